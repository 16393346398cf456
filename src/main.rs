//! Star Hauler headless runner
//!
//! Plays the default layout under the autopilot and logs progress.
//!
//! Usage: `star-hauler [seed] [ticks] [tuning.json]`

use std::error::Error;

use star_hauler::Tuning;
use star_hauler::consts::TICKS_PER_SECOND;
use star_hauler::sim::{GameEvent, GamePhase, TickInput, World};

/// Log a progress line this often (ticks)
const REPORT_EVERY: u64 = 10 * TICKS_PER_SECOND as u64;

struct Args {
    seed: u64,
    ticks: u64,
    tuning_path: Option<String>,
}

fn parse_args() -> Result<Args, Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let seed = match args.next() {
        Some(s) => s.parse().map_err(|e| format!("invalid seed {s:?}: {e}"))?,
        None => 12345,
    };
    let ticks = match args.next() {
        Some(s) => s.parse().map_err(|e| format!("invalid tick count {s:?}: {e}"))?,
        None => 60 * TICKS_PER_SECOND as u64,
    };
    Ok(Args {
        seed,
        ticks,
        tuning_path: args.next(),
    })
}

fn load_tuning(path: Option<&str>) -> Result<Tuning, Box<dyn Error>> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path).map_err(|e| format!("reading {path}: {e}"))?;
            Ok(Tuning::from_json(&json)?)
        }
        None => Ok(Tuning::default()),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let args = parse_args()?;
    let tuning = load_tuning(args.tuning_path.as_deref())?;
    log::info!("Star Hauler starting (seed {}, {} ticks)", args.seed, args.ticks);

    let mut world = World::with_default_layout(args.seed, tuning);
    let input = TickInput {
        idle_mode: true,
        ..Default::default()
    };

    let mut destroyed = 0u32;
    let mut deposits = 0u32;
    for _ in 0..args.ticks {
        world.step(&input);

        for event in world.drain_events() {
            match event {
                GameEvent::AsteroidDestroyed { .. } => destroyed += 1,
                GameEvent::Deposited { .. } => deposits += 1,
                _ => {}
            }
            log::debug!("{:?}", event);
        }

        if world.time_ticks % REPORT_EVERY == 0 {
            log::info!(
                "t={}s exp={} health={:?} entities={} cargo={}",
                world.time_ticks / TICKS_PER_SECOND as u64,
                world.experience(),
                world.player_health(),
                world.entity_count(),
                world.player().map_or(0, |p| p.hold.count()),
            );
        }

        if world.phase == GamePhase::GameOver {
            log::info!("Game over at tick {}", world.time_ticks);
            break;
        }
    }

    let snapshot = world.snapshot();
    println!(
        "seed={} ticks={} experience={} asteroids_destroyed={} deposits={} phase={:?}",
        args.seed, snapshot.tick, snapshot.experience, destroyed, deposits, snapshot.phase
    );
    Ok(())
}
