//! 2D vector helpers on top of `glam::Vec2`

use glam::Vec2;

/// Unit vector pointing along `angle` (radians)
#[inline]
pub fn direction(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Angle (radians) of the ray from `center` toward `point`
#[inline]
pub fn angle_to(center: Vec2, point: Vec2) -> f32 {
    let d = point - center;
    d.y.atan2(d.x)
}

/// Angle of a vector, or `None` for the zero vector
#[inline]
pub fn heading(v: Vec2) -> Option<f32> {
    if v.length_squared() > 0.0 {
        Some(v.y.atan2(v.x))
    } else {
        None
    }
}

/// Distance between two points
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    (a - b).length()
}

/// Scale `v` down to `max_len` if it is longer
#[inline]
pub fn clamp_length(v: Vec2, max_len: f32) -> Vec2 {
    let len = v.length();
    if len > max_len && len > 0.0 {
        v * (max_len / len)
    } else {
        v
    }
}

/// Whether a circle overlaps an axis-aligned rectangle
pub fn circle_overlaps_rect(center: Vec2, radius: f32, rect_center: Vec2, half_extent: Vec2) -> bool {
    let min = rect_center - half_extent;
    let max = rect_center + half_extent;
    let closest = center.clamp(min, max);
    (center - closest).length_squared() < radius * radius
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_zero_vector_normalizes_to_zero() {
        assert_eq!(Vec2::ZERO.normalize_or_zero(), Vec2::ZERO);
        assert_eq!(heading(Vec2::ZERO), None);
    }

    #[test]
    fn test_direction_and_angle_to() {
        let d = direction(PI / 2.0);
        assert!(d.x.abs() < 1e-6);
        assert!((d.y - 1.0).abs() < 1e-6);

        let a = angle_to(Vec2::new(1.0, 1.0), Vec2::new(1.0, 5.0));
        assert!((a - PI / 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_clamp_length() {
        let v = clamp_length(Vec2::new(300.0, 400.0), 100.0);
        assert!((v.length() - 100.0).abs() < 1e-3);
        let short = clamp_length(Vec2::new(3.0, 4.0), 100.0);
        assert_eq!(short, Vec2::new(3.0, 4.0));
    }

    #[test]
    fn test_circle_rect_overlap() {
        let half = Vec2::splat(150.0);
        assert!(circle_overlaps_rect(Vec2::ZERO, 50.0, Vec2::ZERO, half));
        assert!(circle_overlaps_rect(Vec2::new(190.0, 0.0), 50.0, Vec2::ZERO, half));
        assert!(!circle_overlaps_rect(Vec2::new(210.0, 0.0), 50.0, Vec2::ZERO, half));
        assert!(!circle_overlaps_rect(Vec2::new(190.0, 190.0), 50.0, Vec2::ZERO, half));
    }
}
