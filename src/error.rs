//! Configuration error types.
//!
//! The simulation itself never fails: invalid actions resolve to defined
//! no-ops. The only fallible surface is loading and validating [`Tuning`].
//!
//! [`Tuning`]: crate::tuning::Tuning

use std::fmt;

/// Error raised while loading or validating tuning values.
#[derive(Debug)]
pub enum TuningError {
    /// The tuning document was not valid JSON for [`crate::Tuning`].
    Parse(serde_json::Error),

    /// A constant is outside the range the simulation can honor.
    OutOfRange {
        /// Field name (for logging).
        name: &'static str,
        /// The value that was rejected.
        value: f32,
        /// Human-readable description of the accepted range.
        range: &'static str,
    },
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TuningError::Parse(err) => write!(f, "invalid tuning document: {}", err),
            TuningError::OutOfRange { name, value, range } => write!(
                f,
                "tuning value '{}' = {} is outside accepted range {}",
                name, value, range
            ),
        }
    }
}

impl std::error::Error for TuningError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TuningError::Parse(err) => Some(err),
            TuningError::OutOfRange { .. } => None,
        }
    }
}

impl From<serde_json::Error> for TuningError {
    fn from(err: serde_json::Error) -> Self {
        TuningError::Parse(err)
    }
}

/// Convenience alias: a `Result` using `TuningError` as the error type.
pub type TuningResult<T> = Result<T, TuningError>;

/// Returns an error unless `value` is finite and strictly positive.
pub fn require_positive(name: &'static str, value: f32) -> TuningResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TuningError::OutOfRange {
            name,
            value,
            range: "(0.0, ∞)",
        })
    }
}

/// Returns an error unless `value` is finite and not negative.
pub fn require_non_negative(name: &'static str, value: f32) -> TuningResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TuningError::OutOfRange {
            name,
            value,
            range: "[0.0, ∞)",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_positive() {
        assert!(require_positive("mass", 1.0).is_ok());
        assert!(require_positive("mass", 0.0).is_err());
        assert!(require_positive("mass", f32::NAN).is_err());
    }

    #[test]
    fn test_out_of_range_display() {
        let err = require_non_negative("damping", -1.0).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("damping"));
        assert!(msg.contains("-1"));
    }
}
