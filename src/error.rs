//! Crate error types.
//!
//! The simulation itself never fails: missing entities, double deaths and
//! out-of-range values are handled by guards inside the subsystems. Errors only
//! surface when loading or validating configuration.

use std::fmt;
use std::path::PathBuf;

/// Top-level error enum for the simulation crate.
#[derive(Debug)]
pub enum SimError {
    /// A configuration file could not be read or written.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A configuration document was not valid JSON for the expected shape.
    Config {
        /// Where the document came from (file path or `<inline>`).
        origin: String,
        source: serde_json::Error,
    },

    /// A tuning value is outside the range the simulation can work with.
    InvalidTuning {
        field: &'static str,
        value: f32,
        expected: &'static str,
    },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::Io { path, source } => {
                write!(f, "failed to access '{}': {}", path.display(), source)
            }
            SimError::Config { origin, source } => {
                write!(f, "invalid configuration in {}: {}", origin, source)
            }
            SimError::InvalidTuning {
                field,
                value,
                expected,
            } => write!(
                f,
                "tuning value '{}' = {} is out of range (expected {})",
                field, value, expected
            ),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::Io { source, .. } => Some(source),
            SimError::Config { source, .. } => Some(source),
            SimError::InvalidTuning { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_tuning_display() {
        let err = SimError::InvalidTuning {
            field: "wave_period",
            value: -1.0,
            expected: "> 0",
        };
        let msg = err.to_string();
        assert!(msg.contains("wave_period"));
        assert!(msg.contains("> 0"));
    }

    #[test]
    fn test_config_error_has_source() {
        let source = serde_json::from_str::<u32>("nope").unwrap_err();
        let err = SimError::Config {
            origin: "<inline>".to_string(),
            source,
        };
        assert!(std::error::Error::source(&err).is_some());
    }
}
