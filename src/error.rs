//! Error types for the mapping core.

use thiserror::Error;

/// Errors raised by the map, registration and orchestration layers.
///
/// Configuration errors are fatal to the call that produced them. Every other
/// variant is a per-scan failure that the orchestrator recovers from without
/// touching the map or the trajectory.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MapperError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Map is empty")]
    EmptyMap,

    #[error("No neighbors found in the map for the query cloud")]
    NoNeighborsFound,

    #[error("Insufficient correspondences: found {found}, required {required}")]
    InsufficientCorrespondences { found: usize, required: usize },

    #[error("Registration did not converge after {iterations} iterations (last change {last_change:.3e})")]
    RegistrationDidNotConverge { iterations: u32, last_change: f64 },

    #[error("Frame transform unavailable: {0}")]
    FrameTransformUnavailable(String),
}

impl MapperError {
    /// True for errors that only reject the current scan.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, MapperError::InvalidConfig(_))
    }
}

pub type Result<T> = std::result::Result<T, MapperError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_fatal() {
        assert!(!MapperError::InvalidConfig("resolution".into()).is_recoverable());
        assert!(MapperError::NoNeighborsFound.is_recoverable());
        assert!(
            MapperError::RegistrationDidNotConverge {
                iterations: 30,
                last_change: 0.1
            }
            .is_recoverable()
        );
    }

    #[test]
    fn test_display_mentions_counts() {
        let err = MapperError::InsufficientCorrespondences {
            found: 2,
            required: 6,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient correspondences: found 2, required 6"
        );
    }
}
