use std::fmt;

/// Result type for rpsr operations
pub type Result<T> = std::result::Result<T, RpsrError>;

/// Main error type for the rpsr library
#[derive(Debug, Clone)]
pub enum RpsrError {
    /// Invalid dimensions for operations
    DimensionMismatch {
        expected: String,
        actual: String,
    },

    /// Invalid parameter value
    InvalidParameter {
        name: String,
        reason: String,
    },

    /// Action index outside the model's action space
    InvalidAction {
        action: usize,
        max_actions: usize,
    },

    /// Observation with (near-)zero probability under the model
    ImpossibleObservation {
        action: usize,
        observation: usize,
        probability: f64,
    },

    /// Numerical computation errors
    NumericalError(String),

    /// Empty collection where at least one element is required
    EmptyInput(String),

    /// IO errors (file operations)
    IoError(String),

    /// Serialization/deserialization errors
    SerializationError(String),
}

impl fmt::Display for RpsrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RpsrError::DimensionMismatch { expected, actual } => {
                write!(f, "Dimension mismatch: expected {}, got {}", expected, actual)
            }
            RpsrError::InvalidParameter { name, reason } => {
                write!(f, "Invalid parameter '{}': {}", name, reason)
            }
            RpsrError::InvalidAction { action, max_actions } => {
                write!(f, "Invalid action {}: must be less than {}", action, max_actions)
            }
            RpsrError::ImpossibleObservation { action, observation, probability } => {
                write!(
                    f,
                    "Impossible observation {} after action {} (probability {:e})",
                    observation, action, probability
                )
            }
            RpsrError::NumericalError(msg) => write!(f, "Numerical error: {}", msg),
            RpsrError::EmptyInput(msg) => write!(f, "Empty input: {}", msg),
            RpsrError::IoError(msg) => write!(f, "IO error: {}", msg),
            RpsrError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for RpsrError {}

impl From<std::io::Error> for RpsrError {
    fn from(err: std::io::Error) -> Self {
        RpsrError::IoError(err.to_string())
    }
}

impl From<bincode::Error> for RpsrError {
    fn from(err: bincode::Error) -> Self {
        RpsrError::SerializationError(err.to_string())
    }
}

impl From<serde_json::Error> for RpsrError {
    fn from(err: serde_json::Error) -> Self {
        RpsrError::SerializationError(err.to_string())
    }
}

// Helper functions for common error patterns
impl RpsrError {
    pub fn dimension_mismatch<S: Into<String>>(expected: S, actual: S) -> Self {
        RpsrError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        RpsrError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Fails unless `action < max_actions`
    pub fn check_action(action: usize, max_actions: usize) -> Result<()> {
        if action < max_actions {
            Ok(())
        } else {
            Err(RpsrError::InvalidAction { action, max_actions })
        }
    }
}
