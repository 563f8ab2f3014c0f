use std::fmt;

/// Result type for balance operations
pub type Result<T> = std::result::Result<T, BalanceError>;

/// Main error type for the balance crate
#[derive(Debug, Clone)]
pub enum BalanceError {
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

    /// A replay sample asked for more transitions than are stored
    InsufficientSamples {
        requested: usize,
        available: usize,
    },

    /// IO errors (file operations)
    IoError(String),

    /// Serialization/deserialization errors
    SerializationError(String),

    /// Numerical computation errors
    NumericalError(String),

    /// Invalid action
    InvalidAction {
        action: usize,
        max_actions: usize,
    },

    /// Environment collaborator failure
    EnvironmentError(String),

    /// Training error
    TrainingError(String),
}

impl fmt::Display for BalanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BalanceError::DimensionMismatch { expected, actual } => {
                write!(f, "Dimension mismatch: expected {}, got {}", expected, actual)
            }
            BalanceError::InvalidParameter { name, reason } => {
                write!(f, "Invalid parameter '{}': {}", name, reason)
            }
            BalanceError::InsufficientSamples { requested, available } => {
                write!(
                    f,
                    "Cannot sample {} transitions: only {} stored",
                    requested, available
                )
            }
            BalanceError::IoError(msg) => write!(f, "IO error: {}", msg),
            BalanceError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            BalanceError::NumericalError(msg) => write!(f, "Numerical error: {}", msg),
            BalanceError::InvalidAction { action, max_actions } => {
                write!(f, "Invalid action {}: must be less than {}", action, max_actions)
            }
            BalanceError::EnvironmentError(msg) => write!(f, "Environment error: {}", msg),
            BalanceError::TrainingError(msg) => write!(f, "Training error: {}", msg),
        }
    }
}

impl std::error::Error for BalanceError {}

impl From<std::io::Error> for BalanceError {
    fn from(err: std::io::Error) -> Self {
        BalanceError::IoError(err.to_string())
    }
}

impl From<bincode::Error> for BalanceError {
    fn from(err: bincode::Error) -> Self {
        BalanceError::SerializationError(err.to_string())
    }
}

impl From<serde_json::Error> for BalanceError {
    fn from(err: serde_json::Error) -> Self {
        BalanceError::SerializationError(err.to_string())
    }
}

// Helper functions for common error patterns
impl BalanceError {
    pub fn dimension_mismatch<S: Into<String>>(expected: S, actual: S) -> Self {
        BalanceError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_parameter<N: Into<String>, R: Into<String>>(name: N, reason: R) -> Self {
        BalanceError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
