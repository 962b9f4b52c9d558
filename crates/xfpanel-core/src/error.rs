//! Error taxonomy for the panel engine.
//!
//! Only configuration handling can fail. Missing build history, an absent
//! claim plugin or a queue miss all degrade to neutral values instead.

/// Errors produced while parsing or validating panel configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("field {field}: expected an integer, got {value:?}")]
    InvalidInteger { field: String, value: String },

    #[error("field {field}: {value} is outside {min}..={max}")]
    OutOfRange {
        field: String,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("field {field}: unknown value {value:?}")]
    InvalidChoice { field: String, value: String },

    #[error("field {field} is required")]
    MissingField { field: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ConfigError {
    /// Name of the offending field, when the error concerns one.
    pub fn field(&self) -> Option<&str> {
        match self {
            ConfigError::InvalidInteger { field, .. }
            | ConfigError::OutOfRange { field, .. }
            | ConfigError::InvalidChoice { field, .. }
            | ConfigError::MissingField { field } => Some(field),
            ConfigError::Io(_) | ConfigError::Serialization(_) => None,
        }
    }
}

/// Top-level panel errors.
#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for panel operations.
pub type Result<T> = std::result::Result<T, PanelError>;
