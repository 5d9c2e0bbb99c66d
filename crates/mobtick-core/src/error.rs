//! Error types for mobtick-core

use thiserror::Error;

/// Misuse of the attribute registration API, detected at entity construction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("attribute {0} defined after registration was locked")]
    DefinedAfterLock(&'static str),

    #[error("attribute {0} defined twice")]
    Duplicate(&'static str),

    #[error("attribute {key} has slot index {index}, stores hold at most 64 slots")]
    TooManyKeys { key: &'static str, index: usize },
}

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// A listener wrote back to a key whose change is still propagating
    #[error("Re-entrant write to attribute {key} during its own change propagation")]
    ReentrantWrite { key: &'static str },

    #[error("Attribute {key} cannot be written from a client-side store")]
    ReadOnlyContext { key: &'static str },

    #[error("Attribute {0} is not defined for this entity")]
    UnknownAttribute(&'static str),

    #[error("Replicated attribute id {0} does not name a key of this entity kind")]
    UnknownAttributeId(u8),

    #[error("Type error on attribute {key}: expected {expected}, got {got}")]
    TypeMismatch {
        key: &'static str,
        expected: &'static str,
        got: &'static str,
    },

    #[error("Corrupt field {field}: {reason}")]
    DataCorruption { field: String, reason: String },

    #[error("Codec error: {0}")]
    Codec(String),
}

impl Error {
    /// Whether the error is recoverable by skipping the offending field
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::DataCorruption { .. })
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
