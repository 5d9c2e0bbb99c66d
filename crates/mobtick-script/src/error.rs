//! Error types for mobtick-script

use thiserror::Error;

/// Configuration loading error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Duplicate definition: {0}")]
    DuplicateDefinition(String),

    #[error("{owner} references unknown {kind} {id}")]
    UnknownReference {
        owner: String,
        kind: &'static str,
        id: String,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
