//! Error types for mobtick-render

use thiserror::Error;

/// Render error type
#[derive(Debug, Error)]
pub enum Error {
    /// Attribute store failure
    #[error("core error: {0}")]
    Core(#[from] mobtick_core::Error),

    /// A sub-kind setter was called on a display of another kind
    #[error("{operation} is not supported by {kind} displays")]
    WrongDisplayKind {
        operation: &'static str,
        kind: &'static str,
    },
}

/// Result type for render operations
pub type Result<T> = std::result::Result<T, Error>;
