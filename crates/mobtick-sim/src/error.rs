//! Error types for mobtick-sim

use mobtick_core::{DefId, EntityId};
use thiserror::Error;

/// Result type for mobtick-sim operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building, stepping or persisting entities
#[derive(Debug, Error)]
pub enum Error {
    /// Attribute store or codec failure
    #[error("core error: {0}")]
    Core(#[from] mobtick_core::Error),

    /// Display entity failure
    #[error("render error: {0}")]
    Render(#[from] mobtick_render::Error),

    /// Configuration could not be loaded
    #[error("definition error: {0}")]
    Script(#[from] mobtick_script::Error),

    /// No entity type with this id in the type table
    #[error("unknown entity type {0}")]
    UnknownEntityType(DefId),

    /// A potion or effect id missing from the type table
    #[error("unknown {kind} {id}")]
    UnknownDefinition { kind: &'static str, id: DefId },

    #[error("{0} not found")]
    EntityNotFound(EntityId),

    /// The entity exists but is of another kind
    #[error("{id} is not a {expected}")]
    WrongEntityKind { id: EntityId, expected: &'static str },

    /// A saved entity without the `id` field
    #[error("saved entity has no type id")]
    MissingTypeId,
}

impl From<ron::error::SpannedError> for Error {
    fn from(err: ron::error::SpannedError) -> Self {
        Error::Script(err.into())
    }
}

// Regions step on worker threads, so failures must cross them
fn _assert_error_send_sync<T: Send + Sync>() {}
fn _error_is_send_sync() {
    _assert_error_send_sync::<Error>();
}
