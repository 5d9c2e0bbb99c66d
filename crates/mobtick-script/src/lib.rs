//! Mobtick Script - RON definitions for the simulation host
//!
//! Loads static configuration from RON files:
//! - Entity type definitions (category, dimensions, ageing parameters)
//! - Effect and potion definitions
//! - Known particle ids
//!
//! The result is an immutable [`TypeTable`] that the host builds once at
//! startup and injects into every region.

mod error;
mod loader;
pub mod schema;

pub use error::{Error, Result};
pub use loader::{Loader, TypeTable};
pub use schema::{
    AgeableDef, EffectDef, EffectKind, EntityCategory, EntityTypeDef, PotionDef, PotionEffect,
};
