//! Schema definitions for RON configuration

pub mod effect;
pub mod entity;

pub use effect::{EffectDef, EffectKind, PotionDef, PotionEffect};
pub use entity::{AgeableDef, EntityCategory, EntityTypeDef};
