//! Effect and potion definition schema

use mobtick_core::DefId;
use serde::{Deserialize, Serialize};

/// How an effect acts on its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    /// Lasts for a duration as an effect instance on the target
    Durable,
    /// Restores health immediately
    InstantHeal,
    /// Deals damage immediately
    InstantHarm,
}

impl EffectKind {
    pub fn is_instant(&self) -> bool {
        !matches!(self, EffectKind::Durable)
    }
}

/// Definition of a status effect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectDef {
    pub id: DefId,
    pub kind: EffectKind,
    /// Packed RGB colour used for cloud tinting
    pub color: i32,
    #[serde(default)]
    pub beneficial: bool,
}

/// One effect of a potion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PotionEffect {
    pub effect: DefId,
    /// Duration in ticks (ignored by instant effects)
    #[serde(default)]
    pub duration: i32,
    #[serde(default)]
    pub amplifier: i32,
}

/// Definition of a potion: a named bundle of effects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PotionDef {
    pub id: DefId,
    #[serde(default)]
    pub effects: Vec<PotionEffect>,
}
