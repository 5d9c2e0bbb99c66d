//! Entity type definition schema

use mobtick_core::DefId;
use serde::{Deserialize, Serialize};

/// Which simulation variant an entity type is built as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityCategory {
    /// Living, possibly ageable creature
    Mob,
    /// Living collector of experience
    Player,
    AreaEffectCloud,
    ExperienceOrb,
    BlockDisplay,
    ItemDisplay,
    TextDisplay,
}

impl EntityCategory {
    pub fn is_living(&self) -> bool {
        matches!(self, EntityCategory::Mob | EntityCategory::Player)
    }

    pub fn is_display(&self) -> bool {
        matches!(
            self,
            EntityCategory::BlockDisplay | EntityCategory::ItemDisplay | EntityCategory::TextDisplay
        )
    }
}

/// Definition of an entity type (e.g. sheep, area_effect_cloud)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityTypeDef {
    /// Unique identifier for this entity type
    pub id: DefId,
    /// Display name
    #[serde(default)]
    pub name: String,
    pub category: EntityCategory,
    /// Bounding box width (x and z)
    pub width: f32,
    pub height: f32,
    /// Health for living kinds
    #[serde(default = "default_max_health")]
    pub max_health: f32,
    /// Whether area clouds and potions may affect this kind
    #[serde(default = "default_true")]
    pub affected_by_potions: bool,
    /// Ageing parameters; `None` for kinds that never grow up
    #[serde(default)]
    pub ageable: Option<AgeableDef>,
    /// Whether an adult passenger still fits when this kind is used as a vehicle
    #[serde(default = "default_true")]
    pub seats_adults: bool,
}

/// Ageing parameters of an ageable kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgeableDef {
    /// Probability that a non-leading group member spawns as a baby
    #[serde(default = "default_baby_chance")]
    pub baby_chance: f32,
    /// Whether group spawns may produce babies at all
    #[serde(default = "default_true")]
    pub group_babies: bool,
}

impl Default for AgeableDef {
    fn default() -> Self {
        Self {
            baby_chance: default_baby_chance(),
            group_babies: true,
        }
    }
}

impl EntityTypeDef {
    pub fn new(id: impl Into<DefId>, category: EntityCategory, width: f32, height: f32) -> Self {
        let id = id.into();
        Self {
            name: id.to_string(),
            id,
            category,
            width,
            height,
            max_health: default_max_health(),
            affected_by_potions: true,
            ageable: None,
            seats_adults: true,
        }
    }

    pub fn with_ageable(mut self, ageable: AgeableDef) -> Self {
        self.ageable = Some(ageable);
        self
    }

    pub fn with_max_health(mut self, max_health: f32) -> Self {
        self.max_health = max_health;
        self
    }

    pub fn with_seats_adults(mut self, seats_adults: bool) -> Self {
        self.seats_adults = seats_adults;
        self
    }

    pub fn is_ageable(&self) -> bool {
        self.ageable.is_some()
    }
}

fn default_true() -> bool {
    true
}

fn default_max_health() -> f32 {
    20.0
}

fn default_baby_chance() -> f32 {
    0.05
}
