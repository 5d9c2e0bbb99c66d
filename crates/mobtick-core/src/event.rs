//! Lifecycle events emitted by entities during their tick

use crate::{DefId, EntityId};
use serde::{Deserialize, Serialize};

/// Why an entity was discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalReason {
    /// Lifetime or duration ran out
    Expired,
    /// Radius decayed below the viable minimum
    Depleted,
    /// Absorbed by another entity
    Merged,
    /// Picked up by a collector
    Consumed,
    /// Health reached zero
    Killed,
    /// Taken out of the region by the host
    Unloaded,
}

/// Something observable that happened during an entity's tick
///
/// Events are collected in the entity's outbox and drained by the region
/// into the step report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityEvent {
    /// Age changed sign; `baby` is the new juvenile state
    AgeBoundary { entity: EntityId, baby: bool },
    /// A grown-up passenger left a vehicle slot too small for it
    Dismounted { entity: EntityId, vehicle: EntityId },
    /// Area cloud entered or left its waiting phase
    CloudPhaseChanged { entity: EntityId, waiting: bool },
    /// An area cloud applied an effect to a target
    EffectApplied {
        source: EntityId,
        target: EntityId,
        effect: DefId,
    },
    /// `absorbed` was folded into `into`, which now counts `count` orbs
    OrbsMerged {
        into: EntityId,
        absorbed: EntityId,
        count: i32,
    },
    /// An orb chose (or dropped) the collector it drifts toward
    TargetChanged {
        entity: EntityId,
        target: Option<EntityId>,
    },
    /// Experience value spent repairing a collector's item
    ItemMended {
        orb: EntityId,
        collector: EntityId,
        slot: usize,
        repaired: i32,
    },
    /// Experience granted to a collector
    ExperienceGained {
        orb: EntityId,
        collector: EntityId,
        amount: i32,
    },
}

impl EntityEvent {
    /// The entity whose tick produced the event
    pub fn source(&self) -> EntityId {
        match self {
            EntityEvent::AgeBoundary { entity, .. }
            | EntityEvent::Dismounted { entity, .. }
            | EntityEvent::CloudPhaseChanged { entity, .. }
            | EntityEvent::TargetChanged { entity, .. } => *entity,
            EntityEvent::EffectApplied { source, .. } => *source,
            EntityEvent::OrbsMerged { into, .. } => *into,
            EntityEvent::ItemMended { orb, .. } | EntityEvent::ExperienceGained { orb, .. } => *orb,
        }
    }
}
