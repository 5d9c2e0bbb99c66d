//! Identities: runtime entity ids, persistent uuids and definition ids

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Runtime identifier for an entity, assigned in spawn order by its region
///
/// Ids are never reused within a region; experience orbs derive their merge
/// bucket from the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl EntityId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Signed view used by bucket arithmetic
    pub fn as_i64(&self) -> i64 {
        self.0 as i64
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity:{}", self.0)
    }
}

/// Hands out entity ids and uuids for one region
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    /// Start allocating at `first`
    pub fn starting_at(first: u64) -> Self {
        Self { next: first }
    }

    /// Allocate the next runtime id
    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }

    /// Peek at the id the next allocation will return
    pub fn peek(&self) -> EntityId {
        EntityId(self.next)
    }

    /// A fresh random uuid for a newly created entity
    pub fn fresh_uuid(&self) -> Uuid {
        Uuid::new_v4()
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

/// Identifier for a definition (entity type, effect, potion) loaded from configuration
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefId(pub String);

impl DefId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DefId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for DefId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_display() {
        let id = EntityId::new(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(format!("{}", id), "entity:42");
    }

    #[test]
    fn test_allocator_is_monotonic() {
        let mut ids = IdAllocator::starting_at(40);
        assert_eq!(ids.peek(), EntityId(40));
        assert_eq!(ids.next_id(), EntityId(40));
        assert_eq!(ids.next_id(), EntityId(41));
        assert_ne!(ids.fresh_uuid(), ids.fresh_uuid());
    }

    #[test]
    fn test_def_id_from_str() {
        let id: DefId = "area_effect_cloud".into();
        assert_eq!(id.as_str(), "area_effect_cloud");
        assert_eq!(id.to_string(), "area_effect_cloud");
    }
}
