//! Region-local entity storage and spatial queries
//!
//! Entities live in insertion order. While one entity ticks, its slot is
//! empty: the acting entity is held by the driver and everything else is
//! reachable through the store, so cross-entity effects are plain `&mut`
//! calls.

use crate::entity::Entity;
use indexmap::IndexMap;
use mobtick_core::{Aabb, DVec3, EntityId, RemovalReason};

/// Volume queries over the entities of a region
pub trait SpatialQuery {
    /// Ids of entities whose box intersects `volume` and that pass
    /// `predicate`, in insertion order
    fn entities_intersecting(
        &self,
        volume: &Aabb,
        predicate: &dyn Fn(&Entity) -> bool,
    ) -> Vec<EntityId>;
}

/// Entities of one region keyed by id
#[derive(Debug, Default)]
pub struct EntityStore {
    slots: IndexMap<EntityId, Option<Entity>>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entities, including one currently taken out to tick
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn insert(&mut self, entity: Entity) -> EntityId {
        let id = entity.id();
        self.slots.insert(id, Some(entity));
        id
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.slots.get(&id).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.slots.get_mut(&id).and_then(Option::as_mut)
    }

    /// Snapshot of the current order
    pub fn ids(&self) -> Vec<EntityId> {
        self.slots.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.slots.values().filter_map(Option::as_ref)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.slots.values_mut().filter_map(Option::as_mut)
    }

    /// Nearest entity within `max_distance` of `pos` passing `predicate`
    pub fn nearest(
        &self,
        pos: DVec3,
        max_distance: f64,
        predicate: &dyn Fn(&Entity) -> bool,
    ) -> Option<EntityId> {
        let limit = max_distance * max_distance;
        self.iter()
            .filter(|e| predicate(e))
            .map(|e| (e.id(), e.base().distance_to_sqr(pos)))
            .filter(|(_, d)| *d < limit)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    /// Empty the slot of `id` for the duration of its tick
    pub(crate) fn take(&mut self, id: EntityId) -> Option<Entity> {
        self.slots.get_mut(&id).and_then(Option::take)
    }

    /// Put a taken entity back into its slot
    pub(crate) fn restore(&mut self, entity: Entity) {
        match self.slots.get_mut(&entity.id()) {
            Some(slot) => *slot = Some(entity),
            None => {
                self.insert(entity);
            }
        }
    }

    /// Remove an entity, keeping the order of the rest
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.slots.shift_remove(&id).flatten()
    }

    /// Drop every discarded entity
    pub(crate) fn sweep_removed(&mut self) -> Vec<(EntityId, RemovalReason)> {
        let mut removed = Vec::new();
        self.slots.retain(|id, slot| {
            match slot.as_ref().and_then(|e| e.base().removal_reason()) {
                Some(reason) => {
                    removed.push((*id, reason));
                    false
                }
                None => true,
            }
        });
        removed
    }
}

impl SpatialQuery for EntityStore {
    fn entities_intersecting(
        &self,
        volume: &Aabb,
        predicate: &dyn Fn(&Entity) -> bool,
    ) -> Vec<EntityId> {
        self.iter()
            .filter(|e| !e.base().is_removed())
            .filter(|e| e.base().bounding_box().intersects(volume))
            .filter(|e| predicate(e))
            .map(Entity::id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{default_rng_factory, Spawner};
    use mobtick_core::DefId;
    use mobtick_script::TypeTable;

    fn store_with(kinds: &[(&str, DVec3)]) -> (EntityStore, Vec<EntityId>) {
        let types = TypeTable::builtin().unwrap();
        let mut spawner = Spawner::new(3, default_rng_factory());
        let mut store = EntityStore::new();
        let ids = kinds
            .iter()
            .map(|(kind, pos)| {
                let entity = spawner.create(&types, &DefId::new(*kind), *pos).unwrap();
                store.insert(entity)
            })
            .collect();
        (store, ids)
    }

    #[test]
    fn test_query_keeps_insertion_order() {
        let (store, ids) = store_with(&[
            ("cow", DVec3::new(1.0, 0.0, 0.0)),
            ("sheep", DVec3::ZERO),
            ("cow", DVec3::new(50.0, 0.0, 0.0)),
        ]);
        let area = Aabb::of_size(DVec3::ZERO, 4.0, 4.0, 4.0);
        assert_eq!(store.entities_intersecting(&area, &|_| true), ids[..2]);

        let cows = store.entities_intersecting(&area, &|e| e.base().kind == DefId::new("cow"));
        assert_eq!(cows, vec![ids[0]]);
    }

    #[test]
    fn test_taken_entity_is_invisible() {
        let (mut store, ids) = store_with(&[("cow", DVec3::ZERO), ("cow", DVec3::ZERO)]);
        let taken = store.take(ids[0]).unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.get(ids[0]).is_none());
        let area = Aabb::of_size(DVec3::ZERO, 2.0, 2.0, 2.0);
        assert_eq!(store.entities_intersecting(&area, &|_| true), vec![ids[1]]);

        store.restore(taken);
        assert_eq!(store.ids(), ids);
    }

    #[test]
    fn test_nearest_within_range() {
        let (store, ids) = store_with(&[
            ("cow", DVec3::new(6.0, 0.0, 0.0)),
            ("cow", DVec3::new(3.0, 0.0, 0.0)),
            ("cow", DVec3::new(-20.0, 0.0, 0.0)),
        ]);
        assert_eq!(store.nearest(DVec3::ZERO, 8.0, &|_| true), Some(ids[1]));
        assert_eq!(store.nearest(DVec3::ZERO, 2.0, &|_| true), None);
    }

    #[test]
    fn test_sweep_reports_reasons() {
        let (mut store, ids) = store_with(&[("cow", DVec3::ZERO), ("sheep", DVec3::ZERO)]);
        store
            .get_mut(ids[1])
            .unwrap()
            .base_mut()
            .discard(RemovalReason::Killed);
        assert_eq!(store.sweep_removed(), vec![(ids[1], RemovalReason::Killed)]);
        assert_eq!(store.ids(), vec![ids[0]]);
    }
}
