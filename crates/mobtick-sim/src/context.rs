//! What an entity sees while it ticks

use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::store::EntityStore;
use mobtick_core::{
    DVec3, DefId, EntityBase, EntityId, EventGate, GameRng, IdAllocator, RandomSource, Tick,
};
use mobtick_script::TypeTable;
use std::fmt;
use std::sync::Arc;

/// Builds the random source of a new entity from the region seed and its id
pub type RngFactory = Arc<dyn Fn(u64, EntityId) -> Box<dyn RandomSource> + Send + Sync>;

/// `GameRng` seeded per entity
pub fn default_rng_factory() -> RngFactory {
    Arc::new(|seed: u64, id: EntityId| -> Box<dyn RandomSource> {
        Box::new(GameRng::for_entity(seed, id))
    })
}

/// Allocates identities for new entities of one region
pub struct Spawner {
    ids: IdAllocator,
    seed: u64,
    factory: RngFactory,
    spawned: Vec<EntityId>,
}

impl Spawner {
    pub fn new(seed: u64, factory: RngFactory) -> Self {
        Self {
            ids: IdAllocator::default(),
            seed,
            factory,
            spawned: Vec::new(),
        }
    }

    pub fn set_factory(&mut self, factory: RngFactory) {
        self.factory = factory;
    }

    /// Id the next spawn will get
    pub fn peek(&self) -> EntityId {
        self.ids.peek()
    }

    /// Build an entity of type `kind` standing at `pos`
    pub fn create(&mut self, types: &TypeTable, kind: &DefId, pos: DVec3) -> Result<Entity> {
        let def = types
            .entity_type(kind)
            .ok_or_else(|| Error::UnknownEntityType(kind.clone()))?;
        let id = self.ids.next_id();
        let mut base = EntityBase::new(
            id,
            self.ids.fresh_uuid(),
            def.id.clone(),
            def.width,
            def.height,
            (self.factory)(self.seed, id),
        );
        base.set_pos(pos);
        base.old_pos = pos;
        Entity::create(def, base)
    }

    pub(crate) fn record(&mut self, id: EntityId) {
        self.spawned.push(id);
    }

    pub(crate) fn drain_spawned(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.spawned)
    }
}

impl fmt::Debug for Spawner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spawner")
            .field("next", &self.ids.peek())
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}

/// The acting entity's view of its region for one tick slice
///
/// The acting entity itself is not in `entities` while it ticks.
pub struct TickContext<'a> {
    pub tick: Tick,
    pub types: &'a TypeTable,
    pub gate: &'a dyn EventGate,
    pub entities: &'a mut EntityStore,
    /// Region-level random source, for draws not owned by any entity
    pub rng: &'a mut dyn RandomSource,
    spawner: &'a mut Spawner,
}

impl<'a> TickContext<'a> {
    pub(crate) fn new(
        tick: Tick,
        types: &'a TypeTable,
        gate: &'a dyn EventGate,
        entities: &'a mut EntityStore,
        rng: &'a mut dyn RandomSource,
        spawner: &'a mut Spawner,
    ) -> Self {
        Self {
            tick,
            types,
            gate,
            entities,
            rng,
            spawner,
        }
    }

    /// Spawn an entity; it is queryable at once and ticks from the next step
    pub fn spawn(&mut self, kind: &DefId, pos: DVec3) -> Result<EntityId> {
        self.spawn_with(kind, pos, |_| Ok(()))
    }

    /// Spawn, letting `configure` adjust the entity before it is inserted
    pub fn spawn_with(
        &mut self,
        kind: &DefId,
        pos: DVec3,
        configure: impl FnOnce(&mut Entity) -> Result<()>,
    ) -> Result<EntityId> {
        let mut entity = self.spawner.create(self.types, kind, pos)?;
        configure(&mut entity)?;
        let id = self.entities.insert(entity);
        self.spawner.record(id);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mobtick_core::AllowAll;

    #[test]
    fn test_unknown_type_is_rejected() {
        let types = TypeTable::builtin().unwrap();
        let mut spawner = Spawner::new(1, default_rng_factory());
        let err = spawner
            .create(&types, &DefId::new("dragon"), DVec3::ZERO)
            .unwrap_err();
        assert!(matches!(err, Error::UnknownEntityType(_)));
        assert_eq!(spawner.peek(), EntityId(1));
    }

    #[test]
    fn test_spawn_with_configures_and_records() {
        let types = TypeTable::builtin().unwrap();
        let mut entities = EntityStore::new();
        let mut spawner = Spawner::new(1, default_rng_factory());
        let mut rng = GameRng::new(9);
        let pos = DVec3::new(2.0, 5.0, 2.0);
        let id = {
            let mut ctx = TickContext::new(
                1,
                &types,
                &AllowAll,
                &mut entities,
                &mut rng,
                &mut spawner,
            );
            ctx.spawn_with(&DefId::new("cow"), pos, |e| {
                e.base_mut().no_gravity = true;
                Ok(())
            })
            .unwrap()
        };
        let cow = entities.get(id).unwrap();
        assert!(cow.base().no_gravity);
        assert_eq!(cow.base().old_pos, pos);
        assert_eq!(spawner.drain_spawned(), vec![id]);
        assert!(spawner.drain_spawned().is_empty());
    }
}
