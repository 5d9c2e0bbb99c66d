//! Per-region tick driver
//!
//! A region owns its entities and steps them one at a time in insertion
//! order. The acting entity is taken out of the store for its slice, so it
//! can reach every other entity through the [`TickContext`] with plain
//! mutable access.

use crate::ageable::AgeableGroupData;
use crate::config::RegionConfig;
use crate::context::{default_rng_factory, RngFactory, Spawner, TickContext};
use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::orb::{self, ExpData};
use crate::store::EntityStore;
use crate::{AreaEffectCloud, ExperienceOrb, Mob, Player};
use mobtick_core::{
    AllowAll, Clock, DVec3, DataValue, DefId, EntityEvent, EntityId, EventGate, FieldReader,
    PersistenceCodec, RandomSource, RemovalReason, Tick, TickMode, ValueMap,
};
use mobtick_render::DisplayEntity;
use mobtick_script::TypeTable;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};

/// Everything that happened during one region step
#[derive(Debug, Default)]
pub struct TickReport {
    /// The step that was executed
    pub tick: Tick,
    /// Events drained from entity outboxes, in tick order
    pub events: Vec<EntityEvent>,
    /// Entities dropped at the end of the step
    pub removed: Vec<(EntityId, RemovalReason)>,
    /// Entities spawned during the step; they tick from the next one
    pub spawned: Vec<EntityId>,
    /// Per-entity tick failures; the rest of the step still ran
    pub failures: Vec<(EntityId, Error)>,
    /// Packed replication deltas of entities with dirty attributes
    pub deltas: Vec<(EntityId, Vec<DataValue>)>,
    pub active: usize,
    pub inactive: usize,
}

impl TickReport {
    fn new(tick: Tick) -> Self {
        Self {
            tick,
            ..Self::default()
        }
    }

    /// True when no entity failed
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// One independently stepped slice of the world
pub struct Region {
    config: RegionConfig,
    types: Arc<TypeTable>,
    gate: Arc<dyn EventGate>,
    clock: Clock,
    entities: EntityStore,
    spawner: Spawner,
    rng: Box<dyn RandomSource>,
    forced_mode: Option<TickMode>,
}

impl Region {
    pub fn new(config: RegionConfig, types: Arc<TypeTable>) -> Self {
        let factory = default_rng_factory();
        let rng = factory(config.seed, EntityId(0));
        Self {
            spawner: Spawner::new(config.seed, factory),
            config,
            types,
            gate: Arc::new(AllowAll),
            clock: Clock::new(),
            entities: EntityStore::new(),
            rng,
            forced_mode: None,
        }
    }

    pub fn with_gate(mut self, gate: Arc<dyn EventGate>) -> Self {
        self.gate = gate;
        self
    }

    /// Use `factory` for the region's own draws and every later spawn
    pub fn with_rng_factory(mut self, factory: RngFactory) -> Self {
        self.rng = factory(self.config.seed, EntityId(0));
        self.spawner.set_factory(factory);
        self
    }

    /// Tick every entity in `mode`, ignoring the activation range
    pub fn force_mode(&mut self, mode: Option<TickMode>) {
        self.forced_mode = mode;
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &RegionConfig {
        &self.config
    }

    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    pub fn current_tick(&self) -> Tick {
        self.clock.tick
    }

    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    fn require_mut(&mut self, id: EntityId) -> Result<&mut Entity> {
        self.entities.get_mut(id).ok_or(Error::EntityNotFound(id))
    }

    pub fn mob_mut(&mut self, id: EntityId) -> Result<&mut Mob> {
        self.require_mut(id)?.require("mob", Entity::as_mob_mut)
    }

    pub fn player_mut(&mut self, id: EntityId) -> Result<&mut Player> {
        self.require_mut(id)?.require("player", Entity::as_player_mut)
    }

    pub fn cloud_mut(&mut self, id: EntityId) -> Result<&mut AreaEffectCloud> {
        self.require_mut(id)?
            .require("area effect cloud", Entity::as_cloud_mut)
    }

    pub fn orb_mut(&mut self, id: EntityId) -> Result<&mut ExperienceOrb> {
        self.require_mut(id)?
            .require("experience orb", Entity::as_orb_mut)
    }

    pub fn display_mut(&mut self, id: EntityId) -> Result<&mut DisplayEntity> {
        self.require_mut(id)?.require("display", Entity::as_display_mut)
    }

    /// Spawn an entity of type `kind` at `pos`
    pub fn spawn(&mut self, kind: impl Into<DefId>, pos: DVec3) -> Result<EntityId> {
        let entity = self.spawner.create(&self.types, &kind.into(), pos)?;
        let id = self.entities.insert(entity);
        debug!(region = %self.config.name, entity = %id, "spawned");
        Ok(id)
    }

    /// Spawn one group member per position
    ///
    /// For ageable kinds, members after the first may start juvenile with
    /// the kind's baby chance when `should_spawn_baby` is set.
    pub fn spawn_group(
        &mut self,
        kind: impl Into<DefId>,
        positions: &[DVec3],
        should_spawn_baby: bool,
    ) -> Result<Vec<EntityId>> {
        let kind = kind.into();
        let def = self
            .types
            .entity_type(&kind)
            .ok_or_else(|| Error::UnknownEntityType(kind.clone()))?;
        let mut group = def.ageable.as_ref().map(|ageable| {
            AgeableGroupData::new(should_spawn_baby && ageable.group_babies)
                .with_baby_chance(ageable.baby_chance)
        });

        let mut ids = Vec::with_capacity(positions.len());
        for pos in positions {
            let mut entity = self.spawner.create(&self.types, &kind, *pos)?;
            if let (Some(group), Some(mob)) = (group.as_mut(), entity.as_mob_mut()) {
                group.finalize_spawn(mob, self.rng.as_mut())?;
            }
            ids.push(self.entities.insert(entity));
        }
        debug!(region = %self.config.name, %kind, size = ids.len(), "group spawned");
        Ok(ids)
    }

    /// Seat `passenger` on `vehicle`
    ///
    /// Whether an adult passenger fits is taken from the vehicle's type.
    pub fn mount(&mut self, passenger: EntityId, vehicle: EntityId) -> Result<()> {
        let vehicle_kind = self
            .entities
            .get(vehicle)
            .ok_or(Error::EntityNotFound(vehicle))?
            .base()
            .kind
            .clone();
        let fits_adults = self
            .types
            .entity_type(&vehicle_kind)
            .map_or(true, |def| def.seats_adults);
        self.mob_mut(passenger)?.mount(vehicle, fits_adults);
        Ok(())
    }

    /// Drop `amount` experience at `pos`, stacking onto nearby orbs
    pub fn award_experience(
        &mut self,
        pos: DVec3,
        amount: i32,
        exp_data: &ExpData,
    ) -> Result<Vec<EntityId>> {
        let mut ctx = TickContext::new(
            self.clock.tick,
            &self.types,
            self.gate.as_ref(),
            &mut self.entities,
            self.rng.as_mut(),
            &mut self.spawner,
        );
        let touched = orb::award(&mut ctx, pos, amount, exp_data);
        self.spawner.drain_spawned();
        touched
    }

    /// Take an entity out of the region
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let mut entity = self.entities.remove(id)?;
        entity.base_mut().discard(RemovalReason::Unloaded);
        Some(entity)
    }

    fn mode_for(&self, entity: &Entity, players: &[DVec3]) -> TickMode {
        if let Some(mode) = self.forced_mode {
            return mode;
        }
        let Some(range) = self.config.activation_range() else {
            return TickMode::Active;
        };
        if entity.as_player().is_some() {
            return TickMode::Active;
        }
        let pos = entity.base().pos;
        let limit = range * range;
        if players.iter().any(|p| p.distance_squared(pos) <= limit) {
            TickMode::Active
        } else {
            TickMode::Inactive
        }
    }

    /// Advance every entity by one step
    pub fn tick(&mut self) -> TickReport {
        let tick = self.clock.advance();
        let mut report = TickReport::new(tick);
        let players: Vec<DVec3> = self
            .entities
            .iter()
            .filter_map(Entity::as_player)
            .filter(|p| p.is_present())
            .map(|p| p.base.pos)
            .collect();

        for id in self.entities.ids() {
            let Some(mut entity) = self.entities.take(id) else {
                continue;
            };
            if entity.base().is_removed() {
                self.entities.restore(entity);
                continue;
            }
            let mode = self.mode_for(&entity, &players);
            entity.base_mut().begin_tick(mode);
            entity.lock_attributes();

            let result = {
                let mut ctx = TickContext::new(
                    tick,
                    &self.types,
                    self.gate.as_ref(),
                    &mut self.entities,
                    self.rng.as_mut(),
                    &mut self.spawner,
                );
                match mode {
                    TickMode::Active => entity.tick(&mut ctx),
                    TickMode::Inactive => entity.inactive_tick(),
                }
            };
            match mode {
                TickMode::Active => report.active += 1,
                TickMode::Inactive => report.inactive += 1,
            }
            if let Err(err) = result {
                error!(
                    region = %self.config.name,
                    entity = %id,
                    kind = entity.kind_name(),
                    error = %err,
                    "entity tick failed"
                );
                report.failures.push((id, err));
            }
            report.events.extend(entity.base_mut().drain_events());
            self.entities.restore(entity);
        }

        report.removed = self.entities.sweep_removed();
        report.spawned = self.spawner.drain_spawned();
        for entity in self.entities.iter_mut() {
            if let Some(delta) = entity.pack_dirty() {
                report.deltas.push((entity.id(), delta));
            }
        }
        debug!(
            region = %self.config.name,
            tick,
            entities = self.entities.len(),
            removed = report.removed.len(),
            "region stepped"
        );
        report
    }

    /// Persist one entity through `codec`
    pub fn save_entity(&self, id: EntityId, codec: &dyn PersistenceCodec) -> Result<Vec<u8>> {
        let entity = self.entities.get(id).ok_or(Error::EntityNotFound(id))?;
        let mut map = ValueMap::new();
        entity.save(&mut map)?;
        Ok(codec.write_attributes(&map)?)
    }

    /// Recreate a saved entity under a fresh runtime id
    pub fn load_entity(&mut self, blob: &[u8], codec: &dyn PersistenceCodec) -> Result<EntityId> {
        let map = codec.read_attributes(blob)?;
        let kind = map
            .get("id")
            .and_then(|v| v.as_str())
            .map(DefId::new)
            .ok_or(Error::MissingTypeId)?;
        let mut entity = self.spawner.create(&self.types, &kind, DVec3::ZERO)?;
        let context = kind.to_string();
        entity.load(&FieldReader::new(&map, &context), &self.types)?;
        let id = self.entities.insert(entity);
        debug!(region = %self.config.name, entity = %id, %kind, "loaded");
        Ok(id)
    }
}

impl fmt::Debug for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Region")
            .field("name", &self.config.name)
            .field("tick", &self.clock.tick)
            .field("entities", &self.entities.len())
            .finish()
    }
}
