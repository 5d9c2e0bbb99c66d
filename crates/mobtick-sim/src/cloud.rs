//! Area effect clouds
//!
//! A cloud waits, then every few ticks applies its potion and extra effects
//! to eligible living entities inside its radius. Each target is remembered
//! with the tick from which it may be affected again.

use crate::context::TickContext;
use crate::effect::{effect_kind, mix_colors, potion_effects, EffectInstance};
use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::store::SpatialQuery;
use indexmap::IndexMap;
use mobtick_core::{
    DefId, EntityBase, EntityEvent, EntityId, FieldReader, GateRequest, RemovalReason,
    SyncedStore, Value, ValueMap,
};
use mobtick_script::{EffectKind, TypeTable};
use tracing::{debug, trace};
use uuid::Uuid;

mobtick_core::attribute_keys! {
    /// Synchronized attributes of area effect clouds
    pub enum CloudKey {
        Radius => "Radius",
        Color => "Color",
        Waiting => "Waiting",
        Particle => "Particle",
    }
}

pub const DEFAULT_RADIUS: f32 = 3.0;
pub const MAX_RADIUS: f32 = 32.0;
/// Below this the cloud dissolves
pub const MIN_RADIUS: f32 = 0.5;
pub const CLOUD_HEIGHT: f32 = 0.5;
pub const DEFAULT_DURATION: i32 = 600;
pub const DEFAULT_WAIT_TIME: i32 = 20;
pub const DEFAULT_REAPPLICATION_DELAY: i32 = 20;
/// Ticks between two application scans
pub const APPLICATION_INTERVAL: i32 = 5;
/// Strength of instant effects delivered by a cloud
pub const INSTANT_PROXIMITY: f64 = 0.5;
pub const DEFAULT_PARTICLE: &str = "entity_effect";

/// Read access shared by everything that applies effects over an area
pub trait AreaEffectSource {
    fn radius(&self) -> f32;

    fn color(&self) -> i32;

    fn is_waiting(&self) -> bool;

    /// Effects one application delivers, in application order
    fn effects_to_apply(&self) -> Vec<EffectInstance>;

    /// Whether `target` is still on cooldown
    fn is_victim(&self, target: EntityId) -> bool;
}

/// A lingering cloud of potion effects
#[derive(Debug)]
pub struct AreaEffectCloud {
    pub base: EntityBase,
    store: SyncedStore<CloudKey>,
    potion: Option<DefId>,
    /// Resolved effects of `potion`, at full duration
    potion_effects: Vec<EffectInstance>,
    effects: Vec<EffectInstance>,
    /// Target → tick from which it may be affected again
    victims: IndexMap<EntityId, i32>,
    duration: i32,
    pub wait_time: i32,
    pub reapplication_delay: i32,
    fixed_color: bool,
    pub duration_on_use: i32,
    pub radius_on_use: f32,
    pub radius_per_tick: f32,
    pub owner: Option<Uuid>,
}

impl AreaEffectCloud {
    pub fn new(mut base: EntityBase) -> Result<Self> {
        let mut store = SyncedStore::new();
        store.define(CloudKey::Radius, DEFAULT_RADIUS)?;
        store.define(CloudKey::Color, 0i32)?;
        store.define(CloudKey::Waiting, false)?;
        store.define(CloudKey::Particle, DEFAULT_PARTICLE)?;
        base.set_dimensions(DEFAULT_RADIUS * 2.0, CLOUD_HEIGHT);
        Ok(Self {
            base,
            store,
            potion: None,
            potion_effects: Vec::new(),
            effects: Vec::new(),
            victims: IndexMap::new(),
            duration: DEFAULT_DURATION,
            wait_time: DEFAULT_WAIT_TIME,
            reapplication_delay: DEFAULT_REAPPLICATION_DELAY,
            fixed_color: false,
            duration_on_use: 0,
            radius_on_use: 0.0,
            radius_per_tick: 0.0,
            owner: None,
        })
    }

    pub fn store(&self) -> &SyncedStore<CloudKey> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SyncedStore<CloudKey> {
        &mut self.store
    }

    /// Clamped to `[0, MAX_RADIUS]`; the box follows
    pub fn set_radius(&mut self, radius: f32) -> Result<()> {
        self.store.set(CloudKey::Radius, radius.clamp(0.0, MAX_RADIUS))?;
        self.refresh_dimensions();
        Ok(())
    }

    fn refresh_dimensions(&mut self) {
        let radius = self.radius();
        self.base.set_dimensions(radius * 2.0, CLOUD_HEIGHT);
    }

    pub fn duration(&self) -> i32 {
        self.duration
    }

    pub fn set_duration(&mut self, duration: i32) {
        self.duration = duration;
    }

    pub fn potion(&self) -> Option<&DefId> {
        self.potion.as_ref()
    }

    pub fn set_potion(&mut self, types: &TypeTable, potion: Option<DefId>) -> Result<()> {
        self.potion_effects = match &potion {
            Some(id) => potion_effects(types, id)?,
            None => Vec::new(),
        };
        self.potion = potion;
        self.update_color(types)
    }

    pub fn effects(&self) -> &[EffectInstance] {
        &self.effects
    }

    pub fn add_effect(&mut self, types: &TypeTable, instance: EffectInstance) -> Result<()> {
        effect_kind(types, &instance.effect)?;
        self.effects.push(instance);
        self.update_color(types)
    }

    pub fn has_fixed_color(&self) -> bool {
        self.fixed_color
    }

    /// Pin the colour; potion and effect changes no longer recolour
    pub fn set_fixed_color(&mut self, rgb: i32) -> Result<()> {
        self.fixed_color = true;
        self.store.set(CloudKey::Color, rgb)?;
        Ok(())
    }

    fn update_color(&mut self, types: &TypeTable) -> Result<()> {
        if self.fixed_color {
            return Ok(());
        }
        let color = if self.potion.is_none() && self.effects.is_empty() {
            0
        } else {
            mix_colors(types, self.potion_effects.iter().chain(&self.effects))
        };
        self.store.set(CloudKey::Color, color)?;
        Ok(())
    }

    pub fn particle(&self) -> &str {
        self.store
            .get_text(CloudKey::Particle)
            .unwrap_or(DEFAULT_PARTICLE)
    }

    pub fn set_particle(&mut self, types: &TypeTable, particle: &DefId) -> Result<()> {
        if !types.has_particle(particle) {
            return Err(Error::UnknownDefinition {
                kind: "particle",
                id: particle.clone(),
            });
        }
        self.store.set(CloudKey::Particle, particle.as_str())?;
        Ok(())
    }

    pub fn victims(&self) -> &IndexMap<EntityId, i32> {
        &self.victims
    }

    fn expired(&self) -> bool {
        self.base.tick_count >= self.wait_time.saturating_add(self.duration)
    }

    pub fn tick(&mut self, ctx: &mut TickContext<'_>) -> Result<()> {
        if self.store.take_changes().contains(CloudKey::Radius) {
            self.refresh_dimensions();
        }
        if self.expired() {
            self.base.discard(RemovalReason::Expired);
            return Ok(());
        }

        let waiting = self.base.tick_count < self.wait_time;
        if waiting != self.is_waiting() {
            self.store.set(CloudKey::Waiting, waiting)?;
            debug!(entity = %self.base.id, waiting, "cloud phase");
            self.base.emit(EntityEvent::CloudPhaseChanged {
                entity: self.base.id,
                waiting,
            });
        }
        if waiting {
            return Ok(());
        }

        let mut radius = self.radius();
        if self.radius_per_tick != 0.0 {
            radius += self.radius_per_tick;
            if radius < MIN_RADIUS {
                self.base.discard(RemovalReason::Depleted);
                return Ok(());
            }
            self.set_radius(radius)?;
        }

        if self.base.tick_count % APPLICATION_INTERVAL == 0 {
            self.apply(ctx, radius)?;
        }
        Ok(())
    }

    /// Reduced update: only the lifetime runs
    pub fn inactive_tick(&mut self) {
        if self.expired() {
            self.base.discard(RemovalReason::Expired);
        }
    }

    fn apply(&mut self, ctx: &mut TickContext<'_>, mut radius: f32) -> Result<()> {
        let now = self.base.tick_count;
        self.victims.retain(|_, cooldown| now < *cooldown);

        let list = self.effects_to_apply();
        if list.is_empty() {
            self.victims.clear();
            return Ok(());
        }
        let kinds = list
            .iter()
            .map(|instance| effect_kind(ctx.types, &instance.effect))
            .collect::<Result<Vec<EffectKind>>>()?;

        let center = self.base.pos;
        let reach = radius as f64 * radius as f64;
        let victims = &self.victims;
        let mut targets = ctx.entities.entities_intersecting(
            &self.base.bounding_box(),
            &|e: &Entity| {
                let dx = e.base().pos.x - center.x;
                let dz = e.base().pos.z - center.z;
                !victims.contains_key(&e.id())
                    && e.is_affected_by_potions()
                    && dx * dx + dz * dz <= reach
            },
        );
        if targets.is_empty() {
            return Ok(());
        }
        let request = &mut GateRequest::AreaEffectApply {
            cloud: self.base.id,
            targets: &mut targets,
        };
        if let Err(veto) = ctx.gate.check(request) {
            trace!(entity = %self.base.id, %veto, "area effect vetoed");
            return Ok(());
        }

        for target in targets {
            let Some(entity) = ctx.entities.get_mut(target) else {
                continue;
            };
            if !entity.is_affected_by_potions() {
                continue;
            }
            self.victims
                .insert(target, now.saturating_add(self.reapplication_delay));
            for (instance, kind) in list.iter().zip(&kinds) {
                entity.receive_effect(*kind, instance, INSTANT_PROXIMITY)?;
                self.base.emit(EntityEvent::EffectApplied {
                    source: self.base.id,
                    target,
                    effect: instance.effect.clone(),
                });
            }

            if self.radius_on_use != 0.0 {
                radius += self.radius_on_use;
                if radius < MIN_RADIUS {
                    self.base.discard(RemovalReason::Depleted);
                    return Ok(());
                }
                self.set_radius(radius)?;
            }
            if self.duration_on_use != 0 {
                self.duration = self.duration.saturating_add(self.duration_on_use);
                if self.duration <= 0 {
                    self.base.discard(RemovalReason::Expired);
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    pub fn save(&self, out: &mut ValueMap) {
        self.base.save(out);
        out.insert("Age".into(), self.base.tick_count.into());
        out.insert("Duration".into(), self.duration.into());
        out.insert("WaitTime".into(), self.wait_time.into());
        out.insert("ReapplicationDelay".into(), self.reapplication_delay.into());
        out.insert("DurationOnUse".into(), self.duration_on_use.into());
        out.insert("RadiusOnUse".into(), self.radius_on_use.into());
        out.insert("RadiusPerTick".into(), self.radius_per_tick.into());
        out.insert("Radius".into(), self.radius().into());
        out.insert("Particle".into(), self.particle().into());
        if let Some(owner) = self.owner {
            out.insert("Owner".into(), owner.into());
        }
        if self.fixed_color {
            out.insert("Color".into(), self.color().into());
        }
        if let Some(potion) = &self.potion {
            out.insert("Potion".into(), potion.as_str().into());
        }
        if !self.effects.is_empty() {
            let list = self.effects.iter().map(EffectInstance::save).collect();
            out.insert("effects".into(), Value::List(list));
        }
    }

    pub fn load(&mut self, input: &FieldReader<'_>, types: &TypeTable) -> Result<()> {
        self.base.load(input);
        self.base.tick_count = input.int32("Age", 0);
        self.duration = input.int32("Duration", self.duration);
        self.wait_time = input.int32("WaitTime", self.wait_time);
        self.reapplication_delay = input.int32("ReapplicationDelay", self.reapplication_delay);
        self.duration_on_use = input.int32("DurationOnUse", 0);
        self.radius_on_use = input.float32("RadiusOnUse", 0.0);
        self.radius_per_tick = input.float32("RadiusPerTick", 0.0);
        self.set_radius(input.float32("Radius", DEFAULT_RADIUS))?;
        if let Some(particle) = input.string("Particle") {
            if self.set_particle(types, &DefId::new(particle)).is_err() {
                input.corrupt("Particle", "unknown particle");
            }
        }
        self.owner = input.uuid("Owner");
        if input.contains("Color") {
            self.set_fixed_color(input.int32("Color", 0))?;
        }
        if let Some(potion) = input.string("Potion") {
            match self.set_potion(types, Some(DefId::new(potion))) {
                Err(Error::UnknownDefinition { .. }) => input.corrupt("Potion", "unknown potion"),
                other => other?,
            }
        }
        self.effects.clear();
        for entry in input.list("effects").unwrap_or_default() {
            let Some(instance) = entry
                .as_map()
                .and_then(|m| EffectInstance::load(&FieldReader::new(m, "effect")))
            else {
                input.corrupt("effects", "malformed effect entry");
                continue;
            };
            match self.add_effect(types, instance) {
                Err(Error::UnknownDefinition { .. }) => input.corrupt("effects", "unknown effect"),
                other => other?,
            }
        }
        Ok(())
    }
}

impl AreaEffectSource for AreaEffectCloud {
    fn radius(&self) -> f32 {
        self.store
            .get_float(CloudKey::Radius)
            .unwrap_or(DEFAULT_RADIUS)
    }

    fn color(&self) -> i32 {
        self.store.get_int(CloudKey::Color).unwrap_or(0)
    }

    fn is_waiting(&self) -> bool {
        self.store.get_bool(CloudKey::Waiting).unwrap_or(false)
    }

    /// Potion effects at a quarter of their duration, then the extra effects
    fn effects_to_apply(&self) -> Vec<EffectInstance> {
        self.potion_effects
            .iter()
            .map(|e| e.map_duration(|d| d / 4))
            .chain(self.effects.iter().cloned())
            .collect()
    }

    fn is_victim(&self, target: EntityId) -> bool {
        self.victims.contains_key(&target)
    }
}
