//! Experience orbs
//!
//! Experience is split into orbs of canonical values. Orbs of equal value in
//! the same merge bucket fold into one stacked orb, drift toward the nearest
//! collector and are consumed one stack entry per pickup.

use crate::context::TickContext;
use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::player::{Player, PICKUP_DELAY};
use crate::store::SpatialQuery;
use mobtick_core::{
    Aabb, DVec3, DefId, EntityBase, EntityEvent, EntityId, EventGate, FieldReader, GateRequest,
    RemovalReason, SyncedStore, Value, ValueMap,
};
use serde::{Deserialize, Serialize};
use tracing::trace;
use uuid::Uuid;

mobtick_core::attribute_keys! {
    /// Synchronized attributes of experience orbs
    pub enum OrbKey {
        Value => "Value",
    }
}

/// Type table id orbs are spawned as
pub const ORB_TYPE: &str = "experience_orb";
/// Ticks an orb lives
pub const LIFETIME: i32 = 6000;
pub const ORB_HEALTH: i32 = 5;
/// Collectors farther than this are neither followed nor acquired
pub const FOLLOW_RANGE: f64 = 8.0;
/// Follow and merge scans run when `tick_count % SCAN_INTERVAL == 1`
pub const SCAN_INTERVAL: i32 = 20;
pub const MERGE_BUCKETS: i32 = 40;
const GRAVITY: f64 = 0.03;
const DRAG: f64 = 0.98;

/// Why an orb came into the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SpawnReason {
    PlayerDeath,
    EntityDeath,
    Furnace,
    Breed,
    VillagerTrade,
    Fishing,
    BlockBreak,
    Custom,
    ExpBottle,
    Grindstone,
    #[default]
    Unknown,
}

impl SpawnReason {
    const ALL: [SpawnReason; 11] = [
        SpawnReason::PlayerDeath,
        SpawnReason::EntityDeath,
        SpawnReason::Furnace,
        SpawnReason::Breed,
        SpawnReason::VillagerTrade,
        SpawnReason::Fishing,
        SpawnReason::BlockBreak,
        SpawnReason::Custom,
        SpawnReason::ExpBottle,
        SpawnReason::Grindstone,
        SpawnReason::Unknown,
    ];

    /// Persisted name
    pub fn name(&self) -> &'static str {
        match self {
            SpawnReason::PlayerDeath => "PLAYER_DEATH",
            SpawnReason::EntityDeath => "ENTITY_DEATH",
            SpawnReason::Furnace => "FURNACE",
            SpawnReason::Breed => "BREED",
            SpawnReason::VillagerTrade => "VILLAGER_TRADE",
            SpawnReason::Fishing => "FISHING",
            SpawnReason::BlockBreak => "BLOCK_BREAK",
            SpawnReason::Custom => "CUSTOM",
            SpawnReason::ExpBottle => "EXP_BOTTLE",
            SpawnReason::Grindstone => "GRINDSTONE",
            SpawnReason::Unknown => "UNKNOWN",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|reason| reason.name() == name)
    }
}

/// Provenance of an orb
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpData {
    /// Entity the experience came from
    pub source: Option<Uuid>,
    /// Entity that caused the drop
    pub trigger: Option<Uuid>,
    pub reason: SpawnReason,
}

impl ExpData {
    pub fn new(reason: SpawnReason) -> Self {
        Self {
            reason,
            ..Self::default()
        }
    }

    fn save(&self) -> Value {
        let mut map = ValueMap::new();
        if let Some(source) = self.source {
            map.insert("source".into(), source.into());
        }
        if let Some(trigger) = self.trigger {
            map.insert("trigger".into(), trigger.into());
        }
        if self.reason != SpawnReason::Unknown {
            map.insert("reason".into(), self.reason.name().into());
        }
        Value::Map(map)
    }

    fn load(input: &FieldReader<'_>) -> Self {
        let mut data = Self {
            source: input.uuid("source"),
            trigger: input.uuid("trigger"),
            reason: SpawnReason::Unknown,
        };
        if let Some(name) = input.string("reason") {
            match SpawnReason::from_name(name) {
                Some(reason) => data.reason = reason,
                None => input.corrupt("reason", "unknown spawn reason"),
            }
        }
        data
    }
}

/// The largest canonical orb value not exceeding `amount`
pub fn experience_value(amount: i32) -> i32 {
    const LARGE: [i32; 15] = [
        81_335_063, 40_667_527, 20_333_759, 10_166_857, 5_083_423, 2_541_701, 1_270_849,
        635_413, 317_701, 158_849, 79_423, 39_709, 19_853, 9_923, 4_957,
    ];
    const SMALL: [i32; 10] = [2477, 1237, 617, 307, 149, 73, 37, 17, 7, 3];

    if amount > 162_670_129 {
        return amount - 100_000;
    }
    if let Some(value) = LARGE.into_iter().find(|v| amount > *v) {
        return value;
    }
    SMALL.into_iter().find(|v| amount >= *v).unwrap_or(1)
}

/// Split `amount` into canonical orb values, largest first
pub fn decompose(amount: i32) -> Vec<i32> {
    let mut chunks = Vec::new();
    let mut remaining = amount;
    while remaining > 0 {
        let value = experience_value(remaining);
        chunks.push(value);
        remaining -= value;
    }
    chunks
}

/// Whether `orb` may absorb (or be absorbed under) merge seed `seed`
///
/// The bucket test compares the orb's own id against the seed, not the
/// ids of both orbs.
pub fn can_merge(orb: &ExperienceOrb, seed: i64, value: i32) -> bool {
    !orb.base.is_removed()
        && (orb.base.id.as_i64() - seed) % MERGE_BUCKETS as i64 == 0
        && orb.value == value
}

/// Size tier of an orb's value, 0 to 10
pub fn icon(value: i32) -> i32 {
    const TIERS: [(i32, i32); 10] = [
        (2477, 10),
        (1237, 9),
        (617, 8),
        (307, 7),
        (149, 6),
        (73, 5),
        (37, 4),
        (17, 3),
        (7, 2),
        (3, 1),
    ];
    TIERS
        .into_iter()
        .find(|(threshold, _)| value >= *threshold)
        .map_or(0, |(_, tier)| tier)
}

/// Something worth experience
pub trait ExperienceUnit {
    /// Experience each stacked unit grants
    fn value(&self) -> i32;

    /// Units stacked in this entity
    fn count(&self) -> i32;

    fn total(&self) -> i64 {
        self.value() as i64 * self.count() as i64
    }
}

/// A stack of equal-valued experience
#[derive(Debug)]
pub struct ExperienceOrb {
    pub base: EntityBase,
    store: SyncedStore<OrbKey>,
    age: i32,
    health: i32,
    value: i32,
    count: i32,
    following: Option<EntityId>,
    pub exp_data: ExpData,
}

impl ExperienceOrb {
    pub fn new(base: EntityBase) -> Result<Self> {
        let mut store = SyncedStore::new();
        store.define(OrbKey::Value, 0i32)?;
        Ok(Self {
            base,
            store,
            age: 0,
            health: ORB_HEALTH,
            value: 0,
            count: 1,
            following: None,
            exp_data: ExpData::default(),
        })
    }

    pub fn store(&self) -> &SyncedStore<OrbKey> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SyncedStore<OrbKey> {
        &mut self.store
    }

    pub fn set_value(&mut self, value: i32) -> Result<()> {
        self.value = value;
        self.store.set(OrbKey::Value, value)?;
        Ok(())
    }

    /// Ticks alive
    pub fn age(&self) -> i32 {
        self.age
    }

    pub fn set_age(&mut self, age: i32) {
        self.age = age;
    }

    pub fn set_count(&mut self, count: i32) {
        self.count = count.max(1);
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn following(&self) -> Option<EntityId> {
        self.following
    }

    pub fn icon(&self) -> i32 {
        icon(self.value)
    }

    /// Random initial heading and hop of a freshly dropped orb
    pub fn scatter(&mut self) {
        let rng = self.base.rng();
        let yaw = rng.next_f64() * 360.0;
        let dx = (rng.next_f64() * 0.2 - 0.1) * 2.0;
        let dy = rng.next_f64() * 0.2 * 2.0;
        let dz = (rng.next_f64() * 0.2 - 0.1) * 2.0;
        self.base.y_rot = yaw as f32;
        self.base.delta_movement = DVec3::new(dx, dy, dz);
    }

    /// Take damage; returns false when already removed
    pub fn hurt(&mut self, amount: f32) -> bool {
        if self.base.is_removed() {
            return false;
        }
        self.health = (self.health as f32 - amount) as i32;
        if self.health <= 0 {
            self.base.discard(RemovalReason::Killed);
        }
        true
    }

    /// Fold `other` into this stack
    pub fn merge(&mut self, other: &mut ExperienceOrb) {
        self.count = self.count.saturating_add(other.count);
        self.age = self.age.min(other.age);
        other.base.discard(RemovalReason::Merged);
        self.base.emit(EntityEvent::OrbsMerged {
            into: self.base.id,
            absorbed: other.base.id,
            count: self.count,
        });
    }

    pub fn tick(&mut self, ctx: &mut TickContext<'_>) -> Result<()> {
        if !self.base.no_gravity {
            self.base.delta_movement.y -= GRAVITY;
        }
        if self.base.tick_count % SCAN_INTERVAL == 1 {
            self.scan_for_collector(ctx);
            self.scan_for_merges(ctx);
        }
        self.drop_absent_collector(ctx);
        self.follow(ctx);

        self.base.move_by_motion();
        self.base.delta_movement *= DRAG;

        self.touch_collectors(ctx)?;
        self.grow_older();
        Ok(())
    }

    /// Reduced update: only the lifetime runs
    pub fn inactive_tick(&mut self) {
        self.grow_older();
    }

    fn grow_older(&mut self) {
        self.age = self.age.saturating_add(1);
        if self.age >= LIFETIME {
            self.base.discard(RemovalReason::Expired);
        }
    }

    fn scan_for_collector(&mut self, ctx: &mut TickContext<'_>) {
        let limit = FOLLOW_RANGE * FOLLOW_RANGE;
        let tracked_nearby = self
            .following
            .and_then(|id| ctx.entities.get(id))
            .is_some_and(|e| e.base().distance_to_sqr(self.base.pos) <= limit);
        if tracked_nearby {
            return;
        }
        let nearest = ctx.entities.nearest(self.base.pos, FOLLOW_RANGE, &|e: &Entity| {
            e.as_player().is_some_and(Player::is_present)
        });
        if nearest == self.following {
            return;
        }
        let mut request = GateRequest::OrbTarget {
            orb: self.base.id,
            target: nearest,
        };
        if let Err(veto) = ctx.gate.check(&mut request) {
            trace!(entity = %self.base.id, %veto, "target change vetoed");
            return;
        }
        self.set_following(nearest);
    }

    fn drop_absent_collector(&mut self, ctx: &TickContext<'_>) {
        let Some(id) = self.following else {
            return;
        };
        let present = ctx
            .entities
            .get(id)
            .and_then(Entity::as_player)
            .is_some_and(Player::is_present);
        if !present {
            self.set_following(None);
        }
    }

    fn set_following(&mut self, target: Option<EntityId>) {
        self.following = target;
        self.base.emit(EntityEvent::TargetChanged {
            entity: self.base.id,
            target,
        });
    }

    fn follow(&mut self, ctx: &TickContext<'_>) {
        let Some(target) = self.following.and_then(|id| ctx.entities.get(id)) else {
            return;
        };
        let eye = target.base();
        let pos = self.base.pos;
        let offset = DVec3::new(
            eye.pos.x - pos.x,
            eye.pos.y + eye.eye_height() / 2.0 - pos.y,
            eye.pos.z - pos.z,
        );
        let distance_sqr = offset.length_squared();
        if distance_sqr < FOLLOW_RANGE * FOLLOW_RANGE {
            let pull = 1.0 - distance_sqr.sqrt() / FOLLOW_RANGE;
            self.base.delta_movement += offset.normalize_or_zero() * (pull * pull * 0.1);
        }
    }

    fn scan_for_merges(&mut self, ctx: &mut TickContext<'_>) {
        let seed = self.base.id.as_i64();
        let value = self.value;
        let area = self.base.bounding_box().inflate(0.5);
        let candidates = ctx.entities.entities_intersecting(&area, &|e: &Entity| {
            e.as_orb().is_some_and(|orb| can_merge(orb, seed, value))
        });
        for id in candidates {
            if let Some(other) = ctx.entities.get_mut(id).and_then(Entity::as_orb_mut) {
                self.merge(other);
            }
        }
    }

    fn touch_collectors(&mut self, ctx: &mut TickContext<'_>) -> Result<()> {
        let touching = ctx
            .entities
            .entities_intersecting(&self.base.bounding_box(), &|e: &Entity| {
                e.as_player().is_some_and(Player::is_present)
            });
        for id in touching {
            if self.base.is_removed() {
                break;
            }
            if let Some(player) = ctx.entities.get_mut(id).and_then(Entity::as_player_mut) {
                self.player_touch(player, ctx.gate)?;
            }
        }
        Ok(())
    }

    /// A collector touched this orb: mend, grant the rest, consume one unit
    pub fn player_touch(&mut self, player: &mut Player, gate: &dyn EventGate) -> Result<()> {
        if player.collector.pickup_delay != 0 {
            return Ok(());
        }
        let collector = player.base.id;
        let mut request = GateRequest::ExperiencePickup {
            orb: self.base.id,
            collector,
        };
        if gate.check(&mut request).is_err() {
            return Ok(());
        }
        player.collector.pickup_delay = PICKUP_DELAY;

        let remaining = self.repair_items(player, gate, self.value);
        if remaining > 0 {
            let mut amount = remaining;
            let mut request = GateRequest::ExperienceGain {
                orb: self.base.id,
                collector,
                amount: &mut amount,
            };
            if gate.check(&mut request).is_ok() {
                player.collector.give_experience(amount);
                self.base.emit(EntityEvent::ExperienceGained {
                    orb: self.base.id,
                    collector,
                    amount,
                });
            }
        }
        player.sync()?;

        self.count -= 1;
        if self.count <= 0 {
            self.base.discard(RemovalReason::Consumed);
        }
        Ok(())
    }

    /// Spend `amount` on random damaged items; returns what is left
    fn repair_items(&mut self, player: &mut Player, gate: &dyn EventGate, amount: i32) -> i32 {
        let Some(slot) = player.collector.random_damaged_slot(player.base.rng()) else {
            return amount;
        };
        let damage = player.collector.item(slot).map_or(0, |item| item.damage);
        let mut repair = amount.saturating_mul(2).min(damage);
        let mut request = GateRequest::ItemMend {
            orb: self.base.id,
            collector: player.base.id,
            slot,
            repair: &mut repair,
        };
        if gate.check(&mut request).is_err() {
            return amount;
        }
        let repaired = player.collector.repair(slot, repair);
        if repaired > 0 {
            self.base.emit(EntityEvent::ItemMended {
                orb: self.base.id,
                collector: player.base.id,
                slot,
                repaired,
            });
        }
        let remaining = amount - repaired / 2;
        if repaired == 0 && remaining == amount {
            return remaining;
        }
        if remaining > 0 {
            self.repair_items(player, gate, remaining)
        } else {
            0
        }
    }

    pub fn save(&self, out: &mut ValueMap) {
        self.base.save(out);
        out.insert("Health".into(), self.health.into());
        out.insert("Age".into(), self.age.into());
        out.insert("Value".into(), self.value.into());
        out.insert("Count".into(), self.count.into());
        out.insert("ExpData".into(), self.exp_data.save());
    }

    pub fn load(&mut self, input: &FieldReader<'_>) -> Result<()> {
        self.base.load(input);
        self.health = input.int32("Health", ORB_HEALTH);
        self.age = input.int32("Age", 0);
        self.set_value(input.int32("Value", 0))?;
        self.set_count(input.int32("Count", 1));
        if let Some(data) = input.map("ExpData") {
            self.exp_data = ExpData::load(&data);
        }
        Ok(())
    }
}

impl ExperienceUnit for ExperienceOrb {
    fn value(&self) -> i32 {
        self.value
    }

    fn count(&self) -> i32 {
        self.count
    }
}

/// Drop `amount` experience at `pos`
///
/// Each canonical chunk first tries to stack onto an orb near `pos` in a
/// randomly drawn merge bucket; otherwise a new orb is spawned. Returns the
/// orbs that received experience, one entry per chunk.
pub fn award(
    ctx: &mut TickContext<'_>,
    pos: DVec3,
    amount: i32,
    exp_data: &ExpData,
) -> Result<Vec<EntityId>> {
    let kind = DefId::new(ORB_TYPE);
    let mut touched = Vec::new();
    for value in decompose(amount) {
        let seed = ctx.rng.next_int(MERGE_BUCKETS) as i64;
        let area = Aabb::of_size(pos, 1.0, 1.0, 1.0);
        let existing = ctx
            .entities
            .entities_intersecting(&area, &|e: &Entity| {
                e.as_orb().is_some_and(|orb| can_merge(orb, seed, value))
            })
            .into_iter()
            .next();
        if let Some(orb) = existing.and_then(|id| ctx.entities.get_mut(id)?.as_orb_mut()) {
            orb.count = orb.count.saturating_add(1);
            orb.age = 0;
            touched.push(orb.base.id);
            continue;
        }
        let id = ctx.spawn_with(&kind, pos, |entity| {
            let id = entity.id();
            let orb = entity.as_orb_mut().ok_or(Error::WrongEntityKind {
                id,
                expected: "experience orb",
            })?;
            orb.set_value(value)?;
            orb.exp_data = exp_data.clone();
            orb.scatter();
            Ok(())
        })?;
        touched.push(id);
    }
    Ok(touched)
}
