//! State shared by every simulated entity

use crate::codec::{vec3_value, FieldReader};
use crate::event::{EntityEvent, RemovalReason};
use crate::math::{Aabb, DVec3};
use crate::rng::RandomSource;
use crate::time::TickMode;
use crate::{DefId, EntityId, Value, ValueMap};
use tracing::debug;
use uuid::Uuid;

/// Identity, placement and bookkeeping common to all entity kinds
///
/// Kind-specific state (attribute store, age record, cloud parameters, ...)
/// lives in the concrete entity that embeds this.
#[derive(Debug)]
pub struct EntityBase {
    pub id: EntityId,
    pub uuid: Uuid,
    /// Type table entry this entity was built from
    pub kind: DefId,
    pub pos: DVec3,
    /// Position at the start of the current tick
    pub old_pos: DVec3,
    pub delta_movement: DVec3,
    pub y_rot: f32,
    pub x_rot: f32,
    pub width: f32,
    pub height: f32,
    /// Ticks this entity has been stepped, incremented before each tick hook
    pub tick_count: i32,
    pub no_gravity: bool,
    /// Mode chosen by the region for the current step
    pub mode: TickMode,
    removal: Option<RemovalReason>,
    rng: Box<dyn RandomSource>,
    outbox: Vec<EntityEvent>,
}

impl EntityBase {
    pub fn new(
        id: EntityId,
        uuid: Uuid,
        kind: impl Into<DefId>,
        width: f32,
        height: f32,
        rng: Box<dyn RandomSource>,
    ) -> Self {
        Self {
            id,
            uuid,
            kind: kind.into(),
            pos: DVec3::ZERO,
            old_pos: DVec3::ZERO,
            delta_movement: DVec3::ZERO,
            y_rot: 0.0,
            x_rot: 0.0,
            width,
            height,
            tick_count: 0,
            no_gravity: false,
            mode: TickMode::Active,
            removal: None,
            rng,
            outbox: Vec::new(),
        }
    }

    pub fn set_pos(&mut self, pos: DVec3) {
        self.pos = pos;
    }

    /// Resize; boxes are recomputed from the feet position on demand
    pub fn set_dimensions(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    pub fn bounding_box(&self) -> Aabb {
        Aabb::from_dimensions(self.pos, self.width, self.height)
    }

    pub fn eye_height(&self) -> f64 {
        self.height as f64 * 0.85
    }

    pub fn distance_to_sqr(&self, pos: DVec3) -> f64 {
        self.pos.distance_squared(pos)
    }

    /// Called by the region before the tick hook
    pub fn begin_tick(&mut self, mode: TickMode) {
        self.old_pos = self.pos;
        self.tick_count = self.tick_count.saturating_add(1);
        self.mode = mode;
    }

    /// Apply the current motion to the position
    pub fn move_by_motion(&mut self) {
        self.pos += self.delta_movement;
    }

    /// Mark for removal; the first reason wins
    pub fn discard(&mut self, reason: RemovalReason) {
        if self.removal.is_none() {
            debug!(entity = %self.id, kind = %self.kind, ?reason, "discarded");
            self.removal = Some(reason);
        }
    }

    pub fn is_removed(&self) -> bool {
        self.removal.is_some()
    }

    pub fn removal_reason(&self) -> Option<RemovalReason> {
        self.removal
    }

    pub fn rng(&mut self) -> &mut dyn RandomSource {
        self.rng.as_mut()
    }

    /// Replace the random source, e.g. with a scripted one in tests
    pub fn set_rng(&mut self, rng: Box<dyn RandomSource>) {
        self.rng = rng;
    }

    pub fn emit(&mut self, event: EntityEvent) {
        self.outbox.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<EntityEvent> {
        std::mem::take(&mut self.outbox)
    }

    /// Write the shared fields
    pub fn save(&self, out: &mut ValueMap) {
        out.insert("id".into(), Value::String(self.kind.to_string()));
        out.insert("UUID".into(), Value::Uuid(self.uuid));
        out.insert("Pos".into(), vec3_value(self.pos.x, self.pos.y, self.pos.z));
        out.insert(
            "Motion".into(),
            vec3_value(self.delta_movement.x, self.delta_movement.y, self.delta_movement.z),
        );
        out.insert(
            "Rotation".into(),
            Value::List(vec![Value::from(self.y_rot), Value::from(self.x_rot)]),
        );
        if self.no_gravity {
            out.insert("NoGravity".into(), Value::Bool(true));
        }
    }

    /// Restore the shared fields, keeping current values for corrupt ones
    pub fn load(&mut self, input: &FieldReader<'_>) {
        if let Some(uuid) = input.uuid("UUID") {
            self.uuid = uuid;
        }
        if let Some([x, y, z]) = input.vec3("Pos") {
            self.pos = DVec3::new(x, y, z);
            self.old_pos = self.pos;
        }
        if let Some([x, y, z]) = input.vec3("Motion") {
            self.delta_movement = DVec3::new(x, y, z);
        }
        if let Some(rot) = input.list("Rotation") {
            match rot {
                [yaw, pitch] => {
                    self.y_rot = yaw.as_float().unwrap_or(0.0) as f32;
                    self.x_rot = pitch.as_float().unwrap_or(0.0) as f32;
                }
                _ => input.corrupt("Rotation", "expected yaw and pitch"),
            }
        }
        self.no_gravity = input.bool("NoGravity", false);
    }
}
