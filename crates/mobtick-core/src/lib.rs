//! Mobtick Core - building blocks for fixed-step entity simulation
//!
//! This crate provides the types every simulated entity is made of:
//! - Synchronized attribute store with change propagation and replication
//!   deltas (`SyncedStore`, `AttributeKey`)
//! - Entity and definition identifiers
//! - Shared entity state (`EntityBase`) and lifecycle events
//! - Fixed-step time and deterministic per-entity RNG
//! - Geometry and blending helpers (`Aabb`, `Transformation`)
//! - External collaborator interfaces: persistence codec and event gate
//!
//! ## Ownership model
//!
//! A region owns its entities and steps them one at a time. During an
//! entity's tick slice it is the only writer of its own attribute store and
//! of any other entity it touches, so nothing here needs interior locking.

pub mod attribute;
pub mod codec;
mod entity;
mod error;
mod event;
mod gate;
mod identity;
pub mod math;
mod rng;
pub mod time;
mod value;

pub use attribute::{
    AttrValue, AttributeKey, Authority, ChangeSet, DataValue, Listener, SyncedStore,
    MAX_ATTRIBUTES,
};
pub use codec::{BincodeCodec, FieldReader, PersistenceCodec, RonCodec};
pub use entity::EntityBase;
pub use error::{ConfigurationError, Error, Result};
pub use event::{EntityEvent, RemovalReason};
pub use gate::{AllowAll, EventGate, GateRequest, Veto};
pub use identity::{DefId, EntityId, IdAllocator};
pub use math::{Aabb, DVec3, Quat, Transformation, Vec3};
pub use rng::{derive_seed, GameRng, RandomSource};
pub use time::{Clock, Tick, TickMode, TICKS_PER_SECOND};
pub use value::{Value, ValueMap};
