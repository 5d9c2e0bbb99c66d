//! Mobtick Sim - region-based tick driver for ageing mobs, area effect
//! clouds and experience orbs
//!
//! A [`Region`] owns a set of entities and advances them one step at a time:
//!
//! - **Mobs** grow up through the age state machine ([`Ageable`]) and can
//!   ride vehicles
//! - **Players** collect experience and mend damaged gear
//! - **Area effect clouds** wait, then apply potion effects to living
//!   entities in range with a per-victim cooldown
//! - **Experience orbs** stack by merge bucket, follow the nearest player and
//!   are picked up on contact
//! - **Displays** rebuild their render state at tick boundaries
//!
//! A [`World`] steps several regions side by side on worker threads.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                            World                             │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐       │
//! │  │   Region A   │  │   Region B   │  │   Region C   │  ...  │
//! │  │  Clock       │  │  Clock       │  │  Clock       │       │
//! │  │  EntityStore │  │  EntityStore │  │  EntityStore │       │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘       │
//! └─────────┼─────────────────┼─────────────────┼───────────────┘
//!           ▼                 ▼                 ▼
//!      TickReport        TickReport        TickReport
//!   (events, removals, spawns, failures, replication deltas)
//! ```
//!
//! # Example
//!
//! ```
//! use mobtick_sim::{Region, RegionConfig};
//! use mobtick_core::DVec3;
//! use mobtick_script::TypeTable;
//! use std::sync::Arc;
//!
//! let types = Arc::new(TypeTable::builtin().unwrap());
//! let mut region = Region::new(RegionConfig::with_seed(7), types);
//! let sheep = region.spawn("sheep", DVec3::ZERO).unwrap();
//!
//! let report = region.tick();
//! assert_eq!(report.active, 1);
//! assert!(region.entity(sheep).is_some());
//! ```

mod ageable;
mod cloud;
mod config;
mod context;
mod effect;
mod entity;
mod error;
mod living;
mod mob;
mod orb;
mod player;
mod region;
mod store;
mod world;

pub use ageable::{
    speed_up_seconds_when_feeding, AgeRecord, AgeStage, Ageable, AgeableGroupData,
    BABY_START_AGE, DEFAULT_BABY_CHANCE, FORCED_AGE_TIMER_TICKS,
};
pub use cloud::{
    AreaEffectCloud, AreaEffectSource, CloudKey, APPLICATION_INTERVAL, CLOUD_HEIGHT,
    DEFAULT_DURATION, DEFAULT_PARTICLE, DEFAULT_RADIUS, DEFAULT_REAPPLICATION_DELAY,
    DEFAULT_WAIT_TIME, INSTANT_PROXIMITY, MAX_RADIUS, MIN_RADIUS,
};
pub use config::{max_cores, RegionConfig, WorldConfig};
pub use context::{default_rng_factory, RngFactory, Spawner, TickContext};
pub use effect::{effect_kind, mix_colors, potion_effects, EffectInstance, DEFAULT_POTION_COLOR};
pub use entity::Entity;
pub use error::{Error, Result};
pub use living::{Living, LivingBody};
pub use mob::{Mob, MobKey, Seat};
pub use orb::{
    award, can_merge, decompose, experience_value, icon, ExpData, ExperienceOrb, ExperienceUnit,
    OrbKey, SpawnReason, FOLLOW_RANGE, LIFETIME, MERGE_BUCKETS, ORB_HEALTH, ORB_TYPE,
    SCAN_INTERVAL,
};
pub use player::{Collector, MendableItem, Player, PlayerKey, PICKUP_DELAY};
pub use region::{Region, TickReport};
pub use store::{EntityStore, SpatialQuery};
pub use world::World;
