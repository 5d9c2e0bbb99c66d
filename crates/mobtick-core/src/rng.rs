//! Deterministic per-entity random sources
//!
//! Every entity owns its own `RandomSource`, seeded from the region seed and
//! the entity id, so a region replays identically for the same seed no matter
//! how many other regions run alongside it.

use crate::EntityId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A swappable source of randomness for simulation logic
///
/// Only `next_u64` is required; the derived draws follow the conventions the
/// simulation code relies on (bounded ints, unit floats).
pub trait RandomSource: Send + fmt::Debug {
    /// Next raw 64-bit value
    fn next_u64(&mut self) -> u64;

    /// Uniform int in `[0, bound)`; 0 when `bound <= 0`
    fn next_int(&mut self, bound: i32) -> i32 {
        if bound <= 0 {
            return 0;
        }
        ((self.next_u64() >> 32) % bound as u64) as i32
    }

    /// Uniform float in `[0, 1)`
    fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    /// Uniform double in `[0, 1)`
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn next_bool(&mut self) -> bool {
        self.next_u64() & 1 == 1
    }
}

/// xorshift64 generator, the default random source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRng {
    state: u64,
}

impl GameRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u64) -> Self {
        // xorshift never leaves the zero state
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Seed for one entity of a region
    pub fn for_entity(region_seed: u64, id: EntityId) -> Self {
        Self::new(derive_seed(region_seed, id.raw()))
    }

    /// Current state, for save/restore
    pub fn state(&self) -> u64 {
        self.state
    }

    /// Pick a random element from a slice
    pub fn pick<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        if slice.is_empty() {
            None
        } else {
            let i = (self.next_u64() as usize) % slice.len();
            Some(&slice[i])
        }
    }
}

impl RandomSource for GameRng {
    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::new(12345)
    }
}

/// Mix a base seed with a salt (splitmix64 finalizer)
pub fn derive_seed(base: u64, salt: u64) -> u64 {
    let mut z = base ^ salt.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
