//! Fixed-step simulation time
//!
//! - `Tick` - region clock tick number
//! - `TickMode` - full or reduced-fidelity update for one entity
//! - `Clock` - region clock

use serde::{Deserialize, Serialize};

/// A discrete tick number (region clock)
pub type Tick = u64;

/// Simulation steps per wall-clock second
pub const TICKS_PER_SECOND: i32 = 20;

/// Convert whole seconds to ticks
pub fn seconds_to_ticks(seconds: i32) -> i32 {
    seconds.saturating_mul(TICKS_PER_SECOND)
}

/// How an entity is updated in the current step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TickMode {
    /// Full update
    #[default]
    Active,
    /// Reduced-fidelity update for entities outside the activation range
    Inactive,
}

impl TickMode {
    pub fn is_active(&self) -> bool {
        matches!(self, TickMode::Active)
    }
}

/// Region clock
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Clock {
    /// Current tick number
    pub tick: Tick,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance to the next tick
    pub fn advance(&mut self) -> Tick {
        self.tick += 1;
        self.tick
    }

    /// Elapsed simulated time in seconds
    pub fn elapsed_seconds(&self) -> f64 {
        self.tick as f64 / TICKS_PER_SECOND as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock() {
        let mut clock = Clock::new();
        assert_eq!(clock.tick, 0);
        assert_eq!(clock.advance(), 1);
        for _ in 0..19 {
            clock.advance();
        }
        assert_eq!(clock.elapsed_seconds(), 1.0);
    }

    #[test]
    fn test_seconds_to_ticks_saturates() {
        assert_eq!(seconds_to_ticks(3), 60);
        assert_eq!(seconds_to_ticks(i32::MAX), i32::MAX);
    }

    #[test]
    fn test_tick_mode_default_is_active() {
        assert!(TickMode::default().is_active());
        assert!(!TickMode::Inactive.is_active());
    }
}
