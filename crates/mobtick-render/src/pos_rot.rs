//! Smoothed position/rotation changes over a fixed number of ticks

use mobtick_core::math::{lerp_f64, rotlerp};
use mobtick_core::{DVec3, EntityBase};
use serde::{Deserialize, Serialize};

/// Longest allowed position/rotation interpolation, in ticks
pub const MAX_POS_ROT_STEPS: i32 = 59;

/// A pending move toward a target position and rotation
///
/// Independent of the render snapshot's interpolation window: it moves the
/// entity itself, one linear step per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosRotInterpolationTarget {
    steps: i32,
    target: DVec3,
    y_rot: f64,
    x_rot: f64,
}

impl PosRotInterpolationTarget {
    /// `steps` is clamped to `0..=MAX_POS_ROT_STEPS`
    pub fn new(steps: i32, target: DVec3, y_rot: f32, x_rot: f32) -> Self {
        Self {
            steps: steps.clamp(0, MAX_POS_ROT_STEPS),
            target,
            y_rot: y_rot as f64,
            x_rot: x_rot as f64,
        }
    }

    pub fn steps(&self) -> i32 {
        self.steps
    }

    pub fn target(&self) -> DVec3 {
        self.target
    }

    /// Advance one tick; returns true once the target has been reached
    pub fn step(&mut self, entity: &mut EntityBase) -> bool {
        if self.steps == 0 {
            entity.pos = self.target;
            entity.y_rot = self.y_rot as f32;
            entity.x_rot = self.x_rot as f32;
            entity.old_pos = entity.pos;
            return true;
        }

        let t = 1.0 / self.steps as f64;
        entity.pos = DVec3::new(
            lerp_f64(t, entity.pos.x, self.target.x),
            lerp_f64(t, entity.pos.y, self.target.y),
            lerp_f64(t, entity.pos.z, self.target.z),
        );
        entity.y_rot = rotlerp(t, entity.y_rot as f64, self.y_rot) as f32;
        entity.x_rot = lerp_f64(t, entity.x_rot as f64, self.x_rot) as f32;
        self.steps -= 1;
        self.steps == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mobtick_core::{EntityId, GameRng};
    use uuid::Uuid;

    fn entity() -> EntityBase {
        EntityBase::new(
            EntityId(1),
            Uuid::new_v4(),
            "text_display",
            0.0,
            0.0,
            Box::new(GameRng::new(1)),
        )
    }

    #[test]
    fn test_zero_steps_snaps() {
        let mut e = entity();
        let mut target = PosRotInterpolationTarget::new(0, DVec3::new(4.0, 5.0, 6.0), 90.0, 10.0);
        assert!(target.step(&mut e));
        assert_eq!(e.pos, DVec3::new(4.0, 5.0, 6.0));
        assert_eq!(e.old_pos, e.pos);
        assert_eq!(e.y_rot, 90.0);
    }

    #[test]
    fn test_linear_steps_reach_target() {
        let mut e = entity();
        let mut target = PosRotInterpolationTarget::new(4, DVec3::new(8.0, 0.0, 0.0), 0.0, 0.0);
        assert!(!target.step(&mut e));
        assert_eq!(e.pos.x, 2.0);
        assert!(!target.step(&mut e));
        assert!(!target.step(&mut e));
        assert!(target.step(&mut e));
        assert_eq!(e.pos.x, 8.0);
        assert_eq!(target.steps(), 0);
    }

    #[test]
    fn test_steps_clamped() {
        let target = PosRotInterpolationTarget::new(500, DVec3::ZERO, 0.0, 0.0);
        assert_eq!(target.steps(), MAX_POS_ROT_STEPS);
        assert_eq!(PosRotInterpolationTarget::new(-3, DVec3::ZERO, 0.0, 0.0).steps(), 0);
    }
}
