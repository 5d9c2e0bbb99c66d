//! Geometry and blending helpers shared by simulation and rendering

pub use glam::{DVec3, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in world space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Box of the given full extents centred on `center`
    pub fn of_size(center: DVec3, x: f64, y: f64, z: f64) -> Self {
        let half = DVec3::new(x, y, z) * 0.5;
        Self::new(center - half, center + half)
    }

    /// Entity box: `width` across x/z centred on `pos`, `height` upward from its feet
    pub fn from_dimensions(pos: DVec3, width: f32, height: f32) -> Self {
        let w = width as f64 / 2.0;
        Self::new(
            DVec3::new(pos.x - w, pos.y, pos.z - w),
            DVec3::new(pos.x + w, pos.y + height as f64, pos.z + w),
        )
    }

    /// Grow the box by `amount` on every side
    pub fn inflate(&self, amount: f64) -> Self {
        Self::new(self.min - DVec3::splat(amount), self.max + DVec3::splat(amount))
    }

    /// Overlap test; touching faces do not intersect
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }

    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }
}

/// Affine display transformation: translate, rotate, scale, rotate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transformation {
    pub translation: Vec3,
    pub left_rotation: Quat,
    pub scale: Vec3,
    pub right_rotation: Quat,
}

impl Transformation {
    pub const IDENTITY: Transformation = Transformation {
        translation: Vec3::ZERO,
        left_rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
        right_rotation: Quat::IDENTITY,
    };

    pub fn new(translation: Vec3, left_rotation: Quat, scale: Vec3, right_rotation: Quat) -> Self {
        Self {
            translation,
            left_rotation,
            scale,
            right_rotation,
        }
    }

    /// Blend towards `target`; rotations take the shortest arc, vectors blend linearly
    pub fn slerp(&self, target: &Transformation, t: f32) -> Transformation {
        Transformation {
            translation: self.translation.lerp(target.translation, t),
            left_rotation: self.left_rotation.slerp(target.left_rotation, t),
            scale: self.scale.lerp(target.scale, t),
            right_rotation: self.right_rotation.slerp(target.right_rotation, t),
        }
    }
}

impl Default for Transformation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

pub fn lerp(t: f32, start: f32, end: f32) -> f32 {
    start + t * (end - start)
}

pub fn lerp_f64(t: f64, start: f64, end: f64) -> f64 {
    start + t * (end - start)
}

/// Integer blend, rounding the step toward negative infinity
pub fn lerp_int(t: f32, start: i32, end: i32) -> i32 {
    let span = i64::from(end) - i64::from(start);
    let step = (f64::from(t) * span as f64).floor() as i64;
    (i64::from(start) + step).clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Per-channel blend of two packed ARGB colours
pub fn lerp_argb(t: f32, start: i32, end: i32) -> i32 {
    let channel = |c: i32, shift: u32| (c >> shift) & 0xFF;
    let blend = |shift: u32| lerp_int(t, channel(start, shift), channel(end, shift)) as u32 & 0xFF;
    ((blend(24) << 24) | (blend(16) << 16) | (blend(8) << 8) | blend(0)) as i32
}

/// Wrap an angle in degrees into `[-180, 180)`
pub fn wrap_degrees(angle: f64) -> f64 {
    let mut wrapped = angle % 360.0;
    if wrapped >= 180.0 {
        wrapped -= 360.0;
    }
    if wrapped < -180.0 {
        wrapped += 360.0;
    }
    wrapped
}

/// Step `from` toward `to` by fraction `t` along the shortest arc
pub fn rotlerp(t: f64, from: f64, to: f64) -> f64 {
    from + t * wrap_degrees(to - from)
}
