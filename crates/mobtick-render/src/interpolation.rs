//! Interpolator primitives
//!
//! A render snapshot stores each animatable field as an [`Interpolator`]:
//! either a constant, or a pair of endpoints blended by a progress value in
//! `[0, 1]`. How a type blends is defined by [`Lerp`].

use mobtick_core::math::{lerp, lerp_argb, lerp_int};
use mobtick_core::Transformation;
use serde::{Deserialize, Serialize};

/// Blend between two values of the same type
pub trait Lerp: Clone {
    /// Value at `t` of the way from `self` to `end`
    fn lerp(&self, end: &Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(&self, end: &Self, t: f32) -> Self {
        lerp(t, *self, *end)
    }
}

impl Lerp for i32 {
    fn lerp(&self, end: &Self, t: f32) -> Self {
        lerp_int(t, *self, *end)
    }
}

impl Lerp for Transformation {
    fn lerp(&self, end: &Self, t: f32) -> Self {
        self.slerp(end, t)
    }
}

/// Packed 32-bit ARGB colour, blended channel by channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackedColor(pub i32);

impl Lerp for PackedColor {
    fn lerp(&self, end: &Self, t: f32) -> Self {
        PackedColor(lerp_argb(t, self.0, end.0))
    }
}

/// A constant or a blend between a previous and a current value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Interpolator<T> {
    Constant(T),
    Between { previous: T, current: T },
}

impl<T: Lerp> Interpolator<T> {
    pub fn constant(value: T) -> Self {
        Interpolator::Constant(value)
    }

    pub fn between(previous: T, current: T) -> Self {
        Interpolator::Between { previous, current }
    }

    /// Materialize at `progress`; the current endpoint once progress reaches 1
    pub fn get(&self, progress: f32) -> T {
        match self {
            Interpolator::Constant(value) => value.clone(),
            Interpolator::Between { current, .. } if progress >= 1.0 => current.clone(),
            Interpolator::Between { previous, current } => previous.lerp(current, progress),
        }
    }

    /// The value the interpolator settles on
    pub fn target(&self) -> &T {
        match self {
            Interpolator::Constant(value) => value,
            Interpolator::Between { current, .. } => current,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Interpolator::Constant(_))
    }
}

/// Progress through an interpolation window
///
/// `elapsed` is whole ticks since the window started and `partial` the
/// sub-tick fraction. A non-positive duration means no interpolation.
pub fn interpolation_progress(elapsed: i64, partial: f32, duration: i32) -> f32 {
    if duration <= 0 {
        return 1.0;
    }
    ((elapsed as f32 + partial) / duration as f32).clamp(0.0, 1.0)
}
