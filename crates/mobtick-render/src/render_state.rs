//! Render state snapshots and the engine that rebuilds them
//!
//! The snapshot is what a renderer draws: a bundle of interpolators built from
//! the display's synchronized attributes. It is never mutated; whenever a
//! render-relevant attribute changes the engine builds a replacement at the
//! next tick boundary, so several writes within one step cost one rebuild.
//!
//! With an interpolation duration configured, a rebuild starts each
//! interpolator at the value the previous snapshot had materialized at the
//! last [`RenderStateEngine::progress`] call and ends it at the new attribute
//! value.

use crate::display::{DisplayKey, DisplayKind};
use crate::error::Result;
use crate::interpolation::{interpolation_progress, Interpolator, PackedColor};
use mobtick_core::{ChangeSet, SyncedStore, Transformation};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Keys whose change invalidates the snapshot
pub const RENDER_STATE_KEYS: &[DisplayKey] = &[
    DisplayKey::Translation,
    DisplayKey::Scale,
    DisplayKey::LeftRotation,
    DisplayKey::RightRotation,
    DisplayKey::Billboard,
    DisplayKey::BrightnessOverride,
    DisplayKey::ShadowRadius,
    DisplayKey::ShadowStrength,
    DisplayKey::GlowColorOverride,
    DisplayKey::BlockState,
    DisplayKey::ItemStack,
    DisplayKey::ItemContext,
    DisplayKey::Text,
    DisplayKey::LineWidth,
    DisplayKey::BackgroundColor,
    DisplayKey::TextOpacity,
    DisplayKey::StyleFlags,
];

/// Which axes of a display turn to face the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BillboardConstraints {
    #[default]
    Fixed,
    Vertical,
    Horizontal,
    Center,
}

impl BillboardConstraints {
    const ALL: [BillboardConstraints; 4] = [
        BillboardConstraints::Fixed,
        BillboardConstraints::Vertical,
        BillboardConstraints::Horizontal,
        BillboardConstraints::Center,
    ];

    /// Unknown ids fall back to `Fixed`
    pub fn from_id(id: i8) -> Self {
        usize::try_from(id)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .unwrap_or_default()
    }

    pub fn id(self) -> i8 {
        self as i8
    }

    pub fn name(self) -> &'static str {
        match self {
            BillboardConstraints::Fixed => "fixed",
            BillboardConstraints::Vertical => "vertical",
            BillboardConstraints::Horizontal => "horizontal",
            BillboardConstraints::Center => "center",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.name() == name)
    }
}

/// Light levels overriding the world's lighting for a display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Brightness {
    pub block: u8,
    pub sky: u8,
}

impl Brightness {
    pub const FULL_BRIGHT: Brightness = Brightness { block: 15, sky: 15 };

    /// Levels are clamped to `0..=15`
    pub fn new(block: u8, sky: u8) -> Self {
        Self {
            block: block.min(15),
            sky: sky.min(15),
        }
    }

    pub fn pack(self) -> i32 {
        (self.block as i32) << 4 | (self.sky as i32) << 20
    }

    pub fn unpack(packed: i32) -> Self {
        Self::new(
            ((packed >> 4) & 0xFFFF).min(15) as u8,
            ((packed >> 20) & 0xFFFF).min(15) as u8,
        )
    }
}

/// Horizontal alignment of text lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    Center,
    Left,
    Right,
}

/// Text style flag bits
pub mod text_flags {
    pub const SHADOW: u8 = 1;
    pub const SEE_THROUGH: u8 = 2;
    pub const DEFAULT_BACKGROUND: u8 = 4;
    pub const ALIGN_LEFT: u8 = 8;
    pub const ALIGN_RIGHT: u8 = 16;
}

/// Text display part of a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRenderState {
    pub text: String,
    pub line_width: i32,
    /// Unsigned opacity, 255 is opaque
    pub opacity: Interpolator<i32>,
    pub background: Interpolator<PackedColor>,
    pub flags: u8,
}

impl TextRenderState {
    pub fn has_shadow(&self) -> bool {
        self.flags & text_flags::SHADOW != 0
    }

    pub fn is_see_through(&self) -> bool {
        self.flags & text_flags::SEE_THROUGH != 0
    }

    pub fn uses_default_background(&self) -> bool {
        self.flags & text_flags::DEFAULT_BACKGROUND != 0
    }

    pub fn align(&self) -> TextAlign {
        align_from_flags(self.flags)
    }
}

pub(crate) fn align_from_flags(flags: u8) -> TextAlign {
    if flags & text_flags::ALIGN_LEFT != 0 {
        TextAlign::Left
    } else if flags & text_flags::ALIGN_RIGHT != 0 {
        TextAlign::Right
    } else {
        TextAlign::Center
    }
}

/// Kind-specific part of a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SubRenderState {
    Block { block_state: String },
    Item { item: String, context: i8 },
    Text(TextRenderState),
}

impl SubRenderState {
    fn build(
        store: &SyncedStore<DisplayKey>,
        kind: DisplayKind,
        previous: Option<(&SubRenderState, f32)>,
    ) -> Result<Self> {
        Ok(match kind {
            DisplayKind::Block => SubRenderState::Block {
                block_state: store.get_text(DisplayKey::BlockState)?.to_string(),
            },
            DisplayKind::Item => SubRenderState::Item {
                item: store.get_text(DisplayKey::ItemStack)?.to_string(),
                context: store.get_byte(DisplayKey::ItemContext)?,
            },
            DisplayKind::Text => {
                let opacity = store.get_byte(DisplayKey::TextOpacity)? as u8 as i32;
                let background = PackedColor(store.get_int(DisplayKey::BackgroundColor)?);
                let (opacity, background) = match previous {
                    Some((SubRenderState::Text(prev), progress)) => (
                        Interpolator::between(prev.opacity.get(progress), opacity),
                        Interpolator::between(prev.background.get(progress), background),
                    ),
                    _ => (
                        Interpolator::constant(opacity),
                        Interpolator::constant(background),
                    ),
                };
                SubRenderState::Text(TextRenderState {
                    text: store.get_text(DisplayKey::Text)?.to_string(),
                    line_width: store.get_int(DisplayKey::LineWidth)?,
                    opacity,
                    background,
                    flags: store.get_byte(DisplayKey::StyleFlags)? as u8,
                })
            }
        })
    }
}

/// Immutable client-visible snapshot of a display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderState {
    pub transformation: Interpolator<Transformation>,
    pub billboard: BillboardConstraints,
    /// Packed brightness, -1 when the world's lighting applies
    pub brightness_override: i32,
    pub shadow_radius: Interpolator<f32>,
    pub shadow_strength: Interpolator<f32>,
    /// Packed RGB, -1 when the team colour applies
    pub glow_color_override: i32,
    pub sub: SubRenderState,
}

impl RenderState {
    /// Build from current attributes, blending from `previous` when given
    pub fn build(
        store: &SyncedStore<DisplayKey>,
        kind: DisplayKind,
        previous: Option<(&RenderState, f32)>,
    ) -> Result<Self> {
        let transformation = Transformation::new(
            store.get_vector(DisplayKey::Translation)?,
            store.get_rotation(DisplayKey::LeftRotation)?,
            store.get_vector(DisplayKey::Scale)?,
            store.get_rotation(DisplayKey::RightRotation)?,
        );
        let shadow_radius = store.get_float(DisplayKey::ShadowRadius)?;
        let shadow_strength = store.get_float(DisplayKey::ShadowStrength)?;

        let (transformation, shadow_radius, shadow_strength) = match previous {
            Some((prev, progress)) => (
                Interpolator::between(prev.transformation.get(progress), transformation),
                Interpolator::between(prev.shadow_radius.get(progress), shadow_radius),
                Interpolator::between(prev.shadow_strength.get(progress), shadow_strength),
            ),
            None => (
                Interpolator::constant(transformation),
                Interpolator::constant(shadow_radius),
                Interpolator::constant(shadow_strength),
            ),
        };

        Ok(RenderState {
            transformation,
            billboard: BillboardConstraints::from_id(store.get_byte(DisplayKey::Billboard)?),
            brightness_override: store.get_int(DisplayKey::BrightnessOverride)?,
            shadow_radius,
            shadow_strength,
            glow_color_override: store.get_int(DisplayKey::GlowColorOverride)?,
            sub: SubRenderState::build(
                store,
                kind,
                previous.map(|(prev, progress)| (&prev.sub, progress)),
            )?,
        })
    }

    pub fn brightness(&self) -> Option<Brightness> {
        (self.brightness_override != -1).then(|| Brightness::unpack(self.brightness_override))
    }
}

/// Engine phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPhase {
    /// No interpolation window is open
    Fresh,
    /// Inside an interpolation window
    Interpolating,
}

/// Rebuilds a display's [`RenderState`] at tick boundaries
#[derive(Debug, Clone)]
pub struct RenderStateEngine {
    interpolation_start: i32,
    interpolation_duration: i32,
    last_progress: f32,
    update_start_tick: bool,
    update_duration: bool,
    update_render_state: bool,
    state: Option<RenderState>,
}

impl RenderStateEngine {
    pub fn new() -> Self {
        Self {
            interpolation_start: i32::MIN,
            interpolation_duration: 0,
            last_progress: 1.0,
            update_start_tick: false,
            update_duration: true,
            update_render_state: true,
            state: None,
        }
    }

    /// Record which pending updates a batch of attribute changes requires
    pub fn observe(&mut self, changes: &ChangeSet<DisplayKey>) {
        if changes.contains(DisplayKey::InterpolationStartDelta) {
            self.update_start_tick = true;
        }
        if changes.contains(DisplayKey::InterpolationDuration) {
            self.update_duration = true;
        }
        if changes.any(RENDER_STATE_KEYS) {
            self.update_render_state = true;
        }
    }

    /// Apply pending updates; call once per tick after `observe`
    pub fn update(
        &mut self,
        tick_count: i32,
        store: &SyncedStore<DisplayKey>,
        kind: DisplayKind,
    ) -> Result<()> {
        if self.update_start_tick {
            self.update_start_tick = false;
            let delay = store.get_int(DisplayKey::InterpolationStartDelta)?;
            self.interpolation_start = tick_count.saturating_add(delay);
        }
        if self.update_duration {
            self.update_duration = false;
            self.interpolation_duration = store.get_int(DisplayKey::InterpolationDuration)?;
        }
        if self.update_render_state {
            self.update_render_state = false;
            let previous = if self.interpolation_duration != 0 {
                // start from what was last drawn, not from the tick boundary
                self.state.as_ref().map(|state| (state, self.last_progress))
            } else {
                None
            };
            let next = RenderState::build(store, kind, previous)?;
            trace!(
                tick_count,
                start = self.interpolation_start,
                duration = self.interpolation_duration,
                "render state rebuilt"
            );
            self.state = Some(next);
        }
        Ok(())
    }

    /// Progress through the current window at a sub-tick instant
    pub fn progress(&mut self, tick_count: i32, partial: f32) -> f32 {
        let progress = interpolation_progress(
            tick_count as i64 - self.interpolation_start as i64,
            partial,
            self.interpolation_duration,
        );
        self.last_progress = progress;
        progress
    }

    /// Progress most recently computed by [`progress`](Self::progress)
    pub fn last_progress(&self) -> f32 {
        self.last_progress
    }

    pub fn phase(&self, tick_count: i32) -> RenderPhase {
        let progress = interpolation_progress(
            tick_count as i64 - self.interpolation_start as i64,
            0.0,
            self.interpolation_duration,
        );
        if self.interpolation_duration > 0 && progress < 1.0 {
            RenderPhase::Interpolating
        } else {
            RenderPhase::Fresh
        }
    }

    pub fn state(&self) -> Option<&RenderState> {
        self.state.as_ref()
    }

    pub fn interpolation_start(&self) -> i32 {
        self.interpolation_start
    }

    pub fn interpolation_duration(&self) -> i32 {
        self.interpolation_duration
    }

    pub fn needs_rebuild(&self) -> bool {
        self.update_render_state
    }
}

impl Default for RenderStateEngine {
    fn default() -> Self {
        Self::new()
    }
}
