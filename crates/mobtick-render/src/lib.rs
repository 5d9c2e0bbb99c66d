//! Mobtick Render - client-visible state decoupled from simulation state
//!
//! This crate turns synchronized display attributes into render snapshots:
//!
//! - **Interpolators**: constant, linear, per-channel colour and spherical
//!   blends (`Interpolator`, `Lerp`)
//! - **Render state engine**: rebuilds an immutable `RenderState` at tick
//!   boundaries, interpolating from the previously materialized snapshot
//! - **Position/rotation targets**: smoothed teleports over N ticks
//! - **Display entities**: block, item and text displays
//!
//! # Data flow
//!
//! ```text
//! setter ─▶ SyncedStore ─▶ ChangeSet ─▶ RenderStateEngine ─▶ RenderState ─▶ renderer
//!                 │
//!                 └─▶ pack_dirty ─▶ network ─▶ assign_values (client copy)
//! ```

mod display;
mod error;
mod interpolation;
mod pos_rot;
mod render_state;

pub use display::{
    define_display_keys, DisplayEntity, DisplayKey, DisplayKind, Displayable,
    DEFAULT_BACKGROUND, DEFAULT_LINE_WIDTH, ITEM_CONTEXTS,
};
pub use error::{Error, Result};
pub use interpolation::{interpolation_progress, Interpolator, Lerp, PackedColor};
pub use pos_rot::{PosRotInterpolationTarget, MAX_POS_ROT_STEPS};
pub use render_state::{
    text_flags, BillboardConstraints, Brightness, RenderPhase, RenderState, RenderStateEngine,
    SubRenderState, TextAlign, TextRenderState, RENDER_STATE_KEYS,
};
