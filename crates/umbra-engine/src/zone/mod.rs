//! Zone frame rendering: the view-model contract, preferences, token overlays
//! and the per-frame layer sequence.

mod overlay;
mod prefs;
mod renderer;
mod view;

pub use overlay::{BarOverlay, BarSide, TokenOverlay, BAR_THICKNESS, TOKEN_OVERLAY_LINE_PX};
pub use prefs::{LightingStyle, RenderPrefs};
pub use renderer::{FrameLayer, FrameOutcome, ZoneRenderer, FRAME_LAYER_ORDER};
pub use view::{Aura, Drawable, FogState, Label, Light, LumensLevel, Outline, Stroke, Token, ZoneLayer, ZoneView};
