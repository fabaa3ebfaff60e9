//! Narrow query contract between the frame renderer and the zone view model.
//!
//! Every shape is in model space (+Y down). Colors are premultiplied.

use crate::coords::{Rect, Vec2};
use crate::geom::{Join, Region};
use crate::grid::GridSpec;
use crate::paint::Color;

use super::overlay::{BarOverlay, TokenOverlay};

/// Zone layers that hold drawables and tokens.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ZoneLayer {
    /// Map art below the grid.
    Background,
    /// Walls, doors and props above the grid.
    Object,
    /// GM-only content.
    Hidden,
    /// Player tokens and their drawings.
    Token,
}

/// Pen for outlines; `width` is in screen pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f32,
    pub join: Join,
}

impl Stroke {
    pub fn new(color: Color, width: f32) -> Self {
        Self { color, width, join: Join::Pointy }
    }

    pub fn with_join(mut self, join: Join) -> Self {
        self.join = join;
        self
    }
}

/// A drawn shape: filled, outlined or both.
#[derive(Debug, Clone, PartialEq)]
pub struct Drawable {
    pub region: Region,
    pub fill: Option<Color>,
    pub stroke: Option<Stroke>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub footprint: Region,
    /// Layout box for overlays and bars.
    pub bounds: Rect,
    pub color: Color,
    pub halo: Option<Color>,
    pub overlay: Option<TokenOverlay>,
    pub bar: Option<BarOverlay>,
    /// Redrawn above the fog.
    pub always_visible: bool,
}

impl Token {
    /// A round token filling `bounds`.
    pub fn round(bounds: Rect, color: Color) -> Self {
        Self {
            footprint: Region::ellipse(bounds),
            bounds,
            color,
            halo: None,
            overlay: None,
            bar: None,
            always_visible: false,
        }
    }
}

/// Lit polygon of one light source.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub area: Region,
    pub color: Color,
}

/// Lit and darkened areas at one lumens intensity (negative values are magical darkness).
#[derive(Debug, Clone, PartialEq)]
pub struct LumensLevel {
    pub lumens: i32,
    pub lit: Region,
    pub dark: Region,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aura {
    pub area: Region,
    pub color: Color,
}

/// Fog of war: what has ever been seen and what is seen right now.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FogState {
    pub exposed: Region,
    pub visible: Region,
}

/// Map label; `position` is its centre.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub position: Vec2,
    pub text: String,
    pub background: Color,
    pub border: Color,
}

/// Vision or selection outline.
#[derive(Debug, Clone, PartialEq)]
pub struct Outline {
    pub points: Vec<Vec2>,
    pub closed: bool,
    pub stroke: Stroke,
}

/// What the frame renderer asks of the zone view model.
///
/// Queries are made every frame and in layer order; implementations may cache.
pub trait ZoneView {
    /// `false` while the model is loading or mid-update; the frame shows a placeholder.
    fn is_ready(&self) -> bool;

    fn is_gm_view(&self) -> bool;

    fn board_color(&self) -> Color;

    fn grid(&self) -> Option<GridSpec>;

    fn drawables(&self, layer: ZoneLayer) -> &[Drawable];

    fn tokens(&self, layer: ZoneLayer) -> &[Token];

    fn lights(&self) -> &[Light];

    fn lumens_levels(&self) -> &[LumensLevel];

    fn auras(&self) -> &[Aura];

    /// Area hidden from players by darkness, if any.
    fn player_darkness(&self) -> Option<&Region>;

    /// `None` when fog of war is off.
    fn fog(&self) -> Option<&FogState>;

    fn labels(&self) -> &[Label];

    fn overlays(&self) -> &[Outline];
}
