//! Token state overlays and bars, laid out inside the token's bounds.

use crate::coords::{Rect, Vec2};
use crate::geom::Join;
use crate::paint::Color;
use crate::render::{CompositeBackend, RegionRenderer};

/// Line width of stroked overlays, in screen pixels.
pub const TOKEN_OVERLAY_LINE_PX: f32 = 3.0;

/// Bar thickness relative to the shorter side of the token bounds.
pub const BAR_THICKNESS: f32 = 0.12;

/// Gap between bar segments relative to the segment pitch.
const SEGMENT_GAP: f32 = 0.15;

/// Marker drawn over a token to flag a state.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TokenOverlay {
    /// Both diagonals.
    X(Color),
    /// Vertical and horizontal centre lines.
    Cross(Color),
    /// Filled dot in the centre.
    Dot(Color),
    /// Diamond outline touching the edge midpoints.
    Diamond(Color),
    /// Upward triangle outline.
    Triangle(Color),
    /// The whole box tinted.
    Shade(Color),
}

impl TokenOverlay {
    pub fn color(&self) -> Color {
        match *self {
            TokenOverlay::X(c)
            | TokenOverlay::Cross(c)
            | TokenOverlay::Dot(c)
            | TokenOverlay::Diamond(c)
            | TokenOverlay::Triangle(c)
            | TokenOverlay::Shade(c) => c,
        }
    }

    pub fn draw(&self, backend: &mut impl CompositeBackend, regions: &mut RegionRenderer, bounds: Rect) {
        if bounds.is_empty() {
            return;
        }
        let min = bounds.min();
        let max = bounds.max();
        let c = bounds.center();

        regions.set_color(self.color());
        regions.set_join(Join::Pointy);
        regions.set_line_width_px(TOKEN_OVERLAY_LINE_PX);

        match *self {
            TokenOverlay::X(_) => {
                regions.draw_polyline(backend, &[min, max], false);
                regions.draw_polyline(backend, &[Vec2::new(max.x, min.y), Vec2::new(min.x, max.y)], false);
            }
            TokenOverlay::Cross(_) => {
                regions.draw_polyline(backend, &[Vec2::new(c.x, min.y), Vec2::new(c.x, max.y)], false);
                regions.draw_polyline(backend, &[Vec2::new(min.x, c.y), Vec2::new(max.x, c.y)], false);
            }
            TokenOverlay::Dot(_) => {
                let radius = bounds.width().min(bounds.height()) * 0.2;
                regions.fill_circle(backend, c, radius);
            }
            TokenOverlay::Diamond(_) => {
                let points = [
                    Vec2::new(c.x, min.y),
                    Vec2::new(max.x, c.y),
                    Vec2::new(c.x, max.y),
                    Vec2::new(min.x, c.y),
                ];
                regions.draw_polyline(backend, &points, true);
            }
            TokenOverlay::Triangle(_) => {
                let points = [Vec2::new(c.x, min.y), Vec2::new(max.x, max.y), Vec2::new(min.x, max.y)];
                regions.draw_polyline(backend, &points, true);
            }
            TokenOverlay::Shade(_) => regions.fill_rect(backend, bounds),
        }
    }
}

/// Edge of the token bounds a bar hugs.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum BarSide {
    Top,
    #[default]
    Bottom,
    Left,
    Right,
}

/// A 0–1 gauge drawn along one side of a token. Vertical bars fill bottom-up.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum BarOverlay {
    Single { value: f32, color: Color, side: BarSide },
    /// Filled part over a full-length background.
    TwoTone { value: f32, fill: Color, background: Color, side: BarSide },
    /// `segments` separate blocks, `round(value * segments)` of them drawn.
    Segmented { value: f32, segments: u16, color: Color, side: BarSide },
}

impl BarOverlay {
    pub fn side(&self) -> BarSide {
        match *self {
            BarOverlay::Single { side, .. }
            | BarOverlay::TwoTone { side, .. }
            | BarOverlay::Segmented { side, .. } => side,
        }
    }

    pub fn value(&self) -> f32 {
        let value = match *self {
            BarOverlay::Single { value, .. }
            | BarOverlay::TwoTone { value, .. }
            | BarOverlay::Segmented { value, .. } => value,
        };
        if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
    }

    /// Rectangles to fill, in draw order.
    pub fn layout(&self, bounds: Rect) -> Vec<(Rect, Color)> {
        let mut out = Vec::new();
        if bounds.is_empty() {
            return out;
        }
        let track = bar_track(bounds, self.side());
        let value = self.value();

        match *self {
            BarOverlay::Single { color, side, .. } => {
                if value > 0.0 {
                    out.push((bar_portion(track, side, 0.0, value), color));
                }
            }
            BarOverlay::TwoTone { fill, background, side, .. } => {
                out.push((track, background));
                if value > 0.0 {
                    out.push((bar_portion(track, side, 0.0, value), fill));
                }
            }
            BarOverlay::Segmented { segments, color, side, .. } => {
                if segments == 0 {
                    return out;
                }
                let n = segments as f32;
                let lit = (value * n).round() as u16;
                let pitch = 1.0 / n;
                let gap = pitch * SEGMENT_GAP * 0.5;
                for i in 0..lit {
                    let from = i as f32 * pitch + gap;
                    let to = (i + 1) as f32 * pitch - gap;
                    out.push((bar_portion(track, side, from, to), color));
                }
            }
        }
        out
    }

    pub fn draw(&self, backend: &mut impl CompositeBackend, regions: &mut RegionRenderer, bounds: Rect) {
        for (rect, color) in self.layout(bounds) {
            regions.set_color(color);
            regions.fill_rect(backend, rect);
        }
    }
}

fn bar_track(bounds: Rect, side: BarSide) -> Rect {
    let t = bounds.width().min(bounds.height()) * BAR_THICKNESS;
    let min = bounds.min();
    let max = bounds.max();
    match side {
        BarSide::Top => Rect::new(min.x, min.y, bounds.width(), t),
        BarSide::Bottom => Rect::new(min.x, max.y - t, bounds.width(), t),
        BarSide::Left => Rect::new(min.x, min.y, t, bounds.height()),
        BarSide::Right => Rect::new(max.x - t, min.y, t, bounds.height()),
    }
}

/// Slice `[from, to]` (fractions of the length) of a track.
fn bar_portion(track: Rect, side: BarSide, from: f32, to: f32) -> Rect {
    match side {
        BarSide::Top | BarSide::Bottom => {
            let w = track.width();
            Rect::new(track.origin.x + w * from, track.origin.y, w * (to - from), track.height())
        }
        BarSide::Left | BarSide::Right => {
            let h = track.height();
            let bottom = track.max().y;
            Rect::new(track.origin.x, bottom - h * to, track.width(), h * (to - from))
        }
    }
}
