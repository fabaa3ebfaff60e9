//! Coordinate and geometry types shared across the geometry and render layers.
//!
//! Three spaces are in play:
//! - model space: the map's own coordinates, +Y down
//! - render space: model space with Y negated (+Y up); every mesh lives here
//! - screen space: physical pixels, origin top-left, +Y down
//!
//! [`Projection`] is the only render → screen mapping backends consume.

mod camera;
mod rect;
mod vec2;
mod viewport;

pub use camera::{Projection, ZoneCamera};
pub use rect::Rect;
pub use vec2::Vec2;
pub use viewport::Viewport;
