//! Grid overlay: lattice geometry, the per-cell shape cache and the line renderer.

mod renderer;
mod shape;

pub use renderer::{GridRenderer, MAX_VISIBLE_CELLS};
pub use shape::{GridCacheKey, GridKind, GridShapeCache, GridSpec};
