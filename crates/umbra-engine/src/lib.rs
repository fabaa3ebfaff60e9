//! Umbra engine: vector region rendering and layered compositing for tabletop zones.
//!
//! Geometry (`geom`) turns regions into triangle meshes, `render` composites
//! them through off-screen targets on a [`render::CompositeBackend`], and `zone`
//! sequences a zone's layers into a frame. `device`, `window` and `core` host
//! it in a winit window on wgpu.

pub mod coords;
pub mod geom;
pub mod grid;
pub mod paint;
pub mod render;
pub mod zone;

pub mod core;
pub mod device;
pub mod logging;
pub mod window;
