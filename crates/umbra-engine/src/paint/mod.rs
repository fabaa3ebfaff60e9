//! Paint model shared between the geometry consumers and the backends.
//!
//! Colors are linear premultiplied RGBA; every render target stores them that way.

pub mod color;

pub use color::{opacity_to_f32, Color};
