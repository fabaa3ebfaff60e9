//! Compositing subsystem.
//!
//! Region meshes and off-screen targets meet here. Everything above this module
//! talks to [`CompositeBackend`]; the wgpu and CPU implementations live below it.
//!
//! Convention:
//! - meshes arrive in render space (+Y up) and are mapped to pixels by the bound [`Projection`](crate::coords::Projection)
//! - every attachment stores linear premultiplied RGBA

mod backend;
mod blend;
mod compositor;
mod ctx;
mod error;
mod gpu;
mod region;
mod software;

pub use backend::{Attachment, CompositeBackend, TargetId};
pub use blend::{BlendFactor, BlendFunction, BlendShader};
pub use compositor::{Compositor, LayerTargets};
pub use ctx::{RenderCtx, RenderTarget};
pub use error::RenderError;
pub use gpu::{GpuBackend, OFFSCREEN_FORMAT};
pub use region::RegionRenderer;
pub use software::SoftwareBackend;
