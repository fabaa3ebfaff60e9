//! wgpu backend: pipelines per blend state, off-screen textures, batched fills.

mod backend;
mod common;
mod pipelines;

pub use backend::{GpuBackend, OFFSCREEN_FORMAT};
