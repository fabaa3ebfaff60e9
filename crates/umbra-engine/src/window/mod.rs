//! winit event loop and window ownership.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
