use thiserror::Error;

use super::backend::TargetId;

/// Failures surfaced by render backends and the compositor.
///
/// Malformed geometry is never an error; only resource and pipeline problems are.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RenderError {
    #[error("failed to allocate {width}x{height} render target: {reason}")]
    TargetAllocation { width: u32, height: u32, reason: String },

    #[error("shader `{label}` failed to compile: {message}")]
    ShaderCompilation { label: String, message: String },

    #[error("render target {0:?} does not exist")]
    UnknownTarget(TargetId),

    #[error("render target {0:?} cannot be sampled while it is bound")]
    TargetFeedback(TargetId),

    #[error("compositor has no render targets (resize has not succeeded yet)")]
    NoTargets,

    #[error("viewport {width}x{height} has no pixels")]
    EmptyViewport { width: u32, height: u32 },
}
