use crate::coords::{Projection, Viewport};
use crate::geom::Mesh;
use crate::paint::Color;

use super::blend::{BlendFunction, BlendShader};
use super::error::RenderError;

/// Handle of an off-screen render target owned by a backend.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TargetId(pub u32);

/// Where draw calls currently land.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum Attachment {
    /// The frame that is eventually presented.
    #[default]
    Screen,
    Target(TargetId),
}

/// The active batched polygon renderer.
///
/// The compositor and region renderer only talk to this trait. Implementations may
/// batch freely between state changes, but draws must reach the bound attachment in
/// submission order, and state (binding, blend, projection) is sampled at draw time.
pub trait CompositeBackend {
    /// Allocates a transparent `width`×`height` target in the premultiplied working format.
    fn create_target(&mut self, width: u32, height: u32) -> Result<TargetId, RenderError>;

    /// Frees a target. Unknown ids are ignored.
    fn release_target(&mut self, id: TargetId);

    fn target_size(&self, id: TargetId) -> Option<Viewport>;

    /// Size of the presented frame.
    fn screen_size(&self) -> Viewport;

    fn bind(&mut self, attachment: Attachment) -> Result<(), RenderError>;

    fn bound(&self) -> Attachment;

    /// Overwrites every pixel of the bound attachment, ignoring the blend state.
    fn clear(&mut self, color: Color);

    fn blend_function(&self) -> BlendFunction;

    fn set_blend_function(&mut self, blend: BlendFunction);

    /// Render space → pixels of the bound attachment for subsequent mesh fills.
    fn set_projection(&mut self, projection: Projection);

    fn projection(&self) -> Projection;

    /// Fills every triangle of `mesh` with the premultiplied `color`.
    fn fill_mesh(&mut self, mesh: &Mesh, color: Color);

    /// Draws `source` over the whole bound attachment, pixel for pixel, scaled by `opacity`.
    fn draw_target(&mut self, source: TargetId, opacity: f32) -> Result<(), RenderError>;

    /// Like [`draw_target`](Self::draw_target) but the written value is
    /// `shader(source, accumulated)`; the result still goes through the active blend.
    fn draw_target_shaded(
        &mut self,
        source: TargetId,
        accumulated: TargetId,
        shader: BlendShader,
    ) -> Result<(), RenderError>;

    /// Pushes batched work out to the attachments.
    fn flush(&mut self);
}
