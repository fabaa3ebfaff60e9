/// One acquired swapchain image with its encoder.
///
/// Presentation happens when the surface texture is dropped after submission,
/// so hold it only for the duration of a frame.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
