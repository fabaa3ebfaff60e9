use wgpu::util::DeviceExt;

use crate::coords::{Projection, Viewport};
use crate::geom::Mesh;
use crate::paint::Color;
use crate::render::backend::{Attachment, CompositeBackend, TargetId};
use crate::render::blend::{BlendFunction, BlendShader};
use crate::render::error::RenderError;

use super::common::{begin_pass, BlitParams, MeshVertex};
use super::pipelines::{PipelineKind, Pipelines};

/// Format of every off-screen target: linear, premultiplied.
pub const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

struct GpuTarget {
    // Kept alive for the view.
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: Viewport,
}

/// wgpu implementation of [`CompositeBackend`].
///
/// Triangles are batched until the attachment or blend state changes; target
/// draws and clears are encoded in order on a private encoder that is submitted
/// by [`flush`](CompositeBackend::flush). The screen attachment is the surface
/// view handed in by [`begin_frame`](Self::begin_frame).
pub struct GpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,

    screen: Option<wgpu::TextureView>,
    screen_size: Viewport,
    targets: Vec<Option<GpuTarget>>,
    pipelines: Pipelines,

    bound: Attachment,
    blend: BlendFunction,
    projection: Projection,

    batch: Vec<MeshVertex>,
    pending_clear: Option<[f32; 4]>,
    encoder: Option<wgpu::CommandEncoder>,

    warned_missing_screen: bool,
}

/// View and format of `attachment`, if it exists.
fn attachment_view<'a>(
    attachment: Attachment,
    screen: &'a Option<wgpu::TextureView>,
    surface_format: wgpu::TextureFormat,
    targets: &'a [Option<GpuTarget>],
) -> Option<(&'a wgpu::TextureView, wgpu::TextureFormat)> {
    match attachment {
        Attachment::Screen => screen.as_ref().map(|v| (v, surface_format)),
        Attachment::Target(id) => targets
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .map(|t| (&t.view, OFFSCREEN_FORMAT)),
    }
}

impl GpuBackend {
    /// Compiles the shader set. Fails if any shader does not compile.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
    ) -> Result<Self, RenderError> {
        let pipelines = Pipelines::new(device)?;
        log::info!("GpuBackend: shaders compiled (surface format {surface_format:?})");
        Ok(Self {
            device: device.clone(),
            queue: queue.clone(),
            surface_format,
            screen: None,
            screen_size: Viewport::default(),
            targets: Vec::new(),
            pipelines,
            bound: Attachment::Screen,
            blend: BlendFunction::default(),
            projection: Projection::screen(),
            batch: Vec::new(),
            pending_clear: None,
            encoder: None,
            warned_missing_screen: false,
        })
    }

    /// Installs the acquired surface view as the screen attachment for this frame.
    pub fn begin_frame(&mut self, screen: &wgpu::TextureView, size: Viewport) {
        self.screen = Some(screen.clone());
        self.screen_size = size;
    }

    /// Submits pending work and drops the surface view so the frame can present.
    pub fn end_frame(&mut self) {
        self.flush();
        self.screen = None;
        self.bound = Attachment::Screen;
    }

    fn bound_size(&self) -> Viewport {
        match self.bound {
            Attachment::Screen => self.screen_size,
            Attachment::Target(id) => self.target_size(id).unwrap_or_default(),
        }
    }

    fn encoder(&mut self) -> &mut wgpu::CommandEncoder {
        let device = &self.device;
        self.encoder.get_or_insert_with(|| {
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("umbra composite encoder"),
            })
        })
    }

    /// Encodes batched triangles (and any pending clear) into the bound attachment.
    fn flush_batch(&mut self) {
        if self.batch.is_empty() {
            return;
        }
        self.encoder();
        let Some(encoder) = self.encoder.as_mut() else { return };

        let Some((view, format)) =
            attachment_view(self.bound, &self.screen, self.surface_format, &self.targets)
        else {
            if !self.warned_missing_screen {
                log::debug!("GpuBackend: draw without an attachment view; dropped");
                self.warned_missing_screen = true;
            }
            self.batch.clear();
            return;
        };

        let vbo = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("umbra mesh vbo"),
            contents: bytemuck::cast_slice(&self.batch),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let pipeline = self.pipelines.get(&self.device, PipelineKind::Mesh, self.blend, format);

        let mut rpass = begin_pass(encoder, view, self.pending_clear.take(), "umbra mesh pass");
        rpass.set_pipeline(pipeline);
        rpass.set_vertex_buffer(0, vbo.slice(..));
        rpass.draw(0..self.batch.len() as u32, 0..1);
        drop(rpass);

        self.batch.clear();
    }

    /// Encodes a clear-only pass if a clear is still waiting for its first draw.
    fn resolve_clear(&mut self) {
        let Some(clear) = self.pending_clear.take() else { return };
        self.encoder();
        let Some(encoder) = self.encoder.as_mut() else { return };
        if let Some((view, _)) = attachment_view(self.bound, &self.screen, self.surface_format, &self.targets) {
            drop(begin_pass(encoder, view, Some(clear), "umbra clear pass"));
        }
    }

    fn check_source(&self, source: TargetId) -> Result<(), RenderError> {
        if self.bound == Attachment::Target(source) {
            return Err(RenderError::TargetFeedback(source));
        }
        if self.target_size(source).is_none() {
            return Err(RenderError::UnknownTarget(source));
        }
        Ok(())
    }

    fn source_view(&self, source: TargetId) -> Result<&wgpu::TextureView, RenderError> {
        self.targets
            .get(source.0 as usize)
            .and_then(Option::as_ref)
            .map(|t| &t.view)
            .ok_or(RenderError::UnknownTarget(source))
    }

    /// Encodes one fullscreen-triangle pass with `bind_group` into the bound attachment.
    fn draw_fullscreen(&mut self, kind: PipelineKind, bind_group: &wgpu::BindGroup) {
        self.encoder();
        let Some(encoder) = self.encoder.as_mut() else { return };
        let Some((view, format)) =
            attachment_view(self.bound, &self.screen, self.surface_format, &self.targets)
        else {
            return;
        };
        let pipeline = self.pipelines.get(&self.device, kind, self.blend, format);

        let mut rpass = begin_pass(encoder, view, self.pending_clear.take(), "umbra composite pass");
        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.draw(0..3, 0..1);
    }
}

impl CompositeBackend for GpuBackend {
    fn create_target(&mut self, width: u32, height: u32) -> Result<TargetId, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::EmptyViewport { width, height });
        }
        let max = self.device.limits().max_texture_dimension_2d;
        if width > max || height > max {
            return Err(RenderError::TargetAllocation {
                width,
                height,
                reason: format!("exceeds device limit of {max}px"),
            });
        }

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("umbra layer target"),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OFFSCREEN_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let target = GpuTarget { _texture: texture, view, size: Viewport::new(width, height) };

        let index = match self.targets.iter().position(Option::is_none) {
            Some(free) => {
                self.targets[free] = Some(target);
                free
            }
            None => {
                self.targets.push(Some(target));
                self.targets.len() - 1
            }
        };
        let id = TargetId(index as u32);

        // New textures start with undefined contents.
        let previous = self.bound;
        self.flush_batch();
        self.resolve_clear();
        self.bound = Attachment::Target(id);
        self.pending_clear = Some(Color::transparent().to_array());
        self.resolve_clear();
        self.bound = previous;

        log::debug!("GpuBackend: created target {id:?} ({width}x{height})");
        Ok(id)
    }

    fn release_target(&mut self, id: TargetId) {
        // Queued commands may still reference the texture.
        self.flush();
        if let Some(slot) = self.targets.get_mut(id.0 as usize) {
            *slot = None;
        }
        if self.bound == Attachment::Target(id) {
            self.bound = Attachment::Screen;
        }
    }

    fn target_size(&self, id: TargetId) -> Option<Viewport> {
        self.targets.get(id.0 as usize).and_then(Option::as_ref).map(|t| t.size)
    }

    fn screen_size(&self) -> Viewport {
        self.screen_size
    }

    fn bind(&mut self, attachment: Attachment) -> Result<(), RenderError> {
        if let Attachment::Target(id) = attachment {
            if self.target_size(id).is_none() {
                return Err(RenderError::UnknownTarget(id));
            }
        }
        if attachment != self.bound {
            self.flush_batch();
            self.resolve_clear();
            self.bound = attachment;
        }
        Ok(())
    }

    fn bound(&self) -> Attachment {
        self.bound
    }

    fn clear(&mut self, color: Color) {
        // Earlier draws are overwritten anyway.
        self.batch.clear();
        self.pending_clear = Some(color.to_array());
    }

    fn blend_function(&self) -> BlendFunction {
        self.blend
    }

    fn set_blend_function(&mut self, blend: BlendFunction) {
        if blend != self.blend {
            self.flush_batch();
            self.blend = blend;
        }
    }

    fn set_projection(&mut self, projection: Projection) {
        // Vertices are projected as they are batched, so no flush is needed.
        self.projection = projection;
    }

    fn projection(&self) -> Projection {
        self.projection
    }

    fn fill_mesh(&mut self, mesh: &Mesh, color: Color) {
        let size = self.bound_size();
        if mesh.is_empty() || !size.is_valid() {
            return;
        }
        let (w, h) = (size.width as f32, size.height as f32);
        let color = color.to_array();
        let projection = self.projection;

        self.batch.extend(mesh.indices.iter().map(|&i| {
            let px = projection.apply(mesh.vertex(i as usize));
            MeshVertex {
                pos: [px.x / w * 2.0 - 1.0, 1.0 - px.y / h * 2.0],
                color,
            }
        }));
    }

    fn draw_target(&mut self, source: TargetId, opacity: f32) -> Result<(), RenderError> {
        self.check_source(source)?;
        self.flush_batch();

        let params = BlitParams { opacity: opacity.clamp(0.0, 1.0), _pad: [0.0; 3] };
        let ubo = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("umbra blit params"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("umbra blit bind group"),
            layout: &self.pipelines.blit_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(self.source_view(source)?),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: ubo.as_entire_binding(),
                },
            ],
        });

        self.draw_fullscreen(PipelineKind::Blit, &bind_group);
        Ok(())
    }

    fn draw_target_shaded(
        &mut self,
        source: TargetId,
        accumulated: TargetId,
        shader: BlendShader,
    ) -> Result<(), RenderError> {
        self.check_source(source)?;
        self.check_source(accumulated)?;
        self.flush_batch();

        let kind = match shader {
            BlendShader::EnvironmentalLight => PipelineKind::Light,
        };
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("umbra light bind group"),
            layout: &self.pipelines.light_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(self.source_view(source)?),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(self.source_view(accumulated)?),
                },
            ],
        });

        self.draw_fullscreen(kind, &bind_group);
        Ok(())
    }

    fn flush(&mut self) {
        self.flush_batch();
        self.resolve_clear();
        if let Some(encoder) = self.encoder.take() {
            self.queue.submit(std::iter::once(encoder.finish()));
        }
    }
}
