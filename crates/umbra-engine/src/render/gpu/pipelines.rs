use std::collections::HashMap;

use crate::render::blend::BlendFunction;
use crate::render::error::RenderError;

use super::common::{blend_state, uniform_binding_size, BlitParams, MeshVertex};

/// What a pipeline draws.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub(super) enum PipelineKind {
    /// Pre-projected colored triangles.
    Mesh,
    /// One target over the attachment, scaled by an opacity uniform.
    Blit,
    /// The environmental-light shader blend over two targets.
    Light,
}

type PipelineKey = (PipelineKind, BlendFunction, wgpu::TextureFormat);

/// Compiled shader modules, layouts and a lazily filled pipeline cache.
///
/// Shader modules are validated once at construction; pipelines are created on
/// first use per (kind, blend, format).
pub(super) struct Pipelines {
    mesh_shader: wgpu::ShaderModule,
    fullscreen_shader: wgpu::ShaderModule,
    blit_shader: wgpu::ShaderModule,
    light_shader: wgpu::ShaderModule,

    pub blit_bgl: wgpu::BindGroupLayout,
    pub light_bgl: wgpu::BindGroupLayout,

    mesh_layout: wgpu::PipelineLayout,
    blit_layout: wgpu::PipelineLayout,
    light_layout: wgpu::PipelineLayout,

    cache: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

/// Creates a shader module and fails if the compiler reported any error.
fn compile(device: &wgpu::Device, label: &str, source: &'static str) -> Result<wgpu::ShaderModule, RenderError> {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    let info = pollster::block_on(module.get_compilation_info());
    let errors: Vec<String> = info
        .messages
        .iter()
        .filter(|m| m.message_type == wgpu::CompilationMessageType::Error)
        .map(|m| m.message.clone())
        .collect();

    if !errors.is_empty() {
        let message = errors.join("; ");
        log::error!("shader `{label}` failed to compile: {message}");
        return Err(RenderError::ShaderCompilation { label: label.to_string(), message });
    }
    log::debug!("shader `{label}` compiled");
    Ok(module)
}

impl Pipelines {
    pub fn new(device: &wgpu::Device) -> Result<Self, RenderError> {
        let mesh_shader = compile(device, "umbra mesh shader", include_str!("shaders/mesh.wgsl"))?;
        let fullscreen_shader =
            compile(device, "umbra fullscreen shader", include_str!("shaders/fullscreen.wgsl"))?;
        let blit_shader = compile(device, "umbra blit shader", include_str!("shaders/blit.wgsl"))?;
        let light_shader = compile(device, "umbra light shader", include_str!("shaders/light.wgsl"))?;

        let blit_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("umbra blit bgl"),
            entries: &[
                texture_entry(0),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: uniform_binding_size::<BlitParams>(),
                    },
                    count: None,
                },
            ],
        });

        let light_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("umbra light bgl"),
            entries: &[texture_entry(0), texture_entry(1)],
        });

        let mesh_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("umbra mesh pipeline layout"),
            bind_group_layouts: &[],
            immediate_size: 0,
        });
        let blit_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("umbra blit pipeline layout"),
            bind_group_layouts: &[&blit_bgl],
            immediate_size: 0,
        });
        let light_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("umbra light pipeline layout"),
            bind_group_layouts: &[&light_bgl],
            immediate_size: 0,
        });

        Ok(Self {
            mesh_shader,
            fullscreen_shader,
            blit_shader,
            light_shader,
            blit_bgl,
            light_bgl,
            mesh_layout,
            blit_layout,
            light_layout,
            cache: HashMap::new(),
        })
    }

    /// Returns the pipeline for `kind` rendering into `format` with `blend`.
    pub fn get(
        &mut self,
        device: &wgpu::Device,
        kind: PipelineKind,
        blend: BlendFunction,
        format: wgpu::TextureFormat,
    ) -> &wgpu::RenderPipeline {
        let (vs, fs, layout, buffers): (_, _, _, &[wgpu::VertexBufferLayout<'static>]) = match kind {
            PipelineKind::Mesh => (&self.mesh_shader, &self.mesh_shader, &self.mesh_layout, &MESH_BUFFERS),
            PipelineKind::Blit => (&self.fullscreen_shader, &self.blit_shader, &self.blit_layout, &[]),
            PipelineKind::Light => (&self.fullscreen_shader, &self.light_shader, &self.light_layout, &[]),
        };

        self.cache.entry((kind, blend, format)).or_insert_with(|| {
            log::debug!("creating {kind:?} pipeline for {format:?} with {blend:?}");
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("umbra pipeline"),
                layout: Some(layout),

                vertex: wgpu::VertexState {
                    module: vs,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers,
                },

                fragment: Some(wgpu::FragmentState {
                    module: fs,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(blend_state(blend)),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),

                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },

                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
        })
    }
}

const MESH_BUFFERS: [wgpu::VertexBufferLayout<'static>; 1] = [MeshVertex::LAYOUT];
