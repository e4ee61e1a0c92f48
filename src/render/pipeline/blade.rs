//! Blade render pipeline: deformer vertex stage and blade shading.

use crate::render::buffer::{blade_instance_layout, blade_vertex_layout, CameraBuffer, GrassUniformBuffer};
use crate::render::texture::{ParamTextures, ShadowMap, DEPTH_FORMAT};

/// Blade shader source: shared grass functions followed by the entry points.
pub const BLADE_SHADER_SOURCE: &str = concat!(
    include_str!("../../../shaders/grass_common.wgsl"),
    "\n",
    include_str!("../../../shaders/blade.wgsl"),
);

/// Shader module shared by the blade and blade-shadow pipelines
pub fn blade_shader_module(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("blade_shader"),
        source: wgpu::ShaderSource::Wgsl(BLADE_SHADER_SOURCE.into()),
    })
}

/// Renders every blade instance with one instanced indexed draw.
///
/// Bind groups: 0 camera, 1 grass uniform, 2 parameter textures, 3 shadow map.
pub struct BladePipeline {
    pipeline: wgpu::RenderPipeline,
}

impl BladePipeline {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        camera: &CameraBuffer,
        uniform: &GrassUniformBuffer,
        params: &ParamTextures,
        shadow: &ShadowMap,
    ) -> Self {
        let shader = blade_shader_module(device);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("blade_pipeline_layout"),
            bind_group_layouts: &[
                camera.bind_group_layout(),
                uniform.bind_group_layout(),
                params.read_bind_group_layout(),
                shadow.bind_group_layout(),
            ],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("blade_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[blade_vertex_layout(), blade_instance_layout()],
                compilation_options: Default::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                // Blades are two-sided; the fragment stage flips the normal
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        Self { pipeline }
    }

    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }
}
