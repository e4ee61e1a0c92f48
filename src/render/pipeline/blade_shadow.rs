//! Depth-only blade pipeline for shadow casting.
//!
//! Runs the same deformation as the main pipeline (same parameter textures,
//! time and camera position in the grass uniform); only the view-projection
//! bound at group 0 is the light's.

use crate::render::buffer::{blade_instance_layout, blade_vertex_layout, CameraBuffer, GrassUniformBuffer};
use crate::render::texture::{ParamTextures, DEPTH_FORMAT};

use super::blade::blade_shader_module;

pub struct BladeShadowPipeline {
    pipeline: wgpu::RenderPipeline,
}

impl BladeShadowPipeline {
    pub fn new(
        device: &wgpu::Device,
        light_camera: &CameraBuffer,
        uniform: &GrassUniformBuffer,
        params: &ParamTextures,
    ) -> Self {
        let shader = blade_shader_module(device);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("blade_shadow_pipeline_layout"),
            bind_group_layouts: &[
                light_camera.bind_group_layout(),
                uniform.bind_group_layout(),
                params.read_bind_group_layout(),
            ],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("blade_shadow_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_shadow"),
                buffers: &[blade_vertex_layout(), blade_instance_layout()],
                compilation_options: Default::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: Default::default(),
                bias: wgpu::DepthBiasState {
                    constant: 2,
                    slope_scale: 2.0,
                    clamp: 0.0,
                },
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: None,
            multiview_mask: None,
            cache: None,
        });

        Self { pipeline }
    }

    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }
}
