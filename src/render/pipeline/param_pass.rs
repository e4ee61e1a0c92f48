//! Offscreen parameter pass compute pipeline

use crate::render::buffer::{GrassUniformBuffer, InstanceBuffer};
use crate::render::texture::ParamTextures;

/// Invocations per workgroup side; must match `@workgroup_size` in param_pass.wgsl.
pub const WORKGROUP_SIZE: u32 = 8;

/// Parameter pass source: shared grass functions followed by the compute entry.
pub const PARAM_PASS_SHADER_SOURCE: &str = concat!(
    include_str!("../../../shaders/grass_common.wgsl"),
    "\n",
    include_str!("../../../shaders/param_pass.wgsl"),
);

/// Evaluates every blade's parameter record into the parameter textures.
///
/// One invocation per grid cell. Base positions come from the same instance
/// buffer the blade pipeline draws with.
pub struct ParamPassPipeline {
    pipeline: wgpu::ComputePipeline,
    instance_bind_group: wgpu::BindGroup,
}

impl ParamPassPipeline {
    pub fn new(
        device: &wgpu::Device,
        uniform: &GrassUniformBuffer,
        instances: &InstanceBuffer,
        params: &ParamTextures,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("grass_param_pass_shader"),
            source: wgpu::ShaderSource::Wgsl(PARAM_PASS_SHADER_SOURCE.into()),
        });

        // Bind group 1: instance records (read-only storage)
        let instance_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("grass_param_pass_instances_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: true },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let instance_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("grass_param_pass_instances"),
            layout: &instance_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: instances.buffer().as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("grass_param_pass_pipeline_layout"),
            bind_group_layouts: &[
                uniform.bind_group_layout(),
                &instance_bind_group_layout,
                params.storage_bind_group_layout(),
            ],
            immediate_size: 0,
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("grass_param_pass_pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        Self {
            pipeline,
            instance_bind_group,
        }
    }

    /// Record the dispatch covering a `grid_size x grid_size` field
    pub fn dispatch(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        uniform: &GrassUniformBuffer,
        params: &ParamTextures,
    ) {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("grass_param_pass"),
            timestamp_writes: None,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, uniform.bind_group(), &[]);
        pass.set_bind_group(1, &self.instance_bind_group, &[]);
        pass.set_bind_group(2, params.storage_bind_group(), &[]);

        let groups = workgroup_count(params.addressing().grid_size());
        pass.dispatch_workgroups(groups, groups, 1);
    }
}

/// Workgroups per side needed to cover `grid_size` cells.
pub fn workgroup_count(grid_size: u32) -> u32 {
    grid_size.div_ceil(WORKGROUP_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::pipeline::validate_wgsl;

    #[test]
    fn test_workgroup_count_covers_grid() {
        assert_eq!(workgroup_count(1), 1);
        assert_eq!(workgroup_count(8), 1);
        assert_eq!(workgroup_count(9), 2);
        assert_eq!(workgroup_count(256), 32);
    }

    #[test]
    fn test_param_pass_shader_validates() {
        validate_wgsl(PARAM_PASS_SHADER_SOURCE).unwrap();
    }

    #[test]
    fn test_workgroup_size_matches_shader() {
        let module = naga::front::wgsl::parse_str(PARAM_PASS_SHADER_SOURCE).unwrap();
        let entry = module.entry_points.iter().find(|e| e.name == "main").unwrap();
        assert_eq!(entry.workgroup_size, [WORKGROUP_SIZE, WORKGROUP_SIZE, 1]);
    }
}
