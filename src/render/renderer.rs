//! Per-field GPU resources and frame sequencing.
//!
//! A frame runs in three steps, all recorded into one encoder:
//!
//! 1. [`GrassRenderer::prepare`] writes the uniform and refreshes the
//!    parameter textures (compute dispatch or CPU upload).
//! 2. [`GrassRenderer::draw_shadow`] renders blade depth from the light.
//! 3. [`GrassRenderer::draw`] renders the blades into the target.
//!
//! Steps 2 and 3 take the [`PreparedFrame`] returned by step 1, so a draw can
//! never be recorded ahead of the parameter pass it reads.

use glam::Vec3;

use crate::core::camera::Camera;
use crate::grass::{BladeMesh, FrameInputs, GrassSystem, ParameterBuffers, PassScheduler};
use crate::render::buffer::{CameraBuffer, GrassUniformBuffer, InstanceBuffer, MeshBuffer};
use crate::render::pipeline::{BladePipeline, BladeShadowPipeline, ParamPassPipeline};
use crate::render::texture::{DepthTexture, ParamTextures, ShadowMap};

/// Shadow map resolution
pub const SHADOW_MAP_SIZE: u32 = 2048;

/// Where the parameter textures come from each frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParameterSource {
    /// Compute pass on the GPU
    #[default]
    Gpu,
    /// Rayon pass on the CPU, uploaded with `write_texture`
    Cpu,
}

/// Token proving the parameter pass for this frame has been recorded.
#[derive(Debug)]
pub struct PreparedFrame {
    frame: u64,
    recomputed: bool,
}

impl PreparedFrame {
    /// Whether the parameter textures were refreshed this frame.
    pub fn recomputed(&self) -> bool {
        self.recomputed
    }
}

pub struct GrassRenderer {
    camera: CameraBuffer,
    uniform: GrassUniformBuffer,
    instances: InstanceBuffer,
    mesh: MeshBuffer,
    params: ParamTextures,
    param_pass: ParamPassPipeline,
    blade_pipeline: BladePipeline,
    shadow_pipeline: BladeShadowPipeline,
    depth: DepthTexture,
    shadow: ShadowMap,
    source: ParameterSource,
    scheduler: PassScheduler,
    cpu_params: Option<ParameterBuffers>,
    frame: u64,
}

impl GrassRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        system: &GrassSystem,
        source: ParameterSource,
    ) -> Self {
        let layout = system.layout();
        let camera = CameraBuffer::new(device, "grass_camera");
        let uniform = GrassUniformBuffer::new(device);
        let instances = InstanceBuffer::new(device, layout);
        let mesh = MeshBuffer::new(device, &BladeMesh::default());
        let params = ParamTextures::new(device, layout.addressing());
        let shadow = ShadowMap::new(device, SHADOW_MAP_SIZE);
        let depth = DepthTexture::new(device, width, height);

        let param_pass = ParamPassPipeline::new(device, &uniform, &instances, &params);
        let blade_pipeline = BladePipeline::new(device, surface_format, &camera, &uniform, &params, &shadow);
        let shadow_pipeline = BladeShadowPipeline::new(device, shadow.light_camera(), &uniform, &params);

        log::info!(
            "Grass renderer ready: {} instances, {} indices per blade, parameters on {:?}",
            instances.count(),
            mesh.index_count(),
            source
        );

        Self {
            camera,
            uniform,
            instances,
            mesh,
            params,
            param_pass,
            blade_pipeline,
            shadow_pipeline,
            depth,
            shadow,
            source,
            scheduler: PassScheduler::new(),
            cpu_params: None,
            frame: 0,
        }
    }

    pub fn parameter_source(&self) -> ParameterSource {
        self.source
    }

    /// Switch parameter source; the next frame recomputes.
    pub fn set_parameter_source(&mut self, source: ParameterSource) {
        if self.source != source {
            log::info!("Grass parameters now computed on {:?}", source);
            self.source = source;
            self.scheduler.invalidate();
        }
    }

    /// Upload per-frame state and record the parameter pass if it is due.
    ///
    /// `clock_secs` is the host's unbounded elapsed time.
    pub fn prepare(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        queue: &wgpu::Queue,
        system: &GrassSystem,
        camera: &Camera,
        clock_secs: f64,
    ) -> PreparedFrame {
        self.frame += 1;

        let inputs = FrameInputs::from_clock(clock_secs, camera.position);
        let time = inputs.time;
        self.uniform.update(queue, &system.build_uniform(&inputs));
        self.camera.update(queue, camera);

        let field = system.layout().field();
        let extent = 0.5 * field.patch_size + system.effective_config().blade_height_max;
        self.shadow.update_light(queue, system.light().direction, Vec3::ZERO, extent);

        let recomputed = self.scheduler.begin_frame(system.revision(), system.is_time_varying());
        if recomputed {
            match self.source {
                ParameterSource::Gpu => self.param_pass.dispatch(encoder, &self.uniform, &self.params),
                ParameterSource::Cpu => {
                    let buffers = match self.cpu_params.take() {
                        Some(mut buffers) => match system.recompute_parameters(&mut buffers, time) {
                            Ok(()) => buffers,
                            Err(e) => {
                                log::warn!("Reallocating CPU grass parameters: {}", e);
                                system.compute_parameters(time)
                            }
                        },
                        None => system.compute_parameters(time),
                    };
                    self.params.upload(queue, &buffers);
                    self.cpu_params = Some(buffers);
                }
            }
        }

        PreparedFrame {
            frame: self.frame,
            recomputed,
        }
    }

    /// Render blade depth into the shadow map from the light camera.
    pub fn draw_shadow(&self, frame: &PreparedFrame, encoder: &mut wgpu::CommandEncoder) {
        debug_assert_eq!(frame.frame, self.frame, "stale PreparedFrame");

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("grass_shadow_pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: self.shadow.view(),
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        pass.set_pipeline(self.shadow_pipeline.pipeline());
        pass.set_bind_group(0, self.shadow.light_camera().bind_group(), &[]);
        pass.set_bind_group(1, self.uniform.bind_group(), &[]);
        pass.set_bind_group(2, self.params.read_bind_group(), &[]);
        self.draw_blades(&mut pass);
    }

    /// Render the blades into `target`, clearing it to `clear_color`.
    pub fn draw(
        &self,
        frame: &PreparedFrame,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        clear_color: wgpu::Color,
    ) {
        debug_assert_eq!(frame.frame, self.frame, "stale PreparedFrame");

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("grass_blade_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: self.depth.view(),
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        pass.set_pipeline(self.blade_pipeline.pipeline());
        pass.set_bind_group(0, self.camera.bind_group(), &[]);
        pass.set_bind_group(1, self.uniform.bind_group(), &[]);
        pass.set_bind_group(2, self.params.read_bind_group(), &[]);
        pass.set_bind_group(3, self.shadow.bind_group(), &[]);
        self.draw_blades(&mut pass);
    }

    /// Shadow pass followed by the main pass.
    pub fn render(
        &self,
        frame: &PreparedFrame,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        clear_color: wgpu::Color,
    ) {
        self.draw_shadow(frame, encoder);
        self.draw(frame, encoder, target, clear_color);
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if !self.depth.matches(width, height) {
            self.depth = DepthTexture::new(device, width, height);
        }
    }

    /// One instanced indexed draw covering every blade.
    fn draw_blades(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.mesh.vertices().slice(..));
        pass.set_vertex_buffer(1, self.instances.buffer().slice(..));
        pass.set_index_buffer(self.mesh.indices().slice(..), wgpu::IndexFormat::Uint16);
        pass.draw_indexed(0..self.mesh.index_count(), 0, 0..self.instances.count());
    }
}
