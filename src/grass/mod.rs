//! Procedural grass field.
//!
//! Blades sit on a jittered grid (`layout`), belong to clumps found by a
//! nearest-seed search (`clump`), get their shape and motion parameters from
//! pure hash functions (`synth`, `wind`, `pass`) and are bent into curved,
//! wind-animated blades in the vertex stage (`spine`, `deform`) before
//! shading (`shade`). The WGSL shaders mirror these modules.

pub mod clump;
pub mod config;
pub mod deform;
pub mod hash;
pub mod layout;
pub mod mesh;
pub mod params;
pub mod pass;
pub mod shade;
pub mod spine;
pub mod synth;
pub mod wind;

pub use config::GrassConfig;
pub use deform::{DeformedVertex, FrameInputs};
pub use layout::{FieldLayout, GpuBladeInstance, InstanceAddressing, InstanceLayout};
pub use mesh::{BladeMesh, BladeVertex};
pub use params::GrassUniform;
pub use pass::{BladeRecord, ParameterBuffers, PassScheduler};
pub use shade::Light;

use std::ops::{Deref, DerefMut};

use crate::core::Result;

/// Owns the knob set, the instance layout and the light for one grass field.
pub struct GrassSystem {
    config: GrassConfig,
    effective: GrassConfig,
    layout: InstanceLayout,
    light: Light,
    revision: u64,
}

impl GrassSystem {
    pub fn new(config: GrassConfig, field: &FieldLayout) -> Result<Self> {
        let layout = InstanceLayout::generate(field)?;
        let effective = config.sanitized();
        Ok(Self {
            config,
            effective,
            layout,
            light: Light::default(),
            revision: 0,
        })
    }

    /// Knobs as supplied by the caller.
    pub fn config(&self) -> &GrassConfig {
        &self.config
    }

    /// Knobs after clamping; what the pipeline actually uses.
    pub fn effective_config(&self) -> &GrassConfig {
        &self.effective
    }

    /// Mutable access; the change is sanitized and published when the guard drops.
    pub fn config_mut(&mut self) -> ConfigGuard<'_> {
        ConfigGuard { system: self }
    }

    pub fn set_config(&mut self, config: GrassConfig) {
        self.config = config;
        self.commit();
    }

    /// Bumped on every configuration change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn layout(&self) -> &InstanceLayout {
        &self.layout
    }

    pub fn light(&self) -> &Light {
        &self.light
    }

    pub fn set_light(&mut self, light: Light) {
        self.light = light;
    }

    /// Build the GPU uniform for this frame.
    pub fn build_uniform(&self, frame: &FrameInputs) -> GrassUniform {
        GrassUniform::new(&self.effective, self.layout.addressing().grid_size(), frame, &self.light)
    }

    /// Run the parameter pass on the CPU.
    pub fn compute_parameters(&self, time: f32) -> ParameterBuffers {
        ParameterBuffers::compute(&self.layout, &self.effective, time)
    }

    /// Refresh existing CPU buffers in place.
    pub fn recompute_parameters(&self, buffers: &mut ParameterBuffers, time: f32) -> Result<()> {
        buffers.recompute(&self.layout, &self.effective, time)
    }

    /// Whether the parameter pass has to run every frame.
    pub fn is_time_varying(&self) -> bool {
        self.effective.is_time_varying()
    }

    /// Deform one mesh vertex of instance `index` against a parameter record.
    pub fn deform(&self, index: u32, record: &BladeRecord, vertex: BladeVertex, frame: &FrameInputs) -> DeformedVertex {
        deform::deform_vertex(vertex, self.layout.position(index), record, &self.effective, frame)
    }

    fn commit(&mut self) {
        self.effective = self.config.sanitized();
        self.revision += 1;
        log::debug!("grass config updated (revision {})", self.revision);
    }
}

/// Write guard returned by [`GrassSystem::config_mut`].
pub struct ConfigGuard<'a> {
    system: &'a mut GrassSystem,
}

impl Deref for ConfigGuard<'_> {
    type Target = GrassConfig;

    fn deref(&self) -> &GrassConfig {
        &self.system.config
    }
}

impl DerefMut for ConfigGuard<'_> {
    fn deref_mut(&mut self) -> &mut GrassConfig {
        &mut self.system.config
    }
}

impl Drop for ConfigGuard<'_> {
    fn drop(&mut self) {
        self.system.commit();
    }
}
