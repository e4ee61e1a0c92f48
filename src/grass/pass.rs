//! Offscreen parameter pass.
//!
//! Maps each blade instance to its parameter record and lays the records
//! out as three index-aligned texel arrays (shape, clump, motion). The GPU
//! compute pass in `param_pass.wgsl` produces the same layout; this CPU
//! version runs the identical mapping with rayon for tests and as a
//! fallback upload path.

use glam::Vec2;
use rayon::prelude::*;

use crate::core::{Error, Result};

use super::config::GrassConfig;
use super::hash::{hash_position, salt};
use super::layout::{InstanceAddressing, InstanceLayout};
use super::synth::{normalize_angle, synthesize, wrap_pi, yaw_toward, BladePlacement, BladeShape, BladeType};
use super::wind::sample_wind;

/// One RGBA32F texel.
pub type Texel = [f32; 4];

/// Time-dependent part of a blade record.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BladeMotion {
    /// Facing angle in [0, TAU) after the wind bias.
    pub facing: f32,
    /// Per-blade phase in [0, 1).
    pub phase: f32,
    /// Wind field strength sample in [0, 1].
    pub wind_sample: f32,
    /// Distance-thinning seed in [0, 1).
    pub lod_seed: f32,
}

/// Full per-instance parameter record.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BladeRecord {
    pub shape: BladeShape,
    pub placement: BladePlacement,
    pub motion: BladeMotion,
}

impl BladeRecord {
    /// Pack into (shape, clump, motion) texels.
    pub fn to_texels(&self) -> [Texel; 3] {
        let s = &self.shape;
        let p = &self.placement;
        let m = &self.motion;
        [
            [s.height, s.width, s.bend, s.kind.as_f32()],
            [p.dir_to_center.x, p.dir_to_center.y, p.presence, p.base_facing],
            [m.facing, m.phase, m.wind_sample, m.lod_seed],
        ]
    }

    /// Unpack the three texels written for one instance.
    pub fn from_texels(shape: Texel, clump: Texel, motion: Texel) -> Self {
        Self {
            shape: BladeShape {
                height: shape[0],
                width: shape[1],
                bend: shape[2],
                kind: BladeType::from_texel(shape[3]),
            },
            placement: BladePlacement {
                dir_to_center: Vec2::new(clump[0], clump[1]),
                presence: clump[2],
                base_facing: clump[3],
            },
            motion: BladeMotion {
                facing: motion[0],
                phase: motion[1],
                wind_sample: motion[2],
                lod_seed: motion[3],
            },
        }
    }
}

/// Turn `base_facing` part of the way toward the wind.
///
/// The turn scales with the configured strength (capped at 1) and the local
/// sample, so zero wind leaves the base angle untouched.
pub fn wind_facing(base_facing: f32, wind_dir: Vec2, wind_sample: f32, cfg: &GrassConfig) -> f32 {
    let delta = wrap_pi(yaw_toward(wind_dir) - base_facing);
    let turn = cfg.wind_facing * cfg.wind_strength.min(1.0) * wind_sample;
    normalize_angle(base_facing + delta * turn)
}

/// Pure mapping from a blade position (plus config and time) to its record.
pub fn evaluate_blade(p: Vec2, cfg: &GrassConfig, time: f32) -> BladeRecord {
    let synth = synthesize(p, cfg);
    let wind = sample_wind(p, time, cfg);

    BladeRecord {
        shape: synth.shape,
        placement: synth.placement,
        motion: BladeMotion {
            facing: wind_facing(synth.placement.base_facing, wind.direction, wind.strength, cfg),
            phase: hash_position(p, salt::PHASE),
            wind_sample: wind.strength,
            lod_seed: hash_position(p, salt::LOD),
        },
    }
}

/// Which of the three parameter buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamBuffer {
    Shape,
    Clump,
    Motion,
}

impl ParamBuffer {
    pub const ALL: [ParamBuffer; 3] = [ParamBuffer::Shape, ParamBuffer::Clump, ParamBuffer::Motion];

    pub fn label(self) -> &'static str {
        match self {
            ParamBuffer::Shape => "grass_params_shape",
            ParamBuffer::Clump => "grass_params_clump",
            ParamBuffer::Motion => "grass_params_motion",
        }
    }
}

/// CPU-side parameter buffers, one texel per instance in index order.
#[derive(Clone, Debug)]
pub struct ParameterBuffers {
    addressing: InstanceAddressing,
    shape: Vec<Texel>,
    clump: Vec<Texel>,
    motion: Vec<Texel>,
}

impl ParameterBuffers {
    /// Allocate zeroed buffers sized for `addressing`.
    pub fn new(addressing: InstanceAddressing) -> Self {
        let n = addressing.instance_count() as usize;
        Self {
            addressing,
            shape: vec![[0.0; 4]; n],
            clump: vec![[0.0; 4]; n],
            motion: vec![[0.0; 4]; n],
        }
    }

    /// Evaluate the full pass for `layout`.
    pub fn compute(layout: &InstanceLayout, cfg: &GrassConfig, time: f32) -> Self {
        let mut buffers = Self::new(layout.addressing());
        buffers.fill(layout, |_, p| evaluate_blade(p, cfg, time).to_texels());
        buffers
    }

    /// Overwrite every texel with a fresh evaluation.
    pub fn recompute(&mut self, layout: &InstanceLayout, cfg: &GrassConfig, time: f32) -> Result<()> {
        self.fill_with(layout, |_, p| evaluate_blade(p, cfg, time).to_texels())
    }

    /// Overwrite every texel with `f(index, base_position)`.
    ///
    /// Fails with [`Error::Layout`] when the buffers were sized for another
    /// layout.
    pub fn fill_with<F>(&mut self, layout: &InstanceLayout, f: F) -> Result<()>
    where
        F: Fn(u32, Vec2) -> [Texel; 3] + Sync,
    {
        if layout.addressing() != self.addressing {
            return Err(Error::Layout(format!(
                "parameter buffers sized for grid {}, layout has grid {}",
                self.addressing.grid_size(),
                layout.addressing().grid_size()
            )));
        }
        self.fill(layout, f);
        Ok(())
    }

    /// Iterates instances in parallel; each writes only its own texel.
    fn fill<F>(&mut self, layout: &InstanceLayout, f: F)
    where
        F: Fn(u32, Vec2) -> [Texel; 3] + Sync,
    {
        let positions = layout.positions();
        self.shape
            .par_iter_mut()
            .zip(self.clump.par_iter_mut())
            .zip(self.motion.par_iter_mut())
            .enumerate()
            .for_each(|(i, ((shape, clump), motion))| {
                let [s, c, m] = f(i as u32, positions[i]);
                *shape = s;
                *clump = c;
                *motion = m;
            });
    }

    pub fn addressing(&self) -> InstanceAddressing {
        self.addressing
    }

    /// Texels of one buffer in texture row order.
    pub fn texels(&self, buffer: ParamBuffer) -> &[Texel] {
        match buffer {
            ParamBuffer::Shape => &self.shape,
            ParamBuffer::Clump => &self.clump,
            ParamBuffer::Motion => &self.motion,
        }
    }

    /// Read back the record stored for instance `index`.
    pub fn record(&self, index: u32) -> BladeRecord {
        let i = index as usize;
        BladeRecord::from_texels(self.shape[i], self.clump[i], self.motion[i])
    }

    /// Raw texel triple at texture coordinate `texel`.
    pub fn texel_at(&self, texel: glam::UVec2) -> [Texel; 3] {
        let i = self.addressing.index(texel) as usize;
        [self.shape[i], self.clump[i], self.motion[i]]
    }
}

/// Decides when the parameter pass must run before the next draw.
#[derive(Clone, Debug, Default)]
pub struct PassScheduler {
    last_revision: Option<u64>,
}

impl PassScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the pass has to run this frame; records the revision it will produce.
    ///
    /// Runs on the first frame, after every configuration change, and on
    /// every frame while the motion terms depend on time.
    pub fn begin_frame(&mut self, revision: u64, time_varying: bool) -> bool {
        let changed = self.last_revision != Some(revision);
        if changed {
            log::debug!("grass parameter pass: config revision {revision}, full recompute");
        }
        self.last_revision = Some(revision);
        changed || time_varying
    }

    /// Force a recompute on the next frame.
    pub fn invalidate(&mut self) {
        self.last_revision = None;
    }
}
