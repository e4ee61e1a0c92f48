//! GPU-ready grass uniform (256 bytes, 16-byte aligned).
//!
//! Flat copy of the sanitized knob set plus the per-frame inputs. Both the
//! parameter pass and the blade pipelines bind the same buffer.

use bytemuck::{Pod, Zeroable};

use super::config::GrassConfig;
use super::deform::FrameInputs;
use super::shade::Light;

/// `flags` bit: root darkening on.
pub const FLAG_AMBIENT_OCCLUSION: u32 = 1 << 0;
/// `flags` bit: per-clump tint on.
pub const FLAG_CLUMP_TINT: u32 = 1 << 1;

/// GPU uniform for the grass pipelines. Must match `GrassUniform` in grass_common.wgsl.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GrassUniform {
    pub blade_height_min: f32,
    pub blade_height_max: f32,
    pub blade_width_min: f32,
    pub blade_width_max: f32,
    // -- 16 bytes --
    pub bend_amount_min: f32,
    pub bend_amount_max: f32,
    pub clump_size: f32,
    pub clump_radius: f32,
    // -- 32 bytes --
    pub blade_randomness: [f32; 3],
    pub clump_edge_start: f32,
    // -- 48 bytes --
    pub center_yaw: f32,
    pub blade_yaw: f32,
    pub clump_yaw: f32,
    pub thickness_strength: f32,
    // -- 64 bytes --
    pub wind_dir: [f32; 2],
    pub wind_speed: f32,
    pub wind_strength: f32,
    // -- 80 bytes --
    pub wind_scale: f32,
    pub sway_freq_min: f32,
    pub sway_freq_max: f32,
    pub sway_strength: f32,
    // -- 96 bytes --
    pub wind_facing: f32,
    pub tip_taper: f32,
    pub lod_start: f32,
    pub lod_end: f32,
    // -- 112 bytes --
    pub base_color: [f32; 3],
    pub roughness: f32,
    // -- 128 bytes --
    pub tip_color: [f32; 3],
    pub metalness: f32,
    // -- 144 bytes --
    pub emissive: [f32; 3],
    pub emissive_intensity: f32,
    // -- 160 bytes --
    pub env_map_intensity: f32,
    pub ao_min: f32,
    pub clump_tint_strength: f32,
    pub clump_normal_blend: f32,
    // -- 176 bytes --
    pub clump_normal_far: f32,
    pub lod_min_keep: f32,
    pub flags: u32,
    pub grid_size: u32,
    // -- 192 bytes --
    pub camera_position: [f32; 3],
    pub time: f32,
    // -- 208 bytes --
    pub light_direction: [f32; 3],
    pub light_intensity: f32,
    // -- 224 bytes --
    pub light_color: [f32; 3],
    pub ambient_intensity: f32,
    // -- 240 bytes --
    pub _pad: [f32; 4],
    // Total: 256 bytes
}

impl GrassUniform {
    /// Pack a sanitized config with this frame's inputs.
    pub fn new(cfg: &GrassConfig, grid_size: u32, frame: &FrameInputs, light: &Light) -> Self {
        let wind_dir = super::wind::wind_direction(cfg);
        let mut flags = 0;
        if cfg.ambient_occlusion {
            flags |= FLAG_AMBIENT_OCCLUSION;
        }
        if cfg.clump_tint {
            flags |= FLAG_CLUMP_TINT;
        }

        Self {
            blade_height_min: cfg.blade_height_min,
            blade_height_max: cfg.blade_height_max,
            blade_width_min: cfg.blade_width_min,
            blade_width_max: cfg.blade_width_max,
            bend_amount_min: cfg.bend_amount_min,
            bend_amount_max: cfg.bend_amount_max,
            clump_size: cfg.clump_size,
            clump_radius: cfg.clump_radius,
            blade_randomness: cfg.blade_randomness,
            clump_edge_start: cfg.clump_edge_start,
            center_yaw: cfg.center_yaw,
            blade_yaw: cfg.blade_yaw,
            clump_yaw: cfg.clump_yaw,
            thickness_strength: cfg.thickness_strength,
            wind_dir: wind_dir.to_array(),
            wind_speed: cfg.wind_speed,
            wind_strength: cfg.wind_strength,
            wind_scale: cfg.wind_scale,
            sway_freq_min: cfg.sway_freq_min,
            sway_freq_max: cfg.sway_freq_max,
            sway_strength: cfg.sway_strength,
            wind_facing: cfg.wind_facing,
            tip_taper: cfg.tip_taper,
            lod_start: cfg.lod_start,
            lod_end: cfg.lod_end,
            base_color: cfg.base_color,
            roughness: cfg.roughness,
            tip_color: cfg.tip_color,
            metalness: cfg.metalness,
            emissive: cfg.emissive,
            emissive_intensity: cfg.emissive_intensity,
            env_map_intensity: cfg.env_map_intensity,
            ao_min: cfg.ao_min,
            clump_tint_strength: cfg.clump_tint_strength,
            clump_normal_blend: cfg.clump_normal_blend,
            clump_normal_far: cfg.clump_normal_far,
            lod_min_keep: cfg.lod_min_keep,
            flags,
            grid_size,
            camera_position: frame.camera_position.to_array(),
            time: frame.time,
            light_direction: light.direction.normalize_or(glam::Vec3::Y).to_array(),
            light_intensity: light.intensity,
            light_color: light.color.to_array(),
            ambient_intensity: light.ambient,
            _pad: [0.0; 4],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_grass_uniform_size() {
        assert_eq!(std::mem::size_of::<GrassUniform>(), 256);
    }

    #[test]
    fn test_grass_uniform_alignment() {
        assert_eq!(std::mem::size_of::<GrassUniform>() % 16, 0);
        assert_eq!(std::mem::offset_of!(GrassUniform, blade_randomness), 32);
        assert_eq!(std::mem::offset_of!(GrassUniform, base_color), 112);
        assert_eq!(std::mem::offset_of!(GrassUniform, camera_position), 192);
        assert_eq!(std::mem::offset_of!(GrassUniform, light_color), 224);
    }

    #[test]
    fn test_flags_follow_toggles() {
        let frame = FrameInputs { time: 0.0, camera_position: Vec3::ZERO };
        let light = Light::default();
        let on = GrassConfig { ambient_occlusion: true, clump_tint: true, ..Default::default() };
        let off = GrassConfig { ambient_occlusion: false, clump_tint: false, ..Default::default() };
        assert_eq!(GrassUniform::new(&on, 8, &frame, &light).flags, FLAG_AMBIENT_OCCLUSION | FLAG_CLUMP_TINT);
        assert_eq!(GrassUniform::new(&off, 8, &frame, &light).flags, 0);
    }

    #[test]
    fn test_frame_inputs_and_wind_dir_packed() {
        let cfg = GrassConfig { wind_dir: [3.0, 4.0], ..Default::default() };
        let frame = FrameInputs { time: 7.5, camera_position: Vec3::new(1.0, 2.0, 3.0) };
        let u = GrassUniform::new(&cfg, 64, &frame, &Light::default());
        assert_eq!(u.time, 7.5);
        assert_eq!(u.camera_position, [1.0, 2.0, 3.0]);
        assert_eq!(u.grid_size, 64);
        assert!((u.wind_dir[0] - 0.6).abs() < 1e-6 && (u.wind_dir[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_bytemuck_cast() {
        let u = GrassUniform::zeroed();
        assert_eq!(bytemuck::bytes_of(&u).len(), 256);
    }
}
