//! Grass configuration (user-facing knob set).
//!
//! Knob names follow the host UI: every field deserializes from its
//! camelCase name and any subset may be omitted. Values reach the pipeline
//! only after [`GrassConfig::sanitized`] has clamped them into range.
//!
//! `bladeRandomness` and `windDir` accept either an array (`[0.3, 0.25, 0.4]`,
//! `[1.0, 0.3]`) or named components (`{"x":..,"y":..,"z":..}`,
//! `{"x":..,"z":..}`); they always serialize as arrays.

use std::path::Path;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Deserializer, Serialize};

use crate::core::{Error, Result};

/// Smallest clump cell edge accepted by the clump locator.
pub const MIN_CLUMP_SIZE: f32 = 0.05;
/// Smallest clump radius accepted by the presence falloff.
pub const MIN_CLUMP_RADIUS: f32 = 0.01;

/// Full grass knob set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GrassConfig {
    // -- Shape bounds -------------------------------------------------------
    pub blade_height_min: f32,
    pub blade_height_max: f32,
    pub blade_width_min: f32,
    pub blade_width_max: f32,
    pub bend_amount_min: f32,
    pub bend_amount_max: f32,
    /// Per-blade variation around the clump base for (height, width, bend).
    #[serde(deserialize_with = "xyz_knob")]
    pub blade_randomness: [f32; 3],
    /// Width-profile exponent; larger keeps the blade wide for longer.
    pub tip_taper: f32,

    // -- Clumping -----------------------------------------------------------
    /// Edge length of a clump cell in world units.
    pub clump_size: f32,
    /// Distance from a clump seed at which presence reaches zero.
    pub clump_radius: f32,
    /// Normalized distance at which presence starts to fall off.
    pub clump_edge_start: f32,

    // -- Orientation mixing weights -------------------------------------------
    pub center_yaw: f32,
    pub blade_yaw: f32,
    pub clump_yaw: f32,
    /// View-dependent edge fold magnitude.
    pub thickness_strength: f32,

    // -- Wind -----------------------------------------------------------------
    /// Horizontal wind direction (x, z).
    #[serde(deserialize_with = "xz_knob")]
    pub wind_dir: [f32; 2],
    pub wind_speed: f32,
    pub wind_strength: f32,
    pub wind_scale: f32,
    pub sway_freq_min: f32,
    pub sway_freq_max: f32,
    pub sway_strength: f32,
    /// Fraction of the angular gap toward the wind a blade turns at full sample.
    pub wind_facing: f32,

    // -- Distance thinning ----------------------------------------------------
    pub lod_start: f32,
    pub lod_end: f32,
    pub lod_min_keep: f32,

    // -- Shading --------------------------------------------------------------
    pub base_color: [f32; 3],
    pub tip_color: [f32; 3],
    pub roughness: f32,
    pub metalness: f32,
    pub emissive: [f32; 3],
    pub emissive_intensity: f32,
    pub env_map_intensity: f32,
    pub ambient_occlusion: bool,
    pub ao_min: f32,
    pub clump_tint: bool,
    pub clump_tint_strength: f32,
    /// Upper bound of the blend toward the synthetic clump normal.
    pub clump_normal_blend: f32,
    /// Camera distance at which the distance term of the blend saturates.
    pub clump_normal_far: f32,
}

impl Default for GrassConfig {
    fn default() -> Self {
        Self {
            blade_height_min: 0.35,
            blade_height_max: 0.8,
            blade_width_min: 0.02,
            blade_width_max: 0.045,
            bend_amount_min: 0.1,
            bend_amount_max: 0.45,
            blade_randomness: [0.3, 0.25, 0.4],
            tip_taper: 2.0,

            clump_size: 0.8,
            clump_radius: 1.5,
            clump_edge_start: 0.6,

            center_yaw: 1.0,
            blade_yaw: 0.15,
            clump_yaw: 0.3,
            thickness_strength: 0.35,

            wind_dir: [1.0, 0.3],
            wind_speed: 1.2,
            wind_strength: 0.6,
            wind_scale: 0.15,
            sway_freq_min: 0.6,
            sway_freq_max: 1.4,
            sway_strength: 0.08,
            wind_facing: 0.25,

            lod_start: 25.0,
            lod_end: 60.0,
            lod_min_keep: 0.35,

            base_color: [0.05, 0.16, 0.03],
            tip_color: [0.38, 0.62, 0.16],
            roughness: 0.55,
            metalness: 0.0,
            emissive: [0.0, 0.0, 0.0],
            emissive_intensity: 0.0,
            env_map_intensity: 1.0,
            ambient_occlusion: true,
            ao_min: 0.45,
            clump_tint: false,
            clump_tint_strength: 0.15,
            clump_normal_blend: 0.6,
            clump_normal_far: 40.0,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Vec3Knob {
    Array([f32; 3]),
    Named { x: f32, y: f32, z: f32 },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PlanarKnob {
    Array([f32; 2]),
    Named { x: f32, z: f32 },
}

fn xyz_knob<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<[f32; 3], D::Error> {
    Ok(match Vec3Knob::deserialize(deserializer)? {
        Vec3Knob::Array(v) => v,
        Vec3Knob::Named { x, y, z } => [x, y, z],
    })
}

fn xz_knob<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<[f32; 2], D::Error> {
    Ok(match PlanarKnob::deserialize(deserializer)? {
        PlanarKnob::Array(v) => v,
        PlanarKnob::Named { x, z } => [x, z],
    })
}

/// Clamp `v` into `[lo, hi]`, logging when it moves. NaN is replaced by `fallback`.
fn clamp_knob(name: &str, v: f32, lo: f32, hi: f32, fallback: f32) -> f32 {
    if !v.is_finite() {
        log::warn!("grass config: {name} is not finite, using {fallback}");
        return fallback;
    }
    let clamped = v.clamp(lo, hi);
    if clamped != v {
        log::warn!("grass config: {name}={v} clamped to {clamped}");
    }
    clamped
}

/// Clamp an ordered (min, max) pair, swapping if it arrives inverted.
fn ordered_range(name: &str, min: f32, max: f32, lo: f32, hi: f32, fallback: (f32, f32)) -> (f32, f32) {
    let min = clamp_knob(name, min, lo, hi, fallback.0);
    let max = clamp_knob(name, max, lo, hi, fallback.1);
    if min > max {
        log::warn!("grass config: {name} range inverted ({min} > {max}), swapping");
        (max, min)
    } else {
        (min, max)
    }
}

impl GrassConfig {
    /// Parse a (possibly partial) JSON knob set.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON preset from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        log::info!("Loaded grass config from {}", path.display());
        Ok(config)
    }

    /// Serialize as pretty JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Return a copy with every knob clamped into the range the pipeline assumes.
    pub fn sanitized(&self) -> Self {
        let d = Self::default();
        let mut c = self.clone();

        (c.blade_height_min, c.blade_height_max) = ordered_range(
            "bladeHeight", c.blade_height_min, c.blade_height_max, 0.0, f32::MAX,
            (d.blade_height_min, d.blade_height_max),
        );
        (c.blade_width_min, c.blade_width_max) = ordered_range(
            "bladeWidth", c.blade_width_min, c.blade_width_max, 0.0, f32::MAX,
            (d.blade_width_min, d.blade_width_max),
        );
        (c.bend_amount_min, c.bend_amount_max) = ordered_range(
            "bendAmount", c.bend_amount_min, c.bend_amount_max, -4.0, 4.0,
            (d.bend_amount_min, d.bend_amount_max),
        );
        for (i, r) in c.blade_randomness.iter_mut().enumerate() {
            *r = clamp_knob("bladeRandomness", *r, 0.0, 1.0, d.blade_randomness[i]);
        }
        c.tip_taper = clamp_knob("tipTaper", c.tip_taper, 0.05, 16.0, d.tip_taper);

        c.clump_size = clamp_knob("clumpSize", c.clump_size, MIN_CLUMP_SIZE, f32::MAX, d.clump_size);
        c.clump_radius = clamp_knob("clumpRadius", c.clump_radius, MIN_CLUMP_RADIUS, f32::MAX, d.clump_radius);
        c.clump_edge_start = clamp_knob("clumpEdgeStart", c.clump_edge_start, 0.0, 0.99, d.clump_edge_start);

        c.center_yaw = clamp_knob("centerYaw", c.center_yaw, -4.0, 4.0, d.center_yaw);
        c.blade_yaw = clamp_knob("bladeYaw", c.blade_yaw, -4.0, 4.0, d.blade_yaw);
        c.clump_yaw = clamp_knob("clumpYaw", c.clump_yaw, -4.0, 4.0, d.clump_yaw);
        c.thickness_strength = clamp_knob("thicknessStrength", c.thickness_strength, 0.0, 4.0, d.thickness_strength);

        let dir = Vec2::from(c.wind_dir);
        if !dir.is_finite() || dir.length_squared() < 1e-12 {
            log::warn!("grass config: windDir {:?} is degenerate, using (1, 0)", c.wind_dir);
            c.wind_dir = [1.0, 0.0];
        }
        c.wind_speed = clamp_knob("windSpeed", c.wind_speed, 0.0, f32::MAX, d.wind_speed);
        c.wind_strength = clamp_knob("windStrength", c.wind_strength, 0.0, 4.0, d.wind_strength);
        c.wind_scale = clamp_knob("windScale", c.wind_scale, 0.0, f32::MAX, d.wind_scale);
        (c.sway_freq_min, c.sway_freq_max) = ordered_range(
            "swayFreq", c.sway_freq_min, c.sway_freq_max, 0.0, f32::MAX,
            (d.sway_freq_min, d.sway_freq_max),
        );
        c.sway_strength = clamp_knob("swayStrength", c.sway_strength, 0.0, 4.0, d.sway_strength);
        c.wind_facing = clamp_knob("windFacing", c.wind_facing, 0.0, 1.0, d.wind_facing);

        (c.lod_start, c.lod_end) = ordered_range(
            "lod", c.lod_start, c.lod_end, 0.0, f32::MAX, (d.lod_start, d.lod_end),
        );
        c.lod_min_keep = clamp_knob("lodMinKeep", c.lod_min_keep, 0.0, 1.0, d.lod_min_keep);

        for i in 0..3 {
            c.base_color[i] = clamp_knob("baseColor", c.base_color[i], 0.0, f32::MAX, d.base_color[i]);
            c.tip_color[i] = clamp_knob("tipColor", c.tip_color[i], 0.0, f32::MAX, d.tip_color[i]);
            c.emissive[i] = clamp_knob("emissive", c.emissive[i], 0.0, f32::MAX, 0.0);
        }
        c.roughness = clamp_knob("roughness", c.roughness, 0.0, 1.0, d.roughness);
        c.metalness = clamp_knob("metalness", c.metalness, 0.0, 1.0, d.metalness);
        c.emissive_intensity = clamp_knob("emissiveIntensity", c.emissive_intensity, 0.0, f32::MAX, 0.0);
        c.env_map_intensity = clamp_knob("envMapIntensity", c.env_map_intensity, 0.0, f32::MAX, d.env_map_intensity);
        c.ao_min = clamp_knob("aoMin", c.ao_min, 0.0, 1.0, d.ao_min);
        c.clump_tint_strength = clamp_knob("clumpTintStrength", c.clump_tint_strength, 0.0, 1.0, d.clump_tint_strength);
        c.clump_normal_blend = clamp_knob("clumpNormalBlend", c.clump_normal_blend, 0.0, 1.0, d.clump_normal_blend);
        c.clump_normal_far = clamp_knob("clumpNormalFar", c.clump_normal_far, 0.01, f32::MAX, d.clump_normal_far);

        c
    }

    /// Per-blade variation magnitudes as a vector.
    pub fn randomness(&self) -> Vec3 {
        Vec3::from(self.blade_randomness)
    }

    /// Whether the motion terms of the parameter pass change with time.
    pub fn is_time_varying(&self) -> bool {
        self.wind_strength > 0.0 && self.wind_speed > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_already_sane() {
        let cfg = GrassConfig::default();
        assert_eq!(cfg.sanitized(), cfg);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg = GrassConfig::from_json_str(r#"{ "clumpSize": 1.25, "windDir": [0.0, 1.0] }"#).unwrap();
        assert_eq!(cfg.clump_size, 1.25);
        assert_eq!(cfg.wind_dir, [0.0, 1.0]);
        assert_eq!(cfg.blade_height_max, GrassConfig::default().blade_height_max);
    }

    #[test]
    fn test_vector_knobs_accept_named_components() {
        let cfg = GrassConfig::from_json_str(
            r#"{ "bladeRandomness": { "x": 0.1, "y": 0.2, "z": 0.3 }, "windDir": { "x": 0.0, "z": -1.0 } }"#,
        )
        .unwrap();
        assert_eq!(cfg.blade_randomness, [0.1, 0.2, 0.3]);
        assert_eq!(cfg.wind_dir, [0.0, -1.0]);
    }

    #[test]
    fn test_vector_knob_missing_component_is_error() {
        assert!(GrassConfig::from_json_str(r#"{ "windDir": { "x": 1.0 } }"#).is_err());
    }

    #[test]
    fn test_knob_names_are_camel_case() {
        let json = GrassConfig::default().to_json_string().unwrap();
        for key in ["bladeHeightMin", "bendAmountMax", "bladeRandomness", "swayFreqMin", "envMapIntensity"] {
            assert!(json.contains(key), "missing {key}");
        }
    }

    #[test]
    fn test_sanitize_clamps_negative_and_zero() {
        let cfg = GrassConfig {
            blade_width_min: -0.5,
            clump_radius: 0.0,
            clump_size: -1.0,
            blade_randomness: [2.0, -1.0, 0.5],
            ..Default::default()
        }
        .sanitized();

        assert_eq!(cfg.blade_width_min, 0.0);
        assert_eq!(cfg.clump_radius, MIN_CLUMP_RADIUS);
        assert_eq!(cfg.clump_size, MIN_CLUMP_SIZE);
        assert_eq!(cfg.blade_randomness, [1.0, 0.0, 0.5]);
    }

    #[test]
    fn test_sanitize_swaps_inverted_range() {
        let cfg = GrassConfig {
            blade_height_min: 1.0,
            blade_height_max: 0.2,
            ..Default::default()
        }
        .sanitized();
        assert_eq!((cfg.blade_height_min, cfg.blade_height_max), (0.2, 1.0));
    }

    #[test]
    fn test_sanitize_replaces_zero_wind_dir() {
        let cfg = GrassConfig {
            wind_dir: [0.0, 0.0],
            ..Default::default()
        }
        .sanitized();
        assert_eq!(cfg.wind_dir, [1.0, 0.0]);
    }

    #[test]
    fn test_sanitize_replaces_nan() {
        let cfg = GrassConfig {
            roughness: f32::NAN,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(cfg.roughness, GrassConfig::default().roughness);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meadow.json");
        std::fs::write(&path, r#"{ "windStrength": 0.0, "baseColor": [0.1, 0.2, 0.3] }"#).unwrap();

        let cfg = GrassConfig::load(&path).unwrap();
        assert_eq!(cfg.wind_strength, 0.0);
        assert_eq!(cfg.base_color, [0.1, 0.2, 0.3]);
        assert!(!cfg.is_time_varying());
    }

    #[test]
    fn test_load_reports_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(GrassConfig::load(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_json_round_trip_preserves_knobs() {
        let cfg = GrassConfig {
            clump_tint: true,
            sway_strength: 0.2,
            ..Default::default()
        };
        let back = GrassConfig::from_json_str(&cfg.to_json_string().unwrap()).unwrap();
        assert_eq!(back, cfg);
    }
}
