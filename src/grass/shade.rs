//! Blade shading: CPU mirror of `fs_main` in blade.wgsl.
//!
//! The flat blade gets a rounded look by folding its normal across the
//! width, then blends toward a clump-wide normal with height and distance so
//! far-away grass does not sparkle.

use std::f32::consts::PI;

use glam::{Vec2, Vec3};

use super::clump::locate_clump;
use super::config::GrassConfig;
use super::deform::DeformedVertex;
use super::hash::{hash_cell, salt, smoothstep};

/// Fold angle at the blade edges, in radians.
pub const RIM_FOLD: f32 = 0.55;
/// Extra fold next to the midrib crease.
pub const MIDRIB_FOLD: f32 = 0.2;
/// Half-width (in `s`) of the midrib crease.
pub const MIDRIB_WIDTH: f32 = 0.2;
/// Upward tilt of the synthetic clump normal.
pub const CLUMP_NORMAL_LIFT: f32 = 1.5;

const DIFFUSE_WRAP: f32 = 0.3;
const TRANSLUCENCY: f32 = 0.35;
const DIELECTRIC_F0: f32 = 0.04;

/// Directional light plus flat ambient.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    /// Unit vector from the surface toward the light.
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub ambient: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            direction: Vec3::new(0.4, 0.8, 0.3).normalize(),
            color: Vec3::new(1.0, 0.96, 0.88),
            intensity: 3.0,
            ambient: 0.25,
        }
    }
}

/// What the fragment stage hands to lighting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceSample {
    pub normal: Vec3,
    pub albedo: Vec3,
    pub t: f32,
}

fn sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn normalize_or(v: Vec3, fallback: Vec3) -> Vec3 {
    let len_sq = v.length_squared();
    if len_sq > 1e-12 && len_sq.is_finite() {
        v / len_sq.sqrt()
    } else {
        fallback
    }
}

/// Normal folded across the width to fake a rounded cross-section.
pub fn rim_normal(normal: Vec3, side: Vec3, s: f32) -> Vec3 {
    let crease = MIDRIB_FOLD * sign(s) * (1.0 - smoothstep(0.0, MIDRIB_WIDTH, s.abs()));
    let angle = RIM_FOLD * s + crease;
    normalize_or(normal * angle.cos() + side * angle.sin(), normal)
}

/// Dome-like normal pointing away from the clump seed.
pub fn clump_normal(dir_to_center: Vec2) -> Vec3 {
    normalize_or(Vec3::new(-dir_to_center.x, CLUMP_NORMAL_LIFT, -dir_to_center.y), Vec3::Y)
}

/// Weight of the clump normal; grows with height and camera distance.
pub fn clump_normal_weight(t: f32, distance: f32, cfg: &GrassConfig) -> f32 {
    let far = smoothstep(0.0, cfg.clump_normal_far, distance);
    ((0.5 * t + 0.5 * far).clamp(0.0, 1.0)) * cfg.clump_normal_blend
}

/// Height-gradient albedo with the optional darkening and tint terms.
pub fn blade_albedo(t: f32, base: Vec2, cfg: &GrassConfig) -> Vec3 {
    let t = t.clamp(0.0, 1.0);
    let mut color = Vec3::from(cfg.base_color).lerp(Vec3::from(cfg.tip_color), t);
    if cfg.ambient_occlusion {
        color *= cfg.ao_min + (1.0 - cfg.ao_min) * t;
    }
    if cfg.clump_tint {
        color *= clump_tint(base, cfg);
    }
    color
}

/// Per-clump brightness factor around 1.
pub fn clump_tint(base: Vec2, cfg: &GrassConfig) -> f32 {
    let cell = locate_clump(base, cfg.clump_size).cell;
    1.0 + (hash_cell(cell, salt::CLUMP_TINT) - 0.5) * 2.0 * cfg.clump_tint_strength
}

/// Shading normal and albedo for one fragment.
pub fn shade_fragment(
    vertex: &DeformedVertex,
    base: Vec2,
    dir_to_center: Vec2,
    camera_position: Vec3,
    cfg: &GrassConfig,
) -> SurfaceSample {
    let to_camera = camera_position - vertex.position;
    let mut normal = rim_normal(vertex.normal, vertex.side, vertex.s);
    // Two-sided: always shade the face the camera sees.
    if normal.dot(to_camera) < 0.0 {
        normal = -normal;
    }

    let w = clump_normal_weight(vertex.t, to_camera.length(), cfg);
    let normal = normalize_or(normal.lerp(clump_normal(dir_to_center), w), normal);

    SurfaceSample {
        normal,
        albedo: blade_albedo(vertex.t, base, cfg),
        t: vertex.t,
    }
}

/// Outgoing radiance for a shaded surface.
pub fn light(surface: &SurfaceSample, position: Vec3, camera_position: Vec3, lamp: &Light, cfg: &GrassConfig) -> Vec3 {
    let n = surface.normal;
    let v = normalize_or(camera_position - position, n);
    let l = normalize_or(lamp.direction, Vec3::Y);
    let n_dot_l = n.dot(l);

    let diffuse = ((n_dot_l + DIFFUSE_WRAP) / (1.0 + DIFFUSE_WRAP)).max(0.0);
    let backlight = (-n_dot_l).max(0.0) * TRANSLUCENCY * (0.5 + 0.5 * surface.t);

    let h = normalize_or(l + v, n);
    let n_dot_h = n.dot(h).max(0.0);
    let alpha = (cfg.roughness * cfg.roughness).max(1e-3);
    let a2 = alpha * alpha;
    let denom = n_dot_h * n_dot_h * (a2 - 1.0) + 1.0;
    let distribution = a2 / (PI * denom * denom);
    let f0 = Vec3::splat(DIELECTRIC_F0).lerp(surface.albedo, cfg.metalness);
    let fresnel = f0 + (Vec3::ONE - f0) * (1.0 - h.dot(v).max(0.0)).powi(5);
    let specular = fresnel * (distribution * 0.25 * n_dot_l.max(0.0));

    let radiance = lamp.color * lamp.intensity;
    let diffuse_color = surface.albedo * (1.0 - cfg.metalness);
    let ambient = surface.albedo * lamp.ambient * cfg.env_map_intensity;
    let emissive = Vec3::from(cfg.emissive) * cfg.emissive_intensity;

    (diffuse_color * (diffuse + backlight) + specular) * radiance + ambient + emissive
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grass::deform::{deform_vertex, FrameInputs};
    use crate::grass::mesh::BladeVertex;
    use crate::grass::pass::evaluate_blade;

    fn plain() -> GrassConfig {
        GrassConfig {
            ambient_occlusion: false,
            clump_tint: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_rim_normal_is_unit_and_symmetric() {
        let (n, side) = (Vec3::Z, Vec3::X);
        assert_eq!(rim_normal(n, side, 0.0), n);
        for i in 1..=10 {
            let s = i as f32 / 10.0;
            let l = rim_normal(n, side, -s);
            let r = rim_normal(n, side, s);
            assert!((l.length() - 1.0).abs() < 1e-5);
            assert!((l.x + r.x).abs() < 1e-5);
            assert!((l.z - r.z).abs() < 1e-5);
            assert!(r.x > 0.0);
        }
    }

    #[test]
    fn test_clump_normal_tilts_outward_and_up() {
        let n = clump_normal(Vec2::new(1.0, 0.0));
        assert!(n.y > 0.0 && n.x < 0.0);
        assert!((n.length() - 1.0).abs() < 1e-6);
        assert_eq!(clump_normal(Vec2::ZERO), Vec3::Y);
    }

    #[test]
    fn test_clump_weight_grows_with_height_and_distance() {
        let cfg = GrassConfig::default();
        assert_eq!(clump_normal_weight(0.0, 0.0, &cfg), 0.0);
        assert!(clump_normal_weight(1.0, 0.0, &cfg) > clump_normal_weight(0.2, 0.0, &cfg));
        assert!(clump_normal_weight(0.5, 30.0, &cfg) > clump_normal_weight(0.5, 2.0, &cfg));
        assert!(clump_normal_weight(1.0, 1e6, &cfg) <= cfg.clump_normal_blend + 1e-6);

        let off = GrassConfig { clump_normal_blend: 0.0, ..Default::default() };
        assert_eq!(clump_normal_weight(1.0, 100.0, &off), 0.0);
    }

    #[test]
    fn test_albedo_gradient_endpoints() {
        let cfg = plain();
        assert_eq!(blade_albedo(0.0, Vec2::ZERO, &cfg), Vec3::from(cfg.base_color));
        assert!((blade_albedo(1.0, Vec2::ZERO, &cfg) - Vec3::from(cfg.tip_color)).length() < 1e-6);
    }

    #[test]
    fn test_ambient_occlusion_darkens_root_only() {
        let cfg = GrassConfig { ambient_occlusion: true, clump_tint: false, ..Default::default() };
        let root = blade_albedo(0.0, Vec2::ZERO, &cfg);
        assert!((root - Vec3::from(cfg.base_color) * cfg.ao_min).length() < 1e-6);
        assert!((blade_albedo(1.0, Vec2::ZERO, &cfg) - Vec3::from(cfg.tip_color)).length() < 1e-6);
    }

    #[test]
    fn test_clump_tint_is_bounded_and_shared() {
        let cfg = GrassConfig { clump_tint: true, ..Default::default() };
        for k in 0..200 {
            let p = Vec2::new(k as f32 * 0.29, k as f32 * -0.13);
            let f = clump_tint(p, &cfg);
            assert!((f - 1.0).abs() <= cfg.clump_tint_strength + 1e-6);
        }
        let seed = crate::grass::clump::seed_position(glam::IVec2::new(2, 2), cfg.clump_size);
        assert_eq!(clump_tint(seed, &cfg), clump_tint(seed + Vec2::splat(0.01), &cfg));
    }

    #[test]
    fn test_shading_normal_faces_camera() {
        let cfg = GrassConfig::default();
        let base = Vec2::new(0.7, -1.1);
        let record = evaluate_blade(base, &cfg, 0.0);
        for camera in [Vec3::new(5.0, 1.5, 0.0), Vec3::new(-5.0, 1.5, 0.0), Vec3::new(0.0, 1.5, -5.0)] {
            let frame = FrameInputs { time: 0.0, camera_position: camera };
            let v = deform_vertex(BladeVertex::new(0.3, 0.4), base, &record, &cfg, &frame);
            let surf = shade_fragment(&v, base, record.placement.dir_to_center, camera, &cfg);
            assert!((surf.normal.length() - 1.0).abs() < 1e-4);
            assert!(surf.normal.is_finite());
        }
    }

    #[test]
    fn test_lighting_is_finite_and_non_negative() {
        let cfg = GrassConfig::default();
        let lamp = Light::default();
        for n in [Vec3::Y, Vec3::X, Vec3::NEG_Y, Vec3::new(0.3, 0.2, -0.9).normalize()] {
            let surf = SurfaceSample { normal: n, albedo: Vec3::splat(0.3), t: 0.5 };
            let c = light(&surf, Vec3::ZERO, Vec3::new(2.0, 2.0, 2.0), &lamp, &cfg);
            assert!(c.is_finite());
            assert!(c.min_element() >= 0.0);
        }
    }

    #[test]
    fn test_front_lit_brighter_than_back_lit() {
        let cfg = GrassConfig::default();
        let lamp = Light { direction: Vec3::Y, ..Default::default() };
        let camera = Vec3::new(0.0, 3.0, 3.0);
        let front = SurfaceSample { normal: Vec3::Y, albedo: Vec3::splat(0.3), t: 0.5 };
        let back = SurfaceSample { normal: Vec3::NEG_Y, ..front };
        let a = light(&front, Vec3::ZERO, camera, &lamp, &cfg);
        let b = light(&back, Vec3::ZERO, camera, &lamp, &cfg);
        assert!(a.length() > b.length());
        // Translucency lets some light through.
        assert!(b.length() > (front.albedo * lamp.ambient).length());
    }

    #[test]
    fn test_emissive_adds_light() {
        let cfg = GrassConfig { emissive: [1.0, 0.0, 0.0], emissive_intensity: 2.0, ..Default::default() };
        let dark = Light { intensity: 0.0, ambient: 0.0, ..Default::default() };
        let surf = SurfaceSample { normal: Vec3::Y, albedo: Vec3::splat(0.3), t: 0.5 };
        let c = light(&surf, Vec3::ZERO, Vec3::new(0.0, 2.0, 1.0), &dark, &cfg);
        assert!((c - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-6);
    }
}
