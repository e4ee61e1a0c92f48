//! Blade deformer.
//!
//! CPU mirror of `vs_main` in blade.wgsl: rebuilds the spine from a
//! parameter record, bends it with wind, evaluates it at the vertex height,
//! spreads the width, turns the blade to its facing angle and applies the
//! view-dependent thickness correction. Everything here is a pure function
//! of its arguments.

use glam::{Quat, Vec2, Vec3};

use super::config::GrassConfig;
use super::hash::{mix, smoothstep};
use super::mesh::BladeVertex;
use super::pass::BladeRecord;
use super::spine::Spine;
use super::wind::{sway_offset, wind_direction};

/// Steady wind push relative to the sway term.
pub const PUSH_SCALE: f32 = 0.6;
/// Reference axis for frame construction (the blade's bend axis).
pub const FRAME_REFERENCE: Vec3 = Vec3::Z;
/// Substitute reference when the tangent runs along [`FRAME_REFERENCE`].
pub const FRAME_FALLBACK: Vec3 = Vec3::NEG_Y;
/// Cross-product magnitude below which the reference counts as parallel.
pub const FRAME_EPSILON: f32 = 1e-3;
/// Tangent used when the spine derivative vanishes.
pub const DEFAULT_TANGENT: Vec3 = Vec3::Y;

/// Edge-on factor at which the thickness push starts.
const THICKNESS_EDGE_START: f32 = 0.5;
/// Height below which the thickness push fades out toward the root.
const THICKNESS_ROOT_FADE: f32 = 0.35;

/// Period, in seconds, at which the wind clock is rebased.
///
/// Keeps `time` small enough that f32 resolves well under a millisecond; the
/// wind field jumps once per period.
pub const WIND_CLOCK_PERIOD: f64 = 4096.0;

/// Per-frame inputs shared by every vertex.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameInputs {
    pub time: f32,
    pub camera_position: Vec3,
}

impl FrameInputs {
    /// Build frame inputs from an unbounded host clock in seconds.
    ///
    /// The clock is reduced modulo [`WIND_CLOCK_PERIOD`] in f64 before it is
    /// narrowed, so wind motion keeps its resolution after hours of uptime.
    pub fn from_clock(clock_secs: f64, camera_position: Vec3) -> Self {
        Self {
            time: clock_secs.rem_euclid(WIND_CLOCK_PERIOD) as f32,
            camera_position,
        }
    }
}

/// Orthonormal frame along the spine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BladeFrame {
    pub tangent: Vec3,
    /// Across the blade width.
    pub side: Vec3,
    /// Face normal, on the bend side for an upright blade.
    pub normal: Vec3,
}

impl BladeFrame {
    /// Build a frame from an unnormalized spine derivative.
    pub fn from_tangent(derivative: Vec3) -> Self {
        let len = derivative.length();
        let tangent = if len > 1e-6 && len.is_finite() {
            derivative / len
        } else {
            DEFAULT_TANGENT
        };

        let mut side = tangent.cross(FRAME_REFERENCE);
        if side.length() < FRAME_EPSILON {
            side = tangent.cross(FRAME_FALLBACK);
        }
        let side = side.normalize();
        let normal = side.cross(tangent);

        Self { tangent, side, normal }
    }
}

/// Output of the deformer for one vertex.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DeformedVertex {
    /// World position after the thickness correction.
    pub position: Vec3,
    pub normal: Vec3,
    pub side: Vec3,
    pub tangent: Vec3,
    pub t: f32,
    pub s: f32,
    /// Half-width actually applied at this height.
    pub width: f32,
}

/// Width multiplier along the blade: 1 at the root, 0 at the tip.
pub fn width_profile(t: f32, taper: f32) -> f32 {
    (1.0 - t.clamp(0.0, 1.0).powf(taper)).max(0.0)
}

/// Fraction of blades kept at camera distance `distance`.
pub fn lod_keep(distance: f32, cfg: &GrassConfig) -> f32 {
    if distance <= cfg.lod_start {
        return 1.0;
    }
    let span = cfg.lod_end - cfg.lod_start;
    let k = if span > 0.0 {
        ((distance - cfg.lod_start) / span).clamp(0.0, 1.0)
    } else {
        1.0
    };
    mix(1.0, cfg.lod_min_keep, k)
}

/// Whether a blade with `lod_seed` survives thinning at `distance`.
pub fn lod_visible(lod_seed: f32, distance: f32, cfg: &GrassConfig) -> bool {
    lod_seed < lod_keep(distance, cfg)
}

/// Tip displacement from wind in blade-local space.
///
/// Steady push plus sway, both scaled by the configured strength, so a zero
/// strength yields an exact zero vector.
pub fn wind_displacement(base: Vec2, record: &BladeRecord, cfg: &GrassConfig, time: f32) -> Vec3 {
    let dir = wind_direction(cfg);
    let local = Quat::from_rotation_y(-record.motion.facing) * Vec3::new(dir.x, 0.0, dir.y);
    let push = record.motion.wind_sample * PUSH_SCALE;
    let sway = sway_offset(base, record.motion.phase, time, cfg);
    local * ((push + sway) * cfg.wind_strength * record.shape.height)
}

/// Spine of the blade with wind applied to its control points.
///
/// The root stays put; control point `k` of `n` moves by `(k / n)²` of the
/// tip displacement.
pub fn deformed_spine(base: Vec2, record: &BladeRecord, cfg: &GrassConfig, time: f32) -> Spine {
    let mut spine = Spine::new(record.shape.kind, record.shape.height, record.shape.bend);
    let offset = wind_displacement(base, record, cfg, time);
    let points = spine.control_points_mut();
    let n = (points.len() - 1) as f32;
    for (k, p) in points.iter_mut().enumerate().skip(1) {
        let w = k as f32 / n;
        *p += offset * (w * w);
    }
    spine
}

/// Outward push along the normal for blades seen edge-on.
pub fn thickness_offset(normal: Vec3, to_camera: Vec3, t: f32, s: f32, width: f32, cfg: &GrassConfig) -> Vec3 {
    let n = Vec2::new(normal.x, normal.z);
    let v = Vec2::new(to_camera.x, to_camera.z);
    let (nl, vl) = (n.length(), v.length());
    if nl < 1e-6 || vl < 1e-6 {
        return Vec3::ZERO;
    }
    let facing = n.dot(v) / (nl * vl);
    let edge_on = 1.0 - facing.abs();
    let mask = smoothstep(THICKNESS_EDGE_START, 1.0, edge_on) * smoothstep(0.0, THICKNESS_ROOT_FADE, t);
    let toward = if facing >= 0.0 { 1.0 } else { -1.0 };
    normal * (toward * s.abs() * width * cfg.thickness_strength * mask)
}

/// Deform one mesh vertex of the blade rooted at `base`.
pub fn deform_vertex(
    vertex: BladeVertex,
    base: Vec2,
    record: &BladeRecord,
    cfg: &GrassConfig,
    frame: &FrameInputs,
) -> DeformedVertex {
    let t = vertex.t.clamp(0.0, 1.0);
    let s = vertex.s.clamp(-1.0, 1.0);

    let spine = deformed_spine(base, record, cfg, frame.time);
    let local = BladeFrame::from_tangent(spine.derivative(t));

    let root = Vec3::new(base.x, 0.0, base.y);
    let keep = if lod_visible(record.motion.lod_seed, (frame.camera_position - root).length(), cfg) {
        1.0
    } else {
        0.0
    };
    let width = record.shape.width * width_profile(t, cfg.tip_taper) * record.placement.presence * keep;

    let rotation = Quat::from_rotation_y(record.motion.facing);
    let spread = spine.point(t) + local.side * (s * width);
    let position = root + rotation * spread;
    let normal = rotation * local.normal;

    let thickness = thickness_offset(normal, frame.camera_position - position, t, s, width, cfg);

    DeformedVertex {
        position: position + thickness,
        normal,
        side: rotation * local.side,
        tangent: rotation * local.tangent,
        t,
        s,
        width,
    }
}
