//! Wind field: scrolling value noise plus per-blade sway oscillation.
//!
//! Samples are pure functions of (position, time, config). Nothing is
//! integrated over frames, so any frame can be evaluated in isolation.

use std::f32::consts::TAU;

use glam::Vec2;

use super::clump::safe_normalize2;
use super::config::GrassConfig;
use super::hash::{mix, salt, value_noise};

/// Substitute for a zero-length configured wind direction.
pub const DEFAULT_WIND_DIRECTION: Vec2 = Vec2::X;

/// Weight of the low-frequency octave in the strength sample.
const BASE_OCTAVE: f32 = 0.65;
/// Lattice scale of the detail octave relative to the base octave.
const DETAIL_SCALE: f32 = 2.03;
/// Ratio of the flutter frequency to the main sway frequency.
const FLUTTER_RATIO: f32 = 3.7;
/// Flutter amplitude relative to the main sway.
const FLUTTER_AMPLITUDE: f32 = 0.25;
/// Speed of gust fronts relative to the wind speed.
const GUST_RATE: f32 = 0.5;

/// Ephemeral wind sample at one position and time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WindSample {
    /// Unit XZ wind direction.
    pub direction: Vec2,
    /// Local strength in [0, 1]; the configured strength is applied later.
    pub strength: f32,
}

/// Configured wind direction as a unit vector.
pub fn wind_direction(cfg: &GrassConfig) -> Vec2 {
    safe_normalize2(Vec2::from(cfg.wind_dir), DEFAULT_WIND_DIRECTION)
}

/// Sample the scrolling wind field at world position `p`.
pub fn sample_wind(p: Vec2, time: f32, cfg: &GrassConfig) -> WindSample {
    let direction = wind_direction(cfg);
    let scroll = direction * (cfg.wind_speed * time);
    let q = (p - scroll) * cfg.wind_scale;

    let base = value_noise(q, salt::WIND);
    let detail = value_noise(q * DETAIL_SCALE + Vec2::splat(17.0), salt::WIND);
    let strength = (BASE_OCTAVE * base + (1.0 - BASE_OCTAVE) * detail).clamp(0.0, 1.0);

    WindSample { direction, strength }
}

/// Slow gust envelope in [0, 1]; fronts travel downwind.
pub fn gust_envelope(base: Vec2, time: f32, cfg: &GrassConfig) -> f32 {
    let along = base.dot(wind_direction(cfg));
    let wave = (along * cfg.wind_scale * TAU - time * cfg.wind_speed * GUST_RATE).sin();
    0.5 + 0.5 * wave
}

/// Signed sway offset, in units of blade height, before wind strength scaling.
///
/// `phase` in [0, 1) picks both the frequency within the configured band and
/// the phase offset, so blades of one clump drift out of lockstep.
pub fn sway_offset(base: Vec2, phase: f32, time: f32, cfg: &GrassConfig) -> f32 {
    let freq = mix(cfg.sway_freq_min, cfg.sway_freq_max, phase);
    let gust = gust_envelope(base, time, cfg);
    let primary = (time * freq * TAU + phase * TAU).sin();
    let flutter = (time * freq * FLUTTER_RATIO * TAU + phase * TAU * 5.3).sin() * FLUTTER_AMPLITUDE;
    (gust * primary + flutter) * cfg.sway_strength
}
