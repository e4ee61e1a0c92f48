//! Parameter synthesizer: clump traits and per-blade variation.

use std::f32::consts::{PI, TAU};

use glam::{IVec2, Vec2};

use super::clump::{locate_clump, ClumpSample};
use super::config::GrassConfig;
use super::hash::{hash_cell, hash_position, mix, salt, smoothstep};

/// Spine style of a blade; decides where along the curve the bend sits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum BladeType {
    /// Quadratic arc, bend spread evenly.
    Arc = 0,
    /// Cubic, bend concentrated near the root.
    LowBend = 1,
    /// Cubic, bend concentrated near the tip.
    HighBend = 2,
}

impl BladeType {
    pub const COUNT: u32 = 3;

    /// Quantize a hash in [0, 1) into one of the three buckets.
    pub fn from_hash(h: f32) -> Self {
        Self::from_index((h * Self::COUNT as f32) as u32)
    }

    /// Decode a stored type; out-of-range values saturate to the last style.
    pub fn from_index(i: u32) -> Self {
        match i {
            0 => Self::Arc,
            1 => Self::LowBend,
            _ => Self::HighBend,
        }
    }

    /// Decode the float channel of a parameter texel.
    pub fn from_texel(v: f32) -> Self {
        Self::from_index(v.max(0.0).round() as u32)
    }

    pub fn as_f32(self) -> f32 {
        self as u32 as f32
    }
}

/// Clump-level attributes, recomputed from the cell id whenever needed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClumpTraits {
    pub base_height: f32,
    pub base_width: f32,
    pub base_bend: f32,
    pub kind: BladeType,
    /// Shared yaw offset in [-PI, PI).
    pub yaw_bias: f32,
}

/// Derive a clump's base shape from its cell id.
pub fn clump_traits(cell: IVec2, cfg: &GrassConfig) -> ClumpTraits {
    ClumpTraits {
        base_height: mix(cfg.blade_height_min, cfg.blade_height_max, hash_cell(cell, salt::CLUMP_HEIGHT)),
        base_width: mix(cfg.blade_width_min, cfg.blade_width_max, hash_cell(cell, salt::CLUMP_WIDTH)),
        base_bend: mix(cfg.bend_amount_min, cfg.bend_amount_max, hash_cell(cell, salt::CLUMP_BEND)),
        kind: BladeType::from_hash(hash_cell(cell, salt::CLUMP_TYPE)),
        yaw_bias: (hash_cell(cell, salt::CLUMP_YAW) * 2.0 - 1.0) * PI,
    }
}

/// Per-blade shape after intra-clump variation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BladeShape {
    pub height: f32,
    pub width: f32,
    pub bend: f32,
    pub kind: BladeType,
}

/// Clump-relative placement and orientation of a blade.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BladePlacement {
    /// Unit XZ direction from the blade toward its clump seed.
    pub dir_to_center: Vec2,
    /// Density falloff in [0, 1].
    pub presence: f32,
    /// Facing angle in [0, TAU) before any wind bias.
    pub base_facing: f32,
}

/// Everything the synthesizer derives for one blade position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BladeSynthesis {
    pub clump: ClumpSample,
    pub traits: ClumpTraits,
    pub shape: BladeShape,
    pub placement: BladePlacement,
}

/// Wrap any finite angle into [0, TAU).
pub fn normalize_angle(a: f32) -> f32 {
    let r = a.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if r >= TAU { 0.0 } else { r }
}

/// Wrap an angle difference into [-PI, PI).
pub fn wrap_pi(a: f32) -> f32 {
    normalize_angle(a + PI) - PI
}

/// Yaw that turns the blade's local +Z (its bend side) onto `dir`.
pub fn yaw_toward(dir: Vec2) -> f32 {
    dir.x.atan2(dir.y)
}

/// Presence falloff over normalized distance to the clump seed.
pub fn presence(distance: f32, clump_radius: f32, edge_start: f32) -> f32 {
    (1.0 - smoothstep(edge_start, 1.0, distance / clump_radius)).clamp(0.0, 1.0)
}

/// Scale `base` by a factor drawn from `[1 - r, 1 + r]`.
fn vary(base: f32, r: f32, h: f32) -> f32 {
    base * mix(1.0 - r, 1.0 + r, h)
}

/// Derive shape and placement for the blade rooted at `p`.
pub fn synthesize(p: Vec2, cfg: &GrassConfig) -> BladeSynthesis {
    let clump = locate_clump(p, cfg.clump_size);
    let traits = clump_traits(clump.cell, cfg);
    let r = cfg.randomness();

    let shape = BladeShape {
        height: vary(traits.base_height, r.x, hash_position(p, salt::BLADE_HEIGHT)).max(0.0),
        width: vary(traits.base_width, r.y, hash_position(p, salt::BLADE_WIDTH)).max(0.0),
        bend: vary(traits.base_bend, r.z, hash_position(p, salt::BLADE_BEND)),
        kind: traits.kind,
    };

    let dir_to_center = clump.direction_from(p);
    // Blades lean away from the seed, so face the outward direction.
    let center_angle = yaw_toward(-dir_to_center);
    let blade_offset = (hash_position(p, salt::BLADE_YAW) - 0.5) * TAU;
    let base_facing = normalize_angle(
        center_angle * cfg.center_yaw + blade_offset * cfg.blade_yaw + traits.yaw_bias * cfg.clump_yaw,
    );

    BladeSynthesis {
        clump,
        traits,
        shape,
        placement: BladePlacement {
            dir_to_center,
            presence: presence(clump.distance, cfg.clump_radius, cfg.clump_edge_start),
            base_facing,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grass::clump::seed_position;

    #[test]
    fn test_clump_traits_are_idempotent() {
        let cfg = GrassConfig::default();
        let cell = IVec2::new(5, -9);
        assert_eq!(clump_traits(cell, &cfg), clump_traits(cell, &cfg));
    }

    #[test]
    fn test_clump_traits_within_bounds() {
        let cfg = GrassConfig::default();
        for x in -20..20 {
            for z in -20..20 {
                let t = clump_traits(IVec2::new(x, z), &cfg);
                assert!(t.base_height >= cfg.blade_height_min && t.base_height <= cfg.blade_height_max);
                assert!(t.base_width >= cfg.blade_width_min && t.base_width <= cfg.blade_width_max);
                assert!(t.base_bend >= cfg.bend_amount_min && t.base_bend <= cfg.bend_amount_max);
                assert!((-PI..PI).contains(&t.yaw_bias));
            }
        }
    }

    #[test]
    fn test_all_blade_types_occur() {
        let cfg = GrassConfig::default();
        let mut seen = [false; 3];
        for x in 0..64 {
            seen[clump_traits(IVec2::new(x, 0), &cfg).kind as usize] = true;
        }
        assert_eq!(seen, [true; 3]);
    }

    #[test]
    fn test_type_quantization() {
        assert_eq!(BladeType::from_hash(0.0), BladeType::Arc);
        assert_eq!(BladeType::from_hash(0.34), BladeType::LowBend);
        assert_eq!(BladeType::from_hash(0.999_999), BladeType::HighBend);
        assert_eq!(BladeType::from_texel(2.0), BladeType::HighBend);
        assert_eq!(BladeType::from_texel(7.0), BladeType::HighBend);
    }

    #[test]
    fn test_presence_monotonic_and_bounded() {
        let radius = 1.5;
        let mut prev = presence(0.0, radius, 0.6);
        assert!((prev - 1.0).abs() < 1e-6);
        for i in 1..=300 {
            let d = i as f32 * 0.01;
            let p = presence(d, radius, 0.6);
            assert!(p <= prev + 1e-7, "presence rose at d={d}");
            assert!((0.0..=1.0).contains(&p));
            prev = p;
        }
        assert_eq!(presence(radius, radius, 0.6), 0.0);
        assert_eq!(presence(radius * 2.0, radius, 0.6), 0.0);
    }

    #[test]
    fn test_normalize_angle_range() {
        for a in [-1e-9_f32, -TAU, -3.0 * TAU - 0.1, 0.0, TAU, 100.0, -100.0, TAU - 1e-7] {
            let n = normalize_angle(a);
            assert!((0.0..TAU).contains(&n), "{a} -> {n}");
        }
    }

    #[test]
    fn test_wrap_pi_range() {
        for a in [-10.0_f32, -PI, 0.0, PI, 3.0 * PI, 7.5] {
            let w = wrap_pi(a);
            assert!((-PI..PI).contains(&w) || (w - PI).abs() < 1e-6, "{a} -> {w}");
        }
    }

    #[test]
    fn test_facing_angle_always_normalized() {
        let cfg = GrassConfig {
            center_yaw: 3.7,
            blade_yaw: -2.2,
            clump_yaw: 4.0,
            ..Default::default()
        };
        for k in 0..2_000 {
            let p = Vec2::new((k % 50) as f32 * 0.37 - 9.0, (k / 50) as f32 * 0.41 - 8.0);
            let s = synthesize(p, &cfg);
            assert!((0.0..TAU).contains(&s.placement.base_facing));
        }
    }

    #[test]
    fn test_scenario_blade_on_clump_seed() {
        let cfg = GrassConfig {
            clump_size: 0.8,
            clump_radius: 1.5,
            ..Default::default()
        };
        let cell = IVec2::new(2, 3);
        let p = seed_position(cell, cfg.clump_size);

        let s = synthesize(p, &cfg);
        assert_eq!(s.clump.cell, cell);
        assert!(s.clump.distance < 1e-4);
        assert!((s.placement.presence - 1.0).abs() < 1e-6);

        let again = synthesize(p, &cfg);
        assert_eq!(s.shape, again.shape);
        assert_eq!(s.shape.kind, clump_traits(cell, &cfg).kind);
    }

    #[test]
    fn test_scenario_zero_randomness_collapses_clump() {
        let cfg = GrassConfig {
            blade_randomness: [0.0, 0.0, 0.0],
            ..Default::default()
        };
        let cell = IVec2::new(-4, 6);
        let center = seed_position(cell, cfg.clump_size);

        let mut shapes = Vec::new();
        for k in 0..40 {
            let angle = k as f32 * 0.61;
            let p = center + Vec2::new(angle.cos(), angle.sin()) * 0.01 * (k % 5 + 1) as f32;
            let s = synthesize(p, &cfg);
            if s.clump.cell == cell {
                shapes.push(s.shape);
            }
        }
        assert!(shapes.len() > 10);
        let first = shapes[0];
        for shape in &shapes {
            assert_eq!(shape.height, first.height);
            assert_eq!(shape.width, first.width);
            assert_eq!(shape.bend, first.bend);
        }
        let traits = clump_traits(cell, &cfg);
        assert_eq!(first.height, traits.base_height);
    }

    #[test]
    fn test_randomness_bounds_variation() {
        let cfg = GrassConfig::default();
        let r = cfg.randomness();
        for k in 0..500 {
            let p = Vec2::new(k as f32 * 0.173, (k as f32 * 0.5).sin() * 3.0);
            let s = synthesize(p, &cfg);
            let h = s.traits.base_height;
            assert!(s.shape.height >= h * (1.0 - r.x) - 1e-6);
            assert!(s.shape.height <= h * (1.0 + r.x) + 1e-6);
        }
    }

    #[test]
    fn test_neighbors_differ() {
        let cfg = GrassConfig::default();
        let center = seed_position(IVec2::new(1, 1), cfg.clump_size);
        let a = synthesize(center + Vec2::new(0.01, 0.0), &cfg);
        let b = synthesize(center + Vec2::new(0.02, 0.0), &cfg);
        assert_eq!(a.clump.cell, b.clump.cell);
        assert_ne!(a.shape.height, b.shape.height);
    }
}
