//! Deterministic hashing and value noise.
//!
//! Every random-looking quantity in the grass field comes from these
//! functions, keyed by integer cell coordinates or raw float bits. There is
//! no generator state: the same key always yields the same value, on the CPU
//! and in `grass_common.wgsl` alike.

use glam::{IVec2, Vec2};

/// Salts that decorrelate hashes drawn from the same key.
pub mod salt {
    pub const SEED_X: u32 = 0x68E3_1DA4;
    pub const SEED_Y: u32 = 0xB529_7A4D;
    pub const CLUMP_HEIGHT: u32 = 0x1B56_C4E9;
    pub const CLUMP_WIDTH: u32 = 0x7F4A_7C15;
    pub const CLUMP_BEND: u32 = 0x2545_F491;
    pub const CLUMP_TYPE: u32 = 0x9E37_79B9;
    pub const CLUMP_YAW: u32 = 0x85EB_CA6B;
    pub const CLUMP_TINT: u32 = 0xC2B2_AE35;
    pub const BLADE_HEIGHT: u32 = 0x27D4_EB2F;
    pub const BLADE_WIDTH: u32 = 0x1656_67B1;
    pub const BLADE_BEND: u32 = 0xD3A2_646C;
    pub const BLADE_YAW: u32 = 0xFD70_46C5;
    pub const PHASE: u32 = 0xB55A_4F09;
    pub const LOD: u32 = 0x5851_F42D;
    pub const WIND: u32 = 0x4C95_7F2D;
    pub const JITTER_X: u32 = 0x3C6E_F372;
    pub const JITTER_Z: u32 = 0xA54F_F53A;
}

/// PCG-style integer permutation.
#[inline]
pub fn hash_u32(x: u32) -> u32 {
    let state = x.wrapping_mul(747_796_405).wrapping_add(2_891_336_453);
    let word = ((state >> ((state >> 28) + 4)) ^ state).wrapping_mul(277_803_737);
    (word >> 22) ^ word
}

/// Hash three words into one.
#[inline]
pub fn hash3(a: u32, b: u32, c: u32) -> u32 {
    hash_u32(a ^ hash_u32(b ^ hash_u32(c)))
}

/// Map a hash to [0, 1) using its top 24 bits (exact in f32).
#[inline]
pub fn unit_float(h: u32) -> f32 {
    (h >> 8) as f32 * (1.0 / 16_777_216.0)
}

/// Hash an integer cell in [0, 1).
#[inline]
pub fn hash_cell(cell: IVec2, salt: u32) -> f32 {
    unit_float(hash3(cell.x as u32, cell.y as u32, salt))
}

/// Bits of `v` with -0.0 folded onto +0.0.
#[inline]
fn canonical_bits(v: f32) -> u32 {
    if v == 0.0 { 0 } else { v.to_bits() }
}

/// Hash a raw float position in [0, 1).
///
/// Keyed by the exact bit pattern, so two blades at the same position always
/// agree while any neighbor, however close, decorrelates.
#[inline]
pub fn hash_position(p: Vec2, salt: u32) -> f32 {
    unit_float(hash3(canonical_bits(p.x), canonical_bits(p.y), salt))
}

#[inline]
pub(crate) fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[inline]
pub(crate) fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Smooth 2D value noise in [0, 1] with one lattice point per unit.
pub fn value_noise(p: Vec2, salt: u32) -> f32 {
    let cell = p.floor();
    let f = p - cell;
    let ix = cell.x as i32;
    let iz = cell.y as i32;

    // Smoothstep for C1 continuity
    let u = f * f * (Vec2::splat(3.0) - 2.0 * f);

    let h00 = hash_cell(IVec2::new(ix, iz), salt);
    let h10 = hash_cell(IVec2::new(ix + 1, iz), salt);
    let h01 = hash_cell(IVec2::new(ix, iz + 1), salt);
    let h11 = hash_cell(IVec2::new(ix + 1, iz + 1), salt);

    let a = mix(h00, h10, u.x);
    let b = mix(h01, h11, u.x);
    mix(a, b, u.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_float_range() {
        assert_eq!(unit_float(0), 0.0);
        assert!(unit_float(u32::MAX) < 1.0);
        for i in 0..10_000u32 {
            let v = unit_float(hash_u32(i));
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_hash_is_deterministic() {
        let c = IVec2::new(-7, 12);
        assert_eq!(hash_cell(c, salt::CLUMP_HEIGHT), hash_cell(c, salt::CLUMP_HEIGHT));
        let p = Vec2::new(3.25, -1.5);
        assert_eq!(hash_position(p, salt::PHASE), hash_position(p, salt::PHASE));
    }

    #[test]
    fn test_salts_decorrelate() {
        let c = IVec2::new(4, 9);
        let a = hash_cell(c, salt::CLUMP_HEIGHT);
        let b = hash_cell(c, salt::CLUMP_WIDTH);
        assert_ne!(a, b);
    }

    #[test]
    fn test_negative_zero_matches_zero() {
        assert_eq!(
            hash_position(Vec2::new(-0.0, 1.0), salt::PHASE),
            hash_position(Vec2::new(0.0, 1.0), salt::PHASE),
        );
    }

    #[test]
    fn test_hash_mean_is_centered() {
        let n = 20_000;
        let sum: f32 = (0..n).map(|i| hash_cell(IVec2::new(i, i * 3), salt::PHASE)).sum();
        let mean = sum / n as f32;
        assert!((mean - 0.5).abs() < 0.02, "mean {mean}");
    }

    #[test]
    fn test_value_noise_range_and_continuity() {
        let mut prev = value_noise(Vec2::new(0.0, 0.37), salt::WIND);
        for i in 1..2_000 {
            let p = Vec2::new(i as f32 * 0.005, 0.37);
            let v = value_noise(p, salt::WIND);
            assert!((0.0..=1.0).contains(&v));
            assert!((v - prev).abs() < 0.05, "jump at {p}");
            prev = v;
        }
    }

    #[test]
    fn test_value_noise_hits_lattice() {
        let p = Vec2::new(3.0, -2.0);
        assert_eq!(value_noise(p, salt::WIND), hash_cell(IVec2::new(3, -2), salt::WIND));
    }

    #[test]
    fn test_smoothstep_edges() {
        assert_eq!(smoothstep(0.2, 1.0, 0.0), 0.0);
        assert_eq!(smoothstep(0.2, 1.0, 1.5), 1.0);
        assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
    }
}
