//! Clump locator: jittered-cell nearest-seed search.
//!
//! The plane is cut into square cells of `clump_size`. Each cell owns one
//! seed point at a hashed offset inside it; a position belongs to the clump
//! whose seed is nearest among the 3x3 cells around it.

use glam::{IVec2, Vec2};

use super::hash::{hash_cell, salt};

/// Substitute for a zero-length direction to the clump seed.
pub const DEFAULT_CLUMP_DIRECTION: Vec2 = Vec2::X;

/// Result of locating the clump that owns a position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClumpSample {
    /// Integer coordinates of the owning cell (the clump id).
    pub cell: IVec2,
    /// World position of the owning seed.
    pub center: Vec2,
    /// World distance from the query position to the seed.
    pub distance: f32,
}

impl ClumpSample {
    /// Unit vector from `p` toward the clump seed, or the default when `p` sits on it.
    pub fn direction_from(&self, p: Vec2) -> Vec2 {
        safe_normalize2(self.center - p, DEFAULT_CLUMP_DIRECTION)
    }
}

/// Normalize, substituting `fallback` for vectors too short to carry a direction.
pub fn safe_normalize2(v: Vec2, fallback: Vec2) -> Vec2 {
    let len_sq = v.length_squared();
    if len_sq > 1e-12 && len_sq.is_finite() {
        v / len_sq.sqrt()
    } else {
        fallback
    }
}

/// Seed offset inside `cell`, in cell units, each component in [0, 1).
pub fn cell_seed(cell: IVec2) -> Vec2 {
    Vec2::new(hash_cell(cell, salt::SEED_X), hash_cell(cell, salt::SEED_Y))
}

/// World position of the seed owned by `cell`.
pub fn seed_position(cell: IVec2, clump_size: f32) -> Vec2 {
    (cell.as_vec2() + cell_seed(cell)) * clump_size
}

/// Find the clump owning world position `p`.
///
/// Neighbors are visited row-major (z outer, x inner) and a strictly closer
/// seed is required to replace the current best, so exact ties resolve to
/// the first visited cell.
pub fn locate_clump(p: Vec2, clump_size: f32) -> ClumpSample {
    let g = p / clump_size;
    let base = g.floor();
    let f = g - base;
    let base_cell = IVec2::new(base.x as i32, base.y as i32);

    let mut best = f32::MAX;
    let mut best_cell = base_cell;
    let mut best_seed = Vec2::ZERO;

    for j in -1..=1 {
        for i in -1..=1 {
            let offset = IVec2::new(i, j);
            let cell = base_cell + offset;
            let seed = offset.as_vec2() + cell_seed(cell);
            let d = (seed - f).length();
            if d < best {
                best = d;
                best_cell = cell;
                best_seed = seed;
            }
        }
    }

    ClumpSample {
        cell: best_cell,
        center: (base + best_seed) * clump_size,
        distance: best * clump_size,
    }
}
