//! Instance layout and addressing.
//!
//! `InstanceAddressing` is the single source of truth for how an instance
//! index maps to a grid cell and to a parameter texel. The layout generator
//! and the parameter pass both go through it; the GPU pass additionally reads
//! positions from the buffer built here instead of regenerating them.

use bytemuck::{Pod, Zeroable};
use glam::{UVec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};
use super::hash::{hash3, salt, unit_float};

/// Largest grid side; keeps N at or below 65536 instances.
pub const MAX_GRID_SIZE: u32 = 256;

/// Shape of the blade field (fixed for the lifetime of a field).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldLayout {
    /// Blades per side; N = grid_size².
    pub grid_size: u32,
    /// World extent of the whole field along X and Z.
    pub patch_size: f32,
    /// Jitter as a fraction of the cell spacing, in [0, 1].
    pub jitter: f32,
    pub seed: u32,
}

impl Default for FieldLayout {
    fn default() -> Self {
        Self {
            grid_size: 256,
            patch_size: 20.0,
            jitter: 0.4,
            seed: 0x5EED,
        }
    }
}

impl FieldLayout {
    /// Reject layouts the pipeline cannot hold.
    pub fn validate(&self) -> Result<()> {
        if self.grid_size == 0 || self.grid_size > MAX_GRID_SIZE {
            return Err(Error::Layout(format!(
                "grid size {} outside 1..={}",
                self.grid_size, MAX_GRID_SIZE
            )));
        }
        if !(self.patch_size.is_finite() && self.patch_size > 0.0) {
            return Err(Error::Layout(format!("patch size {} must be positive", self.patch_size)));
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(Error::Layout(format!("jitter {} outside [0, 1]", self.jitter)));
        }
        Ok(())
    }

    /// Distance between neighboring grid cells.
    pub fn spacing(&self) -> f32 {
        self.patch_size / self.grid_size as f32
    }
}

/// Index <-> grid cell <-> texel mapping, row-major (z outer, x inner).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InstanceAddressing {
    grid_size: u32,
}

impl InstanceAddressing {
    pub fn new(grid_size: u32) -> Self {
        Self { grid_size }
    }

    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    pub fn instance_count(&self) -> u32 {
        self.grid_size * self.grid_size
    }

    /// Parameter texture extent; one texel per instance.
    pub fn texture_extent(&self) -> UVec2 {
        UVec2::splat(self.grid_size)
    }

    /// Grid cell (and texel) of instance `index`.
    pub fn texel(&self, index: u32) -> UVec2 {
        UVec2::new(index % self.grid_size, index / self.grid_size)
    }

    /// Instance index of grid cell `cell`.
    pub fn index(&self, cell: UVec2) -> u32 {
        cell.y * self.grid_size + cell.x
    }
}

/// Jitter offset of grid cell (ix, iz), each component in [-0.5, 0.5).
pub fn jitter_offset(ix: u32, iz: u32, seed: u32) -> Vec2 {
    Vec2::new(
        unit_float(hash3(ix, iz, seed ^ salt::JITTER_X)) - 0.5,
        unit_float(hash3(ix, iz, seed ^ salt::JITTER_Z)) - 0.5,
    )
}

/// Per-instance record uploaded as both a vertex and a storage buffer.
/// Must match `BladeInstance` in grass_common.wgsl.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuBladeInstance {
    pub base: [f32; 2],
    pub index: u32,
    pub _pad: u32,
}

/// Static placement of every blade: base positions in index order.
#[derive(Clone, Debug)]
pub struct InstanceLayout {
    layout: FieldLayout,
    addressing: InstanceAddressing,
    positions: Vec<Vec2>,
}

impl InstanceLayout {
    /// Generate the jittered grid for `layout`.
    pub fn generate(layout: &FieldLayout) -> Result<Self> {
        layout.validate()?;
        let addressing = InstanceAddressing::new(layout.grid_size);
        let spacing = layout.spacing();
        let origin = -0.5 * layout.patch_size;

        let positions = (0..addressing.instance_count())
            .map(|index| {
                let cell = addressing.texel(index);
                let jitter = jitter_offset(cell.x, cell.y, layout.seed) * layout.jitter;
                let local = cell.as_vec2() + Vec2::splat(0.5) + jitter;
                Vec2::splat(origin) + local * spacing
            })
            .collect();

        log::info!(
            "Generated grass layout: {}x{} = {} blades over {}m",
            layout.grid_size,
            layout.grid_size,
            addressing.instance_count(),
            layout.patch_size
        );

        Ok(Self {
            layout: layout.clone(),
            addressing,
            positions,
        })
    }

    pub fn field(&self) -> &FieldLayout {
        &self.layout
    }

    pub fn addressing(&self) -> InstanceAddressing {
        self.addressing
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Base world position (XZ) of instance `index`.
    pub fn position(&self, index: u32) -> Vec2 {
        self.positions[index as usize]
    }

    pub fn positions(&self) -> &[Vec2] {
        &self.positions
    }

    /// GPU instance records in index order.
    pub fn gpu_instances(&self) -> Vec<GpuBladeInstance> {
        self.positions
            .iter()
            .enumerate()
            .map(|(i, p)| GpuBladeInstance {
                base: p.to_array(),
                index: i as u32,
                _pad: 0,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_layout() -> FieldLayout {
        FieldLayout {
            grid_size: 16,
            patch_size: 8.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_instance_count() {
        let layout = InstanceLayout::generate(&small_layout()).unwrap();
        assert_eq!(layout.len(), 256);
        assert_eq!(layout.addressing().instance_count(), 256);
    }

    #[test]
    fn test_default_fits_texture_limit() {
        let layout = FieldLayout::default();
        assert!(layout.validate().is_ok());
        assert_eq!(InstanceAddressing::new(layout.grid_size).instance_count(), 65_536);
    }

    #[test]
    fn test_addressing_round_trip() {
        let a = InstanceAddressing::new(37);
        for i in 0..a.instance_count() {
            let texel = a.texel(i);
            assert!(texel.x < 37 && texel.y < 37);
            assert_eq!(a.index(texel), i);
        }
    }

    #[test]
    fn test_positions_stay_in_their_cells() {
        let field = small_layout();
        let layout = InstanceLayout::generate(&field).unwrap();
        let spacing = field.spacing();
        let half = field.patch_size * 0.5;
        for i in 0..layout.len() as u32 {
            let cell = layout.addressing().texel(i);
            let p = layout.position(i);
            let center = Vec2::splat(-half) + (cell.as_vec2() + 0.5) * spacing;
            let off = (p - center).abs();
            assert!(off.x <= 0.5 * field.jitter * spacing + 1e-5);
            assert!(off.y <= 0.5 * field.jitter * spacing + 1e-5);
            assert!(p.x.abs() <= half && p.y.abs() <= half);
        }
    }

    #[test]
    fn test_regeneration_is_reproducible() {
        let a = InstanceLayout::generate(&small_layout()).unwrap();
        let b = InstanceLayout::generate(&small_layout()).unwrap();
        assert_eq!(a.positions(), b.positions());
    }

    #[test]
    fn test_zero_jitter_is_regular_grid() {
        let field = FieldLayout { jitter: 0.0, ..small_layout() };
        let layout = InstanceLayout::generate(&field).unwrap();
        assert_eq!(layout.position(0), Vec2::new(-4.0 + 0.25, -4.0 + 0.25));
        assert_eq!(layout.position(1), Vec2::new(-4.0 + 0.75, -4.0 + 0.25));
        assert_eq!(layout.position(16), Vec2::new(-4.0 + 0.25, -4.0 + 0.75));
    }

    #[test]
    fn test_gpu_instances_carry_stable_index() {
        let layout = InstanceLayout::generate(&small_layout()).unwrap();
        let gpu = layout.gpu_instances();
        assert_eq!(std::mem::size_of::<GpuBladeInstance>(), 16);
        for (i, inst) in gpu.iter().enumerate() {
            assert_eq!(inst.index, i as u32);
            assert_eq!(Vec2::from(inst.base), layout.position(i as u32));
        }
    }

    #[test]
    fn test_invalid_layouts_rejected() {
        for field in [
            FieldLayout { grid_size: 0, ..Default::default() },
            FieldLayout { grid_size: 257, ..Default::default() },
            FieldLayout { patch_size: 0.0, ..Default::default() },
            FieldLayout { jitter: 1.5, ..Default::default() },
        ] {
            assert!(matches!(InstanceLayout::generate(&field), Err(Error::Layout(_))));
        }
    }
}
