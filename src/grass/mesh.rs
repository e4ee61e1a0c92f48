//! Flat blade mesh shared by every instance.
//!
//! A narrow vertical strip in (t, s) space: `segments` rows of two vertices
//! (left and right edge) and one tip vertex. The deformer turns (t, s) into
//! world space, so the mesh itself carries no positions.

use bytemuck::{Pod, Zeroable};

/// Row count used by the renderer.
pub const DEFAULT_SEGMENTS: u32 = 7;

/// Mesh vertex. Must match `@location(0)` of `vs_main` in blade.wgsl.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct BladeVertex {
    /// Height parameter along the blade in [0, 1].
    pub t: f32,
    /// Signed offset across the width in [-1, 1].
    pub s: f32,
}

impl BladeVertex {
    pub fn new(t: f32, s: f32) -> Self {
        Self { t, s }
    }
}

/// Vertex and index data for one blade.
#[derive(Clone, Debug)]
pub struct BladeMesh {
    pub vertices: Vec<BladeVertex>,
    pub indices: Vec<u16>,
}

impl BladeMesh {
    /// Build a strip with `segments` edge rows (at least one) closed by a tip.
    pub fn new(segments: u32) -> Self {
        let segments = segments.max(1);
        let mut vertices = Vec::with_capacity(segments as usize * 2 + 1);
        for row in 0..segments {
            let t = row as f32 / segments as f32;
            vertices.push(BladeVertex::new(t, -1.0));
            vertices.push(BladeVertex::new(t, 1.0));
        }
        vertices.push(BladeVertex::new(1.0, 0.0));

        let mut indices = Vec::with_capacity(Self::index_count_for(segments) as usize);
        for row in 0..segments - 1 {
            let l0 = (row * 2) as u16;
            let r0 = l0 + 1;
            let l1 = l0 + 2;
            let r1 = l0 + 3;
            indices.extend_from_slice(&[l0, r0, l1, r0, r1, l1]);
        }
        let last = ((segments - 1) * 2) as u16;
        let tip = (segments * 2) as u16;
        indices.extend_from_slice(&[last, last + 1, tip]);

        Self { vertices, indices }
    }

    pub fn index_count_for(segments: u32) -> u32 {
        (segments - 1) * 6 + 3
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

impl Default for BladeMesh {
    fn default() -> Self {
        Self::new(DEFAULT_SEGMENTS)
    }
}
