//! Sward - GPU procedural grass field
//!
//! Blades are placed on a jittered grid, grouped into clumps by a
//! jittered-cell nearest-seed search, given per-blade shape and motion
//! parameters by an offscreen compute pass, and bent into wind-animated
//! Bézier spines in the vertex stage.

pub mod core;
pub mod grass;
pub mod render;
