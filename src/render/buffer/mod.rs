//! GPU buffer management

pub mod camera_buffer;
pub mod grass_buffers;

pub use camera_buffer::{CameraBuffer, CameraUniform};
pub use grass_buffers::{blade_instance_layout, blade_vertex_layout, GrassUniformBuffer, InstanceBuffer, MeshBuffer};
