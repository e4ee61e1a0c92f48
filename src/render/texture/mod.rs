//! GPU textures owned by the grass renderer

pub mod depth;
pub mod param_textures;

pub use depth::{DepthTexture, ShadowMap, DEPTH_FORMAT};
pub use param_textures::{ParamTextures, PARAM_FORMAT};
