//! Rendering resources
//!
//! CPU-side objects that mirror GPU resources: uniform blocks, shaders and
//! materials.

pub mod materials;
pub mod shader;
pub mod uniform_block;

pub use materials::{ShaderData, MaterialRef, MaterialError, UniformValue};
pub use shader::{Shader, ShaderId, ShaderManager};
pub use uniform_block::{UniformBlock, GpuSync, BONES_UBO_INDEX, LIGHT_UBO_INDEX, MATERIAL_UBO_INDEX, TRANSFORM_UBO_INDEX};
