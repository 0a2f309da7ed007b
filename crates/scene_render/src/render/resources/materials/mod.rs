//! Material system
//!
//! Materials are shared between passes (and between copies of a render
//! data), so they are handed around as [`MaterialRef`].

pub mod shader_data;

use std::sync::Arc;

use parking_lot::RwLock;

pub use shader_data::{ShaderData, UniformValue, PayloadState, MaterialError, MaterialResult, MAIN_TEXTURE};

/// Shared, lockable material
pub type MaterialRef = Arc<RwLock<ShaderData>>;

/// Wrap a material for sharing
pub fn shared(material: ShaderData) -> MaterialRef {
    Arc::new(RwLock::new(material))
}
