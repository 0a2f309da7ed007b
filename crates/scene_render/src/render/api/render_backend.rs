//! Backend abstraction traits for the rendering core
//!
//! `LightList` and `RenderData` never talk to a graphics API directly. They
//! allocate, upload and bind through [`Renderer`], which keeps the
//! light/state logic testable without a GPU.

use crate::foundation::collections::{BufferKey, MeshKey, TextureKey};
use crate::render::primitives::Mesh;
use crate::render::resources::{Shader, ShaderManager, UniformBlock};
use crate::render::RenderError;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, RenderError>;

/// Handle to a GPU uniform buffer owned by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct UniformBufferHandle(pub BufferKey);

/// Handle to GPU vertex/index buffers owned by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MeshHandle(pub MeshKey);

/// Handle to a GPU texture owned by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureHandle(pub TextureKey);

/// Rendering backend seam
///
/// Implementations own the GPU objects; this crate only holds handles.
pub trait Renderer {
    /// Create a CPU-side uniform block of `float_count` floats.
    ///
    /// GPU storage is allocated lazily by the first
    /// [`upload_uniform_block`](Self::upload_uniform_block).
    fn create_uniform_block(
        &mut self,
        descriptor: &str,
        binding: u32,
        block_name: &str,
        float_count: usize,
    ) -> BackendResult<UniformBlock>;

    /// Copy the block's floats to its GPU buffer, allocating one if needed
    fn upload_uniform_block(&mut self, block: &mut UniformBlock) -> BackendResult<()>;

    /// Bind the block's buffer to its binding point for `shader`
    fn bind_uniform_block(&mut self, block: &UniformBlock, shader: &Shader) -> BackendResult<()>;

    /// Free a GPU uniform buffer
    fn release_uniform_block(&mut self, handle: UniformBufferHandle);

    /// Create or refresh vertex/index buffers for `mesh`
    fn update_mesh_buffers(&mut self, mesh: &mut Mesh) -> BackendResult<()>;

    /// Allocate a depth texture layer for a shadow-casting light
    fn create_shadow_map(&mut self, layer: usize) -> BackendResult<TextureHandle>;

    /// Registered shaders
    fn shaders(&self) -> &ShaderManager;
}
