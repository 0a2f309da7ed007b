//! CPU-only rendering backend
//!
//! [`HeadlessRenderer`] keeps "GPU" buffers in memory and records every
//! upload and bind. Tools use it to inspect the packed light block without a
//! device; it can also be told to fail allocations or uploads so retry paths
//! can be exercised.

use crate::foundation::collections::{BufferKey, HandleMap, MeshKey, TextureKey};
use crate::render::primitives::Mesh;
use crate::render::resources::{Shader, ShaderId, ShaderManager, UniformBlock};
use crate::render::RenderError;

use super::render_backend::{BackendResult, MeshHandle, Renderer, TextureHandle, UniformBufferHandle};

/// One recorded bind call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindRecord {
    /// Buffer bound, `None` for blocks without a GPU buffer
    pub buffer: Option<UniformBufferHandle>,
    /// Binding point
    pub binding: u32,
    /// Block name
    pub block_name: String,
    /// Shader bound to
    pub shader: ShaderId,
}

/// In-memory backend
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    shaders: ShaderManager,
    buffers: HandleMap<BufferKey, Vec<u8>>,
    meshes: HandleMap<MeshKey, usize>,
    textures: HandleMap<TextureKey, usize>,
    binds: Vec<BindRecord>,
    uploads: usize,
    fail_allocations: bool,
    fail_uploads: bool,
}

impl HeadlessRenderer {
    /// Create an empty backend
    pub fn new() -> Self {
        Self {
            shaders: ShaderManager::new(),
            ..Self::default()
        }
    }

    /// Mutable access to the shader registry
    pub fn shaders_mut(&mut self) -> &mut ShaderManager {
        &mut self.shaders
    }

    /// Make every following allocation fail (or succeed again)
    pub fn set_fail_allocations(&mut self, fail: bool) {
        self.fail_allocations = fail;
    }

    /// Make every following upload fail (or succeed again)
    pub fn set_fail_uploads(&mut self, fail: bool) {
        self.fail_uploads = fail;
    }

    /// Contents of a GPU uniform buffer as floats
    pub fn buffer_floats(&self, handle: UniformBufferHandle) -> Option<Vec<f32>> {
        self.buffers
            .get(handle.0)
            .map(|bytes| bytes.chunks_exact(4).map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]])).collect())
    }

    /// Number of live GPU uniform buffers
    pub fn live_buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Number of successful uploads so far
    pub fn upload_count(&self) -> usize {
        self.uploads
    }

    /// Bind calls in order
    pub fn binds(&self) -> &[BindRecord] {
        &self.binds
    }

    /// Number of mesh buffer sets created or refreshed
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Number of shadow map layers allocated
    pub fn shadow_map_count(&self) -> usize {
        self.textures.len()
    }
}

impl Renderer for HeadlessRenderer {
    fn create_uniform_block(
        &mut self,
        descriptor: &str,
        binding: u32,
        block_name: &str,
        float_count: usize,
    ) -> BackendResult<UniformBlock> {
        if self.fail_allocations {
            return Err(RenderError::ResourceCreationFailed(format!(
                "{block_name}: allocation of {float_count} floats refused"
            )));
        }
        log::debug!("headless: created {block_name} ({descriptor}) with {float_count} floats at binding {binding}");
        Ok(UniformBlock::new(descriptor, binding, block_name, float_count))
    }

    fn upload_uniform_block(&mut self, block: &mut UniformBlock) -> BackendResult<()> {
        if self.fail_uploads {
            return Err(RenderError::BackendError(format!("{}: upload refused", block.block_name())));
        }
        let bytes = block.as_bytes().to_vec();
        match block.gpu_buffer().and_then(|h| self.buffers.get_mut(h.0)) {
            Some(storage) => *storage = bytes,
            None => {
                let key = self.buffers.insert(bytes);
                block.set_gpu_buffer(Some(UniformBufferHandle(key)));
            }
        }
        self.uploads += 1;
        Ok(())
    }

    fn bind_uniform_block(&mut self, block: &UniformBlock, shader: &Shader) -> BackendResult<()> {
        if block.uses_gpu_buffer() && block.gpu_buffer().is_none() {
            return Err(RenderError::RenderingFailed(format!(
                "{}: bound before its first upload",
                block.block_name()
            )));
        }
        self.binds.push(BindRecord {
            buffer: block.gpu_buffer(),
            binding: block.binding(),
            block_name: block.block_name().to_string(),
            shader: shader.id(),
        });
        Ok(())
    }

    fn release_uniform_block(&mut self, handle: UniformBufferHandle) {
        self.buffers.remove(handle.0);
    }

    fn update_mesh_buffers(&mut self, mesh: &mut Mesh) -> BackendResult<()> {
        if self.fail_allocations {
            return Err(RenderError::ResourceCreationFailed("mesh buffers refused".to_string()));
        }
        match mesh.gpu_buffers().filter(|h| self.meshes.contains_key(h.0)) {
            Some(handle) => {
                self.meshes[handle.0] = mesh.vertex_count();
                mesh.set_gpu_buffers(handle);
            }
            None => {
                let key = self.meshes.insert(mesh.vertex_count());
                mesh.set_gpu_buffers(MeshHandle(key));
            }
        }
        Ok(())
    }

    fn create_shadow_map(&mut self, layer: usize) -> BackendResult<TextureHandle> {
        if self.fail_allocations {
            return Err(RenderError::ResourceCreationFailed(format!("shadow map layer {layer} refused")));
        }
        Ok(TextureHandle(self.textures.insert(layer)))
    }

    fn shaders(&self) -> &ShaderManager {
        &self.shaders
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::resources::LIGHT_UBO_INDEX;

    #[test]
    fn test_upload_allocates_once() {
        let mut renderer = HeadlessRenderer::new();
        let mut block = renderer.create_uniform_block("float data", LIGHT_UBO_INDEX, "Test_ubo", 4).unwrap();
        block.use_gpu_buffer(true);
        block.set_at(0, &[1.0, 2.0, 3.0, 4.0]).unwrap();

        block.update_gpu(&mut renderer).unwrap();
        let handle = block.gpu_buffer().unwrap();
        block.set_at(4, &[9.0]).unwrap();
        block.update_gpu(&mut renderer).unwrap();

        assert_eq!(block.gpu_buffer(), Some(handle));
        assert_eq!(renderer.live_buffer_count(), 1);
        assert_eq!(renderer.upload_count(), 2);
        assert_eq!(renderer.buffer_floats(handle), Some(vec![1.0, 9.0, 3.0, 4.0]));
    }

    #[test]
    fn test_failed_upload_keeps_block_dirty() {
        let mut renderer = HeadlessRenderer::new();
        let mut block = renderer.create_uniform_block("float data", LIGHT_UBO_INDEX, "Test_ubo", 4).unwrap();
        renderer.set_fail_uploads(true);

        assert!(block.update_gpu(&mut renderer).is_err());
        assert!(block.is_dirty());

        renderer.set_fail_uploads(false);
        block.update_gpu(&mut renderer).unwrap();
        assert!(!block.is_dirty());
    }

    #[test]
    fn test_bind_before_upload_rejected() {
        let mut renderer = HeadlessRenderer::new();
        let id = renderer.shaders_mut().register(Shader::new("lit"));
        let shader = renderer.shaders().get(id).cloned().unwrap();
        let mut block = renderer.create_uniform_block("float data", LIGHT_UBO_INDEX, "Test_ubo", 4).unwrap();
        block.use_gpu_buffer(true);

        assert!(block.bind_buffer(&shader, &mut renderer).is_err());
        block.update_gpu(&mut renderer).unwrap();
        block.bind_buffer(&shader, &mut renderer).unwrap();
        assert_eq!(renderer.binds().len(), 1);
        assert_eq!(renderer.binds()[0].binding, LIGHT_UBO_INDEX);
    }

    #[test]
    fn test_release_frees_buffer() {
        let mut renderer = HeadlessRenderer::new();
        let mut block = renderer.create_uniform_block("float data", LIGHT_UBO_INDEX, "Test_ubo", 4).unwrap();
        block.update_gpu(&mut renderer).unwrap();
        assert_eq!(renderer.live_buffer_count(), 1);

        block.release(&mut renderer);
        assert_eq!(renderer.live_buffer_count(), 0);
        assert!(block.gpu_buffer().is_none());
    }
}
