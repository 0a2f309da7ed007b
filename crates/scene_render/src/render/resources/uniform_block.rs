//! CPU-side uniform blocks and their GPU synchronization state
//!
//! A [`UniformBlock`] is a flat array of floats mirrored into one GPU
//! uniform buffer. Writers patch ranges with [`UniformBlock::set_at`]; the
//! block remembers that its GPU copy is stale until
//! [`UniformBlock::update_gpu`] succeeds.

use crate::render::api::{Renderer, UniformBufferHandle};
use crate::render::resources::Shader;
use crate::render::{RenderError, RenderResult};

/// Binding point of the per-object transform block
pub const TRANSFORM_UBO_INDEX: u32 = 0;
/// Binding point of the material block
pub const MATERIAL_UBO_INDEX: u32 = 1;
/// Binding point of the skinning matrix block
pub const BONES_UBO_INDEX: u32 = 2;
/// Binding point of the `Lights_ubo` block
pub const LIGHT_UBO_INDEX: u32 = 3;

const FLOAT_SIZE: usize = std::mem::size_of::<f32>();

/// Whether the GPU copy matches the CPU floats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuSync {
    /// GPU copy is current
    Synced,
    /// CPU floats changed since the last successful upload
    Pending,
}

/// Packed float uniform block
#[derive(Debug)]
pub struct UniformBlock {
    descriptor: String,
    binding: u32,
    block_name: String,
    data: Vec<f32>,
    use_gpu_buffer: bool,
    gpu_buffer: Option<UniformBufferHandle>,
    sync: GpuSync,
}

impl UniformBlock {
    /// Create a zeroed block of `float_count` floats
    pub fn new(descriptor: impl Into<String>, binding: u32, block_name: impl Into<String>, float_count: usize) -> Self {
        Self {
            descriptor: descriptor.into(),
            binding,
            block_name: block_name.into(),
            data: vec![0.0; float_count],
            use_gpu_buffer: false,
            gpu_buffer: None,
            sync: GpuSync::Pending,
        }
    }

    /// Layout descriptor, e.g. `"float lightdata"`
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    /// Shader binding point
    pub fn binding(&self) -> u32 {
        self.binding
    }

    /// Name of the uniform block in shader source
    pub fn block_name(&self) -> &str {
        &self.block_name
    }

    /// Capacity in floats
    pub fn float_count(&self) -> usize {
        self.data.len()
    }

    /// Capacity in bytes
    pub fn total_size(&self) -> usize {
        self.data.len() * FLOAT_SIZE
    }

    /// Back this block with a dedicated GPU buffer instead of loose uniforms
    pub fn use_gpu_buffer(&mut self, flag: bool) {
        self.use_gpu_buffer = flag;
    }

    /// Whether this block is backed by a GPU buffer
    pub fn uses_gpu_buffer(&self) -> bool {
        self.use_gpu_buffer
    }

    /// Backend buffer, once the first upload allocated one
    pub fn gpu_buffer(&self) -> Option<UniformBufferHandle> {
        self.gpu_buffer
    }

    /// Record the backend buffer that mirrors this block
    pub fn set_gpu_buffer(&mut self, handle: Option<UniformBufferHandle>) {
        self.gpu_buffer = handle;
    }

    /// True when CPU floats changed since the last successful upload
    pub fn is_dirty(&self) -> bool {
        self.sync == GpuSync::Pending
    }

    /// Copy `values` into the block starting at `byte_offset`
    pub fn set_at(&mut self, byte_offset: usize, values: &[f32]) -> RenderResult<()> {
        if byte_offset % FLOAT_SIZE != 0 {
            return Err(RenderError::RenderingFailed(format!(
                "{}: offset {byte_offset} is not float aligned",
                self.block_name
            )));
        }
        let start = byte_offset / FLOAT_SIZE;
        let end = start + values.len();
        if end > self.data.len() {
            return Err(RenderError::RenderingFailed(format!(
                "{}: write of {} floats at float {start} exceeds capacity {}",
                self.block_name,
                values.len(),
                self.data.len()
            )));
        }
        self.data[start..end].copy_from_slice(values);
        self.sync = GpuSync::Pending;
        Ok(())
    }

    /// Read `count` floats starting at `byte_offset`
    pub fn floats_at(&self, byte_offset: usize, count: usize) -> Option<&[f32]> {
        if byte_offset % FLOAT_SIZE != 0 {
            return None;
        }
        let start = byte_offset / FLOAT_SIZE;
        self.data.get(start..start + count)
    }

    /// All floats in the block
    pub fn as_floats(&self) -> &[f32] {
        &self.data
    }

    /// Raw bytes for upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Push the CPU floats to the GPU.
    ///
    /// On failure the block stays dirty so the next frame retries.
    pub fn update_gpu(&mut self, renderer: &mut dyn Renderer) -> RenderResult<()> {
        renderer.upload_uniform_block(self)?;
        self.sync = GpuSync::Synced;
        Ok(())
    }

    /// Bind this block to its binding point for `shader`
    pub fn bind_buffer(&self, shader: &Shader, renderer: &mut dyn Renderer) -> RenderResult<()> {
        renderer.bind_uniform_block(self, shader)
    }

    /// Give the GPU buffer back to the backend
    pub fn release(&mut self, renderer: &mut dyn Renderer) {
        if let Some(handle) = self.gpu_buffer.take() {
            renderer.release_uniform_block(handle);
        }
        self.sync = GpuSync::Pending;
    }

    /// Human-readable float dump for trace logging
    pub fn dump_floats(&self) -> String {
        self.data
            .chunks(4)
            .map(|row| row.iter().map(|f| format!("{f:.3}")).collect::<Vec<_>>().join(" "))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_read_back() {
        let mut block = UniformBlock::new("float data", LIGHT_UBO_INDEX, "Test_ubo", 8);
        block.set_at(16, &[1.0, 2.0, 3.0]).unwrap();

        assert_eq!(block.floats_at(16, 3), Some(&[1.0, 2.0, 3.0][..]));
        assert_eq!(block.as_floats()[..4], [0.0; 4]);
        assert_eq!(block.total_size(), 32);
        assert_eq!(block.as_bytes().len(), 32);
        assert!(block.is_dirty());
    }

    #[test]
    fn test_out_of_range_write_rejected() {
        let mut block = UniformBlock::new("float data", LIGHT_UBO_INDEX, "Test_ubo", 4);
        assert!(block.set_at(8, &[0.0; 3]).is_err());
        assert!(block.set_at(2, &[0.0]).is_err());
        assert_eq!(block.as_floats(), &[0.0; 4]);
    }

    #[test]
    fn test_dump_rows_of_four() {
        let mut block = UniformBlock::new("float data", LIGHT_UBO_INDEX, "Test_ubo", 5);
        block.set_at(0, &[1.0, 0.0, 0.0, 0.5, 2.0]).unwrap();
        assert_eq!(block.dump_floats(), "1.000 0.000 0.000 0.500\n2.000");
    }
}
