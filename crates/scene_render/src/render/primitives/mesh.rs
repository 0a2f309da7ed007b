//! Mesh reference held by render data
//!
//! Geometry lives with the asset system. The render core only needs to know
//! how much there is, whether the GPU copy is stale, and the current bone
//! palette for skinned meshes.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::foundation::math::Mat4;
use crate::render::api::MeshHandle;

/// Shared, lockable mesh; the scene graph owns it
pub type MeshRef = Arc<RwLock<Mesh>>;

/// Geometry bookkeeping for one mesh
#[derive(Debug, Clone)]
pub struct Mesh {
    vertex_count: usize,
    index_count: usize,
    bone_matrices: Vec<Mat4>,
    gpu_buffers: Option<MeshHandle>,
    geometry_dirty: bool,
    bones_generation: u64,
}

impl Mesh {
    /// Create a mesh description; it starts dirty so buffers get created
    pub fn new(vertex_count: usize, index_count: usize) -> Self {
        Self {
            vertex_count,
            index_count,
            bone_matrices: Vec::new(),
            gpu_buffers: None,
            geometry_dirty: true,
            bones_generation: 0,
        }
    }

    /// Wrap for sharing between render data
    pub fn shared(self) -> MeshRef {
        Arc::new(RwLock::new(self))
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Number of indices
    pub fn index_count(&self) -> usize {
        self.index_count
    }

    /// Nothing to draw
    pub fn is_empty(&self) -> bool {
        self.vertex_count == 0
    }

    /// Geometry was replaced by the asset system
    pub fn set_counts(&mut self, vertex_count: usize, index_count: usize) {
        self.vertex_count = vertex_count;
        self.index_count = index_count;
        self.geometry_dirty = true;
    }

    /// Replace the skinning palette
    pub fn set_bone_matrices(&mut self, bones: Vec<Mat4>) {
        self.bone_matrices = bones;
        self.bones_generation += 1;
    }

    /// Current skinning palette
    pub fn bone_matrices(&self) -> &[Mat4] {
        &self.bone_matrices
    }

    /// Whether the mesh is skinned
    pub fn has_bones(&self) -> bool {
        !self.bone_matrices.is_empty()
    }

    /// GPU buffers, once created
    pub fn gpu_buffers(&self) -> Option<MeshHandle> {
        self.gpu_buffers
    }

    /// Record the GPU buffers and mark the geometry current
    pub fn set_gpu_buffers(&mut self, handle: MeshHandle) {
        self.gpu_buffers = Some(handle);
        self.geometry_dirty = false;
    }

    /// Vertex/index buffers need (re)creating
    pub fn is_dirty(&self) -> bool {
        self.geometry_dirty || self.gpu_buffers.is_none()
    }

    /// Bumped on every palette change.
    ///
    /// Each renderable sharing the mesh compares this against the
    /// generation it last wrote to its own skinning block.
    pub fn bones_generation(&self) -> u64 {
        self.bones_generation
    }
}
