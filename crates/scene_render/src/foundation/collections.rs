//! Specialized collection types

pub use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// Key for GPU uniform buffers owned by a backend
    pub struct BufferKey;

    /// Key for GPU textures owned by a backend
    pub struct TextureKey;

    /// Key for GPU mesh buffers owned by a backend
    pub struct MeshKey;

    /// Key for draw batches owned by the batching system
    pub struct BatchKey;
}

/// Handle-based map using slot map for stable references
pub type HandleMap<K, T> = SlotMap<K, T>;
