//! Backend API
//!
//! The trait every GPU operation of this crate goes through, the handle
//! types backends hand out, and a CPU-only backend.

pub mod headless;
pub mod render_backend;

// Re-export commonly used types
pub use headless::{HeadlessRenderer, BindRecord};
pub use render_backend::{Renderer, BackendResult, UniformBufferHandle, MeshHandle, TextureHandle};
