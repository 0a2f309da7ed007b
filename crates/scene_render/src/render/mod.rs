//! # Rendering Core
//!
//! Backend-agnostic render state and light aggregation for a scene graph
//! renderer.
//!
//! ## Architecture
//!
//! - **Lighting**: [`LightList`](lighting::LightList) aggregates the scene's
//!   lights into one packed `Lights_ubo` uniform block
//! - **Render Data**: [`RenderData`](render_data::RenderData) holds the passes
//!   and pipeline state of one renderable, plus its batching hash
//! - **Resources**: Uniform blocks, shaders and material uniforms
//! - **API**: The [`Renderer`](api::Renderer) seam every GPU operation goes
//!   through
//!
//! `RenderData` and `LightList` never call each other. Both are driven by
//! the host's per-frame loop.

pub mod api;
pub mod lighting;
pub mod primitives;
pub mod render_data;
pub mod render_pass;
pub mod render_state;
pub mod resources;

#[cfg(test)]
mod tests;

pub use api::{Renderer, HeadlessRenderer};
pub use lighting::{Light, LightList, LightRef, ShadowMap};
pub use render_data::{RenderData, RenderState, Validity};
pub use render_pass::{RenderPass, RenderPassRef};
pub use render_state::{BlendFactor, CompareFunc, CullFace, DrawMode, RenderMask, RenderQueue, StencilOp};
pub use resources::{ShaderData, Shader, ShaderId, UniformBlock};

use thiserror::Error;

/// High-level rendering error types
///
/// Errors raised by the backend seam. None of them are fatal for the frame
/// loop: callers log them and retry on the next frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// A rendering operation failed during execution
    #[error("Rendering failed: {0}")]
    RenderingFailed(String),

    /// Resource creation or management failed
    ///
    /// Occurs when GPU resources (buffers, textures) cannot be created,
    /// typically due to memory constraints or invalid sizes.
    #[error("Resource creation failed: {0}")]
    ResourceCreationFailed(String),

    /// Backend-specific error occurred
    #[error("Backend error: {0}")]
    BackendError(String),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
