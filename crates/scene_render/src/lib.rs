//! # Scene Render
//!
//! The light aggregation engine and per-object render state model that sit
//! between a scene graph and its rasterization backend.
//!
//! ## Features
//!
//! - **Light List**: Active lights grouped by light class, dense per-class
//!   indexing and a single packed `Lights_ubo` uniform block
//! - **Render Data**: Per-renderable passes, blend/depth/stencil/cull state,
//!   draw ordering and a cached pipeline hash for batching
//! - **Backend Seam**: A small [`Renderer`](render::api::Renderer) trait for
//!   uniform block allocation and upload, with a headless implementation
//!
//! ## Quick Start
//!
//! ```rust
//! use scene_render::prelude::*;
//!
//! let mut renderer = HeadlessRenderer::new();
//! let shader = renderer.shaders_mut().register(Shader::new("lit_textured"));
//! let shader = renderer.shaders().get(shader).cloned().unwrap();
//!
//! let lights = LightList::new();
//! let sun = Light::directional(Vec3::new(0.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 1.0), 1.0);
//! assert!(lights.add_light(&sun));
//!
//! let shadow_map = lights.update_lights(&mut renderer, &shader);
//! assert!(shadow_map.is_none());
//! assert!(lights.make_shader_block().contains("Udirectional directionals[1];"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core modules
pub mod core;
pub mod config;
pub mod foundation;
pub mod render;
pub mod scene;

/// Common imports for crate users
pub mod prelude {
    pub use crate::{
        core::config::{RenderCoreConfig, LightingConfig, BoneConfig, EngineConfig},
        config::{Config, ConfigError, ConfigFormat},
        foundation::math::{Vec2, Vec3, Vec4, Mat4},
        render::{RenderError, RenderResult},
        render::api::{Renderer, HeadlessRenderer, UniformBufferHandle, MeshHandle, TextureHandle},
        render::lighting::{Light, LightRef, LightList, ShadowMap},
        render::primitives::{Mesh, MeshRef},
        render::resources::{Shader, ShaderId, ShaderManager, ShaderData, MaterialRef, UniformBlock},
        render::render_pass::{RenderPass, RenderPassRef},
        render::render_data::{RenderData, RenderDataError, RenderState, Validity, BatchId},
        render::render_state::{BlendFactor, CompareFunc, CullFace, DrawMode, RenderMask, RenderQueue, StencilOp},
        scene::{Scene, MAX_LIGHTS},
    };
}
