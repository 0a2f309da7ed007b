//! Lighting system
//!
//! Scene lights, their shadow maps, and the [`LightList`] that packs every
//! active light into the shared `Lights_ubo` uniform block.

pub mod light;
pub mod light_list;
pub mod shadow_map;

pub use light::{Light, LightRef, DIRECTIONAL_CLASS, POINT_CLASS, SPOT_CLASS};
pub use light_list::{LightList, LayoutState, IndexState, LIGHT_BLOCK_DESCRIPTOR, LIGHT_BLOCK_NAME};
pub use shadow_map::ShadowMap;
