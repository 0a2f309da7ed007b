//! Scene ownership of lights
//!
//! The scene owns its lights and a [`LightList`] of the ones currently
//! active. The list is shared (`Arc`) so traversal on another thread can add
//! and remove lights while the render thread updates the light block.

use std::sync::Arc;

use crate::config::ConfigError;
use crate::core::config::RenderCoreConfig;
use crate::render::api::Renderer;
use crate::render::lighting::{LightList, LightRef, ShadowMap};
use crate::render::resources::Shader;

/// Default maximum number of active lights in a scene
pub const MAX_LIGHTS: usize = 16;

/// Lights of one scene
#[derive(Debug)]
pub struct Scene {
    lights: Vec<LightRef>,
    light_list: Arc<LightList>,
}

impl Scene {
    /// Create an empty scene with the default light limit
    pub fn new() -> Self {
        Self {
            lights: Vec::new(),
            light_list: Arc::new(LightList::new()),
        }
    }

    /// Create an empty scene from validated configuration
    pub fn with_config(config: &RenderCoreConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            lights: Vec::new(),
            light_list: Arc::new(LightList::with_config(&config.lighting)),
        })
    }

    /// Shared list of active lights
    pub fn light_list(&self) -> &Arc<LightList> {
        &self.light_list
    }

    /// Lights owned by the scene, active or not
    pub fn lights(&self) -> &[LightRef] {
        &self.lights
    }

    /// Take ownership of a light and activate it.
    ///
    /// The scene keeps the light even when the list is full; returns whether
    /// it became active.
    pub fn add_light(&mut self, light: LightRef) -> bool {
        if self.lights.iter().any(|l| Arc::ptr_eq(l, &light)) {
            return false;
        }
        let active = self.light_list.add_light(&light);
        self.lights.push(light);
        active
    }

    /// Deactivate and drop a light; returns whether the scene owned it
    pub fn remove_light(&mut self, light: &LightRef) -> bool {
        let Some(position) = self.lights.iter().position(|l| Arc::ptr_eq(l, light)) else {
            return false;
        };
        self.light_list.remove_light(light);
        self.lights.remove(position);
        true
    }

    /// Per-frame light work: assign shadow maps, then update and bind the
    /// light block for `shader`
    pub fn prepare_lights(&self, renderer: &mut dyn Renderer, shader: &Shader) -> Option<ShadowMap> {
        self.light_list.make_shadow_maps(renderer);
        self.light_list.update_lights(renderer, shader)
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
