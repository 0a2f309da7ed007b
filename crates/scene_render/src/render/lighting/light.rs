//! Scene lights
//!
//! A light is a named light class plus a uniform payload. Lights of the same
//! class share a struct layout in shader source and are addressed there as
//! `<class>s[index]`; the payload bytes live at `block_offset` inside the
//! packed `Lights_ubo` block.
//!
//! The scene graph owns lights. Light lists keep [`LightRef`] clones and
//! compare them by pointer identity.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::foundation::math::Vec3;
use crate::render::api::Renderer;
use crate::render::resources::ShaderData;
use crate::render::RenderResult;

use super::shadow_map::ShadowMap;

/// Light class of directional lights
pub const DIRECTIONAL_CLASS: &str = "directional";
/// Light class of point lights
pub const POINT_CLASS: &str = "point";
/// Light class of spot lights
pub const SPOT_CLASS: &str = "spot";

const ENABLED: &str = "enabled";
const SHADOW_MAP_INDEX: &str = "shadow_map_index";

/// Shared, lockable light.
///
/// Lock order is list first, then light: never call into a `LightList`
/// while holding a light's lock.
pub type LightRef = Arc<Mutex<Light>>;

/// One scene light
#[derive(Debug)]
pub struct Light {
    class_name: String,
    index: Option<usize>,
    block_offset: Option<usize>,
    uniforms: ShaderData,
    shadow_map: Option<ShadowMap>,
    cast_shadows: bool,
    enabled: bool,
}

impl Light {
    /// Create an enabled light of `class_name` with only the common uniforms
    pub fn new(class_name: impl Into<String>) -> Self {
        let mut uniforms = ShaderData::new();
        uniforms.set_float(ENABLED, 1.0);
        uniforms.set_float(SHADOW_MAP_INDEX, -1.0);
        Self {
            class_name: class_name.into(),
            index: None,
            block_offset: None,
            uniforms,
            shadow_map: None,
            cast_shadows: false,
            enabled: true,
        }
    }

    /// Wrap for sharing with light lists
    pub fn shared(self) -> LightRef {
        Arc::new(Mutex::new(self))
    }

    /// Create a shared directional light (like sunlight)
    pub fn directional(direction: Vec3, color: Vec3, intensity: f32) -> LightRef {
        let mut light = Self::new(DIRECTIONAL_CLASS);
        light.uniforms.set_float("intensity", intensity);
        light.uniforms.set_vec3("direction", direction.normalize());
        light.uniforms.set_vec3("color", color);
        light.shared()
    }

    /// Create a shared point light (like a lightbulb)
    pub fn point(position: Vec3, color: Vec3, intensity: f32, range: f32) -> LightRef {
        let mut light = Self::new(POINT_CLASS);
        light.uniforms.set_float("intensity", intensity);
        light.uniforms.set_float("range", range);
        light.uniforms.set_vec3("position", position);
        light.uniforms.set_vec3("color", color);
        // constant, linear, quadratic
        light.uniforms.set_vec3("attenuation", Vec3::new(1.0, 0.09, 0.032));
        light.shared()
    }

    /// Create a shared spot light (like a flashlight); cone angles in radians
    pub fn spot(
        position: Vec3,
        direction: Vec3,
        color: Vec3,
        intensity: f32,
        range: f32,
        inner_cone_angle: f32,
        outer_cone_angle: f32,
    ) -> LightRef {
        let mut light = Self::new(SPOT_CLASS);
        light.uniforms.set_float("intensity", intensity);
        light.uniforms.set_float("range", range);
        light.uniforms.set_vec3("position", position);
        light.uniforms.set_float("inner_cone_angle", inner_cone_angle);
        light.uniforms.set_vec3("direction", direction.normalize());
        light.uniforms.set_float("outer_cone_angle", outer_cone_angle);
        light.uniforms.set_vec3("color", color);
        light.shared()
    }

    /// Light class name
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Index within its class in the owning list, `None` when not listed
    pub fn light_index(&self) -> Option<usize> {
        self.index
    }

    pub(crate) fn set_light_index(&mut self, index: Option<usize>) {
        self.index = index;
    }

    /// Byte offset of the payload inside `Lights_ubo`, once laid out
    pub fn block_offset(&self) -> Option<usize> {
        self.block_offset
    }

    pub(crate) fn set_block_offset(&mut self, offset: Option<usize>) {
        self.block_offset = offset;
    }

    /// Payload size in bytes
    pub fn total_size(&self) -> usize {
        self.uniforms.total_size()
    }

    /// Uniform payload
    pub fn uniforms(&self) -> &ShaderData {
        &self.uniforms
    }

    /// Mutable uniform payload; setters mark it dirty
    pub fn uniforms_mut(&mut self) -> &mut ShaderData {
        &mut self.uniforms
    }

    /// Payload changed since it was last copied into the light block
    pub fn is_dirty(&self) -> bool {
        self.uniforms.is_dirty()
    }

    /// Force the payload to be copied on the next update
    pub fn mark_dirty(&mut self) {
        self.uniforms.mark_dirty();
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.uniforms.clear_dirty();
    }

    /// Whether the light contributes to shading
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Switch the light on or off without removing it from the scene
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.uniforms.set_float(ENABLED, if enabled { 1.0 } else { 0.0 });
    }

    /// Whether this light renders a shadow map
    pub fn cast_shadows(&self) -> bool {
        self.cast_shadows
    }

    /// Enable or disable shadow casting
    pub fn set_cast_shadows(&mut self, cast: bool) {
        self.cast_shadows = cast;
        if let Some(shadow_map) = self.shadow_map.as_mut() {
            shadow_map.set_enabled(cast);
        }
    }

    /// Attached shadow map
    pub fn shadow_map(&self) -> Option<&ShadowMap> {
        self.shadow_map.as_ref()
    }

    /// Attach or detach a shadow map
    pub fn set_shadow_map(&mut self, shadow_map: Option<ShadowMap>) {
        let layer = shadow_map.as_ref().map_or(-1.0, |sm| sm.layer() as f32);
        self.shadow_map = shadow_map;
        self.uniforms.set_float(SHADOW_MAP_INDEX, layer);
    }

    /// Make sure a shadow-casting light owns a shadow map at `layer`.
    ///
    /// Returns true when a new map was allocated.
    pub fn make_shadow_map(&mut self, renderer: &mut dyn Renderer, layer: usize) -> RenderResult<bool> {
        if !self.cast_shadows {
            if self.shadow_map.is_some() {
                self.set_shadow_map(None);
            }
            return Ok(false);
        }
        if self.shadow_map.as_ref().is_some_and(|sm| sm.layer() == layer) {
            return Ok(false);
        }
        let texture = renderer.create_shadow_map(layer)?;
        self.set_shadow_map(Some(ShadowMap::new(texture, layer)));
        log::debug!("SHADOW: {} light got shadow map layer {}", self.class_name, layer);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::api::HeadlessRenderer;

    #[test]
    fn test_typed_light_sizes() {
        let sun = Light::directional(Vec3::new(0.0, -2.0, 0.0), Vec3::new(1.0, 1.0, 1.0), 1.0);
        let bulb = Light::point(Vec3::zeros(), Vec3::new(1.0, 0.9, 0.7), 1.0, 10.0);
        let torch = Light::spot(Vec3::zeros(), Vec3::new(0.0, 0.0, -1.0), Vec3::new(1.0, 1.0, 1.0), 1.0, 5.0, 0.2, 0.4);

        assert_eq!(sun.lock().total_size(), 48);
        assert_eq!(bulb.lock().total_size(), 64);
        assert_eq!(torch.lock().total_size(), 64);
        assert_eq!(sun.lock().class_name(), DIRECTIONAL_CLASS);
    }

    #[test]
    fn test_direction_is_normalized() {
        let sun = Light::directional(Vec3::new(0.0, -2.0, 0.0), Vec3::new(1.0, 1.0, 1.0), 1.0);
        let direction = sun.lock().uniforms().get_vec3("direction").unwrap();
        approx::assert_relative_eq!(direction, Vec3::new(0.0, -1.0, 0.0));
    }

    #[test]
    fn test_new_light_is_unlisted_and_dirty() {
        let light = Light::new("custom");
        assert_eq!(light.light_index(), None);
        assert_eq!(light.block_offset(), None);
        assert!(light.is_dirty());
        assert!(light.is_enabled());
    }

    #[test]
    fn test_disable_updates_payload() {
        let mut light = Light::new("custom");
        light.clear_dirty();
        light.set_enabled(false);
        assert!(light.is_dirty());
        assert_eq!(light.uniforms().get_float("enabled"), Ok(0.0));
    }

    #[test]
    fn test_make_shadow_map_only_for_casters() {
        let mut renderer = HeadlessRenderer::new();
        let mut light = Light::new(SPOT_CLASS);

        assert!(!light.make_shadow_map(&mut renderer, 0).unwrap());
        assert!(light.shadow_map().is_none());

        light.set_cast_shadows(true);
        assert!(light.make_shadow_map(&mut renderer, 2).unwrap());
        assert_eq!(light.shadow_map().map(ShadowMap::layer), Some(2));
        assert_eq!(light.uniforms().get_float("shadow_map_index"), Ok(2.0));

        // same layer is kept
        assert!(!light.make_shadow_map(&mut renderer, 2).unwrap());
        assert_eq!(renderer.shadow_map_count(), 1);
    }
}
