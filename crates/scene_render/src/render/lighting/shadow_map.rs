//! Shadow map handle attached to a shadow-casting light

use crate::render::api::TextureHandle;

/// Depth texture layer a light renders its shadow into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowMap {
    texture: TextureHandle,
    layer: usize,
    enabled: bool,
}

impl ShadowMap {
    /// Create an enabled shadow map
    pub fn new(texture: TextureHandle, layer: usize) -> Self {
        Self {
            texture,
            layer,
            enabled: true,
        }
    }

    /// Backing texture
    pub fn texture(&self) -> TextureHandle {
        self.texture
    }

    /// Layer index in the shadow map array
    pub fn layer(&self) -> usize {
        self.layer
    }

    /// Whether the shadow pass should render into this map
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turn shadow rendering for this map on or off
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}
