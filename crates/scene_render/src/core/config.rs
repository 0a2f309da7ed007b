//! # Unified Configuration
//!
//! Configuration for the lighting and render-state core. Everything a host
//! application may want to tune without recompiling lives here: the light
//! budget, the uniform block binding points and the log filter.
//!
//! ## Configuration Categories
//!
//! - **Engine Config**: Logging
//! - **Lighting Config**: Light budget and `Lights_ubo` binding point
//! - **Bone Config**: Skinning matrix budget and `Bones_ubo` binding point

use serde::{Serialize, Deserialize};

use crate::config::{Config, ConfigError};
use crate::render::resources::uniform_block::{BONES_UBO_INDEX, LIGHT_UBO_INDEX, MATERIAL_UBO_INDEX, TRANSFORM_UBO_INDEX};
use crate::scene::MAX_LIGHTS;

/// Default number of bone matrices a skinned mesh may upload
pub const DEFAULT_MAX_BONES: usize = 60;

/// # Engine Configuration
///
/// Logging behaviour for the subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Default log filter (`RUST_LOG` wins when set)
    pub log_level: String,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Install the logger with this configuration's default filter
    pub fn init_logging(&self) {
        crate::foundation::logging::init_with_level(&self.log_level);
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Lighting Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightingConfig {
    /// Maximum number of simultaneously active lights
    pub max_lights: usize,
    /// Binding point of the `Lights_ubo` block
    pub light_ubo_binding: u32,
}

impl LightingConfig {
    /// Create a lighting configuration with the scene defaults
    pub fn new() -> Self {
        Self {
            max_lights: MAX_LIGHTS,
            light_ubo_binding: LIGHT_UBO_INDEX,
        }
    }

    /// Set the light budget
    pub fn with_max_lights(mut self, max_lights: usize) -> Self {
        self.max_lights = max_lights;
        self
    }

    /// Set the light block binding point
    pub fn with_binding(mut self, binding: u32) -> Self {
        self.light_ubo_binding = binding;
        self
    }
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Bone Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoneConfig {
    /// Maximum bone matrices uploaded per renderable
    pub max_bones: usize,
    /// Binding point of the `Bones_ubo` block
    pub bones_ubo_binding: u32,
}

impl BoneConfig {
    /// Create a bone configuration with the defaults
    pub fn new() -> Self {
        Self {
            max_bones: DEFAULT_MAX_BONES,
            bones_ubo_binding: BONES_UBO_INDEX,
        }
    }
}

impl Default for BoneConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Complete Configuration
///
/// Top-level configuration applications load from TOML or RON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderCoreConfig {
    /// Logging configuration
    pub engine: EngineConfig,
    /// Lighting configuration
    pub lighting: LightingConfig,
    /// Skinning configuration
    pub bones: BoneConfig,
}

impl RenderCoreConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the lighting section
    pub fn with_lighting(mut self, lighting: LightingConfig) -> Self {
        self.lighting = lighting;
        self
    }

    /// Replace the bone section
    pub fn with_bones(mut self, bones: BoneConfig) -> Self {
        self.bones = bones;
        self
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lighting.max_lights == 0 {
            return Err(ConfigError::Invalid("max_lights must be at least 1".to_string()));
        }
        if self.bones.max_bones == 0 {
            return Err(ConfigError::Invalid("max_bones must be at least 1".to_string()));
        }

        let bindings = [
            TRANSFORM_UBO_INDEX,
            MATERIAL_UBO_INDEX,
            self.lighting.light_ubo_binding,
            self.bones.bones_ubo_binding,
        ];
        for (i, a) in bindings.iter().enumerate() {
            if bindings[i + 1..].contains(a) {
                return Err(ConfigError::Invalid(format!("uniform binding {a} is used twice")));
            }
        }
        Ok(())
    }
}

impl Config for RenderCoreConfig {}
