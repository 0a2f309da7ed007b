//! # Core Module
//!
//! Shared configuration for the light list and render data subsystems.
//!
//! ## Organization
//!
//! - **Config**: Lighting limits, uniform binding points and logging settings

pub mod config;

// Re-export commonly used config types
pub use config::{
    RenderCoreConfig,
    EngineConfig,
    LightingConfig,
    BoneConfig,
};
pub use crate::config::{Config, ConfigError};
