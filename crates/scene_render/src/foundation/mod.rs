//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - Math types shared with the scene graph
//! - Handle-based collections for backend resources
//! - Logging utilities

pub mod math;
pub mod collections;
pub mod logging;
