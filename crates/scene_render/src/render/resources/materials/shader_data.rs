//! Material uniforms and texture bindings
//!
//! [`ShaderData`] is the CPU side of a material: named uniforms kept in
//! declaration order plus texture slots. Lights use the same type for their
//! payload, so the packed float layout here is also the layout of each
//! light's struct inside `Lights_ubo`.

use std::collections::HashMap;

use thiserror::Error;

use crate::foundation::math::{mat4_to_floats, Mat4, Vec2, Vec3, Vec4};
use crate::render::api::TextureHandle;

/// Name of the texture slot that gates draw readiness
pub const MAIN_TEXTURE: &str = "main_texture";

/// Errors from material lookups
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MaterialError {
    /// The uniform was never declared on this material
    #[error("uniform '{0}' not found")]
    UniformNotFound(String),

    /// The uniform exists with a different type
    #[error("uniform '{name}' is a {actual}, not a {requested}")]
    TypeMismatch {
        /// Uniform name
        name: String,
        /// Type the caller asked for
        requested: &'static str,
        /// Type stored on the material
        actual: &'static str,
    },

    /// No texture is bound under this name
    #[error("texture '{0}' not found")]
    TextureNotFound(String),
}

/// Result type for material lookups
pub type MaterialResult<T> = Result<T, MaterialError>;

/// One typed uniform value
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    /// `float`
    Float(f32),
    /// `vec2`
    Vec2(Vec2),
    /// `vec3`
    Vec3(Vec3),
    /// `vec4`
    Vec4(Vec4),
    /// `mat4`
    Mat4(Mat4),
}

impl UniformValue {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Float(_) => "float",
            Self::Vec2(_) => "vec2",
            Self::Vec3(_) => "vec3",
            Self::Vec4(_) => "vec4",
            Self::Mat4(_) => "mat4",
        }
    }

    /// std140 base alignment in floats
    fn alignment(&self) -> usize {
        match self {
            Self::Float(_) => 1,
            Self::Vec2(_) => 2,
            Self::Vec3(_) | Self::Vec4(_) | Self::Mat4(_) => 4,
        }
    }

    fn write_floats(&self, out: &mut Vec<f32>) {
        match self {
            Self::Float(v) => out.push(*v),
            Self::Vec2(v) => out.extend_from_slice(v.as_slice()),
            Self::Vec3(v) => out.extend_from_slice(v.as_slice()),
            Self::Vec4(v) => out.extend_from_slice(v.as_slice()),
            Self::Mat4(m) => out.extend_from_slice(&mat4_to_floats(m)),
        }
    }
}

/// Whether uniform values changed since the last upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadState {
    /// Uploaded values are current
    Clean,
    /// Values changed and must be copied again
    Dirty,
}

#[derive(Debug, Clone)]
struct TextureSlot {
    handle: TextureHandle,
    ready: bool,
}

/// Material uniforms and textures
#[derive(Debug, Clone)]
pub struct ShaderData {
    uniforms: Vec<(String, UniformValue)>,
    textures: HashMap<String, TextureSlot>,
    state: PayloadState,
}

macro_rules! typed_accessors {
    ($get:ident, $set:ident, $variant:ident, $ty:ty, $name:literal) => {
        #[doc = concat!("Read a `", $name, "` uniform")]
        pub fn $get(&self, key: &str) -> MaterialResult<$ty> {
            match self.uniform(key)? {
                UniformValue::$variant(v) => Ok(*v),
                other => Err(MaterialError::TypeMismatch {
                    name: key.to_string(),
                    requested: $name,
                    actual: other.type_name(),
                }),
            }
        }

        #[doc = concat!("Set a `", $name, "` uniform, declaring it if new")]
        pub fn $set(&mut self, key: &str, value: $ty) {
            self.set_uniform(key, UniformValue::$variant(value));
        }
    };
}

impl ShaderData {
    /// Create an empty material; it starts dirty so the first frame uploads it
    pub fn new() -> Self {
        Self {
            uniforms: Vec::new(),
            textures: HashMap::new(),
            state: PayloadState::Dirty,
        }
    }

    typed_accessors!(get_float, set_float, Float, f32, "float");
    typed_accessors!(get_vec2, set_vec2, Vec2, Vec2, "vec2");
    typed_accessors!(get_vec3, set_vec3, Vec3, Vec3, "vec3");
    typed_accessors!(get_vec4, set_vec4, Vec4, Vec4, "vec4");
    typed_accessors!(get_mat4, set_mat4, Mat4, Mat4, "mat4");

    /// Look up a uniform by name
    pub fn uniform(&self, key: &str) -> MaterialResult<&UniformValue> {
        self.uniforms
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
            .ok_or_else(|| MaterialError::UniformNotFound(key.to_string()))
    }

    /// Set a uniform, keeping its existing declaration slot when it exists
    pub fn set_uniform(&mut self, key: &str, value: UniformValue) {
        match self.uniforms.iter_mut().find(|(name, _)| name == key) {
            Some((_, slot)) => *slot = value,
            None => self.uniforms.push((key.to_string(), value)),
        }
        self.state = PayloadState::Dirty;
    }

    /// Whether a uniform is declared
    pub fn has_uniform(&self, key: &str) -> bool {
        self.uniforms.iter().any(|(name, _)| name == key)
    }

    /// Uniform names in declaration order
    pub fn uniform_names(&self) -> impl Iterator<Item = &str> {
        self.uniforms.iter().map(|(name, _)| name.as_str())
    }

    /// Bind a texture; a newly bound texture is considered ready
    pub fn set_texture(&mut self, key: &str, handle: TextureHandle) {
        self.textures.insert(key.to_string(), TextureSlot { handle, ready: true });
        self.state = PayloadState::Dirty;
    }

    /// Texture bound under `key`
    pub fn get_texture(&self, key: &str) -> MaterialResult<TextureHandle> {
        self.textures
            .get(key)
            .map(|slot| slot.handle)
            .ok_or_else(|| MaterialError::TextureNotFound(key.to_string()))
    }

    /// Mark a bound texture as still loading or finished
    pub fn set_texture_ready(&mut self, key: &str, ready: bool) -> MaterialResult<()> {
        let slot = self
            .textures
            .get_mut(key)
            .ok_or_else(|| MaterialError::TextureNotFound(key.to_string()))?;
        slot.ready = ready;
        Ok(())
    }

    /// True if no main texture is bound, or it finished loading
    pub fn main_texture_ready(&self) -> bool {
        self.textures.get(MAIN_TEXTURE).map_or(true, |slot| slot.ready)
    }

    /// True when every bound texture finished loading
    pub fn textures_ready(&self) -> bool {
        self.textures.values().all(|slot| slot.ready)
    }

    /// Uniform values packed with std140 alignment; the length is a multiple
    /// of four so the result can be used as an array element
    pub fn packed_floats(&self) -> Vec<f32> {
        let mut out = Vec::new();
        for (_, value) in &self.uniforms {
            let align = value.alignment();
            while out.len() % align != 0 {
                out.push(0.0);
            }
            value.write_floats(&mut out);
        }
        while out.len() % 4 != 0 {
            out.push(0.0);
        }
        out
    }

    /// Packed size in bytes
    pub fn total_size(&self) -> usize {
        self.packed_floats().len() * std::mem::size_of::<f32>()
    }

    /// Whether values changed since the last upload
    pub fn is_dirty(&self) -> bool {
        self.state == PayloadState::Dirty
    }

    /// Flag the values for re-upload
    pub fn mark_dirty(&mut self) {
        self.state = PayloadState::Dirty;
    }

    /// Record that the current values are on the GPU
    pub fn clear_dirty(&mut self) {
        self.state = PayloadState::Clean;
    }
}

impl Default for ShaderData {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ShaderData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (name, value) in &self.uniforms {
            let mut floats = Vec::new();
            value.write_floats(&mut floats);
            writeln!(f, "{} {} = {:?}", value.type_name(), name, floats)?;
        }
        Ok(())
    }
}
