//! Shader handles and the shader registry
//!
//! Shader compilation happens elsewhere. This module only tracks which
//! shaders exist, whether they finished building, and which light block
//! layout they were generated against.

use std::collections::HashMap;

/// Identifier of a compiled shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderId(pub u32);

impl std::fmt::Display for ShaderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A shader program known to the renderer
#[derive(Debug, Clone)]
pub struct Shader {
    id: ShaderId,
    signature: String,
    ready: bool,
    light_layout: Option<String>,
}

impl Shader {
    /// Create an unregistered shader; [`ShaderManager::register`] assigns the id
    pub fn new(signature: impl Into<String>) -> Self {
        Self {
            id: ShaderId(0),
            signature: signature.into(),
            ready: true,
            light_layout: None,
        }
    }

    /// Attach the `Lights_ubo` declaration this shader was built with
    pub fn with_light_layout(mut self, layout: impl Into<String>) -> Self {
        self.light_layout = Some(layout.into());
        self
    }

    /// Mark whether the program finished compiling
    pub fn with_ready(mut self, ready: bool) -> Self {
        self.ready = ready;
        self
    }

    /// Shader id
    pub fn id(&self) -> ShaderId {
        self.id
    }

    /// Signature string the shader was generated from
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Whether the program can be drawn with
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Light block declaration, if the shader uses lights
    pub fn light_layout(&self) -> Option<&str> {
        self.light_layout.as_deref()
    }
}

/// Registry of shaders by id
#[derive(Debug, Default)]
pub struct ShaderManager {
    shaders: HashMap<ShaderId, Shader>,
    next_id: u32,
}

impl ShaderManager {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            shaders: HashMap::new(),
            next_id: 1, // 0 is never handed out
        }
    }

    /// Register a shader and return its id
    pub fn register(&mut self, mut shader: Shader) -> ShaderId {
        if self.next_id == 0 {
            self.next_id = 1;
        }
        let id = ShaderId(self.next_id);
        self.next_id += 1;
        shader.id = id;
        log::debug!("SHADER: registered {} as {}", shader.signature, id);
        self.shaders.insert(id, shader);
        id
    }

    /// Look up a shader
    pub fn get(&self, id: ShaderId) -> Option<&Shader> {
        self.shaders.get(&id)
    }

    /// Find a shader by its signature
    pub fn find_by_signature(&self, signature: &str) -> Option<&Shader> {
        self.shaders.values().find(|s| s.signature == signature)
    }

    /// Flip the readiness of a registered shader
    pub fn set_ready(&mut self, id: ShaderId, ready: bool) -> bool {
        match self.shaders.get_mut(&id) {
            Some(shader) => {
                shader.ready = ready;
                true
            }
            None => false,
        }
    }

    /// Number of registered shaders
    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    /// Whether no shaders are registered
    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }
}
