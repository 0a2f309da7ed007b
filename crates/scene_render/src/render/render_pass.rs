//! Render passes
//!
//! A pass binds one material to one shader. Mono and multiview rendering
//! use different shader variants, so a pass keeps an id for each.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::render::render_state::CullFace;
use crate::render::resources::{MaterialRef, ShaderId};

/// Shared, lockable render pass
pub type RenderPassRef = Arc<RwLock<RenderPass>>;

/// One shader/material binding applied when drawing
#[derive(Debug, Clone)]
pub struct RenderPass {
    material: MaterialRef,
    shaders: [Option<ShaderId>; 2],
    cull_face: CullFace,
}

impl RenderPass {
    /// Create a pass drawing `material` with no shader selected yet
    pub fn new(material: MaterialRef) -> Self {
        Self {
            material,
            shaders: [None, None],
            cull_face: CullFace::default(),
        }
    }

    /// Wrap for sharing between render data
    pub fn shared(self) -> RenderPassRef {
        Arc::new(RwLock::new(self))
    }

    /// Material drawn by this pass
    pub fn material(&self) -> &MaterialRef {
        &self.material
    }

    /// Swap the material
    pub fn set_material(&mut self, material: MaterialRef) {
        self.material = material;
    }

    /// Shader for mono or multiview rendering
    pub fn shader(&self, multiview: bool) -> Option<ShaderId> {
        self.shaders[usize::from(multiview)]
    }

    /// Select the shader for mono or multiview rendering
    pub fn set_shader(&mut self, id: ShaderId, multiview: bool) {
        self.shaders[usize::from(multiview)] = Some(id);
    }

    /// Face culling for this pass
    pub fn cull_face(&self) -> CullFace {
        self.cull_face
    }

    /// Change face culling for this pass
    pub fn set_cull_face(&mut self, cull_face: CullFace) {
        self.cull_face = cull_face;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::resources::materials;

    #[test]
    fn test_shader_variants_are_independent() {
        let mut pass = RenderPass::new(materials::shared(Default::default()));
        pass.set_shader(ShaderId(3), false);

        assert_eq!(pass.shader(false), Some(ShaderId(3)));
        assert_eq!(pass.shader(true), None);

        pass.set_shader(ShaderId(4), true);
        assert_eq!(pass.shader(true), Some(ShaderId(4)));
        assert_eq!(pass.cull_face(), CullFace::Back);
    }
}
