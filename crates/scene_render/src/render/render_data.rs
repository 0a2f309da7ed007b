//! Per-renderable render state
//!
//! [`RenderData`] is everything the renderer needs to draw one object: its
//! passes (shader + material), a mesh reference, fixed-function pipeline
//! state and its draw order. Objects with equal [`RenderData::hash_code`]
//! share pipeline state and can be batched together.
//!
//! Pass contents should be changed through the `RenderData` setters
//! (`set_shader`, `set_cull_face`) so the hash is invalidated.

use std::borrow::{Borrow, BorrowMut};
use std::cmp::Ordering;
use std::fmt::Write as _;

use thiserror::Error;

use crate::core::config::{BoneConfig, DEFAULT_MAX_BONES};
use crate::foundation::collections::BatchKey;
use crate::foundation::math::mat4_to_floats;
use crate::render::api::Renderer;
use crate::render::primitives::{Mesh, MeshRef};
use crate::render::render_pass::RenderPassRef;
use crate::render::render_state::{BlendFactor, CompareFunc, CullFace, DrawMode, RenderMask, RenderQueue, StencilOp};
use crate::render::resources::{MaterialRef, Shader, ShaderId, UniformBlock, BONES_UBO_INDEX};
use crate::render::RenderResult;

/// Layout descriptor of the skinning block
pub const BONES_BLOCK_DESCRIPTOR: &str = "mat4 u_bone_matrix";
/// Name of the skinning block in shader source
pub const BONES_BLOCK_NAME: &str = "Bones_ubo";

const MAT4_FLOATS: usize = 16;
const MAT4_SIZE: usize = MAT4_FLOATS * std::mem::size_of::<f32>();

/// Errors from render data pass access
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderDataError {
    /// Pass index past the end of the pass list
    #[error("pass index {index} out of range ({count} passes)")]
    PassIndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of passes
        count: usize,
    },
}

/// Result type for pass access
pub type RenderDataResult<T> = Result<T, RenderDataError>;

/// Whether the cached hash code matches the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashState {
    /// Cached hash is current
    Clean,
    /// Pipeline state changed; recompute on next read
    Dirty,
}

/// Whether mesh buffers and bone matrices on the GPU are current
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuState {
    /// GPU resources are current
    Clean,
    /// GPU resources need updating
    Dirty,
}

/// Whether a renderable can be drawn this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    /// Ready to draw
    Valid,
    /// Resources still loading; skip this frame and try again
    NotReady,
    /// Cannot be drawn in this pass at all
    Invalid,
}

/// Per-frame scene state used to validate renderables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderState {
    /// Drawing both eyes with multiview shaders
    pub use_multiview: bool,
    /// Rendering the shadow map pass
    pub shadow_pass: bool,
}

/// Handle of the draw batch a renderable was merged into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BatchId(pub BatchKey);

/// Lazily evaluated distance from the camera
pub enum CameraDistance {
    /// No distance this frame
    Unset,
    /// Traversal supplied a way to compute it
    Provided(Box<dyn FnOnce() -> f32 + Send>),
    /// Computed this frame
    Cached(f32),
}

impl std::fmt::Debug for CameraDistance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unset => f.write_str("Unset"),
            Self::Provided(_) => f.write_str("Provided(..)"),
            Self::Cached(distance) => f.debug_tuple("Cached").field(distance).finish(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StencilState {
    test: bool,
    func: CompareFunc,
    func_ref: i32,
    func_mask: u32,
    sfail: StencilOp,
    dpfail: StencilOp,
    dppass: StencilOp,
    write_mask: u32,
}

impl Default for StencilState {
    fn default() -> Self {
        Self {
            test: false,
            func: CompareFunc::Always,
            func_ref: 0,
            func_mask: 0,
            sfail: StencilOp::Keep,
            dpfail: StencilOp::Keep,
            dppass: StencilOp::Keep,
            write_mask: 0,
        }
    }
}

/// Render state of one renderable
#[derive(Debug)]
pub struct RenderData {
    passes: Vec<RenderPassRef>,
    mesh: Option<MeshRef>,
    bones_ubo: Option<UniformBlock>,
    bones_generation: Option<u64>,
    bones_binding: u32,
    max_bones: usize,
    batch: Option<BatchId>,
    batching: bool,

    hash_state: HashState,
    hash_code: String,
    gpu_state: GpuState,

    source_alpha_blend_func: BlendFactor,
    dest_alpha_blend_func: BlendFactor,
    alpha_blend: bool,
    alpha_to_coverage: bool,
    sample_coverage: f32,
    invert_coverage_mask: bool,
    depth_test: bool,
    depth_mask: bool,
    offset: bool,
    offset_factor: f32,
    offset_units: f32,
    stencil: StencilState,
    draw_mode: DrawMode,
    render_mask: RenderMask,
    use_light: bool,
    use_lightmap: bool,

    rendering_order: i32,
    cast_shadows: bool,
    camera_distance: CameraDistance,
}

impl RenderData {
    /// Create render data with default pipeline state and no passes
    pub fn new() -> Self {
        Self {
            passes: Vec::new(),
            mesh: None,
            bones_ubo: None,
            bones_generation: None,
            bones_binding: BONES_UBO_INDEX,
            max_bones: DEFAULT_MAX_BONES,
            batch: None,
            batching: true,
            hash_state: HashState::Dirty,
            hash_code: String::new(),
            gpu_state: GpuState::Clean,
            source_alpha_blend_func: BlendFactor::One,
            dest_alpha_blend_func: BlendFactor::OneMinusSrcAlpha,
            alpha_blend: true,
            alpha_to_coverage: false,
            sample_coverage: 1.0,
            invert_coverage_mask: false,
            depth_test: true,
            depth_mask: true,
            offset: false,
            offset_factor: 0.0,
            offset_units: 0.0,
            stencil: StencilState::default(),
            draw_mode: DrawMode::Triangles,
            render_mask: RenderMask::default(),
            use_light: false,
            use_lightmap: false,
            rendering_order: RenderQueue::Geometry.order(),
            cast_shadows: true,
            camera_distance: CameraDistance::Unset,
        }
    }

    /// Create render data using the configured skinning block
    pub fn with_bone_config(config: &BoneConfig) -> Self {
        Self {
            bones_binding: config.bones_ubo_binding,
            max_bones: config.max_bones,
            ..Self::new()
        }
    }

    fn mark_hash_dirty(&mut self) {
        self.hash_state = HashState::Dirty;
    }

    fn pass_ref(&self, index: usize) -> RenderDataResult<&RenderPassRef> {
        self.passes.get(index).ok_or(RenderDataError::PassIndexOutOfRange {
            index,
            count: self.passes.len(),
        })
    }

    // Passes

    /// Append a pass
    pub fn add_pass(&mut self, pass: RenderPassRef) {
        self.passes.push(pass);
        self.mark_hash_dirty();
    }

    /// Remove and return the pass at `index`
    pub fn remove_pass(&mut self, index: usize) -> RenderDataResult<RenderPassRef> {
        self.pass_ref(index)?;
        let pass = self.passes.remove(index);
        self.mark_hash_dirty();
        Ok(pass)
    }

    /// Pass at `index`
    pub fn pass(&self, index: usize) -> RenderDataResult<&RenderPassRef> {
        self.pass_ref(index)
    }

    /// Number of passes
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    /// Select the mono or multiview shader of a pass
    pub fn set_shader(&mut self, pass: usize, id: ShaderId, multiview: bool) -> RenderDataResult<()> {
        log::debug!("SHADER: render data pass {pass} uses shader {id} (multiview {multiview})");
        self.pass_ref(pass)?.write().set_shader(id, multiview);
        self.mark_hash_dirty();
        Ok(())
    }

    /// Mono or multiview shader of a pass
    pub fn shader(&self, pass: usize, multiview: bool) -> RenderDataResult<Option<ShaderId>> {
        Ok(self.pass_ref(pass)?.read().shader(multiview))
    }

    /// Material of a pass
    pub fn material(&self, pass: usize) -> RenderDataResult<MaterialRef> {
        Ok(self.pass_ref(pass)?.read().material().clone())
    }

    /// Face culling of a pass
    pub fn cull_face(&self, pass: usize) -> RenderDataResult<CullFace> {
        Ok(self.pass_ref(pass)?.read().cull_face())
    }

    /// Change face culling of a pass
    pub fn set_cull_face(&mut self, cull_face: CullFace, pass: usize) -> RenderDataResult<()> {
        self.pass_ref(pass)?.write().set_cull_face(cull_face);
        self.mark_hash_dirty();
        Ok(())
    }

    // Mesh and batching

    /// Mesh drawn by this renderable
    pub fn mesh(&self) -> Option<&MeshRef> {
        self.mesh.as_ref()
    }

    /// Replace the mesh; GPU resources are refreshed on the next update
    pub fn set_mesh(&mut self, mesh: Option<MeshRef>) {
        self.mesh = mesh;
        self.gpu_state = GpuState::Dirty;
    }

    /// Skinning block, once created
    pub fn bones_ubo(&self) -> Option<&UniformBlock> {
        self.bones_ubo.as_ref()
    }

    /// Batch this renderable was merged into
    pub fn batch(&self) -> Option<BatchId> {
        self.batch
    }

    /// Record the batch this renderable was merged into
    pub fn set_batch(&mut self, batch: Option<BatchId>) {
        self.batch = batch;
    }

    /// Whether this renderable may be batched
    pub fn batching(&self) -> bool {
        self.batching
    }

    /// Allow or forbid batching
    pub fn set_batching(&mut self, batching: bool) {
        self.batching = batching;
    }

    // Pipeline state

    /// Source blend factor
    pub fn source_alpha_blend_func(&self) -> BlendFactor {
        self.source_alpha_blend_func
    }

    /// Destination blend factor
    pub fn dest_alpha_blend_func(&self) -> BlendFactor {
        self.dest_alpha_blend_func
    }

    /// Set both blend factors
    pub fn set_alpha_blend_func(&mut self, source: BlendFactor, dest: BlendFactor) {
        self.source_alpha_blend_func = source;
        self.dest_alpha_blend_func = dest;
        self.mark_hash_dirty();
    }

    /// Alpha blending enabled
    pub fn alpha_blend(&self) -> bool {
        self.alpha_blend
    }

    /// Enable or disable alpha blending
    pub fn set_alpha_blend(&mut self, alpha_blend: bool) {
        self.alpha_blend = alpha_blend;
        self.mark_hash_dirty();
    }

    /// Alpha-to-coverage enabled
    pub fn alpha_to_coverage(&self) -> bool {
        self.alpha_to_coverage
    }

    /// Enable or disable alpha-to-coverage
    pub fn set_alpha_to_coverage(&mut self, alpha_to_coverage: bool) {
        self.alpha_to_coverage = alpha_to_coverage;
        self.mark_hash_dirty();
    }

    /// Sample coverage value
    pub fn sample_coverage(&self) -> f32 {
        self.sample_coverage
    }

    /// Set the sample coverage value
    pub fn set_sample_coverage(&mut self, sample_coverage: f32) {
        self.sample_coverage = sample_coverage;
        self.mark_hash_dirty();
    }

    /// Whether the coverage mask is inverted
    pub fn invert_coverage_mask(&self) -> bool {
        self.invert_coverage_mask
    }

    /// Invert the coverage mask
    pub fn set_invert_coverage_mask(&mut self, invert: bool) {
        self.invert_coverage_mask = invert;
        self.mark_hash_dirty();
    }

    /// Depth testing enabled
    pub fn depth_test(&self) -> bool {
        self.depth_test
    }

    /// Enable or disable depth testing
    pub fn set_depth_test(&mut self, depth_test: bool) {
        self.depth_test = depth_test;
        self.mark_hash_dirty();
    }

    /// Depth writes enabled
    pub fn depth_mask(&self) -> bool {
        self.depth_mask
    }

    /// Enable or disable depth writes
    pub fn set_depth_mask(&mut self, depth_mask: bool) {
        self.depth_mask = depth_mask;
        self.mark_hash_dirty();
    }

    /// Polygon offset enabled
    pub fn offset(&self) -> bool {
        self.offset
    }

    /// Enable or disable polygon offset
    pub fn set_offset(&mut self, offset: bool) {
        self.offset = offset;
        self.mark_hash_dirty();
    }

    /// Polygon offset factor
    pub fn offset_factor(&self) -> f32 {
        self.offset_factor
    }

    /// Set the polygon offset factor
    pub fn set_offset_factor(&mut self, factor: f32) {
        self.offset_factor = factor;
        self.mark_hash_dirty();
    }

    /// Polygon offset units
    pub fn offset_units(&self) -> f32 {
        self.offset_units
    }

    /// Set the polygon offset units
    pub fn set_offset_units(&mut self, units: f32) {
        self.offset_units = units;
        self.mark_hash_dirty();
    }

    /// Stencil testing enabled
    pub fn stencil_test(&self) -> bool {
        self.stencil.test
    }

    /// Enable or disable stencil testing
    pub fn set_stencil_test(&mut self, test: bool) {
        self.stencil.test = test;
        self.mark_hash_dirty();
    }

    /// Set the stencil comparison
    pub fn set_stencil_func(&mut self, func: CompareFunc, reference: i32, mask: u32) {
        self.stencil.func = func;
        self.stencil.func_ref = reference;
        self.stencil.func_mask = mask;
        self.mark_hash_dirty();
    }

    /// Stencil comparison function
    pub fn stencil_func(&self) -> CompareFunc {
        self.stencil.func
    }

    /// Stencil reference value
    pub fn stencil_func_ref(&self) -> i32 {
        self.stencil.func_ref
    }

    /// Stencil comparison mask
    pub fn stencil_func_mask(&self) -> u32 {
        self.stencil.func_mask
    }

    /// Set the stencil update operations
    pub fn set_stencil_op(&mut self, sfail: StencilOp, dpfail: StencilOp, dppass: StencilOp) {
        self.stencil.sfail = sfail;
        self.stencil.dpfail = dpfail;
        self.stencil.dppass = dppass;
        self.mark_hash_dirty();
    }

    /// Operation when the stencil test fails
    pub fn stencil_op_sfail(&self) -> StencilOp {
        self.stencil.sfail
    }

    /// Operation when the depth test fails
    pub fn stencil_op_dpfail(&self) -> StencilOp {
        self.stencil.dpfail
    }

    /// Operation when both tests pass
    pub fn stencil_op_dppass(&self) -> StencilOp {
        self.stencil.dppass
    }

    /// Stencil write mask
    pub fn stencil_mask(&self) -> u32 {
        self.stencil.write_mask
    }

    /// Set the stencil write mask
    pub fn set_stencil_mask(&mut self, mask: u32) {
        self.stencil.write_mask = mask;
        self.mark_hash_dirty();
    }

    /// Primitive assembly mode
    pub fn draw_mode(&self) -> DrawMode {
        self.draw_mode
    }

    /// Set the primitive assembly mode
    pub fn set_draw_mode(&mut self, draw_mode: DrawMode) {
        self.draw_mode = draw_mode;
        self.mark_hash_dirty();
    }

    /// Eyes this renderable is drawn for
    pub fn render_mask(&self) -> RenderMask {
        self.render_mask
    }

    /// Set the eyes this renderable is drawn for
    pub fn set_render_mask(&mut self, render_mask: RenderMask) {
        self.render_mask = render_mask;
        self.mark_hash_dirty();
    }

    /// Lit by scene lights
    pub fn light_enabled(&self) -> bool {
        self.use_light
    }

    /// Turn scene lighting on
    pub fn enable_light(&mut self) {
        self.use_light = true;
        self.mark_hash_dirty();
    }

    /// Turn scene lighting off
    pub fn disable_light(&mut self) {
        self.use_light = false;
        self.mark_hash_dirty();
    }

    /// Uses a baked lightmap
    pub fn lightmap_enabled(&self) -> bool {
        self.use_lightmap
    }

    /// Turn the baked lightmap on
    pub fn enable_lightmap(&mut self) {
        self.use_lightmap = true;
        self.mark_hash_dirty();
    }

    /// Turn the baked lightmap off
    pub fn disable_lightmap(&mut self) {
        self.use_lightmap = false;
        self.mark_hash_dirty();
    }

    // Ordering and shadows (not part of the pipeline hash)

    /// Draw order
    pub fn rendering_order(&self) -> i32 {
        self.rendering_order
    }

    /// Set the draw order
    pub fn set_rendering_order(&mut self, order: i32) {
        self.rendering_order = order;
    }

    /// Casts shadows in the shadow pass
    pub fn cast_shadows(&self) -> bool {
        self.cast_shadows
    }

    /// Enable or disable shadow casting
    pub fn set_cast_shadows(&mut self, cast_shadows: bool) {
        self.cast_shadows = cast_shadows;
    }

    /// Move between the transparent and geometry bands.
    ///
    /// With alpha the order moves into the transparent band keeping its
    /// in-band offset and blending is turned on. Without alpha an object in
    /// the transparent band moves back to geometry.
    pub fn adjust_rendering_order_for_transparency(&mut self, has_alpha: bool) {
        let band = RenderQueue::band_of(self.rendering_order);
        let offset = RenderQueue::offset_in_band(self.rendering_order);
        if has_alpha {
            if band != RenderQueue::Transparent {
                self.rendering_order = RenderQueue::Transparent.order() + offset;
            }
            self.set_alpha_blend(true);
        } else if band == RenderQueue::Transparent {
            self.rendering_order = RenderQueue::Geometry.order() + offset;
        }
    }

    // Hash

    /// Whether the cached hash is stale
    pub fn is_hash_dirty(&self) -> bool {
        self.hash_state == HashState::Dirty
    }

    /// Canonical summary of the pipeline state, recomputed only when dirty
    pub fn hash_code(&mut self) -> &str {
        if self.hash_state == HashState::Dirty {
            self.hash_code = self.compute_hash();
            self.hash_state = HashState::Clean;
        }
        &self.hash_code
    }

    fn compute_hash(&self) -> String {
        let mut hash = String::with_capacity(128);
        for pass in &self.passes {
            let pass = pass.read();
            match pass.shader(false) {
                Some(id) => {
                    let _ = write!(hash, "{id}");
                }
                None => hash.push('-'),
            }
            let _ = write!(hash, "{:?};", pass.cull_face());
        }
        let s = &self.stencil;
        let _ = write!(
            hash,
            "|b{:?}{:?}{}|d{}{}|s{}{:?}{},{},{:?}{:?}{:?}{}|m{:?}",
            self.source_alpha_blend_func,
            self.dest_alpha_blend_func,
            u8::from(self.alpha_blend),
            u8::from(self.depth_test),
            u8::from(self.depth_mask),
            u8::from(s.test),
            s.func,
            s.func_ref,
            s.func_mask,
            s.sfail,
            s.dpfail,
            s.dppass,
            s.write_mask,
            self.draw_mode,
        );
        let _ = write!(
            hash,
            "|o{}{},{}|a{}{}{}|r{}|l{}{}",
            u8::from(self.offset),
            self.offset_factor,
            self.offset_units,
            u8::from(self.alpha_to_coverage),
            self.sample_coverage,
            u8::from(self.invert_coverage_mask),
            self.render_mask.bits(),
            u8::from(self.use_light),
            u8::from(self.use_lightmap),
        );
        hash
    }

    // GPU resources

    /// Whether mesh buffers or bone matrices need updating
    pub fn is_gpu_dirty(&self) -> bool {
        self.gpu_state == GpuState::Dirty
    }

    /// Bring mesh buffers and the skinning block up to date.
    ///
    /// Returns `true` when the GPU copies match the CPU state afterwards,
    /// whether or not anything had to be uploaded. Returns `false` without a
    /// mesh or when an upload failed; failures are logged and leave the state
    /// dirty for the next frame.
    pub fn update_gpu(&mut self, renderer: &mut dyn Renderer, shader: &Shader) -> bool {
        let Some(mesh) = self.mesh.clone() else {
            return false;
        };
        let mut mesh = mesh.write();

        if mesh.is_dirty() {
            if let Err(e) = renderer.update_mesh_buffers(&mut mesh) {
                log::warn!("RENDER: mesh buffers not updated, retrying next frame: {e}");
                self.gpu_state = GpuState::Dirty;
                return false;
            }
        }
        if mesh.has_bones() {
            if let Err(e) = self.update_bones(&mesh, renderer, shader) {
                log::warn!("RENDER: {BONES_BLOCK_NAME} not updated, retrying next frame: {e}");
                self.gpu_state = GpuState::Dirty;
                return false;
            }
        }
        self.gpu_state = GpuState::Clean;
        true
    }

    fn update_bones(&mut self, mesh: &Mesh, renderer: &mut dyn Renderer, shader: &Shader) -> RenderResult<()> {
        let fresh = self.bones_ubo.is_none();
        if fresh {
            let mut block = renderer.create_uniform_block(
                BONES_BLOCK_DESCRIPTOR,
                self.bones_binding,
                BONES_BLOCK_NAME,
                self.max_bones * MAT4_FLOATS,
            )?;
            block.use_gpu_buffer(true);
            self.bones_ubo = Some(block);
        }

        let generation = mesh.bones_generation();
        let rewrite = fresh || self.bones_generation != Some(generation) || self.gpu_state == GpuState::Dirty;
        let max_bones = self.max_bones;
        let Some(block) = self.bones_ubo.as_mut() else {
            return Ok(());
        };
        if rewrite {
            let bones = mesh.bone_matrices();
            if bones.len() > max_bones {
                log::warn!("RENDER: {} bones exceed the limit of {max_bones}, extra bones ignored", bones.len());
            }
            for (i, bone) in bones.iter().take(max_bones).enumerate() {
                block.set_at(i * MAT4_SIZE, &mat4_to_floats(bone))?;
            }
        }
        if block.is_dirty() {
            block.update_gpu(renderer)?;
        }
        self.bones_generation = Some(generation);
        block.bind_buffer(shader, renderer)
    }

    /// Check whether this renderable can be drawn in the current pass
    pub fn is_valid(&self, renderer: &dyn Renderer, state: &RenderState) -> Validity {
        let Some(mesh) = self.mesh.as_ref() else {
            return Validity::Invalid;
        };
        if mesh.read().is_empty() || self.passes.is_empty() {
            return Validity::Invalid;
        }
        if state.shadow_pass && !self.cast_shadows {
            return Validity::Invalid;
        }
        for pass in &self.passes {
            let pass = pass.read();
            let ready = pass
                .shader(state.use_multiview)
                .and_then(|id| renderer.shaders().get(id))
                .is_some_and(Shader::is_ready);
            if !ready || !pass.material().read().main_texture_ready() {
                return Validity::NotReady;
            }
        }
        Validity::Valid
    }

    // Camera distance

    /// Supply this frame's distance computation; it runs at most once
    pub fn set_camera_distance_provider(&mut self, provider: impl FnOnce() -> f32 + Send + 'static) {
        self.camera_distance = CameraDistance::Provided(Box::new(provider));
    }

    /// Distance from the camera, computing it on first use this frame.
    ///
    /// Returns 0.0 when no provider was supplied.
    pub fn camera_distance(&mut self) -> f32 {
        let distance = match std::mem::replace(&mut self.camera_distance, CameraDistance::Unset) {
            CameraDistance::Unset => return 0.0,
            CameraDistance::Provided(provider) => provider(),
            CameraDistance::Cached(distance) => distance,
        };
        self.camera_distance = CameraDistance::Cached(distance);
        distance
    }

    /// Distance computed this frame, if any
    pub fn cached_camera_distance(&self) -> Option<f32> {
        match self.camera_distance {
            CameraDistance::Cached(distance) => Some(distance),
            _ => None,
        }
    }

    /// Forget this frame's distance
    pub fn reset_camera_distance(&mut self) {
        self.camera_distance = CameraDistance::Unset;
    }
}

impl Default for RenderData {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for RenderData {
    /// Passes and the mesh are shared; the skinning block is not, so a copy
    /// of skinned render data rebuilds its own on the next update.
    fn clone(&self) -> Self {
        Self {
            passes: self.passes.clone(),
            mesh: self.mesh.clone(),
            bones_ubo: None,
            bones_generation: None,
            bones_binding: self.bones_binding,
            max_bones: self.max_bones,
            batch: self.batch,
            batching: self.batching,
            hash_state: self.hash_state,
            hash_code: self.hash_code.clone(),
            gpu_state: if self.bones_ubo.is_some() { GpuState::Dirty } else { self.gpu_state },
            source_alpha_blend_func: self.source_alpha_blend_func,
            dest_alpha_blend_func: self.dest_alpha_blend_func,
            alpha_blend: self.alpha_blend,
            alpha_to_coverage: self.alpha_to_coverage,
            sample_coverage: self.sample_coverage,
            invert_coverage_mask: self.invert_coverage_mask,
            depth_test: self.depth_test,
            depth_mask: self.depth_mask,
            offset: self.offset,
            offset_factor: self.offset_factor,
            offset_units: self.offset_units,
            stencil: self.stencil,
            draw_mode: self.draw_mode,
            render_mask: self.render_mask,
            use_light: self.use_light,
            use_lightmap: self.use_lightmap,
            rendering_order: self.rendering_order,
            cast_shadows: self.cast_shadows,
            camera_distance: match self.camera_distance {
                CameraDistance::Cached(distance) => CameraDistance::Cached(distance),
                _ => CameraDistance::Unset,
            },
        }
    }
}

/// Draw order: rendering order, then shader, then pass count, then camera
/// distance (far to near in the transparent band, near to far elsewhere).
///
/// Uses the distance cached this frame; [`sort_for_drawing`] computes it
/// first.
pub fn compare_by_order_shader_distance(a: &RenderData, b: &RenderData) -> Ordering {
    let shader = |rd: &RenderData| rd.passes.first().and_then(|p| p.read().shader(false));
    a.rendering_order
        .cmp(&b.rendering_order)
        .then_with(|| shader(a).cmp(&shader(b)))
        .then_with(|| a.passes.len().cmp(&b.passes.len()))
        .then_with(|| {
            let da = a.cached_camera_distance().unwrap_or(0.0);
            let db = b.cached_camera_distance().unwrap_or(0.0);
            if RenderQueue::band_of(a.rendering_order) == RenderQueue::Transparent {
                db.total_cmp(&da)
            } else {
                da.total_cmp(&db)
            }
        })
}

/// Evaluate every camera distance once, then sort into draw order
pub fn sort_for_drawing<T: BorrowMut<RenderData>>(items: &mut [T]) {
    for item in items.iter_mut() {
        BorrowMut::<RenderData>::borrow_mut(item).camera_distance();
    }
    items.sort_by(|a, b| {
        compare_by_order_shader_distance(Borrow::<RenderData>::borrow(a), Borrow::<RenderData>::borrow(b))
    });
}
