//! Light aggregation into the shared `Lights_ubo` block
//!
//! [`LightList`] holds the scene's active lights, numbers them densely per
//! light class, and packs every light's uniform payload into one uniform
//! block. Shaders declare that block with the text produced by
//! [`LightList::make_shader_block`] and address a light as
//! `<class>s[index]`.
//!
//! All state sits behind a single non-reentrant mutex. Public methods lock
//! once and work on `LightListState` through private helpers, so nothing
//! inside the list ever locks it a second time. Individual lights are
//! locked after the list, never before.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::config::LightingConfig;
use crate::render::api::Renderer;
use crate::render::resources::{Shader, UniformBlock, LIGHT_UBO_INDEX};
use crate::render::RenderResult;
use crate::scene::MAX_LIGHTS;

use super::light::{Light, LightRef};
use super::shadow_map::ShadowMap;

/// Layout descriptor of the light block
pub const LIGHT_BLOCK_DESCRIPTOR: &str = "float lightdata";
/// Name of the light block in shader source
pub const LIGHT_BLOCK_NAME: &str = "Lights_ubo";

const FLOAT_SIZE: usize = std::mem::size_of::<f32>();
/// One std140 vec4; an empty list still binds a valid block
const MIN_BLOCK_FLOATS: usize = 4;

/// Whether light offsets inside the block are up to date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutState {
    /// Offsets match the current light set
    Current,
    /// Lights were added or the list was cleared
    Stale,
}

/// Whether per-class indices moved since the last upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    /// Indices unchanged
    Stable,
    /// A removal renumbered lights; every payload must be written again
    Shifted,
}

#[derive(Debug)]
struct LightListState {
    lights: Vec<LightRef>,
    class_map: BTreeMap<String, usize>,
    light_block: Option<UniformBlock>,
    retired_blocks: Vec<UniformBlock>,
    layout: LayoutState,
    indices: IndexState,
    layout_sizes: Vec<usize>,
}

/// Result of laying out the light block
struct BlockLayout {
    allocated: bool,
    moved: bool,
}

impl LightListState {
    fn new() -> Self {
        Self {
            lights: Vec::new(),
            class_map: BTreeMap::new(),
            light_block: None,
            retired_blocks: Vec::new(),
            layout: LayoutState::Stale,
            indices: IndexState::Stable,
            layout_sizes: Vec::new(),
        }
    }

    fn position_of(&self, light: &LightRef) -> Option<usize> {
        self.lights.iter().position(|l| Arc::ptr_eq(l, light))
    }

    fn sizes_changed(&self) -> bool {
        self.layout_sizes.len() != self.lights.len()
            || self
                .lights
                .iter()
                .zip(&self.layout_sizes)
                .any(|(light, &size)| light.lock().total_size() != size)
    }

    fn release_retired(&mut self, renderer: &mut dyn Renderer) {
        for mut block in self.retired_blocks.drain(..) {
            block.release(renderer);
        }
    }

    fn retire_block(&mut self) {
        if let Some(block) = self.light_block.take() {
            self.retired_blocks.push(block);
        }
    }

    /// Assign byte offsets as a prefix sum over light sizes in list order and
    /// make sure the block can hold them all.
    fn create_block(&mut self, renderer: &mut dyn Renderer, binding: u32) -> RenderResult<BlockLayout> {
        let mut offset = 0;
        let mut moved = false;
        let mut sizes = Vec::with_capacity(self.lights.len());
        for light in &self.lights {
            let mut light = light.lock();
            let size = light.total_size();
            match light.block_offset() {
                Some(current) if current == offset => {}
                Some(_) => {
                    moved = true;
                    light.set_block_offset(Some(offset));
                }
                None => {
                    light.mark_dirty();
                    light.set_block_offset(Some(offset));
                }
            }
            sizes.push(size);
            offset += size;
        }

        let float_count = (offset / FLOAT_SIZE).max(MIN_BLOCK_FLOATS);
        let allocated = match &self.light_block {
            Some(block) => block.float_count() < float_count,
            None => true,
        };
        if allocated {
            let mut block = renderer.create_uniform_block(LIGHT_BLOCK_DESCRIPTOR, binding, LIGHT_BLOCK_NAME, float_count)?;
            block.use_gpu_buffer(true);
            log::debug!("LIGHT: allocated {LIGHT_BLOCK_NAME} with {float_count} floats for {} lights", self.lights.len());
            self.retire_block();
            self.light_block = Some(block);
        }

        self.layout_sizes = sizes;
        self.layout = LayoutState::Current;
        Ok(BlockLayout { allocated, moved })
    }

    /// Copy payloads into the block; returns how many lights were written
    fn copy_payloads(&mut self, force_all: bool) -> usize {
        let Some(block) = self.light_block.as_mut() else {
            return 0;
        };
        let mut copied = 0;
        for light in &self.lights {
            let mut light = light.lock();
            if !force_all && !light.is_dirty() {
                continue;
            }
            let Some(offset) = light.block_offset() else {
                continue;
            };
            match block.set_at(offset, &light.uniforms().packed_floats()) {
                Ok(()) => {
                    light.clear_dirty();
                    copied += 1;
                    log::trace!(
                        "LIGHT: {}[{:?}] written at byte {offset}",
                        light.class_name(),
                        light.light_index()
                    );
                }
                Err(e) => log::warn!("LIGHT: {} payload not written: {e}", light.class_name()),
            }
        }
        copied
    }

    fn first_shadow_map(&self) -> Option<ShadowMap> {
        self.lights.iter().find_map(|light| {
            let light = light.lock();
            if !light.is_enabled() {
                return None;
            }
            light.shadow_map().filter(|sm| sm.is_enabled()).cloned()
        })
    }
}

/// The scene's active lights packed into one uniform block
#[derive(Debug)]
pub struct LightList {
    state: Mutex<LightListState>,
    max_lights: usize,
    binding: u32,
}

impl LightList {
    /// Create an empty list accepting up to [`MAX_LIGHTS`] lights
    pub fn new() -> Self {
        Self::with_max_lights(MAX_LIGHTS)
    }

    /// Create an empty list with a custom capacity
    pub fn with_max_lights(max_lights: usize) -> Self {
        Self {
            state: Mutex::new(LightListState::new()),
            max_lights,
            binding: LIGHT_UBO_INDEX,
        }
    }

    /// Create an empty list from lighting configuration
    pub fn with_config(config: &LightingConfig) -> Self {
        Self {
            state: Mutex::new(LightListState::new()),
            max_lights: config.max_lights,
            binding: config.light_ubo_binding,
        }
    }

    /// Maximum number of active lights
    pub fn max_lights(&self) -> usize {
        self.max_lights
    }

    /// Add a light.
    ///
    /// Returns false without changing anything when the light is already
    /// listed or the list is full.
    pub fn add_light(&self, light: &LightRef) -> bool {
        let mut state = self.state.lock();
        if state.position_of(light).is_some() {
            log::warn!("LIGHT: light already in list, ignored");
            return false;
        }
        if state.lights.len() >= self.max_lights {
            log::warn!("LIGHT: light list full ({} lights), light ignored", self.max_lights);
            return false;
        }

        {
            let mut guard = light.lock();
            let count = state.class_map.entry(guard.class_name().to_string()).or_insert(0);
            guard.set_light_index(Some(*count));
            *count += 1;
            log::debug!("LIGHT: added {} light at index {}", guard.class_name(), *count - 1);
        }
        state.lights.push(Arc::clone(light));
        state.layout = LayoutState::Stale;
        true
    }

    /// Remove a light and renumber the rest of its class.
    ///
    /// Returns false when the light is not listed.
    pub fn remove_light(&self, light: &LightRef) -> bool {
        let mut state = self.state.lock();
        let Some(position) = state.position_of(light) else {
            return false;
        };
        let removed = state.lights.remove(position);
        let class_name = {
            let mut guard = removed.lock();
            guard.set_light_index(None);
            guard.set_block_offset(None);
            guard.class_name().to_string()
        };

        let remaining = match state.class_map.get_mut(&class_name) {
            Some(count) => {
                *count = count.saturating_sub(1);
                *count
            }
            None => 0,
        };
        if remaining == 0 {
            state.class_map.remove(&class_name);
        } else {
            let mut next = 0;
            for other in &state.lights {
                let mut other = other.lock();
                if other.class_name() == class_name {
                    other.set_light_index(Some(next));
                    next += 1;
                }
            }
        }
        log::debug!("LIGHT: removed {class_name} light, {remaining} left in class");
        state.indices = IndexState::Shifted;
        true
    }

    /// Remove every light; the GPU block is released on the next update
    pub fn clear(&self) {
        let mut state = self.state.lock();
        for light in state.lights.drain(..) {
            let mut light = light.lock();
            light.set_light_index(None);
            light.set_block_offset(None);
        }
        state.class_map.clear();
        state.layout_sizes.clear();
        state.retire_block();
        state.layout = LayoutState::Stale;
        state.indices = IndexState::Stable;
        log::debug!("LIGHT: list cleared");
    }

    /// Bring the light block up to date and bind it for `shader`.
    ///
    /// The block is bound on every call, including when the list is empty.
    /// Returns the first enabled shadow map among enabled lights. GPU
    /// failures are logged; dirty state is kept so the next frame retries.
    pub fn update_lights(&self, renderer: &mut dyn Renderer, shader: &Shader) -> Option<ShadowMap> {
        let mut state = self.state.lock();
        state.release_retired(renderer);

        let mut force_all = state.indices == IndexState::Shifted;
        if state.layout == LayoutState::Stale || force_all || state.sizes_changed() {
            match state.create_block(renderer, self.binding) {
                Ok(layout) => {
                    force_all |= layout.allocated || layout.moved;
                    state.release_retired(renderer);
                }
                Err(e) => {
                    log::error!("LIGHT: cannot allocate {LIGHT_BLOCK_NAME}: {e}");
                    return None;
                }
            }
        }

        let copied = state.copy_payloads(force_all);
        state.indices = IndexState::Stable;

        let block = state.light_block.as_mut()?;
        if copied > 0 || block.is_dirty() {
            if let Err(e) = block.update_gpu(renderer) {
                log::warn!("LIGHT: upload of {LIGHT_BLOCK_NAME} failed, retrying next frame: {e}");
            }
        }
        if let Err(e) = block.bind_buffer(shader, renderer) {
            log::warn!("LIGHT: bind of {LIGHT_BLOCK_NAME} to shader {} failed: {e}", shader.id());
        }

        state.first_shadow_map()
    }

    /// Lay out the light block, allocating a larger one if needed.
    ///
    /// Returns whether a new block was allocated.
    pub fn create_light_block(&self, renderer: &mut dyn Renderer) -> RenderResult<bool> {
        let mut state = self.state.lock();
        state.release_retired(renderer);
        let layout = state.create_block(renderer, self.binding)?;
        if layout.allocated || layout.moved {
            for light in &state.lights {
                light.lock().mark_dirty();
            }
        }
        Ok(layout.allocated)
    }

    /// GLSL declaration of the light block, one array per light class
    pub fn make_shader_block(&self) -> String {
        let state = self.state.lock();
        let mut layout = format!("layout (std140) uniform {LIGHT_BLOCK_NAME}\n{{\n");
        for (class_name, count) in &state.class_map {
            let _ = writeln!(layout, "U{class_name} {class_name}s[{count}];");
        }
        layout.push_str("};\n");
        layout
    }

    /// Give each shadow-casting light a shadow map layer.
    ///
    /// Layers follow list order among casters. Returns the number of
    /// layers in use.
    pub fn make_shadow_maps(&self, renderer: &mut dyn Renderer) -> usize {
        let state = self.state.lock();
        let mut layer = 0;
        for light in &state.lights {
            let mut light = light.lock();
            let casts = light.cast_shadows();
            if let Err(e) = light.make_shadow_map(renderer, layer) {
                log::warn!("SHADOW: {} light has no shadow map: {e}", light.class_name());
            }
            if casts {
                layer += 1;
            }
        }
        layer
    }

    /// Visit every light in list order
    pub fn for_each_light(&self, mut f: impl FnMut(&Light)) {
        let state = self.state.lock();
        for light in &state.lights {
            f(&light.lock());
        }
    }

    /// Visit every light mutably in list order
    pub fn for_each_light_mut(&self, mut f: impl FnMut(&mut Light)) {
        let state = self.state.lock();
        for light in &state.lights {
            f(&mut light.lock());
        }
    }

    /// Number of active lights
    pub fn light_count(&self) -> usize {
        self.state.lock().lights.len()
    }

    /// Whether no lights are active
    pub fn is_empty(&self) -> bool {
        self.state.lock().lights.is_empty()
    }

    /// Whether `light` is in the list
    pub fn contains(&self, light: &LightRef) -> bool {
        self.state.lock().position_of(light).is_some()
    }

    /// Number of lights of `class_name`
    pub fn class_count(&self, class_name: &str) -> usize {
        self.state.lock().class_map.get(class_name).copied().unwrap_or(0)
    }

    /// Light counts per class, sorted by class name
    pub fn class_counts(&self) -> BTreeMap<String, usize> {
        self.state.lock().class_map.clone()
    }

    /// Whether the next [`update_lights`](Self::update_lights) has work to do
    pub fn is_dirty(&self) -> bool {
        let state = self.state.lock();
        state.layout == LayoutState::Stale
            || state.indices == IndexState::Shifted
            || state.light_block.as_ref().is_some_and(UniformBlock::is_dirty)
            || state.lights.iter().any(|light| light.lock().is_dirty())
    }

    /// Inspect the packed light block
    pub fn with_light_block<R>(&self, f: impl FnOnce(Option<&UniformBlock>) -> R) -> R {
        let state = self.state.lock();
        f(state.light_block.as_ref())
    }

    /// Free every GPU buffer held by the list.
    ///
    /// Lights stay listed; the next update lays out a fresh block.
    pub fn release(&self, renderer: &mut dyn Renderer) {
        let mut state = self.state.lock();
        state.retire_block();
        state.release_retired(renderer);
        for light in &state.lights {
            light.lock().set_block_offset(None);
        }
        state.layout_sizes.clear();
        state.layout = LayoutState::Stale;
    }
}

impl Default for LightList {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LightList {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        let live = state
            .light_block
            .iter()
            .chain(&state.retired_blocks)
            .filter(|block| block.gpu_buffer().is_some())
            .count();
        if live > 0 {
            log::warn!("LIGHT: light list dropped with {live} GPU buffer(s) not released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::render::api::HeadlessRenderer;
    use crate::render::lighting::{POINT_CLASS, SPOT_CLASS};

    fn point() -> LightRef {
        Light::point(Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 1.0, 1.0), 1.0, 10.0)
    }

    fn spot() -> LightRef {
        Light::spot(
            Vec3::zeros(),
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(1.0, 1.0, 1.0),
            1.0,
            5.0,
            0.2,
            0.4,
        )
    }

    fn index_of(light: &LightRef) -> Option<usize> {
        light.lock().light_index()
    }

    fn renderer_with_shader() -> (HeadlessRenderer, Shader) {
        let mut renderer = HeadlessRenderer::new();
        let id = renderer.shaders_mut().register(Shader::new("lit"));
        let shader = renderer.shaders().get(id).cloned().unwrap();
        (renderer, shader)
    }

    #[test]
    fn test_add_remove_renumbers_class() {
        let list = LightList::new();
        let (a, b, c) = (point(), point(), spot());

        assert!(list.add_light(&a));
        assert!(list.add_light(&b));
        assert!(list.add_light(&c));
        assert_eq!((index_of(&a), index_of(&b), index_of(&c)), (Some(0), Some(1), Some(0)));
        assert_eq!(list.class_count(POINT_CLASS), 2);
        assert_eq!(list.class_count(SPOT_CLASS), 1);

        assert!(list.remove_light(&a));
        assert_eq!(index_of(&a), None);
        assert_eq!(index_of(&b), Some(0));
        assert_eq!(index_of(&c), Some(0));
        assert_eq!(list.class_count(POINT_CLASS), 1);
        assert_eq!(list.class_count(SPOT_CLASS), 1);
    }

    #[test]
    fn test_removing_last_of_class_drops_entry() {
        let list = LightList::new();
        let light = spot();
        list.add_light(&light);
        list.remove_light(&light);

        assert!(list.class_counts().is_empty());
        assert!(!list.remove_light(&light));
    }

    #[test]
    fn test_duplicate_add_rejected() {
        let list = LightList::new();
        let light = point();
        assert!(list.add_light(&light));
        assert!(!list.add_light(&light));
        assert_eq!(list.light_count(), 1);
        assert_eq!(list.class_count(POINT_CLASS), 1);
        assert_eq!(index_of(&light), Some(0));
    }

    #[test]
    fn test_capacity_enforced() {
        let list = LightList::with_max_lights(2);
        assert!(list.add_light(&point()));
        assert!(list.add_light(&point()));

        let extra = spot();
        assert!(!list.add_light(&extra));
        assert_eq!(list.light_count(), 2);
        assert_eq!(list.class_count(SPOT_CLASS), 0);
        assert_eq!(index_of(&extra), None);
    }

    #[test]
    fn test_default_capacity_is_scene_max() {
        let list = LightList::new();
        for _ in 0..MAX_LIGHTS {
            assert!(list.add_light(&point()));
        }
        assert!(!list.add_light(&point()));
    }

    #[test]
    fn test_shader_block_text() {
        let list = LightList::new();
        list.add_light(&spot());
        list.add_light(&point());
        list.add_light(&point());

        assert_eq!(
            list.make_shader_block(),
            "layout (std140) uniform Lights_ubo\n{\nUpoint points[2];\nUspot spots[1];\n};\n"
        );
        assert_eq!(LightList::new().make_shader_block(), "layout (std140) uniform Lights_ubo\n{\n};\n");
    }

    #[test]
    fn test_offsets_are_prefix_sum() {
        let (mut renderer, shader) = renderer_with_shader();
        let list = LightList::new();
        let lights = [point(), spot(), Light::new("custom").shared(), point()];
        for light in &lights {
            list.add_light(light);
        }

        assert!(list.update_lights(&mut renderer, &shader).is_none());

        let mut expected = 0;
        for light in &lights {
            let light = light.lock();
            assert_eq!(light.block_offset(), Some(expected));
            expected += light.total_size();
        }
        list.with_light_block(|block| {
            let block = block.unwrap();
            assert!(block.total_size() >= expected);
            for light in &lights {
                let light = light.lock();
                let floats = light.uniforms().packed_floats();
                assert_eq!(block.floats_at(light.block_offset().unwrap(), floats.len()), Some(&floats[..]));
            }
        });
    }

    #[test]
    fn test_update_uploads_and_binds() {
        let (mut renderer, shader) = renderer_with_shader();
        let list = LightList::new();
        let light = point();
        list.add_light(&light);

        list.update_lights(&mut renderer, &shader);
        assert_eq!(renderer.upload_count(), 1);
        assert_eq!(renderer.binds().len(), 1);
        assert_eq!(renderer.binds()[0].binding, LIGHT_UBO_INDEX);
        assert_eq!(renderer.binds()[0].block_name, LIGHT_BLOCK_NAME);
        assert!(!light.lock().is_dirty());
        assert!(!list.is_dirty());

        // nothing changed: bind again, no upload
        list.update_lights(&mut renderer, &shader);
        assert_eq!(renderer.upload_count(), 1);
        assert_eq!(renderer.binds().len(), 2);

        light.lock().uniforms_mut().set_float("intensity", 3.0);
        assert!(list.is_dirty());
        list.update_lights(&mut renderer, &shader);
        assert_eq!(renderer.upload_count(), 2);
    }

    #[test]
    fn test_failed_upload_retried() {
        let (mut renderer, shader) = renderer_with_shader();
        let list = LightList::new();
        list.add_light(&point());

        renderer.set_fail_uploads(true);
        list.update_lights(&mut renderer, &shader);
        assert_eq!(renderer.upload_count(), 0);
        assert!(list.is_dirty());

        renderer.set_fail_uploads(false);
        list.update_lights(&mut renderer, &shader);
        assert_eq!(renderer.upload_count(), 1);
        assert!(!list.is_dirty());
    }

    #[test]
    fn test_failed_allocation_retried() {
        let (mut renderer, shader) = renderer_with_shader();
        let list = LightList::new();
        list.add_light(&point());

        renderer.set_fail_allocations(true);
        list.update_lights(&mut renderer, &shader);
        list.with_light_block(|block| assert!(block.is_none()));

        renderer.set_fail_allocations(false);
        list.update_lights(&mut renderer, &shader);
        list.with_light_block(|block| assert!(block.is_some()));
        assert_eq!(renderer.upload_count(), 1);
    }

    #[test]
    fn test_growth_reallocates_and_releases_old_block() {
        let (mut renderer, shader) = renderer_with_shader();
        let list = LightList::new();
        let first = point();
        list.add_light(&first);
        list.update_lights(&mut renderer, &shader);
        assert_eq!(renderer.live_buffer_count(), 1);

        list.add_light(&spot());
        assert_eq!(list.create_light_block(&mut renderer), Ok(true));
        list.update_lights(&mut renderer, &shader);
        assert_eq!(renderer.live_buffer_count(), 1);

        // shrinking keeps the larger block
        list.remove_light(&first);
        assert_eq!(list.create_light_block(&mut renderer), Ok(false));
    }

    #[test]
    fn test_removal_rewrites_moved_payloads() {
        let (mut renderer, shader) = renderer_with_shader();
        let list = LightList::new();
        let (a, b) = (point(), spot());
        list.add_light(&a);
        list.add_light(&b);
        list.update_lights(&mut renderer, &shader);

        list.remove_light(&a);
        list.update_lights(&mut renderer, &shader);

        assert_eq!(b.lock().block_offset(), Some(0));
        let expected = b.lock().uniforms().packed_floats();
        list.with_light_block(|block| {
            let handle = block.unwrap().gpu_buffer().unwrap();
            let uploaded = renderer.buffer_floats(handle).unwrap();
            assert_eq!(&uploaded[..expected.len()], &expected[..]);
        });
    }

    #[test]
    fn test_clear_resets_lights() {
        let (mut renderer, shader) = renderer_with_shader();
        let list = LightList::new();
        let light = point();
        list.add_light(&light);
        list.update_lights(&mut renderer, &shader);

        list.clear();
        assert!(list.is_empty());
        assert_eq!(index_of(&light), None);
        assert_eq!(light.lock().block_offset(), None);
        list.with_light_block(|block| assert!(block.is_none()));

        // retired block is released on the next update and an empty one bound
        let binds = renderer.binds().len();
        assert!(list.update_lights(&mut renderer, &shader).is_none());
        assert_eq!(renderer.live_buffer_count(), 1);
        assert_eq!(renderer.binds().len(), binds + 1);
        list.with_light_block(|block| assert_eq!(block.map(UniformBlock::float_count), Some(MIN_BLOCK_FLOATS)));
    }

    #[test]
    fn test_removing_last_light_still_binds() {
        let (mut renderer, shader) = renderer_with_shader();
        let list = LightList::new();
        let light = point();
        list.add_light(&light);
        list.update_lights(&mut renderer, &shader);
        let binds = renderer.binds().len();

        assert!(list.remove_light(&light));
        assert!(list.update_lights(&mut renderer, &shader).is_none());
        assert_eq!(renderer.binds().len(), binds + 1);
        assert_eq!(renderer.binds().last().map(|b| b.block_name.as_str()), Some(LIGHT_BLOCK_NAME));
        assert_eq!(renderer.live_buffer_count(), 1);
    }

    #[test]
    fn test_removal_reuploads_unmoved_lights() {
        let (mut renderer, shader) = renderer_with_shader();
        let list = LightList::new();
        let (a, b) = (point(), spot());
        list.add_light(&a);
        list.add_light(&b);
        list.update_lights(&mut renderer, &shader);
        let uploads = renderer.upload_count();

        // scribble over a's slot so only a fresh copy restores it
        let zeros = vec![0.0; a.lock().total_size() / FLOAT_SIZE];
        list.state.lock().light_block.as_mut().unwrap().set_at(0, &zeros).unwrap();
        assert!(!a.lock().is_dirty());

        list.remove_light(&b);
        list.update_lights(&mut renderer, &shader);

        assert_eq!(a.lock().block_offset(), Some(0));
        assert_eq!(renderer.upload_count(), uploads + 1);
        let expected = a.lock().uniforms().packed_floats();
        list.with_light_block(|block| {
            let uploaded = renderer.buffer_floats(block.unwrap().gpu_buffer().unwrap()).unwrap();
            assert_eq!(&uploaded[..expected.len()], &expected[..]);
        });
    }

    #[test]
    fn test_shadow_maps_follow_casters() {
        let (mut renderer, shader) = renderer_with_shader();
        let list = LightList::new();
        let (a, b, c) = (point(), spot(), spot());
        b.lock().set_cast_shadows(true);
        c.lock().set_cast_shadows(true);
        for light in [&a, &b, &c] {
            list.add_light(light);
        }

        assert_eq!(list.make_shadow_maps(&mut renderer), 2);
        assert!(a.lock().shadow_map().is_none());
        assert_eq!(c.lock().shadow_map().map(ShadowMap::layer), Some(1));

        let first = list.update_lights(&mut renderer, &shader);
        assert_eq!(first.map(|sm| sm.layer()), Some(0));

        b.lock().set_enabled(false);
        let first = list.update_lights(&mut renderer, &shader);
        assert_eq!(first.map(|sm| sm.layer()), Some(1));
    }

    #[test]
    fn test_release_frees_gpu_buffers() {
        let (mut renderer, shader) = renderer_with_shader();
        let list = LightList::new();
        list.add_light(&point());
        list.update_lights(&mut renderer, &shader);

        list.release(&mut renderer);
        assert_eq!(renderer.live_buffer_count(), 0);
        assert!(list.is_dirty());
    }

    #[test]
    fn test_config_binding_used() {
        let (mut renderer, shader) = renderer_with_shader();
        let config = LightingConfig::default().with_max_lights(4).with_binding(7);
        let list = LightList::with_config(&config);
        list.add_light(&point());
        list.update_lights(&mut renderer, &shader);

        assert_eq!(list.max_lights(), 4);
        assert_eq!(renderer.binds()[0].binding, 7);
    }

    #[test]
    fn test_shared_across_threads() {
        let list = Arc::new(LightList::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let list = Arc::clone(&list);
                std::thread::spawn(move || {
                    for _ in 0..3 {
                        assert!(list.add_light(&point()));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(list.class_count(POINT_CLASS), 12);
        let mut indices = Vec::new();
        list.for_each_light(|light| indices.extend(light.light_index()));
        indices.sort_unstable();
        assert_eq!(indices, (0..12).collect::<Vec<_>>());
    }
}
