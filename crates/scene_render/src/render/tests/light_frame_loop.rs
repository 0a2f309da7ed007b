//! Light list driven through several frames the way a scene renderer does
//!
//! Lights are added and removed between frames, payloads change, and the
//! uploaded `Lights_ubo` contents are checked against every light's packed
//! uniforms at its offset.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::foundation::math::Vec3;
use crate::render::api::{HeadlessRenderer, Renderer};
use crate::render::lighting::{Light, LightList, LightRef, DIRECTIONAL_CLASS, POINT_CLASS, SPOT_CLASS};
use crate::render::resources::Shader;
use crate::scene::Scene;

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (HeadlessRenderer, Shader) {
        let mut renderer = HeadlessRenderer::new();
        let id = renderer.shaders_mut().register(Shader::new("lit_textured"));
        let shader = renderer.shaders().get(id).cloned().unwrap();
        (renderer, shader)
    }

    fn make_light(class: usize) -> LightRef {
        match class % 3 {
            0 => Light::point(Vec3::new(1.0, 2.0, 3.0), Vec3::new(1.0, 0.5, 0.25), 2.0, 8.0),
            1 => Light::spot(
                Vec3::new(0.0, 4.0, 0.0),
                Vec3::new(0.0, -1.0, 0.0),
                Vec3::new(1.0, 1.0, 1.0),
                1.0,
                6.0,
                0.3,
                0.5,
            ),
            _ => Light::directional(Vec3::new(0.3, -1.0, 0.2), Vec3::new(1.0, 1.0, 0.9), 0.8),
        }
    }

    /// Every light's packed payload must sit at its offset in the uploaded buffer
    fn assert_uploaded_matches(list: &LightList, renderer: &HeadlessRenderer) {
        let uploaded = list.with_light_block(|block| {
            let handle = block.and_then(|b| b.gpu_buffer()).expect("light block uploaded");
            renderer.buffer_floats(handle).expect("buffer alive")
        });
        let mut expected_offset = 0;
        list.for_each_light(|light| {
            let offset = light.block_offset().expect("light laid out");
            assert_eq!(offset, expected_offset);
            let floats = light.uniforms().packed_floats();
            let start = offset / 4;
            assert_eq!(&uploaded[start..start + floats.len()], &floats[..]);
            expected_offset += light.total_size();
        });
    }

    /// Class map equals per-class counts; indices are `0..count` in list order
    fn assert_indices_dense(list: &LightList) {
        let mut seen: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        list.for_each_light(|light| {
            seen.entry(light.class_name().to_string())
                .or_default()
                .push(light.light_index().expect("listed light has an index"));
        });
        let counts: BTreeMap<String, usize> = seen.iter().map(|(k, v)| (k.clone(), v.len())).collect();
        assert_eq!(list.class_counts(), counts);
        for indices in seen.values() {
            assert_eq!(indices, &(0..indices.len()).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_frames_with_adds_removes_and_edits() {
        let (mut renderer, shader) = setup();
        let list = LightList::new();
        let lights: Vec<_> = (0..6).map(make_light).collect();

        // frame 1: three lights
        for light in &lights[..3] {
            assert!(list.add_light(light));
        }
        list.update_lights(&mut renderer, &shader);
        assert_uploaded_matches(&list, &renderer);

        // frame 2: grow past the first block
        for light in &lights[3..] {
            assert!(list.add_light(light));
        }
        list.update_lights(&mut renderer, &shader);
        assert_uploaded_matches(&list, &renderer);
        assert_eq!(renderer.live_buffer_count(), 1);

        // frame 3: remove from the front, edit one payload
        assert!(list.remove_light(&lights[0]));
        lights[4].lock().uniforms_mut().set_float("intensity", 5.0);
        list.update_lights(&mut renderer, &shader);
        assert_uploaded_matches(&list, &renderer);
        assert_indices_dense(&list);

        // frame 4: nothing changed
        let uploads = renderer.upload_count();
        list.update_lights(&mut renderer, &shader);
        assert_eq!(renderer.upload_count(), uploads);
    }

    #[test]
    fn test_shader_block_tracks_classes() {
        let list = LightList::new();
        let lights: Vec<_> = (0..5).map(make_light).collect();
        for light in &lights {
            list.add_light(light);
        }
        assert_eq!(
            list.make_shader_block(),
            format!(
                "layout (std140) uniform Lights_ubo\n{{\nU{d} {d}s[1];\nU{p} {p}s[2];\nU{s} {s}s[2];\n}};\n",
                d = DIRECTIONAL_CLASS,
                p = POINT_CLASS,
                s = SPOT_CLASS
            )
        );

        list.remove_light(&lights[2]);
        assert!(!list.make_shader_block().contains(DIRECTIONAL_CLASS));
    }

    #[test]
    fn test_add_remove_sequence_keeps_invariants() {
        let list = LightList::with_max_lights(8);
        let pool: Vec<_> = (0..12).map(make_light).collect();

        // deterministic pseudo-random walk over the pool
        let mut seed: u32 = 0x2545_f491;
        for _ in 0..200 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let light = &pool[(seed >> 16) as usize % pool.len()];
            let before = list.light_count();
            if list.contains(light) {
                assert!(list.remove_light(light));
                assert_eq!(list.light_count(), before - 1);
                assert_eq!(light.lock().light_index(), None);
            } else if before == list.max_lights() {
                assert!(!list.add_light(light));
                assert_eq!(list.light_count(), before);
            } else {
                assert!(list.add_light(light));
                assert!(!list.add_light(light));
            }
            assert_indices_dense(&list);
        }
    }

    #[test]
    fn test_scene_thread_mutates_while_render_thread_updates() {
        let (mut renderer, shader) = setup();
        let scene = Scene::new();
        let list = Arc::clone(scene.light_list());

        let writer = {
            let list = Arc::clone(&list);
            std::thread::spawn(move || {
                let lights: Vec<_> = (0..8).map(make_light).collect();
                for light in &lights {
                    list.add_light(light);
                }
                for light in lights.iter().step_by(2) {
                    list.remove_light(light);
                }
                lights
            })
        };
        for _ in 0..10 {
            list.update_lights(&mut renderer, &shader);
        }
        let _lights = writer.join().unwrap();

        list.update_lights(&mut renderer, &shader);
        assert_eq!(list.light_count(), 4);
        assert_indices_dense(&list);
        assert_uploaded_matches(&list, &renderer);
    }

    #[test]
    fn test_upload_failure_then_recovery() {
        let (mut renderer, shader) = setup();
        let list = LightList::new();
        let light = make_light(0);
        list.add_light(&light);

        renderer.set_fail_uploads(true);
        list.update_lights(&mut renderer, &shader);
        light.lock().uniforms_mut().set_float("range", 20.0);
        list.update_lights(&mut renderer, &shader);
        assert_eq!(renderer.upload_count(), 0);

        renderer.set_fail_uploads(false);
        list.update_lights(&mut renderer, &shader);
        assert_uploaded_matches(&list, &renderer);
        assert!(!list.is_dirty());
    }
}
