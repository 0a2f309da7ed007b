//! Cross-module scenarios driven through the headless backend

mod light_frame_loop;
