//! lab-ngin
//!
//! Interactive graphics coursework on wgpu and winit, for native targets and
//! the web. Scenes are written as flows that own a transform hierarchy of
//! procedurally generated meshes; the runtime batches their renders per
//! pipeline, resolves colour-ID picking and forwards input.
//!
//! High-level modules
//! - `animation`: easing curves, poses and the queue-driven pose animator
//! - `avatar`: the articulated humanoid, its pose library and input policy
//! - `camera`: camera, projection, orbit controller and arcball
//! - `capture`: PNG screenshots of the current frame
//! - `config` / `logging`: start-up configuration and logger setup
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: transforms, scene graph, meshes, materials and objects
//! - `error`: scene graph and picking errors
//! - `flow`: high level flow control (scenes / update loops)
//! - `fractal` / `primitives`: CPU mesh generators
//! - `pick`: object picking through an off-screen id buffer
//! - `pipelines`: lit, unlit, textured and pick pipelines plus the light uniforms
//! - `render`: render composition for efficient pipeline reuse
//! - `render_texture`: off-screen passes whose result is sampled by other objects
//! - `scenes`: the fractal, avatar and solar scenes of the binary
//!

pub mod animation;
pub mod avatar;
pub mod camera;
pub mod capture;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod fractal;
pub mod logging;
pub mod pick;
pub mod pipelines;
pub mod primitives;
pub mod render;
pub mod render_texture;
pub mod scenes;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use winit::dpi::PhysicalPosition;
pub use winit::event::DeviceEvent;
pub use winit::event::WindowEvent;
pub use wgpu;

/// Web entry point: opens the scene named by the page's `?scene=` query,
/// the fractal scene otherwise.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    use clap::ValueEnum;

    let scene = web_sys::window()
        .and_then(|window| window.location().search().ok())
        .and_then(|query| {
            query
                .trim_start_matches('?')
                .split('&')
                .find_map(|pair| pair.strip_prefix("scene=").map(str::to_string))
        })
        .and_then(|name| scenes::Scene::from_str(&name, true).ok())
        .unwrap_or_default();
    let config = config::EngineConfig::default().with_title(scene.title());
    flow::throw_on_error(flow::run(config, scene.constructors()));
}
