//! The three interactive scenes shipped with the binary.
//!
//! Each scene is a single [`GraphicsFlow`] that owns a [`SceneGraph`] and the
//! [`RenderObject`]s hanging off it. Flows never touch the [`Context`]
//! directly; camera, lights and clear colour go through `Out::Configure`.
//!
//! [`GraphicsFlow`]: crate::flow::GraphicsFlow
//! [`SceneGraph`]: crate::data_structures::scene_graph::SceneGraph
//! [`RenderObject`]: crate::data_structures::object::RenderObject
//! [`Context`]: crate::context::Context

use std::{collections::HashMap, sync::Arc};

use instant::Duration;
use winit::{
    event::{DeviceEvent, KeyEvent, WindowEvent},
    keyboard::Key,
};

use crate::{
    context::Context,
    data_structures::mesh::{Mesh, MeshData},
    error::SceneError,
    flow::{FlowConsturctor, GraphicsFlow, Out},
    render::Render,
};

pub mod avatar;
pub mod fractal;
pub mod solar;

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Scene {
    #[default]
    Fractal,
    Avatar,
    Solar,
}

impl Scene {
    pub fn title(self) -> &'static str {
        match self {
            Scene::Fractal => "lab-ngin: fractals",
            Scene::Avatar => "lab-ngin: avatar",
            Scene::Solar => "lab-ngin: solar system",
        }
    }

    /// Flow constructors for the scene. Meshes are generated inside the
    /// constructor future, before the first frame.
    pub fn constructors(self) -> Vec<FlowConsturctor<(), ()>> {
        let constructor: FlowConsturctor<(), ()> = match self {
            Scene::Fractal => Box::new(|ctx| Box::pin(async move { or_blank("fractal", fractal::FractalFlow::new(&ctx)) })),
            Scene::Avatar => Box::new(|ctx| Box::pin(async move { or_blank("avatar", avatar::AvatarFlow::new(&ctx)) })),
            Scene::Solar => Box::new(|ctx| Box::pin(async move { or_blank("solar", solar::SolarFlow::new(&ctx)) })),
        };
        vec![constructor]
    }
}

fn or_blank<F>(scene: &str, built: Result<F, SceneError>) -> Box<dyn GraphicsFlow<(), ()>>
where
    F: GraphicsFlow<(), ()> + 'static,
{
    match built {
        Ok(flow) => Box::new(flow),
        Err(e) => {
            log::error!("cannot build the {} scene: {}", scene, e);
            Box::new(Blank)
        }
    }
}

/// Shares GPU meshes between objects built from the same generator call.
#[derive(Debug, Default)]
pub struct MeshCache {
    meshes: HashMap<String, Arc<Mesh>>,
}

impl MeshCache {
    pub fn get_or_create(
        &mut self,
        device: &wgpu::Device,
        name: &str,
        generate: impl FnOnce() -> MeshData,
    ) -> Arc<Mesh> {
        self.meshes
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mesh::new(device, name, &generate())))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

/// The lower-cased character of a key press or release, ignoring repeats.
pub fn key_char(event: &WindowEvent) -> Option<(char, bool)> {
    let WindowEvent::KeyboardInput {
        event:
            KeyEvent {
                logical_key: Key::Character(text),
                state,
                repeat: false,
                ..
            },
        ..
    } = event
    else {
        return None;
    };
    let c = text.chars().next()?.to_ascii_lowercase();
    Some((c, state.is_pressed()))
}

/// Stands in for a scene whose construction failed, so the window still opens
/// and shows the clear colour.
struct Blank;

impl GraphicsFlow<(), ()> for Blank {
    fn on_init(&mut self, _: &mut Context, _: &mut ()) -> Out<(), ()> {
        Out::Empty
    }

    fn on_click(&mut self, _: &Context, _: &mut (), _: u32) -> Out<(), ()> {
        Out::Empty
    }

    fn on_update(&mut self, _: &Context, _: &mut (), _: Duration) -> Out<(), ()> {
        Out::Empty
    }

    fn on_tick(&mut self, _: &Context, _: &mut ()) -> Out<(), ()> {
        Out::Empty
    }

    fn on_device_events(&mut self, _: &Context, _: &mut (), _: &DeviceEvent) -> Out<(), ()> {
        Out::Empty
    }

    fn on_window_events(&mut self, _: &Context, _: &mut (), _: &WindowEvent) -> Out<(), ()> {
        Out::Empty
    }

    fn on_custom_events(&mut self, _: &Context, _: &mut (), event: ()) -> Option<()> {
        Some(event)
    }

    fn on_render<'pass>(&self) -> Render<'_, 'pass> {
        Render::None
    }
}
