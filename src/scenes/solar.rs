//! Sun, earth and moon in a transform hierarchy.
//!
//! The earth orbits the sun and the moon orbits the earth; both orbits are
//! plain local translations, so the hierarchy does the rest. The camera is a
//! node as well. Clicking a body re-parents the camera to it while keeping its
//! world placement, after which it travels along with that body. Right-drag
//! orbits the camera around its current parent and the wheel zooms.

use std::f32::consts::{FRAC_PI_2, TAU};

use cgmath::{InnerSpace, Vector3};
use instant::Duration;
use winit::event::{DeviceEvent, MouseScrollDelta, WindowEvent};

use crate::{
    context::{Context, InitContext, MouseButtonState},
    data_structures::{
        material::Material,
        object::{self, RenderObject},
        scene_graph::{NodeId, SceneGraph},
        transform::Transform,
    },
    error::SceneError,
    flow::{GraphicsFlow, Out},
    pipelines::light::Light,
    primitives::sphere,
    render::Render,
    scenes::MeshCache,
};

pub const SUN_ID: u32 = 1;
pub const EARTH_ID: u32 = 2;
pub const MOON_ID: u32 = 3;

pub const EARTH_ORBIT: f32 = 2.5;
/// Revolutions per second.
pub const EARTH_SPEED: f32 = 0.2;
pub const MOON_ORBIT: f32 = 0.5;
pub const MOON_SPEED: f32 = 0.8;

/// Local position on a circular orbit in the XY plane after `t` seconds.
pub fn orbit_position(radius: f32, revolutions_per_second: f32, t: f32) -> Vector3<f32> {
    let angle = t * revolutions_per_second * TAU;
    Vector3::new(radius * angle.cos(), radius * angle.sin(), 0.0)
}

/// Camera placement on a sphere around its parent's origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalOrbit {
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
}

impl LocalOrbit {
    const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.05;

    /// Orbit through `position`, measured from the parent's origin.
    pub fn from_position(position: Vector3<f32>) -> Self {
        let distance = position.magnitude().max(0.5);
        Self {
            yaw: position.x.atan2(position.z),
            pitch: (position.y / distance).clamp(-1.0, 1.0).asin().clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT),
            distance,
        }
    }

    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx;
        self.pitch = (self.pitch + dy).clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT);
    }

    pub fn zoom(&mut self, amount: f32) {
        self.distance = (self.distance * (1.0 - amount)).clamp(0.5, 50.0);
    }

    pub fn position(&self) -> Vector3<f32> {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        Vector3::new(cp * sy, sp, cp * cy) * self.distance
    }

    /// Local transform looking at the parent's origin.
    pub fn transform(&self) -> Transform {
        let mut transform = Transform::from(self.position());
        transform.look_at(Vector3::new(0.0, 0.0, 0.0), Vector3::unit_y());
        transform
    }
}

pub struct SolarFlow {
    graph: SceneGraph,
    objects: Vec<RenderObject>,
    sun: NodeId,
    earth: NodeId,
    moon: NodeId,
    camera: NodeId,
    orbit: LocalOrbit,
    time: f32,
}

impl SolarFlow {
    pub fn new(ctx: &InitContext) -> Result<Self, SceneError> {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let mut meshes = MeshCache::default();
        let ball = meshes.get_or_create(&ctx.device, "sphere", || sphere(1.0, 64, 32));
        let body = |graph: &mut SceneGraph, name: &str, parent: NodeId, scale: f32| {
            // The orbit node carries the translation, its child the size, so
            // children and the camera don't inherit the scale.
            let orbit = graph.add_node(name, parent)?;
            let mesh = graph.add_node_with(format!("{name}0"), orbit, Transform::new().with_scale([scale; 3]))?;
            Ok::<_, SceneError>((orbit, mesh))
        };

        let (sun, sun_mesh) = body(&mut graph, "sun", root, 1.0)?;
        let (earth, earth_mesh) = body(&mut graph, "earth", sun, 0.3)?;
        let (moon, moon_mesh) = body(&mut graph, "moon", earth, 0.1)?;
        let orbit = LocalOrbit::from_position(Vector3::new(0.0, 0.0, 8.0));
        let camera = graph.add_node_with("camera", sun, orbit.transform())?;

        let objects = vec![
            RenderObject::new(
                &ctx.device,
                &ctx.layouts.material,
                ball.clone(),
                sun_mesh,
                Material::from_color([0.8, 0.4, 0.0]),
            )
            .unlit()
            .pickable(SUN_ID),
            RenderObject::new(
                &ctx.device,
                &ctx.layouts.material,
                ball.clone(),
                earth_mesh,
                Material::from_color([0.0, 0.5, 1.0]),
            )
            .pickable(EARTH_ID),
            RenderObject::new(
                &ctx.device,
                &ctx.layouts.material,
                ball,
                moon_mesh,
                Material::from_color([0.7, 0.7, 0.7]),
            )
            .pickable(MOON_ID),
        ];

        let mut flow = Self {
            graph,
            objects,
            sun,
            earth,
            moon,
            camera,
            orbit,
            time: 0.0,
        };
        flow.place_bodies()?;
        flow.graph.update_world_transforms();
        Ok(flow)
    }

    fn place_bodies(&mut self) -> Result<(), SceneError> {
        self.graph.local_mut(self.earth)?.position = orbit_position(EARTH_ORBIT, EARTH_SPEED, self.time);
        self.graph.local_mut(self.moon)?.position = orbit_position(MOON_ORBIT, MOON_SPEED, self.time);
        self.graph.set_local(self.camera, self.orbit.transform())
    }

    /// Hangs the camera below the body with pick id `id`.
    pub fn follow(&mut self, id: u32) -> Result<bool, SceneError> {
        let (target, name) = match id {
            SUN_ID => (self.sun, "sun"),
            EARTH_ID => (self.earth, "earth"),
            MOON_ID => (self.moon, "moon"),
            _ => return Ok(false),
        };
        if self.graph.parent(self.camera)? == Some(target) {
            return Ok(false);
        }
        self.graph.set_parent_keep_world(self.camera, target)?;
        self.orbit = LocalOrbit::from_position(self.graph.local(self.camera)?.position);
        log::info!("camera follows the {}", name);
        Ok(true)
    }
}

impl GraphicsFlow<(), ()> for SolarFlow {
    fn on_init(&mut self, _: &mut Context, _: &mut ()) -> Out<(), ()> {
        Out::Configure(Box::new(|ctx: &mut Context| {
            // The camera node is driven here, not by the engine's controller.
            ctx.camera.controller.enabled = false;
            ctx.lights.set_lights(vec![
                Light::ambient([0.05; 3]),
                Light::point([8.0; 3], [0.0, 0.0, 0.0]),
            ]);
            ctx.clear_colour = wgpu::Color::BLACK;
        }))
    }

    fn on_click(&mut self, _: &Context, _: &mut (), id: u32) -> Out<(), ()> {
        if let Err(e) = self.follow(id) {
            log::error!("cannot re-parent the camera: {}", e);
        }
        Out::Empty
    }

    fn on_update(&mut self, ctx: &Context, _: &mut (), dt: Duration) -> Out<(), ()> {
        self.time += dt.as_secs_f32();
        if let Err(e) = self.place_bodies() {
            log::error!("solar update failed: {}", e);
        }
        self.graph.update_world_transforms();
        object::write_all(&ctx.queue, &self.graph, &self.objects);

        match self.graph.world_matrix(self.camera) {
            Ok(world) => Out::Configure(Box::new(move |ctx: &mut Context| ctx.camera.camera.world = world)),
            Err(e) => {
                log::error!("camera node lost: {}", e);
                Out::Empty
            }
        }
    }

    fn on_tick(&mut self, _: &Context, _: &mut ()) -> Out<(), ()> {
        Out::Empty
    }

    fn on_device_events(&mut self, ctx: &Context, _: &mut (), event: &DeviceEvent) -> Out<(), ()> {
        if let DeviceEvent::MouseMotion { delta } = event {
            if ctx.mouse.pressed == MouseButtonState::Right {
                self.orbit.rotate(delta.0 as f32 * 0.005, delta.1 as f32 * 0.005);
            }
        }
        Out::Empty
    }

    fn on_window_events(&mut self, _: &Context, _: &mut (), event: &WindowEvent) -> Out<(), ()> {
        if let WindowEvent::MouseWheel { delta, .. } = event {
            let amount = match delta {
                MouseScrollDelta::LineDelta(_, y) => *y * 0.1,
                MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 500.0,
            };
            self.orbit.zoom(amount);
        }
        Out::Empty
    }

    fn on_custom_events(&mut self, _: &Context, _: &mut (), event: ()) -> Option<()> {
        Some(event)
    }

    fn on_render<'pass>(&self) -> Render<'_, 'pass> {
        object::render_all(&self.objects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orbits_close_after_one_revolution() {
        let start = orbit_position(EARTH_ORBIT, EARTH_SPEED, 0.0);
        let end = orbit_position(EARTH_ORBIT, EARTH_SPEED, 1.0 / EARTH_SPEED);
        assert!((start - end).magnitude() < 1e-4);
        assert!((start.magnitude() - EARTH_ORBIT).abs() < 1e-6);
    }

    #[test]
    fn local_orbit_round_trips_its_position() {
        let p = Vector3::new(1.0, 2.0, 3.0);
        let orbit = LocalOrbit::from_position(p);
        assert!((orbit.position() - p).magnitude() < 1e-4);
    }

    #[test]
    fn pitch_stays_off_the_poles() {
        let mut orbit = LocalOrbit::from_position(Vector3::new(0.0, 0.0, 8.0));
        orbit.rotate(0.0, 10.0);
        assert!(orbit.pitch < FRAC_PI_2);
        orbit.zoom(-100.0);
        assert_eq!(orbit.distance, 50.0);
    }
}
