//! Fractal landscape: a gradient sky, a swaying Pythagoras tree, dragon curves
//! falling like leaves and a star drifting across the sky.
//!
//! Everything is drawn unlit. Animations are driven by accumulated frame time
//! so their speed does not depend on the frame rate.

use std::sync::Arc;

use cgmath::{Quaternion, Rad, Rotation3, Vector3};
use instant::Duration;
use winit::event::{DeviceEvent, WindowEvent};

use crate::{
    context::{Context, InitContext},
    data_structures::{
        material::Material,
        mesh::{Mesh, MeshData},
        object::{self, RenderObject},
        scene_graph::{NodeId, SceneGraph},
        transform::Transform,
    },
    error::SceneError,
    flow::{GraphicsFlow, Out},
    fractal::{animated_tree_angle, dragon_quartet, pythagoras_tree},
    pipelines::light::Light,
    primitives::{gradient_quad, star},
    render::Render,
    scenes::MeshCache,
};

const TREE_DEPTH: u32 = 12;
const TREE_BASE: ([f32; 3], [f32; 3]) = ([1.0, -2.1, 0.0], [1.4, -2.0, 0.0]);
const TREE_COLOR: [f32; 3] = [0.55, 0.4, 0.25];
const DRAGONS: usize = 5;
const DRAGON_ORDER: u32 = 12;
const DRAGON_SIZE: f32 = 0.4;
/// Height the dragons fall through before wrapping around.
const FALL_SPAN: f32 = 6.0;
const STAR_ID: u32 = 1;

/// Position of dragon `i` at time `t`: it falls with unit speed from `y = 3`,
/// wraps every [`FALL_SPAN`] and sways sideways.
pub fn dragon_position(i: usize, t: f32) -> Vector3<f32> {
    let fallen = (t + 3.6 * i as f32).rem_euclid(FALL_SPAN);
    let sway = -t.sin() * 0.4;
    Vector3::new(0.8 * i as f32 - 1.6 + sway, 3.0 - fallen, 1.0)
}

/// Position of the star at time `t` on its flat ellipse above the tree.
pub fn star_position(t: f32) -> Vector3<f32> {
    let a = t * 0.5;
    Vector3::new(1.5 * a.cos(), 1.4 + 0.3 * a.sin(), 0.5)
}

/// The sky, the swaying tree and the falling dragons. Also drawn into the
/// back wall of the avatar room.
pub struct Landscape {
    pub graph: SceneGraph,
    pub objects: Vec<RenderObject>,
    tree: usize,
    tree_angle: f32,
    dragons: Vec<NodeId>,
    time: f32,
}

impl Landscape {
    pub fn new(ctx: &InitContext, meshes: &mut MeshCache) -> Result<Self, SceneError> {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let mut objects = Vec::new();

        let sky = graph.add_node_with("sky", root, Transform::from_position(0.0, 0.0, -1.0))?;
        let sky_mesh = meshes.get_or_create(&ctx.device, "sky", || {
            gradient_quad(
                12.0,
                6.0,
                [[0.9, 0.5, 0.3], [0.9, 0.5, 0.3], [0.1, 0.1, 0.35], [0.1, 0.1, 0.35]],
            )
        });
        objects.push(unlit(ctx, sky_mesh, sky));

        let tree_node = graph.add_node("tree", root)?;
        let tree_angle = animated_tree_angle(0.0);
        let tree_mesh = Arc::new(Mesh::new(&ctx.device, "tree", &tree_data(tree_angle)));
        let tree = objects.len();
        objects.push(unlit(ctx, tree_mesh, tree_node));

        let dragon_mesh = meshes.get_or_create(&ctx.device, "dragons", || {
            dragon_quartet(DRAGON_ORDER, [0.0; 3], DRAGON_SIZE)
        });
        let mut dragons = Vec::with_capacity(DRAGONS);
        for i in 0..DRAGONS {
            let node = graph.add_node_with(format!("dragon{i}"), root, Transform::from(dragon_position(i, 0.0)))?;
            objects.push(unlit(ctx, dragon_mesh.clone(), node));
            dragons.push(node);
        }

        Ok(Self {
            graph,
            objects,
            tree,
            tree_angle,
            dragons,
            time: 0.0,
        })
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// Advances the dragons and the tree by `dt` seconds. The caller updates
    /// world transforms and uploads them.
    pub fn animate(&mut self, ctx: &Context, dt: f32) -> Result<(), SceneError> {
        self.time += dt;
        let t = self.time;
        for (i, node) in self.dragons.iter().enumerate() {
            let local = self.graph.local_mut(*node)?;
            local.position = dragon_position(i, t);
            local.rotation = Quaternion::from_angle_z(Rad(t));
        }

        let angle = animated_tree_angle(t);
        if (angle - self.tree_angle).abs() > 1e-3 {
            self.tree_angle = angle;
            let data = tree_data(angle);
            let tree = &mut self.objects[self.tree];
            if !tree.mesh.write_vertices(&ctx.queue, &data) {
                log::debug!("tree topology changed, uploading a new mesh");
                tree.mesh = Arc::new(Mesh::new(&ctx.device, "tree", &data));
            }
        }
        Ok(())
    }

    pub fn upload(&mut self, ctx: &Context) {
        self.graph.update_world_transforms();
        object::write_all(&ctx.queue, &self.graph, &self.objects);
    }
}

fn unlit(ctx: &InitContext, mesh: Arc<Mesh>, node: NodeId) -> RenderObject {
    RenderObject::new(&ctx.device, &ctx.layouts.material, mesh, node, Material::default()).unlit()
}

fn tree_data(angle: f32) -> MeshData {
    pythagoras_tree(TREE_DEPTH, angle, TREE_BASE.0, TREE_BASE.1, TREE_COLOR)
}

pub struct FractalFlow {
    landscape: Landscape,
    star: NodeId,
    star_spinning: bool,
    star_angle: f32,
}

impl FractalFlow {
    pub fn new(ctx: &InitContext) -> Result<Self, SceneError> {
        let mut meshes = MeshCache::default();
        let mut landscape = Landscape::new(ctx, &mut meshes)?;

        let root = landscape.graph.root();
        let star_node = landscape
            .graph
            .add_node_with("star", root, Transform::from(star_position(0.0)))?;
        let star_mesh = meshes.get_or_create(&ctx.device, "star", || star(5, 0.08, 0.2).with_color([1.0, 0.9, 0.3]));
        landscape.objects.push(unlit(ctx, star_mesh, star_node).pickable(STAR_ID));

        log::info!(
            "fractal scene: {} objects, {} shared meshes",
            landscape.objects.len(),
            meshes.len()
        );
        Ok(Self {
            landscape,
            star: star_node,
            star_spinning: true,
            star_angle: 0.0,
        })
    }

    fn animate(&mut self, ctx: &Context, dt: f32) -> Result<(), SceneError> {
        self.landscape.animate(ctx, dt)?;
        if self.star_spinning {
            self.star_angle -= dt;
        }
        let t = self.landscape.time();
        let star = self.landscape.graph.local_mut(self.star)?;
        star.position = star_position(t);
        star.rotation = Quaternion::from_angle_z(Rad(self.star_angle));
        Ok(())
    }
}

impl GraphicsFlow<(), ()> for FractalFlow {
    fn on_init(&mut self, _: &mut Context, _: &mut ()) -> Out<(), ()> {
        Out::Configure(Box::new(|ctx: &mut Context| {
            ctx.camera.camera.set_transform(&Transform::from_position(0.0, 0.0, 5.0));
            ctx.camera.controller.enabled = false;
            ctx.lights.set_lights(vec![Light::ambient([1.0; 3])]);
            ctx.clear_colour = wgpu::Color::BLACK;
        }))
    }

    fn on_click(&mut self, _: &Context, _: &mut (), id: u32) -> Out<(), ()> {
        if id == STAR_ID {
            self.star_spinning = !self.star_spinning;
            log::info!("star spinning: {}", self.star_spinning);
        }
        Out::Empty
    }

    fn on_update(&mut self, ctx: &Context, _: &mut (), dt: Duration) -> Out<(), ()> {
        if let Err(e) = self.animate(ctx, dt.as_secs_f32()) {
            log::error!("fractal animation failed: {}", e);
        }
        self.landscape.upload(ctx);
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
        object::render_all(&self.landscape.objects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dragons_wrap_inside_the_fall_span() {
        for i in 0..DRAGONS {
            for step in 0..200 {
                let y = dragon_position(i, step as f32 * 0.37).y;
                assert!(y > 3.0 - FALL_SPAN - 1e-4 && y <= 3.0 + 1e-4, "{y}");
            }
        }
    }

    #[test]
    fn swaying_tree_keeps_its_topology() {
        let a = tree_data(animated_tree_angle(0.4));
        let b = tree_data(animated_tree_angle(1.3));
        assert_eq!(a.vertices.len(), b.vertices.len());
        assert_eq!(a.indices, b.indices);
        assert_ne!(a.vertices, b.vertices);
    }

    #[test]
    fn dragons_start_staggered() {
        let p0 = dragon_position(0, 0.0);
        let p1 = dragon_position(1, 0.0);
        assert!((p0.x + 1.6).abs() < 1e-6);
        assert!((p1.y - (3.0 - 3.6)).abs() < 1e-5);
    }
}
