//! The avatar room: the articulated humanoid, a Rubik-style cube and three
//! grey walls, lit by six lights. A screen on the back wall shows the fractal
//! landscape, rendered into a texture every frame.
//!
//! Controls:
//! - `1` to `4` play a pose while held, a click on the body makes it jump
//! - left-drag rotates the arcball target, `a` and `c` select avatar or cube,
//!   `0` resets the target and the body pivot
//! - `t` toggles toon shading, `e` cycles the easing of keyed poses
//! - right-drag orbits the camera, the wheel zooms

use cgmath::{InnerSpace, One, Quaternion, Rad, Rotation3, Vector3};
use instant::Duration;
use winit::event::{DeviceEvent, MouseButton, WindowEvent};

use crate::{
    avatar::{Avatar, AvatarInput, Pivot},
    camera::{Arcball, Camera, Projection},
    context::{Context, InitContext},
    data_structures::{
        material::Material,
        object::{self, RenderObject},
        scene_graph::{NodeId, SceneGraph},
        transform::Transform,
    },
    error::SceneError,
    flow::{GraphicsFlow, Out},
    pipelines::light::Light,
    primitives::{cube, plane},
    render::Render,
    render_texture::RenderTexture,
    scenes::{MeshCache, fractal::Landscape, key_char},
};

pub const CUBE_ID: u32 = 100;
const WALL: [f32; 3] = [0.5, 0.5, 0.5];
const BACKGROUND_SIZE: f32 = 16.0;
const SCREEN_TEXTURE_SIZE: [u32; 2] = [512, 512];
/// Half the height of the landscape seen through the screen camera.
const SCREEN_HALF_HEIGHT: f32 = 2.0;

/// Faces of the cube with the colour of their tiles. Tiles are picked under
/// the face letter's character code.
const FACES: [(char, [f32; 3]); 6] = [
    ('F', [0.0, 1.0, 0.0]),
    ('B', [0.0, 0.0, 1.0]),
    ('U', [1.0, 1.0, 1.0]),
    ('D', [1.0, 1.0, 0.0]),
    ('L', [1.0, 0.5, 0.0]),
    ('R', [1.0, 0.0, 0.0]),
];

/// Offset of tile `(i, j)` on `face` relative to the cube centre.
pub fn tile_offset(face: char, i: usize, j: usize) -> Option<[f32; 3]> {
    let (i, j) = (i as f32, j as f32);
    Some(match face {
        'F' => [i - 1.0, 1.0 - j, 1.1],
        'B' => [1.0 - i, 1.0 - j, -1.1],
        'U' => [j - 1.0, 1.1, i - 1.0],
        'D' => [j - 1.0, -1.1, 1.0 - i],
        'L' => [-1.1, 1.0 - i, j - 1.0],
        'R' => [1.1, 1.0 - i, 1.0 - j],
        _ => return None,
    })
}

/// Ambient fill, red/green/blue spots from above, a warm point light and a
/// weak sun.
pub fn room_lights() -> Vec<Light> {
    vec![
        Light::ambient([0.1; 3]),
        Light::spotlight([100.0, 0.0, 0.0], [0.0, 10.0, 0.0], [0.0, 0.0, 0.0]),
        Light::spotlight([0.0, 100.0, 0.0], [-5.0, 10.0, 0.0], [-2.0, 0.0, 0.0]),
        Light::spotlight([0.0, 0.0, 100.0], [5.0, 10.0, 0.0], [2.0, 0.0, 0.0]),
        Light::point([10.0; 3], [2.0, 4.0, 2.0]),
        Light::directional([1.0; 3], [-1.0, -1.0, -1.0]),
    ]
}

/// Turns the -Z facing plane towards the room so its texture reads upright
/// from the camera.
pub fn screen_rotation() -> Quaternion<f32> {
    Quaternion::from_angle_y(Rad(std::f32::consts::PI))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ArcballTarget {
    Avatar,
    Cube,
}

pub struct AvatarFlow {
    graph: SceneGraph,
    objects: Vec<RenderObject>,
    avatar: Avatar,
    input: AvatarInput,
    cube: NodeId,
    arcball: Arcball,
    target: ArcballTarget,
    toon: bool,
    landscape: Landscape,
    screen: RenderTexture,
}

impl AvatarFlow {
    pub fn new(ctx: &InitContext) -> Result<Self, SceneError> {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let mut meshes = MeshCache::default();
        let mut objects = Vec::new();
        let lit = |mesh, node, color: [f32; 3]| {
            RenderObject::new(&ctx.device, &ctx.layouts.material, mesh, node, Material::from_color(color))
        };

        // walls
        let half = BACKGROUND_SIZE / 2.0;
        let background = graph.add_node_with("background", root, Transform::from_position(0.0, 0.0, -half))?;
        let wall = meshes.get_or_create(&ctx.device, "wall", || plane(64.0, 64.0));
        let walls = [
            ("bgB", [0.0, 0.0, -half], Quaternion::from_angle_x(Rad(std::f32::consts::PI))),
            ("bgL", [-half, 0.0, 0.0], Quaternion::from_angle_y(Rad(-std::f32::consts::FRAC_PI_2))),
            ("bgR", [half, 0.0, 0.0], Quaternion::from_angle_y(Rad(std::f32::consts::FRAC_PI_2))),
            ("bgD", [0.0, -5.0, 0.0], Quaternion::from_angle_x(Rad(std::f32::consts::FRAC_PI_2))),
        ];
        for (name, position, rotation) in walls {
            let local = Transform::from(Vector3::from(position)).with_rotation(rotation);
            let node = graph.add_node_with(name, background, local)?;
            objects.push(lit(wall.clone(), node, WALL));
        }

        // landscape screen in front of the back wall
        let landscape = Landscape::new(ctx, &mut meshes)?;
        let screen = RenderTexture::new(
            ctx,
            SCREEN_TEXTURE_SIZE,
            Camera::new(&Transform::from_position(0.0, 0.0, 5.0)),
            Projection::orthographic(SCREEN_TEXTURE_SIZE[0], SCREEN_TEXTURE_SIZE[1], SCREEN_HALF_HEIGHT, 0.1, 10.0),
            "Landscape texture",
        );
        let screen_node = graph.add_node_with(
            "bgScreen",
            background,
            Transform::from_position(0.0, 0.0, 0.05 - half).with_rotation(screen_rotation()),
        )?;
        let screen_mesh = meshes.get_or_create(&ctx.device, "screen", || plane(BACKGROUND_SIZE, BACKGROUND_SIZE));
        objects.push(lit(screen_mesh, screen_node, WALL).textured(screen.bind_group(ctx)));

        // cube
        let cube_node = graph.add_node_with(
            "cube",
            root,
            Transform::from_position(5.0, 0.0, 0.0).with_scale([0.5, 0.5, 0.5]),
        )?;
        let cube_mesh = meshes.get_or_create(&ctx.device, "cube", || cube(3.0, 3.0, 3.0));
        objects.push(lit(cube_mesh, cube_node, [0.0; 3]).pickable(CUBE_ID));
        let tile = meshes.get_or_create(&ctx.device, "tile", || cube(0.9, 0.9, 0.9));
        for (face, color) in FACES {
            for i in 0..3 {
                for j in 0..3 {
                    let Some(offset) = tile_offset(face, i, j) else {
                        continue;
                    };
                    let node = graph.add_node_with(format!("tile{face}{i}{j}"), cube_node, Transform::from(Vector3::from(offset)))?;
                    objects.push(lit(tile.clone(), node, color).pickable(face as u32));
                }
            }
        }

        // avatar
        let avatar = Avatar::build(&mut graph, root)?;
        for part in &avatar.parts {
            let mesh = meshes.get_or_create(&ctx.device, &part.shape.label(), || part.shape.mesh_data());
            let object = lit(mesh, part.node, part.color);
            objects.push(if part.pick_id != 0 {
                object.pickable(part.pick_id)
            } else {
                object
            });
        }

        graph.update_world_transforms();
        log::info!(
            "avatar scene: {} objects, {} shared meshes, {} nodes",
            objects.len(),
            meshes.len(),
            graph.len()
        );
        Ok(Self {
            graph,
            objects,
            avatar,
            input: AvatarInput::new(),
            cube: cube_node,
            arcball: Arcball::default(),
            target: ArcballTarget::Cube,
            toon: false,
            landscape,
            screen,
        })
    }

    fn target_node(&self) -> NodeId {
        match self.target {
            ArcballTarget::Avatar => self.avatar.root,
            ArcballTarget::Cube => self.cube,
        }
    }

    fn set_toon(&mut self, queue: &wgpu::Queue, toon: bool) {
        self.toon = toon;
        for object in self.objects.iter_mut() {
            let material = object.material.material.with_toon(toon);
            object.set_material(queue, material);
        }
        log::info!("toon shading {}", if toon { "on" } else { "off" });
    }

    fn key(&mut self, ctx: &Context, key: char, pressed: bool) -> Result<(), SceneError> {
        if !pressed {
            self.input.key_up(key);
            return Ok(());
        }
        match key {
            'a' => self.target = ArcballTarget::Avatar,
            'c' => self.target = ArcballTarget::Cube,
            '0' => {
                self.avatar.set_pivot(&mut self.graph, Pivot::Body)?;
                let target = self.target_node();
                self.graph.local_mut(target)?.rotation = Quaternion::one();
            }
            't' => self.set_toon(&ctx.queue, !self.toon),
            'e' => {
                self.input.easing = self.input.easing.next();
                log::info!("pose easing: {}", self.input.easing.name());
            }
            _ => {
                self.input.key_down(&mut self.avatar, &mut self.graph, key)?;
            }
        }
        Ok(())
    }

    fn drag(&mut self, ctx: &Context) -> Result<(), SceneError> {
        let height = f64::from(ctx.size().1);
        let Some(q) = self.arcball.drag(ctx.mouse.coords.x, ctx.mouse.coords.y, height) else {
            return Ok(());
        };
        let target = self.target_node();
        let local = self.graph.local_mut(target)?;
        local.rotation = (q * local.rotation).normalize();
        Ok(())
    }
}

impl GraphicsFlow<(), ()> for AvatarFlow {
    fn on_init(&mut self, _: &mut Context, _: &mut ()) -> Out<(), ()> {
        Out::Configure(Box::new(|ctx: &mut Context| {
            ctx.camera.camera.set_transform(&Transform::from_position(0.0, 0.0, 15.0));
            ctx.camera.controller.enabled = true;
            ctx.camera.controller.target = Vector3::new(0.0, 0.0, 0.0);
            ctx.lights.set_lights(room_lights());
            ctx.clear_colour = wgpu::Color {
                r: 0.1,
                g: 0.1,
                b: 0.1,
                a: 1.0,
            };
        }))
    }

    fn on_click(&mut self, _: &Context, _: &mut (), id: u32) -> Out<(), ()> {
        match char::from_u32(id).filter(|c| FACES.iter().any(|(face, _)| face == c)) {
            Some(face) => log::info!("clicked cube face {}", face),
            None if id == CUBE_ID => log::info!("clicked the cube"),
            None => {
                if let Err(e) = self.input.click(&mut self.avatar, &mut self.graph, id) {
                    log::error!("avatar click failed: {}", e);
                }
            }
        }
        Out::Empty
    }

    fn on_update(&mut self, ctx: &Context, _: &mut (), dt: Duration) -> Out<(), ()> {
        let camera = match self.input.update(&self.avatar, &mut self.graph, dt.as_secs_f32()) {
            Ok(camera) => camera,
            Err(e) => {
                log::error!("pose update failed: {}", e);
                None
            }
        };
        self.graph.update_world_transforms();
        object::write_all(&ctx.queue, &self.graph, &self.objects);

        if let Err(e) = self.landscape.animate(ctx, dt.as_secs_f32()) {
            log::error!("landscape animation failed: {}", e);
        }
        self.landscape.upload(ctx);
        self.screen.render(ctx, &self.landscape.objects);

        match camera {
            Some((position, rotation)) => Out::Configure(Box::new(move |ctx: &mut Context| {
                ctx.camera
                    .camera
                    .set_transform(&Transform::from(position).with_rotation(rotation));
            })),
            None => Out::Empty,
        }
    }

    fn on_tick(&mut self, _: &Context, _: &mut ()) -> Out<(), ()> {
        Out::Empty
    }

    fn on_device_events(&mut self, _: &Context, _: &mut (), _: &DeviceEvent) -> Out<(), ()> {
        Out::Empty
    }

    fn on_window_events(&mut self, ctx: &Context, _: &mut (), event: &WindowEvent) -> Out<(), ()> {
        let result = match event {
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                if state.is_pressed() {
                    let height = f64::from(ctx.size().1);
                    self.arcball.begin(ctx.mouse.coords.x, ctx.mouse.coords.y, height);
                } else {
                    self.arcball.end();
                }
                Ok(())
            }
            WindowEvent::CursorMoved { .. } if self.arcball.is_dragging() => self.drag(ctx),
            _ => match key_char(event) {
                Some((key, pressed)) => self.key(ctx, key, pressed),
                None => Ok(()),
            },
        };
        if let Err(e) = result {
            log::error!("avatar input failed: {}", e);
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
    fn tiles_sit_just_outside_the_cube() {
        for (face, _) in FACES {
            for i in 0..3 {
                for j in 0..3 {
                    let p = tile_offset(face, i, j).unwrap();
                    let outside = p.iter().filter(|c| (c.abs() - 1.1).abs() < 1e-6).count();
                    assert_eq!(outside, 1, "{face}{i}{j}: {p:?}");
                }
            }
        }
        assert_eq!(tile_offset('X', 0, 0), None);
    }

    #[test]
    fn screen_texture_reads_upright_from_the_room() {
        use cgmath::Rotation;

        let mesh = plane(2.0, 2.0);
        let rotation = screen_rotation();
        for v in &mesh.vertices {
            let p = rotation.rotate_vector(Vector3::from(v.position));
            // seen from +Z: u grows to the right, v grows downwards
            assert!((p.x - (2.0 * v.tex_coords[0] - 1.0)).abs() < 1e-5, "{v:?}");
            assert!((p.y - (1.0 - 2.0 * v.tex_coords[1])).abs() < 1e-5, "{v:?}");
        }
        let normal = rotation.rotate_vector(Vector3::from(mesh.vertices[0].normal));
        assert!((normal.z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn face_ids_do_not_collide_with_avatar_or_cube() {
        for (face, _) in FACES {
            let id = face as u32;
            assert!(id > crate::avatar::HAND_R_ID && id != CUBE_ID);
        }
    }
}
