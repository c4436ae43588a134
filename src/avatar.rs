//! The humanoid avatar.
//!
//! Every limb is a joint node that carries the rotation of a pose, plus an
//! inner node offset along the limb that carries the mesh. Rotating a joint
//! therefore swings the limb around its end instead of its centre.
//!
//! The avatar can stand on two pivots. With [`Pivot::Body`] the chain is
//! `avatar -> body -> legLU -> legLD`; with [`Pivot::LeftLowerLeg`] it is
//! inverted to `avatar -> legLD -> legLU -> body`, so poses keep the left foot
//! planted while the rest of the body moves.

use std::collections::BTreeMap;

use cgmath::{Quaternion, Rotation3, Vector3};

use crate::{
    animation::{Easing, Pose, PoseAnimator, PoseFrame, Transition},
    data_structures::{
        mesh::MeshData,
        scene_graph::{NodeId, SceneGraph},
        transform::Transform,
    },
    error::SceneError,
    primitives,
};

pub const BODY_ID: u32 = 1;
pub const HEAD_ID: u32 = 2;
pub const LEG_LU_ID: u32 = 3;
pub const LEG_RU_ID: u32 = 4;
pub const LEG_LD_ID: u32 = 5;
pub const LEG_RD_ID: u32 = 6;
pub const FOOT_L_ID: u32 = 7;
pub const FOOT_R_ID: u32 = 8;
pub const ARM_LU_ID: u32 = 9;
pub const ARM_RU_ID: u32 = 10;
pub const ARM_LD_ID: u32 = 11;
pub const ARM_RD_ID: u32 = 12;
pub const HAND_L_ID: u32 = 13;
pub const HAND_R_ID: u32 = 14;

const SIDES: u32 = 24;
const LATITUDES: u32 = 12;

const BLACK: [f32; 3] = [0.0, 0.0, 0.0];
const BLUE: [f32; 3] = [64.0 / 255.0, 64.0 / 255.0, 1.0];
const SKIN: [f32; 3] = [1.0, 227.0 / 255.0, 181.0 / 255.0];
const SHOE: [f32; 3] = [0.2, 0.2, 0.2];
const STAGE: [f32; 3] = [0.5, 0.5, 0.5];

/// Geometry of one avatar part. Parts with equal shapes share a mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PartShape {
    Cone { radius: f32, height: f32 },
    UpperBody,
    Hemisphere(f32),
    Sphere(f32),
    QuarterSphere(f32),
    Cylinder { radius: f32, height: f32 },
    Capsule { radius: f32, height: f32 },
    Cube([f32; 3]),
}

impl PartShape {
    pub fn mesh_data(&self) -> MeshData {
        match *self {
            PartShape::Cone { radius, height } => primitives::cone(radius, height, SIDES),
            PartShape::UpperBody => primitives::upper_body(0.5, 0.8, 2.2, 0.5, SIDES),
            PartShape::Hemisphere(r) => primitives::hemisphere(r, SIDES, LATITUDES),
            PartShape::Sphere(r) => primitives::sphere(r, SIDES, LATITUDES),
            PartShape::QuarterSphere(r) => primitives::quarter_sphere(r, SIDES, LATITUDES),
            PartShape::Cylinder { radius, height } => primitives::cylinder(radius, height, SIDES),
            PartShape::Capsule { radius, height } => primitives::capsule(radius, height, SIDES, LATITUDES),
            PartShape::Cube([x, y, z]) => primitives::cube(x, y, z),
        }
    }

    /// Mesh label used for GPU buffers.
    pub fn label(&self) -> String {
        format!("{:?}", self)
    }
}

/// One visible piece of the avatar.
#[derive(Clone, Debug, PartialEq)]
pub struct AvatarPart {
    pub name: String,
    pub node: NodeId,
    pub shape: PartShape,
    /// `0` for parts that can't be picked.
    pub pick_id: u32,
    pub color: [f32; 3],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Pivot {
    #[default]
    Body,
    LeftLowerLeg,
}

impl Pivot {
    /// Joint whose position the poses drive for this pivot.
    pub fn joint(self) -> &'static str {
        match self {
            Pivot::Body => "body",
            Pivot::LeftLowerLeg => "legLD",
        }
    }
}

struct Builder<'g> {
    graph: &'g mut SceneGraph,
    joints: BTreeMap<String, NodeId>,
    inner: BTreeMap<String, NodeId>,
    parts: Vec<AvatarPart>,
}

impl Builder<'_> {
    fn node(&self, name: &str) -> Result<NodeId, SceneError> {
        self.joints
            .get(name)
            .or_else(|| self.inner.get(name))
            .copied()
            .ok_or_else(|| SceneError::UnknownName(name.to_string()))
    }

    fn joint(&mut self, name: &str, parent: NodeId, position: [f32; 3]) -> Result<NodeId, SceneError> {
        let id = self.graph.add_node_with(name, parent, Transform::from(Vector3::from(position)))?;
        self.joints.insert(name.to_string(), id);
        Ok(id)
    }

    /// Inner node below `parent`; carries a mesh when `shape` is given.
    fn inner(
        &mut self,
        name: &str,
        parent: &str,
        shape: Option<PartShape>,
        local: Transform,
        pick_id: u32,
        color: [f32; 3],
    ) -> Result<NodeId, SceneError> {
        let parent = self.node(parent)?;
        let id = self.graph.add_node_with(name, parent, local)?;
        self.inner.insert(name.to_string(), id);
        if let Some(shape) = shape {
            self.parts.push(AvatarPart {
                name: name.to_string(),
                node: id,
                shape,
                pick_id,
                color,
            });
        }
        Ok(id)
    }

    /// A joint at `position` below `parent` with its mesh at `inner_position`.
    #[allow(clippy::too_many_arguments)]
    fn component(
        &mut self,
        name: &str,
        shape: PartShape,
        position: [f32; 3],
        inner_position: [f32; 3],
        pick_id: u32,
        parent: &str,
        color: [f32; 3],
    ) -> Result<NodeId, SceneError> {
        let parent = self.node(parent)?;
        self.joint(name, parent, position)?;
        self.inner(
            &format!("{name}0"),
            name,
            Some(shape),
            Transform::from(Vector3::from(inner_position)),
            pick_id,
            color,
        )
    }
}

fn at(position: [f32; 3]) -> Transform {
    Transform::from(Vector3::from(position))
}

fn rot_z(radians: f32) -> Quaternion<f32> {
    Quaternion::from_angle_z(cgmath::Rad(radians))
}

/// The avatar's nodes inside a [`SceneGraph`].
#[derive(Clone, Debug)]
pub struct Avatar {
    pub root: NodeId,
    joints: BTreeMap<String, NodeId>,
    inner: BTreeMap<String, NodeId>,
    pub parts: Vec<AvatarPart>,
    pivot: Pivot,
}

impl Avatar {
    /// Adds the avatar below `parent` and puts it into the idle pose.
    pub fn build(graph: &mut SceneGraph, parent: NodeId) -> Result<Self, SceneError> {
        let root = graph.add_node("avatar", parent)?;
        let mut b = Builder {
            graph,
            joints: BTreeMap::new(),
            inner: BTreeMap::new(),
            parts: Vec::new(),
        };
        b.joints.insert("avatar".to_string(), root);

        b.inner("stage", "avatar", Some(PartShape::Cube([2.0, 1.4, 2.0])), at([0.0, -5.0, 0.0]), 0, STAGE)?;

        // body
        b.joint("body", root, [0.0, 0.0, 0.0])?;
        b.inner("body0", "body", None, Transform::default(), BODY_ID, SKIN)?;
        b.inner(
            "body00",
            "body0",
            Some(PartShape::Cone {
                radius: 0.7,
                height: 1.2,
            }),
            at([0.0, -0.5, 0.0]).with_scale([1.0, 1.0, 0.7]),
            BODY_ID,
            BLACK,
        )?;
        b.inner("body01", "body0", Some(PartShape::UpperBody), at([0.0, 1.5, 0.0]), BODY_ID, BLUE)?;
        b.inner(
            "body02",
            "body0",
            Some(PartShape::Hemisphere(0.8)),
            at([0.0, 2.6, 0.0]).with_scale([1.0, 0.3, 0.5]),
            BODY_ID,
            BLUE,
        )?;
        b.inner(
            "neck",
            "body0",
            Some(PartShape::Cylinder {
                radius: 0.15,
                height: 1.0,
            }),
            at([0.0, 3.0, 0.0]),
            BODY_ID,
            SKIN,
        )?;

        // head
        b.joint("head", b.node("body")?, [0.0, 3.5, 0.0])?;
        b.inner(
            "head0",
            "head",
            None,
            Transform::default().with_scale([0.8, 1.0, 0.8]),
            HEAD_ID,
            SKIN,
        )?;
        b.inner("head00", "head0", Some(PartShape::Sphere(0.5)), Transform::default(), HEAD_ID, SKIN)?;
        let hair = PartShape::Hemisphere(0.51);
        b.inner("hair0", "head0", Some(hair), Transform::from_euler_deg(-45.0, 45.0, 0.0), HEAD_ID, BLACK)?;
        b.inner("hair1", "head0", Some(hair), Transform::from_euler_deg(-45.0, -45.0, 0.0), HEAD_ID, BLACK)?;
        let eye = PartShape::Cube([0.12, 0.15, 0.1]);
        for (name, x) in [("eye0", -0.2), ("eye1", 0.2)] {
            let local = Transform::from_euler_deg(0.0, 180.0, 0.0).with_position([x, 0.0, 0.43]);
            b.inner(name, "head0", Some(eye), local, HEAD_ID, BLACK)?;
        }

        // legs
        let leg = PartShape::Capsule {
            radius: 0.25,
            height: 2.0,
        };
        b.component("legLU", leg, [0.3, 0.0, 0.0], [0.0, -1.0, 0.0], LEG_LU_ID, "body", SKIN)?;
        b.component("legRU", leg, [-0.3, 0.0, 0.0], [0.0, -1.0, 0.0], LEG_RU_ID, "body", SKIN)?;
        b.component("legLD", leg, [0.0, -2.0, 0.0], [0.0, -1.0, 0.0], LEG_LD_ID, "legLU", SKIN)?;
        b.component("legRD", leg, [0.0, -2.0, 0.0], [0.0, -1.0, 0.0], LEG_RD_ID, "legRU", SKIN)?;
        for (side, id, parent) in [("L", FOOT_L_ID, "legLD"), ("R", FOOT_R_ID, "legRD")] {
            let foot = format!("foot{side}");
            let shoe = PartShape::QuarterSphere(0.3);
            b.joint(&foot, b.node(parent)?, [0.0, -2.0, 0.0])?;
            b.inner(&format!("{foot}0"), &foot, None, at([0.0, -0.3, 0.0]), id, SHOE)?;
            b.inner(
                &format!("{foot}00"),
                &format!("{foot}0"),
                Some(shoe),
                Transform::default().with_scale([1.0, 1.2, 1.0]),
                id,
                SHOE,
            )?;
            b.inner(
                &format!("{foot}01"),
                &format!("{foot}0"),
                Some(shoe),
                Transform::from_euler_deg(0.0, 180.0, 0.0).with_scale([1.0, 1.2, 2.0]),
                id,
                SHOE,
            )?;
        }

        // arms
        let arm = PartShape::Capsule {
            radius: 0.15,
            height: 1.3,
        };
        b.component("armLU", arm, [0.66, 2.66, 0.0], [0.0, -0.65, 0.0], ARM_LU_ID, "body", SKIN)?;
        b.component("armRU", arm, [-0.66, 2.66, 0.0], [0.0, -0.65, 0.0], ARM_RU_ID, "body", SKIN)?;
        b.component("armLD", arm, [0.0, -1.3, 0.0], [0.0, -0.65, 0.0], ARM_LD_ID, "armLU", SKIN)?;
        b.component("armRD", arm, [0.0, -1.3, 0.0], [0.0, -0.65, 0.0], ARM_RD_ID, "armRU", SKIN)?;

        // hands; the right hand mirrors the left along x
        let palm = PartShape::Cube([0.18, 0.15, 0.06]);
        let knuckle = PartShape::Cylinder {
            radius: 0.03,
            height: 0.15,
        };
        let thumb_ball = PartShape::Sphere(0.03);
        let side_plate = PartShape::Cube([0.12 * 0.9578, 0.2 / 0.9578 + 0.06, 0.06]);
        let side_rod = PartShape::Cylinder {
            radius: 0.03,
            height: 0.2 / 0.9578,
        };
        let finger3 = PartShape::Capsule {
            radius: 0.03,
            height: 0.12,
        };
        let finger4 = PartShape::Capsule {
            radius: 0.03,
            height: 0.1,
        };
        let finger5 = PartShape::Capsule {
            radius: 0.03,
            height: 0.08,
        };
        let tilt = 0.3_f32.atan();
        for (side, s, id, parent) in [("L", 1.0_f32, HAND_L_ID, "armLD"), ("R", -1.0_f32, HAND_R_ID, "armRD")] {
            let hand = format!("hand{side}");
            b.component(&hand, palm, [0.0, -1.3, 0.0], [s * 0.03, -0.275, 0.0], id, parent, SKIN)?;
            let n = |i: u32| format!("{hand}{i}");
            b.inner(&n(1), &hand, Some(knuckle), at([s * 0.03 + 0.09, -0.275, 0.0]), id, SKIN)?;
            b.inner(&n(2), &hand, Some(knuckle), at([s * 0.03 - 0.09, -0.275, 0.0]), id, SKIN)?;
            b.inner(&n(3), &hand, Some(thumb_ball), at([s * 0.12, -0.2, 0.0]), id, SKIN)?;
            for (i, x, shape) in [
                (4, 0.03, side_plate),
                (5, -0.03, side_plate),
                (6, 0.09, side_rod),
                (7, -0.09, side_rod),
            ] {
                let angle = if x > 0.0 { tilt } else { -tilt };
                b.inner(&n(i), &hand, Some(shape), at([x, -0.1, 0.0]).with_rotation(rot_z(angle)), id, SKIN)?;
            }

            let finger = |f: u32, k: u32| format!("finger{side}{f}{k}");
            // thumb: two segments
            b.component(&finger(1, 0), finger4, [-s * 0.12, -0.2, 0.0], [0.0, -0.05, 0.0], id, &hand, SKIN)?;
            b.component(&finger(1, 1), finger4, [0.0, -0.1, 0.0], [0.0, -0.05, 0.0], id, &finger(1, 0), SKIN)?;
            for (f, x, shape, step, half) in [
                (2, -s * 0.06, finger4, 0.1, 0.05),
                (3, 0.0, finger3, 0.12, 0.06),
                (4, s * 0.06, finger4, 0.1, 0.05),
                (5, s * 0.12, finger5, 0.08, 0.04),
            ] {
                b.component(&finger(f, 0), shape, [x, -0.35, 0.0], [0.0, -half, 0.0], id, &hand, SKIN)?;
                b.component(&finger(f, 1), shape, [0.0, -step, 0.0], [0.0, -half, 0.0], id, &finger(f, 0), SKIN)?;
                b.component(&finger(f, 2), shape, [0.0, -step, 0.0], [0.0, -half, 0.0], id, &finger(f, 1), SKIN)?;
            }
        }

        let Builder {
            joints, inner, parts, ..
        } = b;
        let mut avatar = Self {
            root,
            joints,
            inner,
            parts,
            pivot: Pivot::Body,
        };
        avatar.set_pivot(graph, Pivot::Body)?;
        avatar.apply_pose(graph, &idle())?;
        log::debug!("avatar built with {} parts", avatar.parts.len());
        Ok(avatar)
    }

    pub fn pivot(&self) -> Pivot {
        self.pivot
    }

    /// Joint or inner node called `name`.
    pub fn node(&self, name: &str) -> Option<NodeId> {
        self.joints.get(name).or_else(|| self.inner.get(name)).copied()
    }

    pub fn joint_names(&self) -> impl Iterator<Item = &str> {
        self.joints.keys().map(String::as_str)
    }

    fn require(&self, name: &str) -> Result<NodeId, SceneError> {
        self.node(name).ok_or_else(|| SceneError::UnknownName(name.to_string()))
    }

    fn place(&self, graph: &mut SceneGraph, name: &str, position: [f32; 3]) -> Result<(), SceneError> {
        graph.local_mut(self.require(name)?)?.position = position.into();
        Ok(())
    }

    /// Re-roots the body/left-leg chain on `pivot`. Joint rotations are kept,
    /// positions along the chain are reset.
    pub fn set_pivot(&mut self, graph: &mut SceneGraph, pivot: Pivot) -> Result<(), SceneError> {
        let body = self.require("body")?;
        let leg_lu = self.require("legLU")?;
        let leg_ld = self.require("legLD")?;
        match pivot {
            Pivot::Body => {
                graph.set_parent(body, self.root)?;
                self.place(graph, "body", [0.0, 0.0, 0.0])?;
                self.place(graph, "body0", [0.0, 0.0, 0.0])?;
                graph.set_parent(leg_lu, body)?;
                self.place(graph, "legLU", [0.3, 0.0, 0.0])?;
                self.place(graph, "legLU0", [0.0, -1.0, 0.0])?;
                self.place(graph, "footL", [0.0, -2.0, 0.0])?;
                graph.set_parent(leg_ld, leg_lu)?;
                self.place(graph, "legLD", [0.0, -2.0, 0.0])?;
                self.place(graph, "legLD0", [0.0, -1.0, 0.0])?;
            }
            Pivot::LeftLowerLeg => {
                graph.set_parent(leg_ld, self.root)?;
                self.place(graph, "legLD", [0.3, -4.0, 0.0])?;
                self.place(graph, "legLD0", [0.0, 1.0, 0.0])?;
                self.place(graph, "footL", [0.0, 0.0, 0.0])?;
                graph.set_parent(leg_lu, leg_ld)?;
                self.place(graph, "legLU", [0.0, 2.0, 0.0])?;
                self.place(graph, "legLU0", [0.0, 1.0, 0.0])?;
                graph.set_parent(body, leg_lu)?;
                self.place(graph, "body", [-0.3, 2.0, 0.0])?;
                self.place(graph, "body0", [0.0, 0.0, 0.0])?;
            }
        }
        if self.pivot != pivot {
            log::debug!("avatar pivot {:?} -> {:?}", self.pivot, pivot);
        }
        self.pivot = pivot;
        Ok(())
    }

    /// Writes joint rotations and the current pivot's position. Returns the
    /// camera placement of the frame, if any.
    pub fn apply_frame(
        &self,
        graph: &mut SceneGraph,
        frame: &PoseFrame,
    ) -> Result<Option<(Vector3<f32>, Quaternion<f32>)>, SceneError> {
        for (joint, rotation) in &frame.rotations {
            match self.joints.get(joint) {
                Some(node) => graph.local_mut(*node)?.rotation = *rotation,
                None => log::warn!("pose names unknown joint '{}'", joint),
            }
        }
        let pivot = self.pivot.joint();
        if let Some(position) = frame.positions.get(pivot) {
            graph.local_mut(self.require(pivot)?)?.position = *position;
        }
        Ok(frame.camera)
    }

    pub fn apply_pose(
        &self,
        graph: &mut SceneGraph,
        pose: &Pose,
    ) -> Result<Option<(Vector3<f32>, Quaternion<f32>)>, SceneError> {
        self.apply_frame(graph, &PoseFrame::of(pose))
    }
}

const HOME_CAMERA: ([f32; 3], [f32; 3]) = ([0.0, 0.0, 15.0], [0.0, 0.0, 0.0]);

fn home(pose: Pose) -> Pose {
    pose.place("body", [0.0, 0.0, 0.0])
        .place("legLD", [0.3, -4.0, 0.0])
        .with_camera(HOME_CAMERA.0, HOME_CAMERA.1)
}

fn fingers(mut pose: Pose, side: &str, fingers: &[u32], rotation: [f32; 3]) -> Pose {
    for f in fingers {
        for k in 0..3 {
            pose = pose.rotate(&format!("finger{side}{f}{k}"), rotation);
        }
    }
    pose
}

/// Arms hanging slightly outward, thumbs relaxed.
pub fn idle() -> Pose {
    let mut pose = home(Pose::new("idle"))
        .rotate("body", [0.0; 3])
        .rotate("head", [0.0; 3])
        .rotate("legLU", [0.0; 3])
        .rotate("legRU", [0.0; 3])
        .rotate("legLD", [0.0; 3])
        .rotate("legRD", [0.0; 3])
        .rotate("armLU", [0.0, 0.0, 14.04])
        .rotate("armRU", [0.0, 0.0, -14.04])
        .rotate("armLD", [0.0; 3])
        .rotate("armRD", [0.0; 3])
        .rotate("handL", [0.0; 3])
        .rotate("handR", [0.0; 3]);
    for side in ["L", "R"] {
        pose = fingers(pose, side, &[2, 3, 4, 5], [0.0; 3]);
        pose = pose.rotate(&format!("finger{side}11"), [0.0; 3]);
    }
    pose.rotate("fingerL10", [0.0, 0.0, -15.0])
        .rotate("fingerR10", [0.0, 0.0, 15.0])
}

/// Waving with the left hand, right leg raised.
pub fn hello() -> Pose {
    let mut pose = idle();
    pose.name = "hello".to_string();
    pose.rotate("armLU", [-30.0, 0.0, 0.0])
        .rotate("armLD", [-120.0, 0.0, 0.0])
        .rotate("armRU", [0.0, 0.0, -90.0])
        .rotate("armRD", [0.0, 0.0, -90.0])
        .rotate("handL", [-30.0, 0.0, 0.0])
        .rotate("fingerL30", [90.0, 0.0, 0.0])
        .rotate("fingerL31", [90.0, 0.0, 0.0])
        .rotate("fingerL40", [90.0, 0.0, 0.0])
        .rotate("fingerL41", [90.0, 0.0, 0.0])
        .rotate("fingerR30", [-90.0, 0.0, 0.0])
        .rotate("fingerR31", [-90.0, 0.0, 0.0])
        .rotate("fingerR40", [-90.0, 0.0, 0.0])
        .rotate("fingerR41", [-90.0, 0.0, 0.0])
        .rotate("legRU", [-90.0, 15.0, 0.0])
        .rotate("legRD", [105.0, 0.0, 15.0])
}

/// Right arm raised high, body leaning into it.
pub fn pose1() -> Pose {
    let mut pose = idle();
    pose.name = "pose1".to_string();
    pose.rotate("body", [0.0, 0.0, -8.0])
        .rotate("head", [0.0, -15.0, -10.0])
        .rotate("armRU", [0.0, 0.0, -150.0])
        .rotate("armRD", [0.0, 0.0, -25.0])
        .rotate("handR", [0.0, 30.0, 0.0])
        .rotate("armLU", [0.0, 0.0, 35.0])
        .rotate("armLD", [-40.0, 0.0, 0.0])
        .rotate("legRU", [0.0, 0.0, -10.0])
}

/// Lunge over the planted left foot.
pub fn pose2() -> Pose {
    let mut pose = idle();
    pose.name = "pose2".to_string();
    pose.rotate("legLD", [30.0, 0.0, 0.0])
        .rotate("legLU", [-75.0, 0.0, 0.0])
        .rotate("body", [50.0, 0.0, 0.0])
        .rotate("legRU", [40.0, 0.0, 0.0])
        .rotate("legRD", [20.0, 0.0, 0.0])
        .rotate("armLU", [0.0, 0.0, 80.0])
        .rotate("armRU", [0.0, 0.0, -80.0])
        .rotate("head", [-15.0, 0.0, 0.0])
}

/// Crouch before and after a jump.
pub fn jump_ready() -> Pose {
    let mut pose = idle();
    pose.name = "jump_ready".to_string();
    pose.rotate("legLD", [25.0, 0.0, 0.0])
        .rotate("legLU", [-60.0, 0.0, 0.0])
        .rotate("body", [35.0, 0.0, 0.0])
        .rotate("legRU", [-35.0, 0.0, 0.0])
        .rotate("legRD", [60.0, 0.0, 0.0])
        .rotate("armLU", [50.0, 0.0, 14.04])
        .rotate("armRU", [50.0, 0.0, -14.04])
        .place("legLD", [0.3, -4.0, 0.0])
}

/// Fully stretched in the air.
pub fn jump() -> Pose {
    let mut pose = idle();
    pose.name = "jump".to_string();
    pose.rotate("armLU", [0.0, 0.0, 160.0])
        .rotate("armRU", [0.0, 0.0, -160.0])
        .rotate("legLD", [-10.0, 0.0, 0.0])
        .rotate("legRD", [10.0, 0.0, 0.0])
        .rotate("head", [-20.0, 0.0, 0.0])
        .place("legLD", [0.3, -2.0, 0.0])
        .place("body", [0.0, 2.0, 0.0])
        .with_camera([0.0, 1.0, 15.0], [0.0, 0.0, 0.0])
}

/// V-sign next to the face, camera moved in for the photo.
pub fn cheese() -> Pose {
    let mut pose = idle();
    pose.name = "cheese".to_string();
    pose = fingers(pose, "R", &[4, 5], [90.0, 0.0, 0.0]);
    pose.rotate("armRU", [0.0, 0.0, -25.0])
        .rotate("armRD", [-30.0, 0.0, -130.0])
        .rotate("handR", [0.0, 90.0, 0.0])
        .rotate("fingerR20", [0.0, 0.0, 10.0])
        .rotate("fingerR30", [0.0, 0.0, -10.0])
        .rotate("fingerR10", [0.0, 0.0, 60.0])
        .rotate("fingerR11", [0.0, 0.0, 40.0])
        .rotate("head", [0.0, 0.0, -12.0])
        .rotate("body", [0.0, 0.0, 4.0])
        .rotate("armLU", [0.0, 0.0, 25.0])
        .with_camera([0.0, 2.5, 8.0], [-8.0, 0.0, 0.0])
}

/// Durations of the keyed transitions in seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoseTimings {
    pub pose1: f32,
    pub pose2: f32,
    pub jump_ready: f32,
    pub jump: f32,
}

impl Default for PoseTimings {
    fn default() -> Self {
        Self {
            pose1: 0.5,
            pose2: 0.5,
            jump_ready: 0.5,
            jump: 0.5,
        }
    }
}

/// Keyboard and click handling of the avatar's pose queue.
///
/// - keys `1` to `4` start pose1, pose2, cheese and hello, but only when no
///   transition is pending
/// - releasing the key queues the way back to idle, unless more than one
///   transition is still pending
/// - clicking the body queues a full jump
#[derive(Clone, Debug)]
pub struct AvatarInput {
    pub animator: PoseAnimator,
    pub easing: Easing,
    pub timings: PoseTimings,
}

impl Default for AvatarInput {
    fn default() -> Self {
        Self::new()
    }
}

impl AvatarInput {
    pub fn new() -> Self {
        Self {
            animator: PoseAnimator::new(idle()),
            easing: Easing::Linear,
            timings: PoseTimings::default(),
        }
    }

    fn keyed(&self, key: char) -> Option<(Pivot, Pose, f32)> {
        match key {
            '1' => Some((Pivot::Body, pose1(), self.timings.pose1)),
            '2' => Some((Pivot::LeftLowerLeg, pose2(), self.timings.pose2)),
            '3' => Some((Pivot::LeftLowerLeg, cheese(), self.timings.pose2)),
            '4' => Some((Pivot::Body, hello(), self.timings.pose1)),
            _ => None,
        }
    }

    /// Returns whether a transition was queued.
    pub fn key_down(&mut self, avatar: &mut Avatar, graph: &mut SceneGraph, key: char) -> Result<bool, SceneError> {
        if !self.animator.is_idle() {
            return Ok(false);
        }
        let Some((pivot, pose, interval)) = self.keyed(key) else {
            return Ok(false);
        };
        avatar.set_pivot(graph, pivot)?;
        log::info!("pose '{}' ({}s, {})", pose.name, interval, self.easing.name());
        self.animator.enqueue(Transition::new(pose, interval, self.easing));
        Ok(true)
    }

    /// Returns whether the way back to idle was queued.
    pub fn key_up(&mut self, key: char) -> bool {
        if self.animator.queue_len() > 1 {
            return false;
        }
        let Some((_, _, interval)) = self.keyed(key) else {
            return false;
        };
        self.animator.enqueue(Transition::new(idle(), interval, self.easing));
        true
    }

    /// Returns whether the click started a jump.
    pub fn click(&mut self, avatar: &mut Avatar, graph: &mut SceneGraph, pick_id: u32) -> Result<bool, SceneError> {
        if pick_id != BODY_ID || !self.animator.is_idle() {
            return Ok(false);
        }
        avatar.set_pivot(graph, Pivot::LeftLowerLeg)?;
        let t = self.timings;
        self.animator.enqueue_all([
            Transition::new(jump_ready(), t.jump_ready, self.easing),
            Transition::new(jump(), t.jump, Easing::Quadratic2),
            Transition::new(jump_ready(), t.jump, Easing::Quadratic1),
            Transition::new(idle(), t.jump_ready, self.easing),
        ]);
        log::info!("jump");
        Ok(true)
    }

    /// Advances the queue and writes the blended pose into the graph.
    /// Returns the camera placement when a transition is running.
    pub fn update(
        &mut self,
        avatar: &Avatar,
        graph: &mut SceneGraph,
        dt: f32,
    ) -> Result<Option<(Vector3<f32>, Quaternion<f32>)>, SceneError> {
        match self.animator.update(dt) {
            Some(frame) => avatar.apply_frame(graph, &frame),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_pose_only_names_existing_joints() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let avatar = Avatar::build(&mut graph, root).unwrap();
        for pose in [idle(), hello(), pose1(), pose2(), jump_ready(), jump(), cheese()] {
            for joint in pose.rotations.keys() {
                assert!(avatar.joints.contains_key(joint), "{} in {}", joint, pose.name);
            }
        }
    }

    #[test]
    fn missing_joints_are_reported_by_name() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let avatar = Avatar::build(&mut graph, root).unwrap();
        assert_eq!(avatar.require("tail"), Err(SceneError::UnknownName("tail".to_string())));
        assert!(avatar.require("legLD").is_ok());
    }

    #[test]
    fn hello_keeps_idle_thumbs() {
        assert_eq!(hello().rotation("fingerL10"), [0.0, 0.0, -15.0]);
        assert_eq!(hello().rotation("armLD"), [-120.0, 0.0, 0.0]);
    }
}
