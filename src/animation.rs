//! Pose interpolation.
//!
//! A [`Pose`] names joint rotations (Euler degrees) and a handful of node
//! positions. The [`PoseAnimator`] blends from the current pose towards a queue
//! of [`Transition`]s, one at a time, using an [`Easing`] curve on the
//! normalised time.
//!
//! # Key types
//!
//! - [`Easing`] remaps `t` in `[0, 1]`
//! - [`Pose`] / [`CameraPose`] describe a target
//! - [`PoseFrame`] is the sampled result that gets written into the scene graph
//! - [`PoseAnimator`] is the queue-driven state machine

use std::collections::{BTreeMap, VecDeque};

use cgmath::{InnerSpace, Quaternion, Vector3};

/// Remapping of the linear transition progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Easing {
    #[default]
    Linear,
    /// `x²`: slow start.
    Quadratic1,
    /// `-x² + 2x`: slow end.
    Quadratic2,
    /// Half a sine period: slow start and end.
    Sin,
}

impl Easing {
    pub const ALL: [Easing; 4] = [Easing::Linear, Easing::Quadratic1, Easing::Quadratic2, Easing::Sin];

    /// Evaluates the curve. `x` is clamped to `[0, 1]` first.
    pub fn apply(self, x: f32) -> f32 {
        let x = x.clamp(0.0, 1.0);
        match self {
            Easing::Linear => x,
            Easing::Quadratic1 => x * x,
            Easing::Quadratic2 => -x * x + 2.0 * x,
            Easing::Sin => ((x - 0.5) * std::f32::consts::PI).sin() / 2.0 + 0.5,
        }
    }

    /// The next curve in [`Easing::ALL`], wrapping around.
    pub fn next(self) -> Easing {
        let idx = Self::ALL.iter().position(|e| *e == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn name(self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::Quadratic1 => "quadratic1",
            Easing::Quadratic2 => "quadratic2",
            Easing::Sin => "sin",
        }
    }
}

/// Quaternion from Euler angles in degrees.
///
/// Matches gl-matrix `quat.fromEuler`: rotate about x, then y, then z
/// (extrinsic), built directly from the half angles.
pub fn quat_from_euler_deg(x: f32, y: f32, z: f32) -> Quaternion<f32> {
    let half = std::f32::consts::PI / 360.0;
    let (sx, cx) = (x * half).sin_cos();
    let (sy, cy) = (y * half).sin_cos();
    let (sz, cz) = (z * half).sin_cos();

    Quaternion::new(
        cx * cy * cz + sx * sy * sz,
        sx * cy * cz - cx * sy * sz,
        cx * sy * cz + sx * cy * sz,
        cx * cy * sz - sx * sy * cz,
    )
}

/// Spherical interpolation along the shorter arc.
///
/// The result is always unit length, even if the inputs drifted.
pub fn slerp(a: Quaternion<f32>, b: Quaternion<f32>, t: f32) -> Quaternion<f32> {
    let a = normalize_or_identity(a);
    let mut b = normalize_or_identity(b);
    let mut cos = a.dot(b);
    if cos < 0.0 {
        cos = -cos;
        b = -b;
    }

    let (wa, wb) = if cos > 0.9995 {
        (1.0 - t, t)
    } else {
        let omega = cos.acos();
        let sin = omega.sin();
        (((1.0 - t) * omega).sin() / sin, (t * omega).sin() / sin)
    };

    normalize_or_identity(a * wa + b * wb)
}

fn normalize_or_identity(q: Quaternion<f32>) -> Quaternion<f32> {
    let len = q.magnitude();
    if len < f32::EPSILON || !len.is_finite() {
        Quaternion::new(1.0, 0.0, 0.0, 0.0)
    } else {
        q / len
    }
}

pub fn lerp_vec3(a: Vector3<f32>, b: Vector3<f32>, t: f32) -> Vector3<f32> {
    a + (b - a) * t
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    pub position: Vector3<f32>,
    pub rotation_deg: [f32; 3],
}

/// Named joint rotations plus optional node positions and camera placement.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Pose {
    pub name: String,
    pub rotations: BTreeMap<String, [f32; 3]>,
    pub positions: BTreeMap<String, Vector3<f32>>,
    pub camera: Option<CameraPose>,
}

impl Pose {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn rotate(mut self, joint: &str, euler_deg: [f32; 3]) -> Self {
        self.rotations.insert(joint.to_string(), euler_deg);
        self
    }

    pub fn place(mut self, node: &str, position: [f32; 3]) -> Self {
        self.positions.insert(node.to_string(), position.into());
        self
    }

    pub fn with_camera(mut self, position: [f32; 3], rotation_deg: [f32; 3]) -> Self {
        self.camera = Some(CameraPose {
            position: position.into(),
            rotation_deg,
        });
        self
    }

    /// Rotation of `joint`, the rest pose when the pose does not mention it.
    pub fn rotation(&self, joint: &str) -> [f32; 3] {
        self.rotations.get(joint).copied().unwrap_or([0.0; 3])
    }
}

/// A sampled pose, ready to be written into transforms.
#[derive(Clone, Debug, PartialEq)]
pub struct PoseFrame {
    pub rotations: BTreeMap<String, Quaternion<f32>>,
    pub positions: BTreeMap<String, Vector3<f32>>,
    pub camera: Option<(Vector3<f32>, Quaternion<f32>)>,
}

impl PoseFrame {
    pub fn of(pose: &Pose) -> Self {
        Self::blend(pose, pose, 0.0)
    }

    /// Blends `from` towards `to`. `t` is used as is, apply easing beforehand.
    pub fn blend(from: &Pose, to: &Pose, t: f32) -> Self {
        let joints = from.rotations.keys().chain(to.rotations.keys());
        let rotations = joints
            .map(|joint| {
                let [ax, ay, az] = from.rotation(joint);
                let [bx, by, bz] = to.rotation(joint);
                let q = slerp(quat_from_euler_deg(ax, ay, az), quat_from_euler_deg(bx, by, bz), t);
                (joint.clone(), q)
            })
            .collect();

        let nodes = from.positions.keys().chain(to.positions.keys());
        let positions = nodes
            .filter_map(|node| {
                let p = match (from.positions.get(node), to.positions.get(node)) {
                    (Some(a), Some(b)) => lerp_vec3(*a, *b, t),
                    (Some(a), None) => *a,
                    (None, Some(b)) => *b,
                    (None, None) => return None,
                };
                Some((node.clone(), p))
            })
            .collect();

        let camera = match (from.camera, to.camera) {
            (Some(a), Some(b)) => {
                let qa = quat_from_euler_deg(a.rotation_deg[0], a.rotation_deg[1], a.rotation_deg[2]);
                let qb = quat_from_euler_deg(b.rotation_deg[0], b.rotation_deg[1], b.rotation_deg[2]);
                Some((lerp_vec3(a.position, b.position, t), slerp(qa, qb, t)))
            }
            (Some(c), None) | (None, Some(c)) => Some((
                c.position,
                quat_from_euler_deg(c.rotation_deg[0], c.rotation_deg[1], c.rotation_deg[2]),
            )),
            (None, None) => None,
        };

        Self {
            rotations,
            positions,
            camera,
        }
    }
}

/// One queued target: reach `pose` within `interval` seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub pose: Pose,
    pub interval: f32,
    pub easing: Easing,
}

impl Transition {
    pub fn new(pose: Pose, interval: f32, easing: Easing) -> Self {
        Self {
            pose,
            interval: interval.max(0.0),
            easing,
        }
    }
}

/// Plays queued transitions in order.
///
/// Each call to [`update`](Self::update) either advances the blend towards the
/// head of the queue or, once its interval has elapsed, snaps onto it and pops
/// it. The snap happens on the call after the interval ran out, so the last
/// blended frame and the snapped frame may differ by one step.
#[derive(Clone, Debug)]
pub struct PoseAnimator {
    current: Pose,
    queue: VecDeque<Transition>,
    elapsed: f32,
}

impl PoseAnimator {
    pub fn new(initial: Pose) -> Self {
        Self {
            current: initial,
            queue: VecDeque::new(),
            elapsed: 0.0,
        }
    }

    pub fn current(&self) -> &Pose {
        &self.current
    }

    pub fn enqueue(&mut self, transition: Transition) {
        self.queue.push_back(transition);
    }

    pub fn enqueue_all(&mut self, transitions: impl IntoIterator<Item = Transition>) {
        self.queue.extend(transitions);
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Drops all pending transitions and stays at the current pose.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.elapsed = 0.0;
    }

    /// Jumps to `pose` without blending.
    pub fn reset(&mut self, pose: Pose) {
        self.clear();
        self.current = pose;
    }

    pub fn sample_current(&self) -> PoseFrame {
        PoseFrame::of(&self.current)
    }

    /// Advances by `dt` seconds. Returns `None` when nothing is queued.
    pub fn update(&mut self, dt: f32) -> Option<PoseFrame> {
        let next = self.queue.front()?;
        if self.elapsed >= next.interval {
            let done = self.queue.pop_front()?;
            log::debug!("pose '{}' reached", done.pose.name);
            self.current = done.pose;
            self.elapsed = 0.0;
            return Some(self.sample_current());
        }

        self.elapsed += dt.max(0.0);
        let progress = if next.interval > 0.0 {
            self.elapsed / next.interval
        } else {
            1.0
        };
        let t = next.easing.apply(progress);
        Some(PoseFrame::blend(&self.current, &next.pose, t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easing_endpoints_are_fixed() {
        for easing in Easing::ALL {
            assert!((easing.apply(0.0)).abs() < 1e-6, "{:?}", easing);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-6, "{:?}", easing);
        }
    }

    #[test]
    fn easing_clamps_input() {
        assert_eq!(Easing::Quadratic2.apply(3.0), 1.0);
        assert_eq!(Easing::Linear.apply(-1.0), 0.0);
    }

    #[test]
    fn easing_cycles_through_all() {
        let mut e = Easing::Linear;
        for _ in 0..Easing::ALL.len() {
            e = e.next();
        }
        assert_eq!(e, Easing::Linear);
    }

    #[test]
    fn euler_about_single_axis() {
        let q = quat_from_euler_deg(90.0, 0.0, 0.0);
        let h = std::f32::consts::FRAC_1_SQRT_2;
        assert!((q.s - h).abs() < 1e-6);
        assert!((q.v.x - h).abs() < 1e-6);
        assert!(q.v.y.abs() < 1e-6 && q.v.z.abs() < 1e-6);
    }
}
