//! Recursive 2D fractals, emitted as flat triangles in the XY plane.

use cgmath::{InnerSpace, Vector3};

use crate::data_structures::mesh::MeshData;

/// Height of each trunk square relative to its base segment.
const TRUNK_STRETCH: f32 = 3.0;

/// Branch angle used by the fractal scene at time `t` seconds.
///
/// Swings through `[-π/4, π/4]`; negative values are lifted by `π/2` so the
/// tree leans the other way instead of folding into itself.
pub fn animated_tree_angle(t: f32) -> f32 {
    let angle = t.sin() * std::f32::consts::FRAC_PI_4;
    if angle < 0.0 {
        angle + std::f32::consts::FRAC_PI_2
    } else {
        angle
    }
}

/// Pythagoras tree grown from the segment `p1 -> p2`.
///
/// Each level adds a trunk rectangle over the segment (two triangles) and a
/// roof triangle whose apex splits the top edge at `angle`, then recurses on
/// both roof edges. A tree of depth `n` holds `3 * (2^n - 1)` triangles.
pub fn pythagoras_tree(depth: u32, angle: f32, p1: [f32; 3], p2: [f32; 3], color: [f32; 3]) -> MeshData {
    let mut mesh = MeshData::new();
    grow(&mut mesh, depth, angle, p1.into(), p2.into(), color);
    mesh
}

fn grow(mesh: &mut MeshData, depth: u32, angle: f32, p1: Vector3<f32>, p2: Vector3<f32>, color: [f32; 3]) {
    if depth == 0 {
        return;
    }
    let v12 = p2 - p1;
    let len = v12.magnitude();
    if len <= f32::EPSILON {
        return;
    }
    let v23 = Vector3::new(-v12.y, v12.x, v12.z) * TRUNK_STRETCH;
    let vx = v12 / len;
    let vy = v23.normalize();
    let p3 = p2 + v23;
    let p4 = p1 + v23;
    let (sin, cos) = angle.sin_cos();
    let p5 = p4 + vx * (len * cos * cos) + vy * (len * cos * sin);

    mesh.push_flat_triangle([p1, p2, p3], color);
    mesh.push_flat_triangle([p1, p3, p4], color);
    mesh.push_flat_triangle([p4, p3, p5], color);
    grow(mesh, depth - 1, angle, p4, p5, color);
    grow(mesh, depth - 1, angle, p5, p3, color);
}

/// Left (`1`) and right (`-1`) turns of the dragon curve of order `n`.
///
/// `L(0) = []`, `L(1) = [1]`, `L(n) = L(n-1) ++ [1] ++ reverse(negate(L(n-1)))`.
pub fn dragon_turns(n: u32) -> Vec<i8> {
    let mut turns = Vec::new();
    for _ in 0..n {
        let mirrored: Vec<i8> = turns.iter().rev().map(|t: &i8| -t).collect();
        turns.push(1);
        turns.extend(mirrored);
    }
    turns
}

/// Unit step for a direction index: 0 right, 1 up, 2 left, 3 down.
fn step(direction: u8) -> Vector3<f32> {
    match direction % 4 {
        0 => Vector3::new(1.0, 0.0, 0.0),
        1 => Vector3::new(0.0, 1.0, 0.0),
        2 => Vector3::new(-1.0, 0.0, 0.0),
        _ => Vector3::new(0.0, -1.0, 0.0),
    }
}

/// Corner points of the dragon curve walk starting at `origin`.
pub fn dragon_points(n: u32, origin: [f32; 3], segment: f32, start_direction: u8) -> Vec<Vector3<f32>> {
    let turns = dragon_turns(n);
    let mut direction = start_direction % 4;
    let mut pos: Vector3<f32> = origin.into();
    let mut points = Vec::with_capacity(turns.len() + 2);
    points.push(pos);
    pos += step(direction) * segment;
    points.push(pos);
    for turn in turns {
        direction = (direction as i8 + turn).rem_euclid(4) as u8;
        pos += step(direction) * segment;
        points.push(pos);
    }
    points
}

/// One dragon curve drawn as a chain of squares.
///
/// Every pair of consecutive segments `p1 -> p2 -> p3` spans a square whose
/// fourth corner mirrors `p2` through the midpoint of `p1 p3`. Curves starting
/// horizontally are mid grey, vertical ones white.
pub fn dragon_curve(n: u32, origin: [f32; 3], segment: f32, start_direction: u8) -> MeshData {
    let grey = ((start_direction % 2) as f32 + 1.0) * 0.5;
    let color = [grey; 3];
    let points = dragon_points(n, origin, segment, start_direction);
    let mut mesh = MeshData::new();
    for i in (2..points.len()).step_by(2) {
        let (p1, p2, p3) = (points[i - 2], points[i - 1], points[i]);
        let middle = (p1 + p3) * 0.5;
        let p4 = middle + (middle - p2);
        mesh.push_flat_triangle([p1, p2, p3], color);
        mesh.push_flat_triangle([p1, p3, p4], color);
    }
    mesh
}

/// Four dragon curves of order `n` sharing `origin`, one per start direction.
/// Segments shrink as `size * 0.67^(n-1)` so higher orders keep a similar extent.
pub fn dragon_quartet(n: u32, origin: [f32; 3], size: f32) -> MeshData {
    let segment = size * 0.67f32.powi(n as i32 - 1);
    let mut mesh = MeshData::new();
    for direction in 0..4 {
        mesh.append(dragon_curve(n, origin, segment, direction));
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_turn_lists() {
        assert!(dragon_turns(0).is_empty());
        assert_eq!(dragon_turns(1), vec![1]);
        assert_eq!(dragon_turns(2), vec![1, 1, -1]);
        assert_eq!(dragon_turns(3), vec![1, 1, -1, 1, 1, -1, -1]);
    }

    #[test]
    fn tree_angle_stays_in_first_quadrant() {
        for i in 0..100 {
            let a = animated_tree_angle(i as f32 * 0.1);
            assert!((0.0..=std::f32::consts::FRAC_PI_2).contains(&a));
        }
    }
}
