//! Parametric solids.
//!
//! All generators return [`MeshData`] centred as documented per function, with
//! white vertex colour and counter-clockwise winding as seen from outside.
//! Winding is enforced against the intended outward normal while building, so
//! the individual generators only have to get positions and normals right.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use cgmath::{InnerSpace, Vector3};

use crate::data_structures::mesh::{MeshData, ModelVertex, face_normal};

const WHITE: [f32; 3] = [1.0; 3];

fn v3(x: f32, y: f32, z: f32) -> Vector3<f32> {
    Vector3::new(x, y, z)
}

/// Pushes a triangle, flipping it if its winding disagrees with `outward`.
/// Degenerate triangles are dropped.
fn push_oriented(mesh: &mut MeshData, mut verts: [ModelVertex; 3], outward: Vector3<f32>) {
    let [a, b, c] = verts.map(|v| Vector3::from(v.position));
    let n = face_normal(a, b, c);
    if n.magnitude2() == 0.0 {
        return;
    }
    if n.dot(outward) < 0.0 {
        verts.swap(1, 2);
    }
    mesh.push_triangle(verts);
}

fn vert(position: Vector3<f32>, normal: Vector3<f32>) -> ModelVertex {
    ModelVertex::coloured(position, normal, WHITE)
}

/// Flat fan around `center` facing `normal`. `ring` is not closed implicitly.
fn push_fan(mesh: &mut MeshData, center: Vector3<f32>, ring: &[Vector3<f32>], normal: Vector3<f32>) {
    for pair in ring.windows(2) {
        push_oriented(
            mesh,
            [vert(center, normal), vert(pair[0], normal), vert(pair[1], normal)],
            normal,
        );
    }
}

fn circle(radius: f32, y: f32, sides: u32, from: f32, to: f32) -> Vec<Vector3<f32>> {
    (0..=sides)
        .map(|i| {
            let theta = from + (to - from) * i as f32 / sides as f32;
            v3(radius * theta.cos(), y, radius * theta.sin())
        })
        .collect()
}

/// Rectangle in the XY plane facing -Z, `xlen` by `ylen`, centred on the origin.
///
/// Texture coordinates are laid out as seen from the front: `(0, 0)` is the
/// top-left corner for a viewer on the -Z side.
pub fn plane(xlen: f32, ylen: f32) -> MeshData {
    let (x, y) = (xlen * 0.5, ylen * 0.5);
    let n = v3(0.0, 0.0, -1.0);
    let mut mesh = MeshData::new();
    mesh.push_quad([
        vert(v3(x, -y, 0.0), n).with_tex_coords([0.0, 1.0]),
        vert(v3(-x, -y, 0.0), n).with_tex_coords([1.0, 1.0]),
        vert(v3(-x, y, 0.0), n).with_tex_coords([1.0, 0.0]),
        vert(v3(x, y, 0.0), n).with_tex_coords([0.0, 0.0]),
    ]);
    mesh
}

/// Axis aligned box centred on the origin with one flat-shaded quad per face.
pub fn cube(xlen: f32, ylen: f32, zlen: f32) -> MeshData {
    let h = v3(xlen * 0.5, ylen * 0.5, zlen * 0.5);
    // (normal, u, v) with u x v = normal, so the corners below run counter-clockwise.
    let faces = [
        (v3(0.0, 0.0, 1.0), v3(h.x, 0.0, 0.0), v3(0.0, h.y, 0.0)),
        (v3(0.0, 1.0, 0.0), v3(h.x, 0.0, 0.0), v3(0.0, 0.0, -h.z)),
        (v3(1.0, 0.0, 0.0), v3(0.0, 0.0, -h.z), v3(0.0, h.y, 0.0)),
        (v3(0.0, 0.0, -1.0), v3(-h.x, 0.0, 0.0), v3(0.0, h.y, 0.0)),
        (v3(0.0, -1.0, 0.0), v3(h.x, 0.0, 0.0), v3(0.0, 0.0, h.z)),
        (v3(-1.0, 0.0, 0.0), v3(0.0, 0.0, h.z), v3(0.0, h.y, 0.0)),
    ];
    let mut mesh = MeshData::new();
    for (n, u, v) in faces {
        let c = v3(n.x * h.x, n.y * h.y, n.z * h.z);
        mesh.push_quad([
            vert(c - u - v, n),
            vert(c + u - v, n),
            vert(c + u + v, n),
            vert(c - u + v, n),
        ]);
    }
    mesh
}

/// Curved patch of a sphere between the given azimuth (`theta`) and polar
/// (`phi`, 0 at +Y) ranges.
fn spherical_patch(
    radius: f32,
    longitudes: u32,
    latitudes: u32,
    theta: (f32, f32),
    phi: (f32, f32),
    center: Vector3<f32>,
) -> MeshData {
    let point = |i: u32, j: u32| {
        let t = theta.0 + (theta.1 - theta.0) * i as f32 / longitudes as f32;
        let p = phi.0 + (phi.1 - phi.0) * j as f32 / latitudes as f32;
        let dir = v3(t.cos() * p.sin(), p.cos(), -t.sin() * p.sin());
        vert(center + dir * radius, dir)
    };
    let mut mesh = MeshData::new();
    for i in 0..longitudes {
        for j in 0..latitudes {
            let quad = [point(i, j), point(i, j + 1), point(i + 1, j + 1), point(i + 1, j)];
            let mid = (Vector3::from(quad[0].normal) + Vector3::from(quad[2].normal)).normalize();
            push_oriented(&mut mesh, [quad[0], quad[1], quad[2]], mid);
            push_oriented(&mut mesh, [quad[0], quad[2], quad[3]], mid);
        }
    }
    mesh
}

/// Sphere centred on the origin. Pole rows become triangle fans.
pub fn sphere(radius: f32, longitudes: u32, latitudes: u32) -> MeshData {
    spherical_patch(radius, longitudes, latitudes, (0.0, TAU), (0.0, PI), v3(0.0, 0.0, 0.0))
}

/// Upper half sphere (y >= 0) closed by a disk at y = 0.
pub fn hemisphere(radius: f32, longitudes: u32, latitudes: u32) -> MeshData {
    let mut mesh = spherical_patch(radius, longitudes, latitudes, (0.0, TAU), (0.0, FRAC_PI_2), v3(0.0, 0.0, 0.0));
    let mut base = MeshData::new();
    push_fan(&mut base, v3(0.0, 0.0, 0.0), &circle(radius, 0.0, longitudes, 0.0, TAU), v3(0.0, -1.0, 0.0));
    mesh.append(base);
    mesh
}

/// The y >= 0, z >= 0 quarter of a sphere, closed by two flat half disks.
pub fn quarter_sphere(radius: f32, longitudes: u32, latitudes: u32) -> MeshData {
    let mut mesh = spherical_patch(radius, longitudes, latitudes, (PI, TAU), (0.0, FRAC_PI_2), v3(0.0, 0.0, 0.0));
    let origin = v3(0.0, 0.0, 0.0);

    let mut base = MeshData::new();
    push_fan(&mut base, origin, &circle(radius, 0.0, longitudes, 0.0, PI), v3(0.0, -1.0, 0.0));
    mesh.append(base);

    let back: Vec<_> = (0..=latitudes * 2)
        .map(|i| {
            let a = PI * i as f32 / (latitudes * 2) as f32;
            v3(radius * a.cos(), radius * a.sin(), 0.0)
        })
        .collect();
    let mut cut = MeshData::new();
    push_fan(&mut cut, origin, &back, v3(0.0, 0.0, -1.0));
    mesh.append(cut);
    mesh
}

/// Side wall of a frustum between `y0` (radius `r0`) and `y1` (radius `r1`).
fn frustum_side(r0: f32, r1: f32, y0: f32, y1: f32, sides: u32) -> MeshData {
    let h = y1 - y0;
    let mut mesh = MeshData::new();
    for i in 0..sides {
        let t0 = TAU * i as f32 / sides as f32;
        let t1 = TAU * (i + 1) as f32 / sides as f32;
        let normal = |t: f32| v3(h * t.cos(), r0 - r1, h * t.sin()).normalize();
        let at = |r: f32, y: f32, t: f32| v3(r * t.cos(), y, r * t.sin());
        let (n0, n1) = (normal(t0), normal(t1));
        let quad = [
            vert(at(r0, y0, t0), n0),
            vert(at(r1, y1, t0), n0),
            vert(at(r1, y1, t1), n1),
            vert(at(r0, y0, t1), n1),
        ];
        let mid = normal((t0 + t1) * 0.5);
        push_oriented(&mut mesh, [quad[0], quad[1], quad[2]], mid);
        push_oriented(&mut mesh, [quad[0], quad[2], quad[3]], mid);
    }
    mesh
}

fn cap(radius: f32, y: f32, sides: u32, normal: Vector3<f32>) -> MeshData {
    let mut mesh = MeshData::new();
    if radius > 0.0 {
        push_fan(&mut mesh, v3(0.0, y, 0.0), &circle(radius, y, sides, 0.0, TAU), normal);
    }
    mesh
}

/// Cone with its base disk at y = 0 and the apex at y = `height`.
pub fn cone(radius: f32, height: f32, sides: u32) -> MeshData {
    let mut mesh = cap(radius, 0.0, sides, v3(0.0, -1.0, 0.0));
    mesh.append(frustum_side(radius, 0.0, 0.0, height, sides));
    mesh
}

/// Closed frustum centred on the origin.
pub fn frustum(bottom_radius: f32, top_radius: f32, height: f32, sides: u32) -> MeshData {
    let h = height * 0.5;
    let mut mesh = cap(bottom_radius, -h, sides, v3(0.0, -1.0, 0.0));
    mesh.append(cap(top_radius, h, sides, v3(0.0, 1.0, 0.0)));
    mesh.append(frustum_side(bottom_radius, top_radius, -h, h, sides));
    mesh
}

/// Closed cylinder centred on the origin.
pub fn cylinder(radius: f32, height: f32, sides: u32) -> MeshData {
    frustum(radius, radius, height, sides)
}

/// Cylinder of `height` with hemispherical caps; overall height is `height + 2 * radius`.
pub fn capsule(radius: f32, height: f32, sides: u32, latitudes: u32) -> MeshData {
    let h = height * 0.5;
    let mut mesh = frustum_side(radius, radius, -h, h, sides);
    mesh.append(spherical_patch(radius, sides, latitudes, (0.0, TAU), (0.0, FRAC_PI_2), v3(0.0, h, 0.0)));
    mesh.append(spherical_patch(radius, sides, latitudes, (0.0, TAU), (FRAC_PI_2, PI), v3(0.0, -h, 0.0)));
    mesh
}

/// Torso: a frustum widening towards the shoulders, flattened front to back.
pub fn upper_body(bottom_radius: f32, top_radius: f32, height: f32, depth_scale: f32, sides: u32) -> MeshData {
    let mut mesh = frustum(bottom_radius, top_radius, height, sides);
    for v in mesh.vertices.iter_mut() {
        v.position[2] *= depth_scale;
        let n = v3(v.normal[0], v.normal[1], v.normal[2] / depth_scale.max(f32::EPSILON));
        v.normal = n.normalize().into();
    }
    mesh
}

/// Flat star in the XY plane facing +Z with `points` tips.
pub fn star(points: u32, inner_radius: f32, outer_radius: f32) -> MeshData {
    let points = points.max(2);
    let ring: Vec<_> = (0..=points * 2)
        .map(|i| {
            let r = if i % 2 == 0 { outer_radius } else { inner_radius };
            let a = FRAC_PI_2 + PI * i as f32 / points as f32;
            v3(r * a.cos(), r * a.sin(), 0.0)
        })
        .collect();
    let mut mesh = MeshData::new();
    push_fan(&mut mesh, v3(0.0, 0.0, 0.0), &ring, v3(0.0, 0.0, 1.0));
    mesh
}

/// Quad in the XY plane facing +Z with one colour per corner:
/// bottom-left, bottom-right, top-right, top-left.
pub fn gradient_quad(width: f32, height: f32, corners: [[f32; 3]; 4]) -> MeshData {
    let (x, y) = (width * 0.5, height * 0.5);
    let n = v3(0.0, 0.0, 1.0);
    let mut mesh = MeshData::new();
    mesh.push_quad([
        ModelVertex::coloured(v3(-x, -y, 0.0), n, corners[0]),
        ModelVertex::coloured(v3(x, -y, 0.0), n, corners[1]),
        ModelVertex::coloured(v3(x, y, 0.0), n, corners[2]),
        ModelVertex::coloured(v3(-x, y, 0.0), n, corners[3]),
    ]);
    mesh
}
