use std::f32::consts::PI;

use lab_ngin::{
    InnerSpace, Vector3,
    data_structures::mesh::{MeshData, face_normal},
    primitives::{capsule, cone, cube, cylinder, frustum, gradient_quad, hemisphere, plane, quarter_sphere, sphere, star, upper_body},
};

fn v(p: [f32; 3]) -> Vector3<f32> {
    Vector3::from(p)
}

/// Enclosed volume via the divergence theorem. Positive when every triangle
/// winds counter-clockwise seen from outside.
fn signed_volume(mesh: &MeshData) -> f32 {
    mesh.triangles()
        .map(|[a, b, c]| v(a.position).dot(v(b.position).cross(v(c.position))) / 6.0)
        .sum()
}

fn assert_winding_matches_normals(mesh: &MeshData, label: &str) {
    for [a, b, c] in mesh.triangles() {
        let face = face_normal(v(a.position), v(b.position), v(c.position));
        let vertex = v(a.normal) + v(b.normal) + v(c.normal);
        assert!(face.dot(vertex) > 0.0, "{label}: triangle winds against its normals");
    }
}

fn assert_volume(mesh: &MeshData, expected: f32, tolerance: f32, label: &str) {
    let volume = signed_volume(mesh);
    assert!(
        (volume - expected).abs() <= expected * tolerance,
        "{label}: volume {volume}, expected about {expected}"
    );
}

fn y_range(mesh: &MeshData) -> (f32, f32) {
    mesh.vertices.iter().fold((f32::MAX, f32::MIN), |(lo, hi), vert| {
        (lo.min(vert.position[1]), hi.max(vert.position[1]))
    })
}

#[test]
fn plane_is_one_quad_facing_negative_z() {
    let mesh = plane(2.0, 4.0);
    assert_eq!(mesh.vertices.len(), 4);
    assert_eq!(mesh.triangle_count(), 2);
    for [a, b, c] in mesh.triangles() {
        let n = face_normal(v(a.position), v(b.position), v(c.position));
        assert!((n - Vector3::new(0.0, 0.0, -1.0)).magnitude() < 1e-6);
    }
    assert_eq!(y_range(&mesh), (-2.0, 2.0));
}

#[test]
fn plane_texture_is_mapped_as_seen_from_the_front() {
    let mesh = plane(2.0, 4.0);
    for vertex in &mesh.vertices {
        let [x, y, _] = vertex.position;
        // viewed from -Z the +X edge is on the left and +Y is up
        assert_eq!(vertex.tex_coords, [if x > 0.0 { 0.0 } else { 1.0 }, if y > 0.0 { 0.0 } else { 1.0 }]);
    }
}

#[test]
fn cube_has_flat_faces_and_the_right_volume() {
    let mesh = cube(1.0, 2.0, 3.0);
    assert_eq!(mesh.vertices.len(), 24);
    assert_eq!(mesh.triangle_count(), 12);
    assert_winding_matches_normals(&mesh, "cube");
    assert_volume(&mesh, 6.0, 1e-4, "cube");
}

#[test]
fn sphere_approaches_the_analytic_volume() {
    let mesh = sphere(2.0, 48, 24);
    assert_winding_matches_normals(&mesh, "sphere");
    assert_volume(&mesh, 4.0 / 3.0 * PI * 8.0, 0.05, "sphere");
    for vert in &mesh.vertices {
        assert!((v(vert.position).magnitude() - 2.0).abs() < 1e-4);
        assert!(v(vert.normal).dot(v(vert.position)) > 0.0);
    }
}

#[test]
fn partial_spheres_are_closed_solids() {
    let half = hemisphere(1.0, 48, 12);
    assert_winding_matches_normals(&half, "hemisphere");
    assert_volume(&half, 2.0 / 3.0 * PI, 0.05, "hemisphere");
    assert!(y_range(&half).0 > -1e-5);

    let quarter = quarter_sphere(1.0, 48, 12);
    assert_winding_matches_normals(&quarter, "quarter sphere");
    assert_volume(&quarter, PI / 3.0, 0.05, "quarter sphere");
    assert!(quarter.vertices.iter().all(|vert| vert.position[2] > -1e-5));
}

#[test]
fn cone_stands_on_its_base() {
    let mesh = cone(1.0, 2.0, 32);
    assert_winding_matches_normals(&mesh, "cone");
    assert_eq!(y_range(&mesh), (0.0, 2.0));
    assert!(mesh.vertices.iter().any(|vert| vert.normal == [0.0, -1.0, 0.0]));
    assert_volume(&mesh, PI * 2.0 / 3.0, 0.05, "cone");
}

#[test]
fn frustum_and_cylinder_are_centred() {
    let mesh = frustum(1.0, 0.5, 2.0, 32);
    assert_winding_matches_normals(&mesh, "frustum");
    assert_eq!(y_range(&mesh), (-1.0, 1.0));
    let expected = PI * 2.0 / 3.0 * (1.0 + 0.5 + 0.25);
    assert_volume(&mesh, expected, 0.05, "frustum");

    let tube = cylinder(0.5, 3.0, 32);
    assert_volume(&tube, PI * 0.25 * 3.0, 0.05, "cylinder");
}

#[test]
fn capsule_extends_by_its_radius_on_both_ends() {
    let mesh = capsule(0.5, 2.0, 32, 8);
    assert_winding_matches_normals(&mesh, "capsule");
    let (lo, hi) = y_range(&mesh);
    assert!((lo + 1.5).abs() < 1e-5 && (hi - 1.5).abs() < 1e-5);
    let expected = PI * 0.25 * 2.0 + 4.0 / 3.0 * PI * 0.125;
    assert_volume(&mesh, expected, 0.05, "capsule");
}

#[test]
fn upper_body_is_flattened_front_to_back() {
    let mesh = upper_body(0.8, 1.0, 2.0, 0.5, 32);
    assert_winding_matches_normals(&mesh, "upper body");
    let depth = mesh.vertices.iter().map(|vert| vert.position[2].abs()).fold(0.0, f32::max);
    let width = mesh.vertices.iter().map(|vert| vert.position[0].abs()).fold(0.0, f32::max);
    assert!((depth - 0.5).abs() < 1e-3, "{depth}");
    assert!((width - 1.0).abs() < 1e-3, "{width}");
    for vert in &mesh.vertices {
        assert!((v(vert.normal).magnitude() - 1.0).abs() < 1e-4);
    }
}

#[test]
fn star_is_a_fan_facing_the_viewer() {
    let mesh = star(5, 0.1, 0.3);
    assert_eq!(mesh.triangle_count(), 10);
    assert_winding_matches_normals(&mesh, "star");
    let tip = mesh.vertices.iter().map(|vert| v(vert.position).magnitude()).fold(0.0, f32::max);
    assert!((tip - 0.3).abs() < 1e-5);
}

#[test]
fn gradient_quad_keeps_its_corner_colours() {
    let corners = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 1.0, 1.0]];
    let mesh = gradient_quad(4.0, 2.0, corners);
    assert_eq!(mesh.vertices.len(), 4);
    assert_eq!(mesh.vertices[0].position, [-2.0, -1.0, 0.0]);
    assert_eq!(mesh.vertices[2].position, [2.0, 1.0, 0.0]);
    for (vert, colour) in mesh.vertices.iter().zip(corners) {
        assert_eq!(vert.color, colour);
    }
    assert_winding_matches_normals(&mesh, "gradient quad");
}

#[test]
fn with_color_paints_every_vertex() {
    let mesh = cube(1.0, 1.0, 1.0).with_color([0.2, 0.4, 0.6]);
    assert!(mesh.vertices.iter().all(|vert| vert.color == [0.2, 0.4, 0.6]));
}
