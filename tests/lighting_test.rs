use lab_ngin::{
    Vector3,
    data_structures::material::Material,
    pipelines::light::{Fragment, Light, LightsUniform, MAX_LIGHTS, shade, shade_fragment},
};

const UP: Vector3<f32> = Vector3 { x: 0.0, y: 1.0, z: 0.0 };
const ORIGIN: Vector3<f32> = Vector3 { x: 0.0, y: 0.0, z: 0.0 };

fn matte(color: [f32; 3]) -> Material {
    Material {
        specular: [0.0; 3],
        ..Material::from_color(color)
    }
}

fn close(a: [f32; 3], b: [f32; 3]) -> bool {
    a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-4)
}

#[test]
fn ambient_light_scales_the_ambient_colour() {
    let c = shade(&matte([0.5, 1.0, 0.2]), UP, ORIGIN, UP * 5.0, &[Light::ambient([0.2; 3])]);
    assert!(close(c, [0.1, 0.2, 0.04]), "{c:?}");
}

#[test]
fn directional_light_head_on_adds_diffuse_and_specular() {
    let light = Light::directional([1.0; 3], [0.0, -1.0, 0.0]);
    let c = shade(&Material::from_color([0.25; 3]), UP, ORIGIN, UP * 5.0, &[light]);
    assert!(close(c, [0.5; 3]), "{c:?}");

    let from_below = Light::directional([1.0; 3], [0.0, 1.0, 0.0]);
    let dark = shade(&Material::from_color([0.25; 3]), UP, ORIGIN, UP * 5.0, &[from_below]);
    assert!(close(dark, [0.0; 3]), "{dark:?}");
}

#[test]
fn point_light_falls_off_with_the_square_of_the_distance() {
    let material = matte([1.0; 3]);
    let near = shade(&material, UP, ORIGIN, UP, &[Light::point([1.0; 3], [0.0, 1.0, 0.0])]);
    let far = shade(&material, UP, ORIGIN, UP, &[Light::point([1.0; 3], [0.0, 2.0, 0.0])]);
    assert!((near[0] - 1.0).abs() < 1e-4);
    assert!((near[0] / far[0] - 4.0).abs() < 1e-3);
}

#[test]
fn spotlight_only_reaches_inside_its_cone() {
    let spot = Light::spotlight([25.0; 3], [0.0, 5.0, 0.0], [0.0, 0.0, 0.0]);
    let material = matte([1.0; 3]);
    let centre = shade(&material, UP, ORIGIN, UP * 5.0, &[spot]);
    assert!((centre[0] - 1.0).abs() < 1e-3, "{centre:?}");

    let outside = shade(&material, UP, Vector3::new(5.0, 0.0, 0.0), UP * 5.0, &[spot]);
    assert_eq!(outside, [0.0; 3]);

    let wide = spot.with_cone(60.0, 0.2);
    let lit = shade(&material, UP, Vector3::new(2.0, 0.0, 0.0), UP * 5.0, &[wide]);
    assert!(lit[0] > 0.0);
}

#[test]
fn zero_smoothness_gives_a_hard_cone_edge() {
    let material = matte([1.0; 3]);
    let hard = Light::spotlight([25.0; 3], [0.0, 5.0, 0.0], [0.0, 0.0, 0.0]).with_cone(30.0, 0.0);
    let soft = hard.with_cone(30.0, 0.2);
    // 26.6° off the axis: inside the cone but in the soft fade band
    let p = Vector3::new(2.5, 0.0, 0.0);
    let full = 25.0 / 31.25 * (5.0 / 31.25f32.sqrt());
    let lit = shade(&material, UP, p, UP * 5.0, &[hard]);
    assert!((lit[0] - full).abs() < 1e-3, "{lit:?}");
    assert!(shade(&material, UP, p, UP * 5.0, &[soft])[0] < lit[0]);
    // 31° off the axis
    let beyond = shade(&material, UP, Vector3::new(3.0, 0.0, 0.0), UP * 5.0, &[hard]);
    assert_eq!(beyond, [0.0; 3]);
}

#[test]
fn vertex_colour_tints_ambient_and_diffuse_but_not_specular() {
    let material = Material::from_color([1.0; 3]);
    let tinted = Fragment::new(ORIGIN, UP).with_color([0.5, 1.0, 0.0]);
    let ambient = shade_fragment(&material, &tinted, UP * 5.0, &[Light::ambient([0.2; 3])]);
    assert!(close(ambient, [0.1, 0.2, 0.0]), "{ambient:?}");

    // head-on: diffuse 1 plus specular 1
    let sun = Light::directional([1.0; 3], [0.0, -1.0, 0.0]);
    let lit = shade_fragment(&material, &tinted, UP * 5.0, &[sun]);
    assert!(close(lit, [1.5, 2.0, 1.0]), "{lit:?}");
}

#[test]
fn back_faces_are_lit_through_the_flipped_normal() {
    let material = matte([1.0; 3]);
    let sun = Light::directional([1.0; 3], [0.0, 1.0, 0.0]);
    let front = shade_fragment(&material, &Fragment::new(ORIGIN, UP), -UP * 5.0, &[sun]);
    assert_eq!(front, [0.0; 3]);
    let back = shade_fragment(&material, &Fragment::new(ORIGIN, UP).back_facing(), -UP * 5.0, &[sun]);
    assert!(close(back, [1.0; 3]), "{back:?}");
}

#[test]
fn toon_shading_quantises_diffuse_into_bands() {
    // the light hits the surface at 60°, so n·l = 0.5
    let (s, c) = 60f32.to_radians().sin_cos();
    let light = Light::directional([1.0; 3], [-s, -c, 0.0]);
    let smooth = shade(&matte([1.0; 3]), UP, ORIGIN, UP * 5.0, &[light]);
    let toon = shade(&matte([1.0; 3]).with_toon(true), UP, ORIGIN, UP * 5.0, &[light]);
    assert!((smooth[0] - 0.5).abs() < 1e-4);
    assert!((toon[0] - 2.0 / 3.0).abs() < 1e-4, "{toon:?}");
}

#[test]
fn disabled_lights_are_skipped() {
    let mut light = Light::ambient([1.0; 3]);
    light.enabled = false;
    assert_eq!(shade(&matte([1.0; 3]), UP, ORIGIN, UP, &[light]), [0.0; 3]);
    assert_eq!(LightsUniform::from_lights(&[light]).count(), 0);
}

#[test]
fn uniform_holds_at_most_max_lights() {
    let lights = vec![Light::point([1.0; 3], [0.0; 3]); MAX_LIGHTS + 2];
    assert_eq!(LightsUniform::from_lights(&lights).count(), MAX_LIGHTS as u32);
}
