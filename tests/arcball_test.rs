use lab_ngin::{
    InnerSpace, Quaternion, Rotation, Vector3,
    camera::{Arcball, arcball_rotation, arcball_vector, normalized_arcball_coords},
};

fn close(a: Vector3<f32>, b: Vector3<f32>) -> bool {
    (a - b).magnitude() < 1e-4
}

#[test]
fn ball_is_centred_at_400_400_from_the_bottom_left() {
    assert_eq!(normalized_arcball_coords(400.0, 400.0, 800.0), (0.0, 0.0));
    assert_eq!(normalized_arcball_coords(700.0, 400.0, 800.0), (1.0, 0.0));
    assert_eq!(normalized_arcball_coords(400.0, 100.0, 800.0), (0.0, 1.0));
}

#[test]
fn vectors_are_unit_and_wrap_to_the_back_outside_the_ball() {
    assert!(close(arcball_vector(0.0, 0.0), Vector3::unit_z()));
    let inside = arcball_vector(0.3, -0.4);
    assert!((inside.magnitude() - 1.0).abs() < 1e-5 && inside.z > 0.0);
    let outside = arcball_vector(2.0, 0.0);
    assert!((outside.magnitude() - 1.0).abs() < 1e-5 && outside.z <= 0.0);
}

#[test]
fn rotation_carries_the_first_vector_onto_the_second() {
    let v0 = arcball_vector(0.0, 0.0);
    let v1 = arcball_vector(0.5, 0.2);
    assert!(close(arcball_rotation(v0, v1).rotate_vector(v0), v1));
    assert_eq!(arcball_rotation(v0, v0), Quaternion::new(1.0, 0.0, 0.0, 0.0));
}

#[test]
fn drag_needs_a_begin_and_stops_after_end() {
    let mut ball = Arcball::default();
    assert!(ball.drag(500.0, 400.0, 800.0).is_none());

    ball.begin(400.0, 400.0, 800.0);
    assert!(ball.is_dragging());
    let q = ball.drag(550.0, 400.0, 800.0).unwrap();
    // moving right turns the front of the ball towards +x
    assert!(q.rotate_vector(Vector3::unit_z()).x > 0.0);
    let still = ball.drag(550.0, 400.0, 800.0).unwrap();
    assert!(close(still.rotate_vector(Vector3::unit_x()), Vector3::unit_x()));

    ball.end();
    assert!(!ball.is_dragging());
    assert!(ball.drag(600.0, 400.0, 800.0).is_none());
}
