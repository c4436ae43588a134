use lab_ngin::{
    InnerSpace, Quaternion, Rotation, Vector3,
    animation::{Easing, Pose, PoseAnimator, PoseFrame, Transition, quat_from_euler_deg, slerp},
};

fn rotated_x(q: Quaternion<f32>) -> Vector3<f32> {
    q.rotate_vector(Vector3::unit_x())
}

fn close(a: Vector3<f32>, b: Vector3<f32>) -> bool {
    (a - b).magnitude() < 1e-4
}

fn bent(name: &str, z: f32) -> Pose {
    Pose::new(name).rotate("arm", [0.0, 0.0, z]).place("body", [0.0, z / 90.0, 0.0])
}

#[test]
fn easings_are_monotone_between_their_endpoints() {
    for easing in Easing::ALL {
        let mut last = easing.apply(0.0);
        for i in 1..=20 {
            let y = easing.apply(i as f32 / 20.0);
            assert!(y >= last - 1e-6, "{} decreases", easing.name());
            last = y;
        }
    }
    assert!(Easing::Quadratic1.apply(0.5) < 0.5);
    assert!(Easing::Quadratic2.apply(0.5) > 0.5);
    assert!((Easing::Sin.apply(0.5) - 0.5).abs() < 1e-6);
}

#[test]
fn easing_cycle_visits_every_curve() {
    let mut easing = Easing::default();
    let mut seen = Vec::new();
    for _ in 0..Easing::ALL.len() {
        seen.push(easing);
        easing = easing.next();
    }
    assert_eq!(easing, Easing::default());
    assert_eq!(seen, Easing::ALL.to_vec());
}

#[test]
fn euler_angles_rotate_about_the_named_axis() {
    assert!(close(rotated_x(quat_from_euler_deg(0.0, 0.0, 90.0)), Vector3::unit_y()));
    assert!(close(rotated_x(quat_from_euler_deg(0.0, 90.0, 0.0)), -Vector3::unit_z()));
    let q = quat_from_euler_deg(0.0, 90.0, 0.0);
    assert!(close(q.rotate_vector(Vector3::unit_y()), Vector3::unit_y()));
}

#[test]
fn slerp_stays_unit_and_takes_the_short_way() {
    let a = quat_from_euler_deg(0.0, 0.0, 10.0);
    let b = -quat_from_euler_deg(0.0, 0.0, 50.0);
    for i in 0..=10 {
        let q = slerp(a, b, i as f32 / 10.0);
        assert!((q.magnitude() - 1.0).abs() < 1e-5);
    }
    let half = slerp(a, b, 0.5);
    let expected = quat_from_euler_deg(0.0, 0.0, 30.0);
    assert!(close(rotated_x(half), rotated_x(expected)));
}

#[test]
fn blend_fills_joints_missing_on_one_side_with_zero() {
    let from = Pose::new("from");
    let to = bent("to", 90.0);
    let frame = PoseFrame::blend(&from, &to, 0.5);
    let arm = frame.rotations["arm"];
    assert!(close(rotated_x(arm), rotated_x(quat_from_euler_deg(0.0, 0.0, 45.0))));
    // positions present on one side only are taken as is
    assert_eq!(frame.positions["body"], Vector3::new(0.0, 1.0, 0.0));
    assert!(frame.camera.is_none());
}

#[test]
fn animator_blends_then_snaps_on_the_following_update() {
    let mut animator = PoseAnimator::new(bent("rest", 0.0));
    animator.enqueue(Transition::new(bent("raised", 90.0), 1.0, Easing::Linear));

    let frame = animator.update(0.5).unwrap();
    assert!(close(
        rotated_x(frame.rotations["arm"]),
        rotated_x(quat_from_euler_deg(0.0, 0.0, 45.0))
    ));
    assert!((frame.positions["body"].y - 0.5).abs() < 1e-5);

    animator.update(0.5).unwrap();
    assert_eq!(animator.current().name, "rest");
    assert_eq!(animator.queue_len(), 1);

    let snapped = animator.update(0.016).unwrap();
    assert_eq!(animator.current().name, "raised");
    assert!(animator.is_idle());
    assert_eq!(animator.elapsed(), 0.0);
    assert_eq!(snapped, PoseFrame::of(&bent("raised", 90.0)));
    assert!(animator.update(0.016).is_none());
}

#[test]
fn queued_transitions_play_in_order() {
    let mut animator = PoseAnimator::new(bent("a", 0.0));
    animator.enqueue_all([
        Transition::new(bent("b", 30.0), 0.1, Easing::Sin),
        Transition::new(bent("c", 60.0), 0.1, Easing::Quadratic1),
    ]);
    let mut reached = Vec::new();
    for _ in 0..20 {
        animator.update(0.05);
        if reached.last() != Some(&animator.current().name) {
            reached.push(animator.current().name.clone());
        }
    }
    assert_eq!(reached, ["a", "b", "c"]);
}

#[test]
fn zero_interval_jumps_straight_to_the_target() {
    let mut animator = PoseAnimator::new(bent("a", 0.0));
    animator.enqueue(Transition::new(bent("b", 90.0), -1.0, Easing::Linear));
    let frame = animator.update(0.0).unwrap();
    assert_eq!(frame, PoseFrame::of(&bent("b", 90.0)));
    assert_eq!(animator.current().name, "b");
}

#[test]
fn clear_and_reset_drop_pending_work() {
    let mut animator = PoseAnimator::new(bent("a", 0.0));
    animator.enqueue(Transition::new(bent("b", 90.0), 1.0, Easing::Linear));
    animator.update(0.3);
    animator.clear();
    assert!(animator.is_idle());
    assert_eq!(animator.current().name, "a");

    animator.reset(bent("z", 10.0));
    assert_eq!(animator.current().name, "z");
    assert_eq!(animator.sample_current(), PoseFrame::of(&bent("z", 10.0)));
}
