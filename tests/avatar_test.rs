use lab_ngin::{
    InnerSpace, Vector3,
    animation::Pose,
    avatar::{Avatar, AvatarInput, BODY_ID, HEAD_ID, Pivot, idle},
    data_structures::scene_graph::SceneGraph,
};

fn setup() -> (SceneGraph, Avatar) {
    let mut graph = SceneGraph::new();
    let root = graph.root();
    let avatar = Avatar::build(&mut graph, root).unwrap();
    graph.update_world_transforms();
    (graph, avatar)
}

fn world(graph: &SceneGraph, avatar: &Avatar, name: &str) -> Vector3<f32> {
    graph.world_position(avatar.node(name).unwrap()).unwrap()
}

fn rest_pose(avatar: &Avatar) -> Pose {
    avatar.joint_names().fold(Pose::new("rest"), |pose, joint| pose.rotate(joint, [0.0; 3]))
}

#[test]
fn switching_pivots_keeps_a_resting_avatar_in_place() {
    let (mut graph, mut avatar) = setup();
    let rest = rest_pose(&avatar);
    avatar.apply_pose(&mut graph, &rest).unwrap();
    graph.update_world_transforms();
    let body = world(&graph, &avatar, "body");
    let foot = world(&graph, &avatar, "footL");

    avatar.set_pivot(&mut graph, Pivot::LeftLowerLeg).unwrap();
    graph.update_world_transforms();
    assert_eq!(avatar.pivot(), Pivot::LeftLowerLeg);
    assert_eq!(graph.parent(avatar.node("legLD").unwrap()).unwrap(), Some(avatar.root));
    assert!((world(&graph, &avatar, "body") - body).magnitude() < 1e-4);
    assert!((world(&graph, &avatar, "footL") - foot).magnitude() < 1e-4);

    avatar.set_pivot(&mut graph, Pivot::Body).unwrap();
    assert_eq!(graph.parent(avatar.node("body").unwrap()).unwrap(), Some(avatar.root));
}

#[test]
fn keys_start_a_pose_only_when_nothing_is_pending() {
    let (mut graph, mut avatar) = setup();
    let mut input = AvatarInput::new();
    assert!(input.key_down(&mut avatar, &mut graph, '2').unwrap());
    assert_eq!(avatar.pivot(), Pivot::LeftLowerLeg);
    assert!(!input.key_down(&mut avatar, &mut graph, '1').unwrap());
    assert!(!input.key_down(&mut avatar, &mut graph, 'x').unwrap());

    assert!(input.key_up('2'));
    assert_eq!(input.animator.queue_len(), 2);
    // a second release while two transitions are queued is dropped
    assert!(!input.key_up('2'));
}

#[test]
fn hello_is_bound_to_four() {
    let (mut graph, mut avatar) = setup();
    let mut input = AvatarInput::new();
    assert!(input.key_down(&mut avatar, &mut graph, '4').unwrap());
    assert_eq!(avatar.pivot(), Pivot::Body);
    for _ in 0..100 {
        input.update(&avatar, &mut graph, 0.02).unwrap();
    }
    assert_eq!(input.animator.current().name, "hello");
}

#[test]
fn clicking_the_body_queues_a_full_jump() {
    let (mut graph, mut avatar) = setup();
    let mut input = AvatarInput::new();
    assert!(!input.click(&mut avatar, &mut graph, HEAD_ID).unwrap());
    assert!(input.click(&mut avatar, &mut graph, BODY_ID).unwrap());
    assert_eq!(input.animator.queue_len(), 4);
    assert_eq!(avatar.pivot(), Pivot::LeftLowerLeg);
    assert!(!input.click(&mut avatar, &mut graph, BODY_ID).unwrap());

    let mut camera_seen = false;
    while !input.animator.is_idle() {
        camera_seen |= input.update(&avatar, &mut graph, 0.05).unwrap().is_some();
    }
    assert!(camera_seen);
    assert_eq!(input.animator.current(), &idle());
    assert!(input.update(&avatar, &mut graph, 0.05).unwrap().is_none());
}
