use lab_ngin::{
    InnerSpace, Matrix4, SquareMatrix, Vector3, Vector4,
    data_structures::{scene_graph::SceneGraph, transform::Transform},
    error::SceneError,
};

fn close(a: Vector3<f32>, b: Vector3<f32>) -> bool {
    (a - b).magnitude() < 1e-4
}

fn chain() -> (SceneGraph, [lab_ngin::data_structures::scene_graph::NodeId; 3]) {
    let mut graph = SceneGraph::new();
    let root = graph.root();
    let a = graph
        .add_node_with("a", root, Transform::from_position(1.0, 0.0, 0.0).with_scale([2.0; 3]))
        .unwrap();
    let b = graph
        .add_node_with("b", a, Transform::from_euler_deg(0.0, 0.0, 90.0).with_position([1.0, 0.0, 0.0]))
        .unwrap();
    let c = graph.add_node_with("c", b, Transform::from_position(1.0, 0.0, 0.0)).unwrap();
    graph.update_world_transforms();
    (graph, [a, b, c])
}

#[test]
fn world_is_parent_world_times_local() {
    let (graph, [a, b, c]) = chain();
    for (parent, child) in [(a, b), (b, c)] {
        let expected = graph.world_matrix(parent).unwrap() * graph.local(child).unwrap().to_matrix();
        let world = graph.world_matrix(child).unwrap();
        for col in 0..4 {
            assert!((world[col] - expected[col]).magnitude() < 1e-5);
        }
    }
    // a scales by 2, b sits 2 units right of a and turns +90° about z
    assert!(close(graph.world_position(b).unwrap(), Vector3::new(3.0, 0.0, 0.0)));
    assert!(close(graph.world_position(c).unwrap(), Vector3::new(3.0, 2.0, 0.0)));
}

#[test]
fn cached_and_computed_world_matrices_agree() {
    let (graph, [_, _, c]) = chain();
    let cached = graph.world_matrix(c).unwrap();
    let computed = graph.compute_world_matrix(c).unwrap();
    let p = cached * Vector4::new(0.0, 0.0, 0.0, 1.0);
    let q = computed * Vector4::new(0.0, 0.0, 0.0, 1.0);
    assert!((p - q).magnitude() < 1e-5);
}

#[test]
fn root_stays_identity() {
    let (graph, _) = chain();
    assert_eq!(graph.world_matrix(graph.root()).unwrap(), Matrix4::identity());
    assert_eq!(graph.parent(graph.root()).unwrap(), None);
}

#[test]
fn reparenting_under_a_descendant_is_rejected() {
    let (mut graph, [a, _, c]) = chain();
    assert!(matches!(graph.set_parent(a, c), Err(SceneError::Cycle { .. })));
    assert!(matches!(graph.set_parent(a, a), Err(SceneError::Cycle { .. })));
    assert!(matches!(graph.set_parent(graph.root(), a), Err(SceneError::RootImmutable)));
    // nothing moved
    assert_eq!(graph.parent(a).unwrap(), Some(graph.root()));
}

#[test]
fn keep_world_preserves_the_placement() {
    let (mut graph, [a, b, c]) = chain();
    let before = graph.world_position(c).unwrap();
    graph.set_parent_keep_world(c, a).unwrap();
    graph.update_world_transforms();
    assert_eq!(graph.parent(c).unwrap(), Some(a));
    assert!(graph.children(b).unwrap().is_empty());
    assert!(close(graph.world_position(c).unwrap(), before));
}

#[test]
fn keep_world_refuses_sheared_placements() {
    let mut graph = SceneGraph::new();
    let root = graph.root();
    let stretched = graph
        .add_node_with("stretched", root, Transform::new().with_scale([2.0, 1.0, 1.0]))
        .unwrap();
    let child = graph
        .add_node_with("child", root, Transform::from_euler_deg(0.0, 0.0, 45.0).with_position([1.0, 0.0, 0.0]))
        .unwrap();
    let local = *graph.local(child).unwrap();
    assert_eq!(
        graph.set_parent_keep_world(child, stretched),
        Err(SceneError::NotDecomposable {
            node: child,
            parent: stretched
        })
    );
    assert_eq!(graph.parent(child).unwrap(), Some(root));
    assert_eq!(*graph.local(child).unwrap(), local);
}

#[test]
fn keep_world_accepts_axis_aligned_children_of_stretched_parents() {
    let mut graph = SceneGraph::new();
    let root = graph.root();
    let stretched = graph
        .add_node_with("stretched", root, Transform::new().with_scale([2.0, 1.0, 1.0]))
        .unwrap();
    let child = graph.add_node_with("child", root, Transform::from_position(4.0, 1.0, 0.0)).unwrap();
    graph.update_world_transforms();
    let before = graph.world_matrix(child).unwrap();
    graph.set_parent_keep_world(child, stretched).unwrap();
    graph.update_world_transforms();
    let after = graph.world_matrix(child).unwrap();
    for (a, b) in [(after.x, before.x), (after.y, before.y), (after.z, before.z), (after.w, before.w)] {
        assert!((a - b).magnitude() < 1e-4, "{after:?} vs {before:?}");
    }
}

#[test]
fn plain_reparent_keeps_the_local_transform() {
    let (mut graph, [a, _, c]) = chain();
    let local = *graph.local(c).unwrap();
    graph.set_parent(c, a).unwrap();
    graph.update_world_transforms();
    assert_eq!(*graph.local(c).unwrap(), local);
    assert!(close(graph.world_position(c).unwrap(), Vector3::new(3.0, 0.0, 0.0)));
}

#[test]
fn removing_a_subtree_drops_its_descendants() {
    let (mut graph, [a, b, c]) = chain();
    let len = graph.len();
    let mut removed = graph.remove_subtree(b).unwrap();
    removed.sort_by_key(|id| id.index());
    assert_eq!(removed, vec![b, c]);
    assert_eq!(graph.len(), len - 2);
    assert!(!graph.contains(c));
    assert!(graph.children(a).unwrap().is_empty());
    assert!(matches!(graph.local(c), Err(SceneError::UnknownNode(_))));
    assert!(graph.find("b").is_none());
}

#[test]
fn names_and_ancestry_are_queryable() {
    let (graph, [a, b, c]) = chain();
    assert_eq!(graph.find("c"), Some(c));
    assert_eq!(graph.name(b).unwrap(), "b");
    assert!(graph.is_ancestor(a, c).unwrap());
    assert!(!graph.is_ancestor(c, a).unwrap());
    assert_eq!(graph.ids().count(), graph.len());
}
