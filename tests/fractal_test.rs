use std::collections::HashSet;

use lab_ngin::fractal::{animated_tree_angle, dragon_curve, dragon_points, dragon_quartet, dragon_turns, pythagoras_tree};

#[test]
fn tree_triangle_count_doubles_per_level() {
    for depth in 0..8u32 {
        let tree = pythagoras_tree(depth, 0.6, [0.0; 3], [1.0, 0.0, 0.0], [1.0; 3]);
        assert_eq!(tree.triangle_count(), 3 * ((1usize << depth) - 1), "depth {depth}");
    }
}

#[test]
fn tree_faces_the_viewer_and_keeps_its_colour() {
    let tree = pythagoras_tree(6, 0.6, [1.0, -2.1, 0.0], [1.4, -2.0, 0.0], [0.5, 0.4, 0.3]);
    for vert in &tree.vertices {
        assert!(vert.normal[2] > 0.99);
        assert_eq!(vert.position[2], 0.0);
        assert_eq!(vert.color, [0.5, 0.4, 0.3]);
    }
}

#[test]
fn degenerate_base_grows_nothing() {
    assert!(pythagoras_tree(5, 0.6, [1.0; 3], [1.0; 3], [1.0; 3]).is_empty());
}

#[test]
fn tree_angle_stays_in_the_first_quadrant() {
    for i in 0..200 {
        let angle = animated_tree_angle(i as f32 * 0.1);
        assert!((0.0..=std::f32::consts::FRAC_PI_2).contains(&angle), "{angle}");
    }
}

#[test]
fn dragon_turn_sequence_follows_the_folding_rule() {
    assert!(dragon_turns(0).is_empty());
    assert_eq!(dragon_turns(1), [1]);
    assert_eq!(dragon_turns(3), [1, 1, -1, 1, 1, -1, -1]);
    for n in 0..12 {
        assert_eq!(dragon_turns(n).len(), (1 << n) - 1);
    }
}

#[test]
fn dragon_walk_never_reuses_an_edge() {
    let points = dragon_points(10, [0.0; 3], 1.0, 0);
    assert_eq!(points.len(), (1 << 10) + 1);
    let key = |p: lab_ngin::Vector3<f32>| (p.x.round() as i32, p.y.round() as i32);
    let mut edges = HashSet::new();
    for pair in points.windows(2) {
        let (a, b) = (key(pair[0]), key(pair[1]));
        assert!(edges.insert(if a < b { (a, b) } else { (b, a) }), "edge {a:?}-{b:?} drawn twice");
    }
}

#[test]
fn dragon_curves_use_two_triangles_per_segment_pair() {
    let curve = dragon_curve(6, [0.0; 3], 0.1, 1);
    assert_eq!(curve.triangle_count(), 1 << 6);
    assert!(curve.vertices.iter().all(|vert| vert.color == [1.0; 3]));
    let grey = dragon_curve(6, [0.0; 3], 0.1, 0);
    assert!(grey.vertices.iter().all(|vert| vert.color == [0.5; 3]));
}

#[test]
fn quartet_holds_one_curve_per_direction() {
    let quartet = dragon_quartet(8, [0.0; 3], 0.4);
    assert_eq!(quartet.triangle_count(), 4 << 8);
    let first = dragon_points(8, [0.0; 3], 0.4 * 0.67f32.powi(7), 0);
    assert!((first[1].x - 0.4 * 0.67f32.powi(7)).abs() < 1e-6);
}
