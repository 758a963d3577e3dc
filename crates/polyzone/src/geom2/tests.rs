use super::*;
use nalgebra::{vector, Vector2};

fn approx(a: Vector2<f64>, b: Vector2<f64>) -> bool {
    (a - b).norm() < 1e-12
}

#[test]
fn degenerate_edge_collapses_to_point() {
    let e = Edge2::new(vector![1.0, 1.0], vector![1.0, 1.0]);
    let pr = e.distance_to(vector![4.0, 1.0]);
    assert_eq!(pr.t, 0.0);
    assert!((pr.distance - 3.0).abs() < 1e-12);
    assert_eq!(pr.lateral, 0.0);
    assert!(e.is_degenerate());
    assert_eq!(e.length(), 0.0);
    assert_eq!(e.normal(), Vector2::zeros());
}

#[test]
fn projection_clamps_to_closed_segment() {
    let e = Edge2::new(vector![0.0, 0.0], vector![2.0, 0.0]);
    let before = e.distance_to(vector![-1.0, 1.0]);
    assert_eq!(before.t, 0.0);
    assert!((before.distance - 2f64.sqrt()).abs() < 1e-12);
    let after = e.distance_to(vector![3.0, -1.0]);
    assert_eq!(after.t, 1.0);
    assert!(approx(after.point, vector![2.0, 0.0]));
    let mid = e.distance_to(vector![1.0, 2.0]);
    assert!((mid.t - 0.5).abs() < 1e-12);
    assert!((mid.lateral - 2.0).abs() < 1e-12);
    assert!((mid.distance - 2.0).abs() < 1e-12);
    // right-hand side is negative
    assert!(e.distance_to(vector![1.0, -0.5]).lateral < 0.0);
}

#[test]
fn point_at_extrapolates() {
    let e = Edge2::new(vector![0.0, 0.0], vector![2.0, 0.0]);
    assert!(approx(e.point_at(2.0), vector![4.0, 0.0]));
    assert!(approx(e.point_at(-0.5), vector![-1.0, 0.0]));
    assert!(approx(e.midpoint(), vector![1.0, 0.0]));
}

#[test]
fn turn_angle_sign_and_full_turn() {
    let e = Edge2::new(vector![1.0, 0.0], vector![0.0, 1.0]);
    let o = Vector2::zeros();
    assert!((e.signed_turn_angle(o) - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    let r = Edge2::new(vector![0.0, 1.0], vector![1.0, 0.0]);
    assert!((r.signed_turn_angle(o) + std::f64::consts::FRAC_PI_2).abs() < 1e-12);

    let ring = [
        vector![-0.5, -0.5],
        vector![0.5, -0.5],
        vector![0.5, 0.5],
        vector![-0.5, 0.5],
    ];
    let total: f64 = (0..4)
        .map(|i| Edge2::new(ring[i], ring[(i + 1) % 4]).signed_turn_angle(o))
        .sum();
    assert!((total - std::f64::consts::TAU).abs() < 1e-12);
    let outside: f64 = (0..4)
        .map(|i| Edge2::new(ring[i], ring[(i + 1) % 4]).signed_turn_angle(vector![3.0, 1.0]))
        .sum();
    assert!(outside.abs() < 1e-12);
}

#[test]
fn normal_points_inward_for_ccw_ring() {
    let e = Edge2::new(vector![-0.5, -0.5], vector![0.5, -0.5]);
    assert!(approx(e.tangent(), vector![1.0, 0.0]));
    assert!(approx(e.normal(), vector![0.0, 1.0]));
    assert!(e.distance_to(Vector2::zeros()).lateral > 0.0);
}

#[test]
fn obb_around_edge_footprint_and_overlap() {
    let e = Edge2::new(vector![0.0, 0.0], vector![2.0, 0.0]);
    let obb = Obb2::around_edge(&e, 0.5);
    assert!(approx(obb.center, vector![1.0, 0.0]));
    assert!(approx(obb.half_extents, vector![1.5, 0.5]));
    let bb = obb.aabb();
    assert!(approx(bb.min, vector![-0.5, -0.5]));
    assert!(approx(bb.max, vector![2.5, 0.5]));

    let hit = Aabb2::from_min_max(vector![2.4, 0.4], vector![3.0, 1.0]);
    let miss = Aabb2::from_min_max(vector![2.6, 0.0], vector![3.0, 1.0]);
    let touch = Aabb2::from_min_max(vector![2.5, 0.0], vector![3.0, 1.0]);
    assert!(obb.intersects_aabb(&hit));
    assert!(!obb.intersects_aabb(&miss));
    assert!(obb.intersects_aabb(&touch));
    assert!(!obb.intersects_aabb(&Aabb2::empty()));
}

#[test]
fn rotated_obb_rejects_box_inside_its_aabb() {
    // Zero-thickness diagonal slab: the AABB test alone would accept.
    let e = Edge2::new(vector![0.0, 0.0], vector![1.0, 1.0]);
    let obb = Obb2::around_edge(&e, 0.0);
    let corner = Aabb2::from_min_max(vector![0.6, 0.0], vector![1.0, 0.3]);
    assert!(obb.aabb().intersects(&corner));
    assert!(!obb.intersects_aabb(&corner));
    let straddle = Aabb2::from_min_max(vector![0.4, 0.4], vector![0.6, 0.6]);
    assert!(obb.intersects_aabb(&straddle));
    assert!(obb.contains(vector![0.5, 0.5]));
    assert!(!obb.contains(vector![0.5, 0.6]));
}

#[test]
fn obb_for_degenerate_edge_uses_x_axis() {
    let e = Edge2::new(vector![1.0, 1.0], vector![1.0, 1.0]);
    let obb = Obb2::around_edge(&e, 0.25);
    assert!(approx(obb.axis, vector![1.0, 0.0]));
    let bb = obb.aabb();
    assert!(approx(bb.min, vector![0.75, 0.75]));
    assert!(approx(bb.max, vector![1.25, 1.25]));
}

#[test]
fn aabb_empty_union_and_half_open_contains() {
    let mut b = Aabb2::empty();
    assert!(b.is_empty());
    assert!(b.expanded(1.0).is_empty());
    assert!(!b.intersects(&Aabb2::from_min_max(vector![-9.0, -9.0], vector![9.0, 9.0])));
    b.encapsulate(vector![1.0, 2.0]);
    b.encapsulate(vector![-1.0, 0.0]);
    assert!(!b.is_empty());
    assert!(approx(b.center(), vector![0.0, 1.0]));
    assert!(b.contains(vector![-1.0, 0.0]));
    assert!(!b.contains(vector![1.0, 2.0]));
    let u = b.union(&Aabb2::from_corners(vector![3.0, 3.0], vector![2.0, -1.0]));
    assert!(approx(u.min, vector![-1.0, -1.0]));
    assert!(approx(u.max, vector![3.0, 3.0]));
    assert!(approx(u.closest_point(vector![10.0, 0.5]), vector![3.0, 0.5]));
}

#[test]
fn trs_composes_scale_then_rotation_then_translation() {
    let trs = Trs2::new(
        vector![1.0, 0.0],
        std::f64::consts::FRAC_PI_2,
        vector![2.0, 1.0],
    );
    let f = trs.to_affine();
    assert!((f.transform_point(vector![1.0, 0.0]) - vector![1.0, 2.0]).norm() < 1e-12);
    let inv = f.inverse().unwrap();
    let p = vector![0.3, -0.7];
    assert!((inv.transform_point(f.transform_point(p)) - p).norm() < 1e-12);
    assert!(f.is_orientation_preserving());
    let mirrored = Trs2::new(Vector2::zeros(), 0.0, vector![-1.0, 1.0]).to_affine();
    assert!(!mirrored.is_orientation_preserving());
    let unrot = trs.to_affine_unrotated();
    assert!(approx(unrot.transform_point(vector![1.0, 1.0]), vector![3.0, 1.0]));
}

#[test]
fn affine_compose_applies_right_first() {
    let s = Trs2::new(Vector2::zeros(), 0.0, vector![2.0, 2.0]).to_affine();
    let t = Trs2::from_translation(vector![1.0, 0.0]).to_affine();
    let st = s.compose(&t);
    assert!(approx(st.transform_point(Vector2::zeros()), vector![2.0, 0.0]));
    assert!(approx(st.transform_vector(vector![1.0, 0.0]), vector![2.0, 0.0]));
}

#[test]
fn crossing_parity_half_open_rule() {
    let ring = [
        vector![0.0, 0.0],
        vector![1.0, 0.0],
        vector![0.0, 1.0],
    ];
    let edges: Vec<_> = (0..3).map(|i| (ring[i], ring[(i + 1) % 3])).collect();
    assert!(crossing_parity(edges.iter().copied(), vector![0.2, 0.2]));
    assert!(!crossing_parity(edges.iter().copied(), vector![0.9, 0.9]));
    // On the hypotenuse both the hypotenuse and the left leg count: even parity.
    assert!(!crossing_parity(edges.iter().copied(), vector![0.5, 0.5]));
    // Bottom edge y=0 is included, top vertex y=1 excluded.
    assert!(crossing_parity(edges.iter().copied(), vector![0.5, 0.0]));
    assert!(!crossing_parity(edges.iter().copied(), vector![0.0, 1.0]));
}

#[test]
fn area_and_centroid() {
    let sq = [
        vector![0.0, 0.0],
        vector![2.0, 0.0],
        vector![2.0, 2.0],
        vector![0.0, 2.0],
    ];
    assert!((signed_area(&sq) - 4.0).abs() < 1e-12);
    let mut cw = sq;
    cw.reverse();
    assert!((signed_area(&cw) + 4.0).abs() < 1e-12);
    assert!(approx(area_centroid(&sq).unwrap(), vector![1.0, 1.0]));
    assert!(area_centroid(&sq[..2]).is_none());
}
