use super::*;
use crate::cfg::{FoldCfg, COPLANAR_EPS};
use crate::error::ErrorKind;
use crate::geom::FoldAxis;
use crate::ids::{EdgeId, FaceId, LineId, PointId};
use nalgebra::{vector, Vector2};

fn unit_square() -> Vec<Vector2<f64>> {
    vec![
        vector![0.0, 0.0],
        vector![0.0, 1.0],
        vector![1.0, 1.0],
        vector![1.0, 0.0],
    ]
}

#[test]
fn faces_need_three_vertices() {
    let err = Face::<2>::new(vec![vector![0.0, 0.0], vector![1.0, 0.0]]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn annotation_ids_start_after_vertices() {
    let mut f = Face::<2>::new(unit_square()).unwrap();
    let a = f.add_point(vector![0.0, 0.5], Some(EdgeId(0)), COPLANAR_EPS).unwrap();
    let b = f.add_point(vector![0.5, 0.5], None, COPLANAR_EPS).unwrap();
    assert_eq!(a, PointId(4));
    assert_eq!(b, PointId(5));
    assert!(f.is_vertex(PointId(3)));
    assert!(!f.is_vertex(a));
    assert_eq!(f.coords(PointId(2)), Some(vector![1.0, 1.0]));
    assert_eq!(f.coords(b), Some(vector![0.5, 0.5]));
}

#[test]
fn edge_points_must_lie_on_their_edge() {
    let mut f = Face::<2>::new(unit_square()).unwrap();
    let err = f
        .add_point(vector![0.5, 0.5], Some(EdgeId(0)), COPLANAR_EPS)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    let err = f
        .add_point(vector![0.0, 0.5], Some(EdgeId(9)), COPLANAR_EPS)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn traversal_position_orders_boundary_points() {
    let mut f = Face::<2>::new(unit_square()).unwrap();
    let on2 = f.add_point(vector![1.0, 0.25], Some(EdgeId(2)), COPLANAR_EPS).unwrap();
    let inner = f.add_point(vector![0.5, 0.5], None, COPLANAR_EPS).unwrap();
    assert_eq!(f.traversal_position(PointId(2)), Some((2, 0.0)));
    let (e, t) = f.traversal_position(on2).unwrap();
    assert_eq!(e, 2);
    assert!((t - 0.75).abs() < 1e-12);
    assert_eq!(f.traversal_position(inner), None);
}

#[test]
fn line_rules() {
    let mut f = Face::<2>::new(unit_square()).unwrap();
    let p = f.add_point(vector![0.5, 0.5], None, COPLANAR_EPS).unwrap();
    let l = f.add_line(PointId(0), p).unwrap();
    assert_eq!(f.find_line(p, PointId(0)), Some(l));

    assert_eq!(
        f.add_line(p, PointId(0)).unwrap_err().kind(),
        ErrorKind::Conflict
    );
    assert_eq!(f.add_line(p, p).unwrap_err().kind(), ErrorKind::InvalidArgument);
    assert_eq!(
        f.add_line(p, PointId(42)).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn removing_a_point_cascades_to_its_lines() {
    let mut f = Face::<2>::new(unit_square()).unwrap();
    let p = f.add_point(vector![0.5, 0.5], None, COPLANAR_EPS).unwrap();
    let l0 = f.add_line(PointId(0), p).unwrap();
    let l1 = f.add_line(PointId(2), p).unwrap();
    let keep = f.add_line(PointId(1), PointId(3)).unwrap();

    let (_, removed) = f.remove_point(p).unwrap();
    let ids: Vec<LineId> = removed.into_iter().map(|(id, _)| id).collect();
    assert_eq!(ids, vec![l0, l1]);
    assert!(f.lines().contains_key(&keep));
    assert_eq!(
        f.remove_point(PointId(1)).unwrap_err().kind(),
        ErrorKind::InvalidArgument
    );
    assert_eq!(f.remove_point(p).unwrap_err().kind(), ErrorKind::NotFound);
    f.validate().unwrap();
}

#[test]
fn twin_lift_follows_the_folded_placement() {
    // Folded copy stands upright in the xz-plane.
    let twin = FaceTwin::from_vertices(
        unit_square(),
        vec![
            vector![0.0, 0.0, 0.0],
            vector![0.0, 0.0, 1.0],
            vector![1.0, 0.0, 1.0],
            vector![1.0, 0.0, 0.0],
        ],
    )
    .unwrap();
    let p = twin.lift(&vector![0.25, 0.5]).unwrap();
    assert!((p - vector![0.25, 0.0, 0.5]).norm() < 1e-12);
    let n = twin.principal_normal().unwrap();
    assert!((n.y.abs() - 1.0).abs() < 1e-12);
}

#[test]
fn twin_edits_keep_ids_in_lockstep() {
    let mut twin = FaceTwin::flat(unit_square()).unwrap();
    let a = twin
        .add_point(vector![0.0, 0.5], Some(EdgeId(0)), COPLANAR_EPS)
        .unwrap();
    let b = twin.add_point(vector![0.5, 0.5], None, COPLANAR_EPS).unwrap();
    let l = twin.add_line(a, b).unwrap();
    twin.validate().unwrap();
    assert_eq!(twin.folded.coords(b), Some(vector![0.5, 0.5, 0.0]));

    let snap = twin.snapshot(FaceId(7));
    assert_eq!(snap.points_added.len(), 2);
    assert_eq!(snap.lines_added.len(), 1);

    assert_eq!(twin.remove_point(b).unwrap(), vec![l]);
    twin.validate().unwrap();
    assert!(twin.folded.lines().is_empty());
    assert_eq!(twin.teardown(FaceId(7)).points_removed, vec![a]);
}

#[test]
fn rotation_moves_only_the_folded_half() {
    let mut twin = FaceTwin::flat(unit_square()).unwrap();
    let axis = FoldAxis::across_edge(&twin.folded.vertex_coords(), 0).unwrap();
    twin.rotate(&axis, std::f64::consts::FRAC_PI_2);
    assert_eq!(twin.planar.coords(PointId(2)), Some(vector![1.0, 1.0]));
    let moved = twin.folded.coords(PointId(2)).unwrap();
    assert!(moved.z.abs() > 0.5);
    let d = twin.descriptor(FaceId(1), &FoldCfg::default(), 0.0);
    assert_eq!(d.polygon.len(), 4);
    assert!((d.thickness - 0.001).abs() < 1e-15);
}

#[test]
fn collinear_polygon_has_no_basis() {
    let err = FaceTwin::flat(vec![
        vector![0.0, 0.0],
        vector![1.0, 0.0],
        vector![2.0, 0.0],
    ])
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}
