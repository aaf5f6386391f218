use std::collections::{BTreeMap, BTreeSet};

use nalgebra::{vector, Vector2};
use proptest::prelude::*;

use super::*;
use crate::adjacency::AdjacencyGraph;
use crate::cfg::{COPLANAR_EPS, STABLE_ANGLE_EPS};
use crate::error::ErrorKind;
use crate::face::FaceTwin;
use crate::geom::FoldAxis;
use crate::ids::{EdgeId, FaceEdge, FaceId, FacePair};

fn sq(x0: f64) -> Vec<Vector2<f64>> {
    vec![
        vector![x0, 0.0],
        vector![x0 + 1.0, 0.0],
        vector![x0 + 1.0, 1.0],
        vector![x0, 1.0],
    ]
}

fn f(i: usize) -> FaceId {
    FaceId(i)
}

/// Stack single-face components bottom to top; each face `i` sits at `xs[i]`.
fn tower(xs: &[f64]) -> (PaperComponent, BTreeMap<FaceId, Vec<Vector2<f64>>>) {
    let projected: BTreeMap<FaceId, Vec<Vector2<f64>>> =
        xs.iter().enumerate().map(|(i, x)| (f(i), sq(*x))).collect();
    let mut c = PaperComponent::single(f(0), true);
    for i in 1..xs.len() {
        c = PaperComponent::stack(c, PaperComponent::single(f(i), true), &projected, COPLANAR_EPS);
    }
    (c, projected)
}

#[test]
fn classify_covers_the_eight_cases() {
    let eps = STABLE_ANGLE_EPS;
    let table = [
        (180.0, 0.0, FoldCase::CompleteSplit),
        (180.0, 360.0, FoldCase::CompleteSplit),
        (0.0, 180.0, FoldCase::CompleteMerge),
        (180.0, 90.0, FoldCase::PartialSplit),
        (90.0, 180.0, FoldCase::ResolvedMerge),
        (0.0, 360.0, FoldCase::CompleteAlign),
        (360.0, 45.0, FoldCase::PartialAlign),
        (45.0, 0.0, FoldCase::ResolvedAlign),
        (45.0, 135.0, FoldCase::AdjustedAlign),
    ];
    for (start, end, want) in table {
        assert_eq!(FoldCase::classify(start, end, eps).unwrap(), want, "{start} -> {end}");
    }
    assert!(FoldCase::CompleteSplit.stacks() && FoldCase::CompleteSplit.is_split());
    assert!(!FoldCase::PartialAlign.stacks() && !FoldCase::PartialAlign.mutates_faces());
    assert!(FoldCase::ResolvedMerge.is_merge());

    let err = FoldCase::classify(180.0, 180.0, eps).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    let err = FoldCase::classify(180.0, 361.0, eps).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(Stability::of(1e-9, eps).unwrap(), Stability::Closed);
}

#[test]
fn stacking_lands_as_low_as_overlaps_allow() {
    // 0 and 1 are disjoint; 2 overlaps only 1.
    let projected: BTreeMap<FaceId, Vec<Vector2<f64>>> =
        [(f(0), sq(0.0)), (f(1), sq(3.0)), (f(2), sq(3.5))].into_iter().collect();
    let bottom = PaperComponent::stack(
        PaperComponent::single(f(0), true),
        PaperComponent::single(f(1), true),
        &projected,
        COPLANAR_EPS,
    );
    // Non-overlapping faces still go above everything.
    assert_eq!(bottom.layer_count(), 2);
    assert!(bottom.node(f(0)).unwrap().up.is_empty());

    let c = PaperComponent::stack(bottom, PaperComponent::single(f(2), true), &projected, COPLANAR_EPS);
    assert_eq!(c.layer_of(f(2)), Some(2));
    assert_eq!(c.node(f(1)).unwrap().up, BTreeSet::from([f(2)]));
    assert_eq!(c.node(f(2)).unwrap().down, BTreeSet::from([f(1)]));
    c.validate().unwrap();
}

#[test]
fn upper_layers_of_the_top_can_sink_beside_the_bottom() {
    // Top is {3 at layer 0, 4 at layer 1}; the bottom face only overlaps 4.
    let projected: BTreeMap<FaceId, Vec<Vector2<f64>>> =
        [(f(0), sq(0.0)), (f(3), sq(5.0)), (f(4), sq(0.5))].into_iter().collect();
    let mut ext = projected.clone();
    ext.insert(f(4), sq(5.5));
    // Built apart, then re-projected so only 4 lands over 0.
    let top = PaperComponent::stack(
        PaperComponent::single(f(3), true),
        PaperComponent::single(f(4), true),
        &ext,
        COPLANAR_EPS,
    );
    assert_eq!(top.layer_count(), 2);

    let c = PaperComponent::stack(PaperComponent::single(f(0), true), top, &projected, COPLANAR_EPS);
    assert_eq!(c.layer_count(), 2);
    assert_eq!(c.layer_of(f(3)), Some(0));
    assert_eq!(c.layer_of(f(4)), Some(1));
    assert!(c.node(f(0)).unwrap().up.contains(&f(4)));
    c.validate().unwrap();
}

#[test]
fn split_keeps_interior_gaps_and_fans_out_descendants() {
    let (c, _) = tower(&[0.0, 0.0, 0.0]);
    let (s, m) = c.split(&BTreeMap::new(), &BTreeSet::from([f(0), f(2)]));
    let s = s.unwrap();
    let m = m.unwrap();
    assert_eq!(s.layer_count(), 3);
    assert!(s.layers()[1].is_empty());
    assert!(s.node(f(0)).unwrap().up.is_empty());
    assert_eq!(m.layer_count(), 1);
    s.validate().unwrap();

    let desc = BTreeMap::from([(f(1), vec![f(7), f(8)])]);
    let (s, m) = c.split(&desc, &BTreeSet::from([f(0), f(2), f(7)]));
    let (s, m) = (s.unwrap(), m.unwrap());
    assert_eq!(s.layer_of(f(7)), Some(1));
    assert!(s.node(f(0)).unwrap().up.contains(&f(7)));
    assert!(s.node(f(7)).unwrap().up.contains(&f(2)));
    assert_eq!(m.faces().collect::<Vec<_>>(), vec![f(8)]);
    assert!(!s.contains(f(1)));
}

#[test]
fn partition_inverts_the_mobile_part() {
    let (c, _) = tower(&[0.0, 0.0, 0.0]);
    let (s, m) = c.partition(&BTreeSet::from([f(0)]));
    let (s, m) = (s.unwrap(), m.unwrap());
    assert!(s.node(f(0)).unwrap().orientation);
    assert_eq!(m.layer_of(f(2)), Some(0));
    assert_eq!(m.layer_of(f(1)), Some(1));
    assert!(!m.node(f(1)).unwrap().orientation);
    assert!(m.node(f(2)).unwrap().up.contains(&f(1)));
    m.validate().unwrap();
}

#[test]
fn merge_aligns_on_the_shared_descendant() {
    let (a, _) = tower(&[0.0, 0.0]);
    let b = PaperComponent::single(f(5), true);
    let desc = BTreeMap::from([(f(0), vec![f(9)]), (f(5), vec![f(9)])]);
    let merged = PaperComponent::merge(&a, &b, &desc).unwrap();
    assert_eq!(merged.len(), 2);
    assert_eq!(merged.layer_of(f(9)), Some(0));
    assert_eq!(merged.layer_of(f(1)), Some(1));
    assert!(merged.node(f(9)).unwrap().up.contains(&f(1)));

    let err = PaperComponent::merge(&a, &b, &BTreeMap::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvariantViolation);

    // Within one component both parents collapse onto the lower placement.
    let stacked = PaperComponent::stack(
        PaperComponent::single(f(0), true),
        PaperComponent::single(f(5), true),
        &BTreeMap::new(),
        COPLANAR_EPS,
    );
    assert_eq!(stacked.layer_count(), 2);
    let relabeled = stacked.relabel(&desc);
    assert_eq!(relabeled.faces().collect::<Vec<_>>(), vec![f(9)]);
    assert_eq!(relabeled.layer_count(), 1);
}

#[test]
fn normal_offsets_are_centred() {
    let (c, _) = tower(&[0.0, 0.0, 0.0]);
    let offsets = c.normal_offsets(0.002);
    assert!((offsets[&f(0)] + 0.002).abs() < 1e-12);
    assert!(offsets[&f(1)].abs() < 1e-12);
    assert!((offsets[&f(2)] - 0.002).abs() < 1e-12);
}

#[test]
fn registry_tracks_components_through_split_and_merge() {
    let mut lug = Lug::new();
    let c0 = lug.add_face(f(0), true).unwrap();
    assert_eq!(lug.add_face(f(0), true).unwrap_err().kind(), ErrorKind::Conflict);
    let desc = BTreeMap::from([(f(0), vec![f(1), f(2)])]);
    let (s, m) = lug.split(c0, &desc, &BTreeSet::from([f(1)])).unwrap();
    let (s, m) = (s.unwrap(), m.unwrap());
    assert_eq!(lug.component_of(f(1)).unwrap(), s);
    assert_eq!(lug.component_of(f(2)).unwrap(), m);
    assert_eq!(lug.component_of(f(0)).unwrap_err().kind(), ErrorKind::NotFound);

    lug.invert(m).unwrap();
    assert!(!lug.orientation(f(2)).unwrap());
    let back = BTreeMap::from([(f(1), vec![f(3)]), (f(2), vec![f(3)])]);
    let merged = lug.merge(s, m, &back).unwrap();
    assert_eq!(lug.len(), 1);
    assert_eq!(lug.component_of(f(3)).unwrap(), merged);
    lug.validate().unwrap();
}

#[test]
fn registry_stack_rotates_the_top_onto_the_anchor() {
    let mut faces: BTreeMap<FaceId, FaceTwin> = BTreeMap::new();
    faces.insert(f(0), FaceTwin::flat(sq(0.0)).unwrap());
    faces.insert(f(1), FaceTwin::flat(sq(1.0)).unwrap());
    let mut lug = Lug::new();
    let bottom = lug.add_face(f(0), true).unwrap();
    let top = lug.add_face(f(1), true).unwrap();

    let axis = FoldAxis::across_edge(&faces[&f(0)].folded.vertex_coords(), 1).unwrap();
    let err = lug
        .stack(bottom, bottom, f(0), &axis, 180.0, &mut faces, COPLANAR_EPS)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let id = lug
        .stack(bottom, top, f(0), &axis, 180.0, &mut faces, COPLANAR_EPS)
        .unwrap();
    let c = lug.component(id).unwrap();
    assert_eq!(c.layer_count(), 2);
    assert!(c.node(f(0)).unwrap().up.contains(&f(1)));
    for v in faces[&f(1)].folded.vertex_coords() {
        assert!(v.x > -1e-9 && v.x < 1.0 + 1e-9);
        assert!(v.z.abs() < 1e-9);
    }
}

#[test]
fn mobile_set_stops_at_the_crease() {
    let mut g = AdjacencyGraph::new();
    for i in 0..4 {
        g.add_face(f(i));
    }
    let fe = |face: usize, edge: usize| FaceEdge::new(f(face), EdgeId(edge));
    g.connect(fe(0, 1), fe(1, 3), 180.0, None).unwrap();
    g.connect(fe(1, 1), fe(2, 3), 180.0, None).unwrap();
    let crease = BTreeSet::from([FacePair::new(f(0), f(1))]);
    let moving = mobile_set(&g, f(0), f(1), &crease).unwrap();
    assert_eq!(moving, BTreeSet::from([f(1), f(2)]));

    // A second path back to the anchor means the crease does not cut the paper.
    g.connect(fe(2, 2), fe(0, 0), 180.0, None).unwrap();
    let err = mobile_set(&g, f(0), f(1), &crease).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

proptest! {
    #[test]
    fn invert_is_an_involution_that_keeps_offsets(xs in proptest::collection::vec(0.0f64..3.0, 1..8)) {
        let (c, _) = tower(&xs);
        let mut flipped = c.clone();
        flipped.invert();
        prop_assert!(flipped.validate().is_ok());
        let (a, b) = (c.normal_offsets(0.002), flipped.normal_offsets(0.002));
        for (face, off) in &a {
            prop_assert!((off - b[face]).abs() < 1e-12);
        }
        flipped.invert();
        prop_assert_eq!(flipped, c);
    }

    #[test]
    fn split_parts_stay_compressed(
        xs in proptest::collection::vec(0.0f64..3.0, 1..8),
        mask in proptest::collection::vec(any::<bool>(), 8),
    ) {
        let (c, _) = tower(&xs);
        let stationary: BTreeSet<FaceId> =
            (0..xs.len()).filter(|i| mask[*i]).map(f).collect();
        let (s, m) = c.split(&BTreeMap::new(), &stationary);
        let mut seen = 0;
        for part in [s, m].into_iter().flatten() {
            prop_assert!(part.validate().is_ok());
            prop_assert!(!part.layers()[0].is_empty());
            prop_assert!(!part.layers()[part.layer_count() - 1].is_empty());
            seen += part.len();
        }
        prop_assert_eq!(seen, xs.len());
    }
}
