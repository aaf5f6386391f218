use std::collections::{BTreeMap, BTreeSet};

use nalgebra::{vector, Vector2};
use proptest::prelude::*;

use super::*;
use crate::cfg::COPLANAR_EPS;
use crate::error::ErrorKind;
use crate::ids::{EdgeId, FaceEdge, FaceId, FacePair};

struct Polys(BTreeMap<FaceId, Vec<Vector2<f64>>>);

impl EdgeGeometry for Polys {
    fn is_live(&self, face: FaceId) -> bool {
        self.0.contains_key(&face)
    }
    fn edge_count(&self, face: FaceId) -> Option<usize> {
        self.0.get(&face).map(Vec::len)
    }
    fn edge_segment(&self, face: FaceId, edge: EdgeId) -> Option<(Vector2<f64>, Vector2<f64>)> {
        let p = self.0.get(&face)?;
        Some((*p.get(edge.0)?, p[(edge.0 + 1) % p.len()]))
    }
}

fn fe(face: usize, edge: usize) -> FaceEdge {
    FaceEdge::new(FaceId(face), EdgeId(edge))
}

fn graph_with(faces: &[usize]) -> AdjacencyGraph {
    let mut g = AdjacencyGraph::new();
    for f in faces {
        g.add_face(FaceId(*f));
    }
    g
}

/// Horizontal cut of the unit square `[(0,0),(0,1),(1,1),(1,0)]` at height `s`,
/// shifted right by `dx`: (bottom, top) children in the order used below.
fn halves(dx: f64, s: f64) -> (Vec<Vector2<f64>>, Vec<Vector2<f64>>) {
    (
        vec![
            vector![dx, 0.0],
            vector![dx, s],
            vector![dx + 1.0, s],
            vector![dx + 1.0, 0.0],
        ],
        vec![
            vector![dx, s],
            vector![dx, 1.0],
            vector![dx + 1.0, 1.0],
            vector![dx + 1.0, s],
        ],
    )
}

fn square_split_map() -> SplitEdgeMap {
    SplitEdgeMap {
        left: [(EdgeId(3), EdgeId(3))].into_iter().collect(),
        right: [(EdgeId(1), EdgeId(1))].into_iter().collect(),
        cut: vec![
            CutEdge { old: EdgeId(0), left: EdgeId(0), right: EdgeId(0) },
            CutEdge { old: EdgeId(2), left: EdgeId(2), right: EdgeId(2) },
        ],
        fold: (EdgeId(1), EdgeId(3)),
    }
}

#[test]
fn add_edge_inserts_mirrored_entries() {
    let mut g = graph_with(&[0, 1]);
    g.connect(fe(0, 2), fe(1, 0), 180.0, None).unwrap();
    assert_eq!(g.shared_edge(FaceId(0), FaceId(1)), Some((EdgeId(2), EdgeId(0))));
    assert_eq!(g.shared_edge(FaceId(1), FaceId(0)), Some((EdgeId(0), EdgeId(2))));
    g.check_symmetry().unwrap();

    let dup = g.add_edge(FaceId(1), EdgeId(3), FaceId(0), EdgeId(1), 90.0);
    assert_eq!(dup.unwrap_err().kind(), ErrorKind::Conflict);
    let missing = g.add_edge(FaceId(0), EdgeId(0), FaceId(9), EdgeId(0), 90.0);
    assert_eq!(missing.unwrap_err().kind(), ErrorKind::NotFound);
    let selfie = g.add_edge(FaceId(0), EdgeId(0), FaceId(0), EdgeId(1), 90.0);
    assert_eq!(selfie.unwrap_err().kind(), ErrorKind::InvalidArgument);
}

#[test]
fn remove_face_from_graph_needs_an_entry() {
    let mut g = graph_with(&[0, 1, 2]);
    g.connect(fe(0, 2), fe(1, 0), 180.0, None).unwrap();
    let removed = g.remove_face_from_graph(FaceId(0), FaceId(1)).unwrap();
    assert_eq!(removed.other, FaceId(0));
    let err = g.remove_face_from_graph(FaceId(0), FaceId(2)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    // Half-removed joint is caught by the checker.
    assert_eq!(
        g.check_symmetry().unwrap_err().kind(),
        ErrorKind::InvariantViolation
    );
}

#[test]
fn set_angle_updates_both_sides() {
    let mut g = graph_with(&[0, 1]);
    g.connect(fe(0, 2), fe(1, 0), 180.0, None).unwrap();
    g.set_angle(FaceId(1), FaceId(0), 45.0).unwrap();
    assert_eq!(g.entry(FaceId(0), FaceId(1)).unwrap().angle, 45.0);
    assert_eq!(g.entry(FaceId(1), FaceId(0)).unwrap().angle, 45.0);
    g.check_symmetry().unwrap();
}

#[test]
fn groups_replace_and_lookup() {
    let mut groups = CorrelatedEdges::new();
    let p01 = FacePair::new(FaceId(0), FaceId(1));
    let p23 = FacePair::new(FaceId(3), FaceId(2));
    let g = groups.create_group([p01, p23]).unwrap();
    assert_eq!(groups.lookup_group(FacePair::new(FaceId(1), FaceId(0))).unwrap(), g);

    let p41 = FacePair::new(FaceId(4), FaceId(1));
    let p51 = FacePair::new(FaceId(5), FaceId(1));
    groups.replace_connection(p01, &[p41, p51]).unwrap();
    assert_eq!(groups.pairs(g).unwrap().len(), 3);
    assert_eq!(
        groups.lookup_group(p01).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        groups.replace_connection(p01, &[]).unwrap_err().kind(),
        ErrorKind::InvariantViolation
    );

    for p in [p23, p41, p51] {
        groups.remove_connection(p).unwrap();
    }
    assert!(groups.is_empty());
}

#[test]
fn split_moves_whole_edges_and_defers_cut_ones() {
    // A = 0 (unit square), B = 1 to its right, C = 2 above it.
    let mut g = graph_with(&[0, 1, 2]);
    g.connect(fe(0, 2), fe(1, 0), 180.0, None).unwrap();
    g.connect(fe(0, 1), fe(2, 3), 180.0, None).unwrap();

    let problems = g
        .rewrite_on_split(FaceId(0), FaceId(3), FaceId(4), &square_split_map())
        .unwrap();
    g.add_edge(FaceId(3), EdgeId(1), FaceId(4), EdgeId(3), 180.0).unwrap();
    g.groups_mut()
        .create_group([FacePair::new(FaceId(3), FaceId(4))])
        .unwrap();

    assert_eq!(g.shared_edge(FaceId(4), FaceId(2)), Some((EdgeId(1), EdgeId(3))));
    assert_eq!(problems.len(), 1);
    assert!(matches!(
        problems[0],
        ProblemEdge::SplitCut { remote, .. } if remote == fe(1, 0)
    ));

    let (bottom, top) = halves(0.0, 0.4);
    let polys = Polys(
        [
            (FaceId(3), bottom),
            (FaceId(4), top),
            (
                FaceId(1),
                vec![
                    vector![1.0, 0.0],
                    vector![1.0, 1.0],
                    vector![2.0, 1.0],
                    vector![2.0, 0.0],
                ],
            ),
        ]
        .into_iter()
        .collect(),
    );
    let left = g
        .resolve_problem_edges(problems, &BTreeMap::new(), &polys, COPLANAR_EPS)
        .unwrap();
    assert!(left.is_empty());
    assert_eq!(g.shared_edge(FaceId(3), FaceId(1)), Some((EdgeId(2), EdgeId(0))));
    assert_eq!(g.shared_edge(FaceId(4), FaceId(1)), Some((EdgeId(2), EdgeId(0))));
    let grp = g.groups().lookup_group(FacePair::new(FaceId(3), FaceId(1))).unwrap();
    assert_eq!(
        g.groups().lookup_group(FacePair::new(FaceId(4), FaceId(1))).unwrap(),
        grp
    );
    g.check_symmetry().unwrap();
}

#[test]
fn merge_rewrites_neighbours_and_defers_excluded() {
    // 0 and 1 merge into 5; 2 touches 0, 3 touches 1 and is excluded.
    let mut g = graph_with(&[0, 1, 2, 3]);
    g.connect(fe(0, 2), fe(1, 0), 0.0, None).unwrap();
    g.connect(fe(0, 0), fe(2, 1), 180.0, None).unwrap();
    g.connect(fe(1, 2), fe(3, 0), 180.0, None).unwrap();

    let map = MergeEdgeMap {
        a: [(0, 4), (1, 5), (3, 3)]
            .into_iter()
            .map(|(o, n)| (EdgeId(o), EdgeId(n)))
            .collect(),
        b: [(1, 0), (2, 1), (3, 2)]
            .into_iter()
            .map(|(o, n)| (EdgeId(o), EdgeId(n)))
            .collect(),
    };
    let excluded: BTreeSet<FaceId> = [FaceId(3)].into_iter().collect();
    let problems = g
        .rewrite_on_merge(FaceId(0), FaceId(1), FaceId(5), &map, &excluded)
        .unwrap();

    assert_eq!(g.shared_edge(FaceId(5), FaceId(2)), Some((EdgeId(4), EdgeId(1))));
    assert!(g.entry(FaceId(3), FaceId(1)).is_none());
    assert_eq!(problems.len(), 1);
    assert!(matches!(problems[0], ProblemEdge::MergeSeam { merged, .. } if merged == FaceId(5)));
    assert!(!g.groups().contains(FacePair::new(FaceId(0), FaceId(1))));

    let err = g
        .rewrite_on_merge(FaceId(0), FaceId(1), FaceId(6), &map, &excluded)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn cut_joints_wait_for_the_remote_split() {
    // Faces 0 and 1 side by side, both cut by the same horizontal crease.
    let mut g = graph_with(&[0, 1]);
    g.connect(fe(0, 2), fe(1, 0), 180.0, None).unwrap();
    let map = square_split_map();
    let mut problems = g
        .rewrite_on_split(FaceId(0), FaceId(2), FaceId(3), &map)
        .unwrap();
    problems.extend(g.rewrite_on_split(FaceId(1), FaceId(4), FaceId(5), &map).unwrap());
    assert_eq!(problems.len(), 1);

    let s = 0.3;
    let (a_lo, a_hi) = halves(0.0, s);
    let (b_lo, b_hi) = halves(1.0, s);
    let polys = Polys(
        [
            (FaceId(2), a_lo),
            (FaceId(3), a_hi),
            (FaceId(4), b_lo),
            (FaceId(5), b_hi),
        ]
        .into_iter()
        .collect(),
    );
    let descendants: BTreeMap<FaceId, Vec<FaceId>> = [
        (FaceId(0), vec![FaceId(2), FaceId(3)]),
        (FaceId(1), vec![FaceId(4), FaceId(5)]),
    ]
    .into_iter()
    .collect();
    let left = g
        .resolve_problem_edges(problems, &descendants, &polys, COPLANAR_EPS)
        .unwrap();
    assert!(left.is_empty());
    assert_eq!(g.shared_edge(FaceId(2), FaceId(4)), Some((EdgeId(2), EdgeId(0))));
    assert_eq!(g.shared_edge(FaceId(3), FaceId(5)), Some((EdgeId(2), EdgeId(0))));
    assert!(g.entry(FaceId(2), FaceId(5)).is_none());
    g.check_symmetry().unwrap();
}

#[test]
fn sibling_seams_share_one_joint() {
    // 2x2 grid: 0 | 1 below 3 | 4, creased between the columns. Both rows
    // merge, so the two deferred seams land on the same pair of faces.
    let mut g = graph_with(&[0, 1, 3, 4]);
    let crease = g.connect(fe(0, 1), fe(1, 3), 0.0, None).unwrap();
    g.connect(fe(3, 1), fe(4, 3), 0.0, Some(crease)).unwrap();
    let rows = g.connect(fe(0, 2), fe(3, 0), 180.0, None).unwrap();
    g.connect(fe(1, 2), fe(4, 0), 180.0, Some(rows)).unwrap();

    let map = MergeEdgeMap {
        a: [(0, 0), (2, 2), (3, 3)]
            .into_iter()
            .map(|(o, n)| (EdgeId(o), EdgeId(n)))
            .collect(),
        b: [(0, 0), (1, 1), (2, 2)]
            .into_iter()
            .map(|(o, n)| (EdgeId(o), EdgeId(n)))
            .collect(),
    };
    let excluded: BTreeSet<FaceId> = [0, 1, 3, 4].into_iter().map(FaceId).collect();
    let mut problems = g
        .rewrite_on_merge(FaceId(0), FaceId(1), FaceId(5), &map, &excluded)
        .unwrap();
    problems.extend(
        g.rewrite_on_merge(FaceId(3), FaceId(4), FaceId(6), &map, &excluded)
            .unwrap(),
    );
    assert_eq!(problems.len(), 2);

    let polys = Polys(
        [
            (FaceId(5), vec![vector![0.0, 0.0], vector![2.0, 0.0], vector![2.0, 1.0], vector![0.0, 1.0]]),
            (FaceId(6), vec![vector![0.0, 1.0], vector![2.0, 1.0], vector![2.0, 2.0], vector![0.0, 2.0]]),
        ]
        .into_iter()
        .collect(),
    );
    let descendants: BTreeMap<FaceId, Vec<FaceId>> = [(0, 5), (1, 5), (3, 6), (4, 6)]
        .into_iter()
        .map(|(o, n)| (FaceId(o), vec![FaceId(n)]))
        .collect();
    let left = g
        .resolve_problem_edges(problems, &descendants, &polys, COPLANAR_EPS)
        .unwrap();
    assert!(left.is_empty());
    assert_eq!(g.shared_edge(FaceId(5), FaceId(6)), Some((EdgeId(2), EdgeId(0))));
    assert_eq!(g.neighbors(FaceId(5)).unwrap().len(), 1);
    assert_eq!(g.groups().pairs(rows).unwrap().len(), 1);
    assert!(g.groups().pairs(crease).is_none());
    g.check_symmetry().unwrap();
}

proptest! {
    #[test]
    fn resolution_finds_both_halves_for_any_cut(s in 0.05f64..0.95) {
        let mut g = graph_with(&[0, 1]);
        g.connect(fe(0, 2), fe(1, 0), 180.0, None).unwrap();
        let problems = g
            .rewrite_on_split(FaceId(0), FaceId(2), FaceId(3), &square_split_map())
            .unwrap();
        let (lo, hi) = halves(0.0, s);
        let polys = Polys(
            [
                (FaceId(2), lo),
                (FaceId(3), hi),
                (FaceId(1), vec![
                    vector![1.0, 0.0],
                    vector![1.0, 1.0],
                    vector![2.0, 1.0],
                    vector![2.0, 0.0],
                ]),
            ]
            .into_iter()
            .collect(),
        );
        let left = g
            .resolve_problem_edges(problems, &BTreeMap::new(), &polys, COPLANAR_EPS)
            .unwrap();
        prop_assert!(left.is_empty());
        prop_assert!(g.entry(FaceId(2), FaceId(1)).is_some());
        prop_assert!(g.entry(FaceId(3), FaceId(1)).is_some());
        prop_assert!(g.check_symmetry().is_ok());
    }

    #[test]
    fn symmetry_survives_random_edits(ops in proptest::collection::vec((0usize..6, 0usize..6, 0u8..3), 1..40)) {
        let mut g = graph_with(&[0, 1, 2, 3, 4, 5]);
        for (a, b, op) in ops {
            let (fa, fb) = (FaceId(a), FaceId(b));
            match op {
                0 => { let _ = g.connect(fe(a, b), fe(b, a), 180.0, None); }
                1 => { let _ = g.disconnect(fa, fb); }
                _ => { let _ = g.set_angle(fa, fb, 90.0); }
            }
            prop_assert!(g.check_symmetry().is_ok());
        }
    }
}
