//! Face adjacency graph: mirrored per-face edge entries plus correlated-edge groups.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::groups::CorrelatedEdges;
use super::types::{EdgeAdjacency, MergeEdgeMap, ProblemEdge, SplitEdgeMap};
use crate::error::{FoldError, Result};
use crate::ids::{EdgeId, FaceEdge, FaceId, FacePair, GroupId};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AdjacencyGraph {
    entries: BTreeMap<FaceId, Vec<EdgeAdjacency>>,
    groups: CorrelatedEdges,
}

impl AdjacencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a face with no neighbours. Re-registering is a no-op.
    pub fn add_face(&mut self, face: FaceId) {
        self.entries.entry(face).or_default();
    }

    pub fn contains_face(&self, face: FaceId) -> bool {
        self.entries.contains_key(&face)
    }

    pub fn faces(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.entries.keys().copied()
    }

    pub fn groups(&self) -> &CorrelatedEdges {
        &self.groups
    }

    pub fn groups_mut(&mut self) -> &mut CorrelatedEdges {
        &mut self.groups
    }

    pub fn neighbors(&self, face: FaceId) -> Result<&[EdgeAdjacency]> {
        self.entries
            .get(&face)
            .map(Vec::as_slice)
            .ok_or_else(|| FoldError::not_found(format!("{face} is not in the adjacency graph")))
    }

    /// The entry of `face` that points at `other`.
    pub fn entry(&self, face: FaceId, other: FaceId) -> Option<&EdgeAdjacency> {
        self.entries.get(&face)?.iter().find(|e| e.other == other)
    }

    /// `(edge of a, edge of b)` of the joint between `a` and `b`.
    pub fn shared_edge(&self, a: FaceId, b: FaceId) -> Option<(EdgeId, EdgeId)> {
        self.entry(a, b).map(|e| (e.my_edge, e.other_edge))
    }

    /// Insert the mirrored entries of one joint.
    pub fn add_edge(
        &mut self,
        a: FaceId,
        edge_a: EdgeId,
        b: FaceId,
        edge_b: EdgeId,
        angle: f64,
    ) -> Result<()> {
        if a == b {
            return Err(FoldError::invalid(format!("{a} cannot be adjacent to itself")));
        }
        for f in [a, b] {
            if !self.entries.contains_key(&f) {
                return Err(FoldError::not_found(format!("{f} is not in the adjacency graph")));
            }
        }
        if self.entry(a, b).is_some() || self.entry(b, a).is_some() {
            return Err(FoldError::conflict(format!(
                "{} are already adjacent",
                FacePair::new(a, b)
            )));
        }
        self.push_entry(a, EdgeAdjacency { other: b, angle, my_edge: edge_a, other_edge: edge_b });
        self.push_entry(b, EdgeAdjacency { other: a, angle, my_edge: edge_b, other_edge: edge_a });
        Ok(())
    }

    /// `add_edge` plus registration of the pair in `group` (or a fresh group).
    pub fn connect(
        &mut self,
        a: FaceEdge,
        b: FaceEdge,
        angle: f64,
        group: Option<GroupId>,
    ) -> Result<GroupId> {
        let pair = FacePair::new(a.face, b.face);
        if self.groups.contains(pair) {
            return Err(FoldError::conflict(format!("{pair} already belongs to a group")));
        }
        self.add_edge(a.face, a.edge, b.face, b.edge, angle)?;
        match group {
            Some(g) => self.groups.extend_group(g, pair).map(|_| g),
            None => self.groups.create_group([pair]),
        }
    }

    fn push_entry(&mut self, face: FaceId, e: EdgeAdjacency) {
        self.entries.entry(face).or_default().push(e);
    }

    /// Delete the entry in `neighbor`'s list that points at `face`.
    pub fn remove_face_from_graph(&mut self, face: FaceId, neighbor: FaceId) -> Result<EdgeAdjacency> {
        let list = self
            .entries
            .get_mut(&neighbor)
            .ok_or_else(|| FoldError::not_found(format!("{neighbor} is not in the adjacency graph")))?;
        let idx = list
            .iter()
            .position(|e| e.other == face)
            .ok_or_else(|| FoldError::not_found(format!("{neighbor} has no entry for {face}")))?;
        Ok(list.remove(idx))
    }

    /// Remove both entries of a joint and its group membership.
    pub fn disconnect(&mut self, a: FaceId, b: FaceId) -> Result<()> {
        self.remove_face_from_graph(a, b)?;
        self.remove_face_from_graph(b, a)?;
        self.groups.remove_connection(FacePair::new(a, b))?;
        Ok(())
    }

    /// Update the dihedral angle on both mirrored entries.
    pub fn set_angle(&mut self, a: FaceId, b: FaceId, angle: f64) -> Result<()> {
        for (x, y) in [(a, b), (b, a)] {
            let e = self
                .entries
                .get_mut(&x)
                .and_then(|l| l.iter_mut().find(|e| e.other == y))
                .ok_or_else(|| FoldError::not_found(format!("{x} has no entry for {y}")))?;
            e.angle = angle;
        }
        Ok(())
    }

    /// Phase 1 of a split: move every joint of `old` onto `left` or `right`.
    ///
    /// Joints on an edge the fold line cut are returned as problem edges; their
    /// group pair stays pending until `resolve_problem_edges` handles it.
    pub fn rewrite_on_split(
        &mut self,
        old: FaceId,
        left: FaceId,
        right: FaceId,
        edges: &SplitEdgeMap,
    ) -> Result<Vec<ProblemEdge>> {
        let entries = self
            .entries
            .remove(&old)
            .ok_or_else(|| FoldError::not_found(format!("{old} is not in the adjacency graph")))?;
        self.add_face(left);
        self.add_face(right);

        let mut problems = Vec::new();
        for e in entries {
            self.remove_face_from_graph(old, e.other).map_err(|_| {
                FoldError::invariant(format!("{} has no mirror entry for {old}", e.other))
            })?;
            let pair = FacePair::new(old, e.other);
            let group = self
                .groups
                .lookup_group(pair)
                .map_err(|_| FoldError::invariant(format!("no correlated-edge group holds {pair}")))?;

            let target = if let Some(le) = edges.left.get(&e.my_edge) {
                Some((left, *le))
            } else {
                edges.right.get(&e.my_edge).map(|re| (right, *re))
            };
            if let Some((child, child_edge)) = target {
                self.add_edge(child, child_edge, e.other, e.other_edge, e.angle)?;
                self.groups.replace_connection(pair, &[FacePair::new(child, e.other)])?;
                continue;
            }
            let cut = edges.cut.iter().find(|c| c.old == e.my_edge).ok_or_else(|| {
                FoldError::invariant(format!(
                    "{} of {old} is in no split remap table",
                    e.my_edge
                ))
            })?;
            tracing::debug!(%old, neighbor = %e.other, edge = %e.my_edge, "deferring cut joint");
            problems.push(ProblemEdge::SplitCut {
                origin: FaceEdge::new(old, e.my_edge),
                left: FaceEdge::new(left, cut.left),
                right: FaceEdge::new(right, cut.right),
                remote: FaceEdge::new(e.other, e.other_edge),
                angle: e.angle,
                group,
            });
        }
        Ok(problems)
    }

    /// Phase 1 of a merge: move the joints of `a` and `b` onto `merged`.
    ///
    /// The seam joint between `a` and `b` disappears. Joints to `excluded`
    /// faces are deferred as problem edges.
    pub fn rewrite_on_merge(
        &mut self,
        a: FaceId,
        b: FaceId,
        merged: FaceId,
        edges: &MergeEdgeMap,
        excluded: &BTreeSet<FaceId>,
    ) -> Result<Vec<ProblemEdge>> {
        if self.entry(a, b).is_none() {
            return Err(FoldError::not_found(format!("{a} and {b} share no edge")));
        }
        self.disconnect(a, b)?;
        let ea = self.entries.remove(&a).unwrap_or_default();
        let eb = self.entries.remove(&b).unwrap_or_default();
        self.add_face(merged);

        let mut problems = Vec::new();
        for (source, entries, map) in [(a, ea, &edges.a), (b, eb, &edges.b)] {
            for e in entries {
                self.remove_face_from_graph(source, e.other).map_err(|_| {
                    FoldError::invariant(format!("{} has no mirror entry for {source}", e.other))
                })?;
                let pair = FacePair::new(source, e.other);
                let group = self.groups.lookup_group(pair).map_err(|_| {
                    FoldError::invariant(format!("no correlated-edge group holds {pair}"))
                })?;
                let merged_edge = *map.get(&e.my_edge).ok_or_else(|| {
                    FoldError::invariant(format!("{} of {source} has no merged edge", e.my_edge))
                })?;
                if excluded.contains(&e.other) {
                    tracing::debug!(%source, neighbor = %e.other, "deferring seam joint");
                    problems.push(ProblemEdge::MergeSeam {
                        origin: FaceEdge::new(source, e.my_edge),
                        merged,
                        remote: FaceEdge::new(e.other, e.other_edge),
                        angle: e.angle,
                        group,
                    });
                    continue;
                }
                if self.entry(merged, e.other).is_some() {
                    // Both halves touched the same neighbour; keep the first joint.
                    self.groups.remove_connection(pair)?;
                    continue;
                }
                self.add_edge(merged, merged_edge, e.other, e.other_edge, e.angle)?;
                self.groups
                    .replace_connection(pair, &[FacePair::new(merged, e.other)])?;
            }
        }
        Ok(problems)
    }

    /// Unregister a face that has no joints left.
    pub fn remove_isolated(&mut self, face: FaceId) -> Result<()> {
        match self.entries.get(&face) {
            Some(list) if list.is_empty() => {
                self.entries.remove(&face);
                Ok(())
            }
            Some(_) => Err(FoldError::conflict(format!("{face} still has neighbours"))),
            None => Err(FoldError::not_found(format!("{face} is not in the adjacency graph"))),
        }
    }

    /// Mirror symmetry of every entry and exact group coverage of every joint.
    pub fn check_symmetry(&self) -> Result<()> {
        let mut joints = BTreeSet::new();
        for (face, list) in &self.entries {
            let mut seen = BTreeSet::new();
            for e in list {
                if !seen.insert(e.other) {
                    return Err(FoldError::invariant(format!(
                        "{face} lists {} twice",
                        e.other
                    )));
                }
                let mirror = self.entry(e.other, *face).ok_or_else(|| {
                    FoldError::invariant(format!("{face} -> {} has no mirror", e.other))
                })?;
                if mirror.my_edge != e.other_edge
                    || mirror.other_edge != e.my_edge
                    || mirror.angle != e.angle
                {
                    return Err(FoldError::invariant(format!(
                        "{face} -> {} disagrees with its mirror",
                        e.other
                    )));
                }
                joints.insert(FacePair::new(*face, e.other));
            }
        }
        for pair in &joints {
            if !self.groups.contains(*pair) {
                return Err(FoldError::invariant(format!("{pair} belongs to no group")));
            }
        }
        for (group, pairs) in self.groups.iter() {
            if let Some(p) = pairs.iter().find(|p| !joints.contains(p)) {
                return Err(FoldError::invariant(format!(
                    "{group} holds {p}, which is not a joint"
                )));
            }
        }
        Ok(())
    }
}
