//! Phase 2 of the problem-edge protocol.
//!
//! Runs after every face of a fold has been split or merged. Each deferred
//! joint is matched against the remote face (or, if the remote is gone, its
//! live descendants) by overlap of the planar edge segments.

use std::collections::BTreeMap;

use nalgebra::Vector2;

use super::graph::AdjacencyGraph;
use super::types::ProblemEdge;
use crate::error::Result;
use crate::geom::segments_overlap;
use crate::ids::{EdgeId, FaceEdge, FaceId, FacePair, GroupId};

/// Planar edge lookup for live faces.
pub trait EdgeGeometry {
    fn is_live(&self, face: FaceId) -> bool;
    fn edge_count(&self, face: FaceId) -> Option<usize>;
    fn edge_segment(&self, face: FaceId, edge: EdgeId) -> Option<(Vector2<f64>, Vector2<f64>)>;
}

/// Live faces standing in for `face`: itself, or its live descendants.
pub fn live_descendants(
    face: FaceId,
    descendants: &BTreeMap<FaceId, Vec<FaceId>>,
    geometry: &impl EdgeGeometry,
) -> Vec<FaceId> {
    let mut out = Vec::new();
    let mut stack = vec![face];
    while let Some(f) = stack.pop() {
        if geometry.is_live(f) {
            out.push(f);
        } else if let Some(children) = descendants.get(&f) {
            stack.extend(children.iter().rev().copied());
        }
    }
    out
}

impl AdjacencyGraph {
    /// Resolve deferred joints; returns the ones nothing matched.
    ///
    /// A resolved joint takes the place of its origin pair in the origin's
    /// group. The origin pair leaves its group either way.
    pub fn resolve_problem_edges(
        &mut self,
        problems: Vec<ProblemEdge>,
        descendants: &BTreeMap<FaceId, Vec<FaceId>>,
        geometry: &impl EdgeGeometry,
        eps: f64,
    ) -> Result<Vec<ProblemEdge>> {
        let mut unresolved = Vec::new();
        for problem in problems {
            let remote = problem.remote();
            let candidates: Vec<FaceEdge> = if geometry.is_live(remote.face) {
                vec![remote]
            } else {
                live_descendants(remote.face, descendants, geometry)
                    .into_iter()
                    .flat_map(|f| {
                        let n = geometry.edge_count(f).unwrap_or(0);
                        (0..n).map(move |e| FaceEdge::new(f, EdgeId(e)))
                    })
                    .collect()
            };
            let (locals, angle) = match problem {
                ProblemEdge::SplitCut { left, right, angle, .. } => (vec![left, right], angle),
                ProblemEdge::MergeSeam { merged, angle, .. } => {
                    let n = geometry.edge_count(merged).unwrap_or(0);
                    ((0..n).map(|e| FaceEdge::new(merged, EdgeId(e))).collect(), angle)
                }
            };

            // A sibling problem may already have joined the same pair of
            // descendants; that joint covers this one too.
            let mut linked = 0usize;
            let mut joined = 0usize;
            for local in &locals {
                let Some((a0, a1)) = geometry.edge_segment(local.face, local.edge) else {
                    continue;
                };
                for cand in &candidates {
                    if cand.face == local.face {
                        continue;
                    }
                    let Some((b0, b1)) = geometry.edge_segment(cand.face, cand.edge) else {
                        continue;
                    };
                    if !segments_overlap(&a0, &a1, &b0, &b1, eps) {
                        continue;
                    }
                    if self.entry(local.face, cand.face).is_some() {
                        joined += 1;
                    } else {
                        self.link_resolved(*local, *cand, angle, problem.group())?;
                        linked += 1;
                    }
                }
            }

            let origin_pair = FacePair::new(problem.origin().face, remote.face);
            if self.groups().contains(origin_pair) {
                self.groups_mut().remove_connection(origin_pair)?;
            }
            if linked + joined == 0 {
                tracing::warn!(
                    origin = %problem.origin(),
                    remote = %remote,
                    "problem edge left unresolved"
                );
                unresolved.push(problem);
            } else {
                tracing::debug!(origin = %problem.origin(), linked, joined, "problem edge resolved");
            }
        }
        Ok(unresolved)
    }

    fn link_resolved(&mut self, local: FaceEdge, remote: FaceEdge, angle: f64, group: GroupId) -> Result<()> {
        self.add_edge(local.face, local.edge, remote.face, remote.edge, angle)?;
        let pair = FacePair::new(local.face, remote.face);
        if self.groups().contains(pair) {
            return Ok(());
        }
        if self.groups().pairs(group).is_some() {
            self.groups_mut().extend_group(group, pair)
        } else {
            self.groups_mut().create_group([pair]).map(|_| ())
        }
    }
}
