//! Commit a planned split or merge to the paper state.
//!
//! Order inside one call: plan on the planar twin, build both twins, rewrite
//! adjacency (phase 1), then swap the faces in the registry. The caller runs
//! phase 2 once every face of the fold has been processed.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::merge::{plan_merge, MergeMaps};
use super::split::{plan_split, SplitMaps};
use crate::adjacency::ProblemEdge;
use crate::cfg::FoldCfg;
use crate::error::{FoldError, Result};
use crate::face::FaceTwin;
use crate::geom::Basis3;
use crate::ids::{FaceEdge, FaceId, GroupId, PointId};
use crate::store::PaperState;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SplitReport {
    pub old: FaceId,
    pub left: FaceId,
    pub right: FaceId,
    /// Correlated-edge group of the new fold edge.
    pub group: GroupId,
    /// Fold points in traversal order (parent ids).
    pub fold_points: (PointId, PointId),
    pub maps: SplitMaps,
    pub problems: Vec<ProblemEdge>,
}

impl SplitReport {
    /// Child on `side` of the directed line `from -> to`.
    pub fn child_on(&self, from: PointId, side: super::Side) -> FaceId {
        let side = if from == self.fold_points.0 { side } else { side.flip() };
        match side {
            super::Side::Left => self.left,
            super::Side::Right => self.right,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MergeReport {
    pub a: FaceId,
    pub b: FaceId,
    pub merged: FaceId,
    pub maps: MergeMaps,
    pub problems: Vec<ProblemEdge>,
}

/// Split `face` along `p -> q` and join the children with a fold edge at `angle`.
///
/// The new joint goes into `group` when given (one group per fold event),
/// otherwise into a fresh group.
pub fn create_split_face(
    state: &mut PaperState,
    face: FaceId,
    p: PointId,
    q: PointId,
    angle: f64,
    group: Option<GroupId>,
    cfg: &FoldCfg,
) -> Result<SplitReport> {
    let twin = state.face(face)?;
    let plan = plan_split(&twin.planar, p, q, cfg)?;
    let (left_planar, right_planar) = plan.apply(&twin.planar)?;
    let (left_folded, right_folded) = plan.apply(&twin.folded)?;
    let left_twin = FaceTwin::new(left_planar, left_folded)?;
    let right_twin = FaceTwin::new(right_planar, right_folded)?;

    let left = state.fresh_face_id();
    let right = state.fresh_face_id();
    let problems = state
        .adjacency
        .rewrite_on_split(face, left, right, &plan.maps.edges)?;
    state.faces.remove(&face);
    state.faces.insert(left, left_twin);
    state.faces.insert(right, right_twin);
    state.lineage.insert(face, vec![left, right]);

    let (le, re) = plan.maps.edges.fold;
    let group = state
        .adjacency
        .connect(FaceEdge::new(left, le), FaceEdge::new(right, re), angle, group)?;
    tracing::info!(%face, %left, %right, %group, deferred = problems.len(), "split face");
    Ok(SplitReport {
        old: face,
        left,
        right,
        group,
        fold_points: (plan.first, plan.second),
        maps: plan.maps,
        problems,
    })
}

/// Merge `a` and `b` across their shared edge. Joints to `excluded` faces are deferred.
pub fn merge_faces(
    state: &mut PaperState,
    a: FaceId,
    b: FaceId,
    excluded: &BTreeSet<FaceId>,
    cfg: &FoldCfg,
) -> Result<MergeReport> {
    let (ea, eb) = state
        .adjacency
        .shared_edge(a, b)
        .ok_or_else(|| FoldError::not_found(format!("{a} and {b} share no edge")))?;
    let (ta, tb) = (state.face(a)?, state.face(b)?);

    let basis = Basis3::of_polygon(&ta.folded.vertex_coords())
        .ok_or_else(|| FoldError::invalid(format!("{a} has a degenerate folded polygon")))?;
    if tb
        .folded
        .vertex_coords()
        .iter()
        .any(|v| basis.height(v).abs() > cfg.coplanar_eps)
    {
        return Err(FoldError::invalid(format!("{a} and {b} are not coplanar")));
    }

    let plan = plan_merge(&ta.planar, ea, &tb.planar, eb, cfg)?;
    let merged_twin = FaceTwin::new(
        plan.apply(&ta.planar, &tb.planar)?,
        plan.apply(&ta.folded, &tb.folded)?,
    )?;
    if merged_twin.principal_normal().is_none() {
        return Err(FoldError::invalid(format!(
            "merging {a} and {b} leaves a degenerate folded polygon"
        )));
    }

    let merged = state.fresh_face_id();
    let problems = state
        .adjacency
        .rewrite_on_merge(a, b, merged, &plan.maps.edges, excluded)?;
    state.faces.remove(&a);
    state.faces.remove(&b);
    state.faces.insert(merged, merged_twin);
    state.lineage.insert(a, vec![merged]);
    state.lineage.insert(b, vec![merged]);
    tracing::info!(%a, %b, %merged, deferred = problems.len(), "merged faces");
    Ok(MergeReport {
        a,
        b,
        merged,
        maps: plan.maps,
        problems,
    })
}
