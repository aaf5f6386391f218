use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::{EdgeId, FaceEdge, FaceId, GroupId};

/// One side of a physical joint: `(other face, dihedral angle, my edge, other edge)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeAdjacency {
    pub other: FaceId,
    /// Dihedral angle in degrees (180 = flat).
    pub angle: f64,
    pub my_edge: EdgeId,
    pub other_edge: EdgeId,
}

/// A connection that could not be rewritten when its face was split or merged.
///
/// Phase 1 (`rewrite_on_split` / `rewrite_on_merge`) emits these; phase 2
/// (`resolve_problem_edges`) matches them once every sibling face exists.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ProblemEdge {
    /// The neighbour sat on an edge the fold line cut in two.
    SplitCut {
        origin: FaceEdge,
        left: FaceEdge,
        right: FaceEdge,
        remote: FaceEdge,
        angle: f64,
        group: GroupId,
    },
    /// The neighbour is on the far side of a merge seam and may not exist yet.
    MergeSeam {
        origin: FaceEdge,
        merged: FaceId,
        remote: FaceEdge,
        angle: f64,
        group: GroupId,
    },
}

impl ProblemEdge {
    pub fn origin(&self) -> FaceEdge {
        match self {
            Self::SplitCut { origin, .. } | Self::MergeSeam { origin, .. } => *origin,
        }
    }
    pub fn remote(&self) -> FaceEdge {
        match self {
            Self::SplitCut { remote, .. } | Self::MergeSeam { remote, .. } => *remote,
        }
    }
    pub fn group(&self) -> GroupId {
        match self {
            Self::SplitCut { group, .. } | Self::MergeSeam { group, .. } => *group,
        }
    }
}

/// A parent edge the fold line crosses, and the halves it became.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutEdge {
    pub old: EdgeId,
    pub left: EdgeId,
    pub right: EdgeId,
}

/// Parent edge ids to child edge ids after a split.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitEdgeMap {
    /// Parent edges that survive whole in the left child.
    pub left: BTreeMap<EdgeId, EdgeId>,
    pub right: BTreeMap<EdgeId, EdgeId>,
    pub cut: Vec<CutEdge>,
    /// The new fold edge, as `(left edge, right edge)`.
    pub fold: (EdgeId, EdgeId),
}

/// Parent edge ids to merged edge ids. Seam edges are absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeEdgeMap {
    pub a: BTreeMap<EdgeId, EdgeId>,
    pub b: BTreeMap<EdgeId, EdgeId>,
}
