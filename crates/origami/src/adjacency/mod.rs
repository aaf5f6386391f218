//! Face adjacency graph and correlated-edge bookkeeping.
//!
//! Purpose
//! - Record which face edges are physically joined and at what dihedral angle.
//! - Group joints by the fold that created them, so a later split or merge
//!   rewrites the group instead of recreating it.
//!
//! Invariants
//! - Every entry `A -> B` has a mirror `B -> A` with swapped edge ids and the
//!   same angle; each face pair has at most one joint.
//! - Every joint belongs to exactly one correlated-edge group.
//! - Both hold after every committed operation. Split and merge rewrites may
//!   leave pending group pairs until phase 2 resolution runs.

mod graph;
mod groups;
mod resolve;
mod types;

pub use graph::AdjacencyGraph;
pub use groups::CorrelatedEdges;
pub use resolve::{live_descendants, EdgeGeometry};
pub use types::{CutEdge, EdgeAdjacency, MergeEdgeMap, ProblemEdge, SplitEdgeMap};

#[cfg(test)]
mod tests;
