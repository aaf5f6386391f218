//! Fold orchestrator: split and merge planning, re-id maps, and their commit.
//!
//! Purpose
//! - `plan_split` / `plan_merge` are pure: they read a planar face and return
//!   a plan plus explicit old-id -> new-id maps. No id survives a split or
//!   merge implicitly.
//! - `create_split_face` / `merge_faces` apply a plan to both twins and drive
//!   phase 1 of the adjacency rewrite.
//!
//! Failure
//! - Every precondition is checked before the registry is touched; the store
//!   wraps each call in copy-then-swap so a late failure leaves no trace.

mod commit;
mod merge;
mod split;

pub use commit::{create_split_face, merge_faces, MergeReport, SplitReport};
pub use merge::{plan_merge, MergeMaps, MergePlan, MergeSource};
pub use split::{plan_split, ChildPlan, Side, SplitMaps, SplitPlan};
