//! Tolerance defaults and fold configuration.
//!
//! Policy
//! - The geometric tolerances below gate specific predicates (edge matching,
//!   merge dedup, straight-continuation test). They are kept exactly as
//!   calibrated against the fold geometry; do not swap them for exact equality
//!   or rescale them without re-deriving the predicates they gate.
//! - `FoldCfg` bundles them with the renderer-facing thickness values so a
//!   store can be built with overrides, while call sites read one struct.

use serde::{Deserialize, Serialize};

/// Coplanarity / collinearity / coordinate-proximity tolerance.
pub const COPLANAR_EPS: f64 = 0.01;
/// Distance under which two seam points are the same point after a merge.
pub const MERGE_DEDUP_DIST: f64 = 0.05;
/// Cosine between the two boundary neighbours of a seam endpoint at or below
/// which the endpoint is a straight continuation and is dropped from the merge.
pub const STRAIGHT_COS_THRESHOLD: f64 = -0.97;
/// Degrees within which a dihedral angle counts as 0, 180 or 360.
pub const STABLE_ANGLE_EPS: f64 = 1e-6;
/// Determinant floor for the 2x2 basis solve.
pub(crate) const SOLVE_DET_EPS: f64 = 1e-12;

/// Fold configuration (tolerances and renderer thickness values).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FoldCfg {
    pub coplanar_eps: f64,
    pub merge_dedup_dist: f64,
    pub straight_cos_threshold: f64,
    pub stable_angle_eps: f64,
    /// Paper thickness reported in face descriptors.
    pub paper_thickness: f64,
    /// Normal-offset distance between consecutive layers of a component.
    pub layer_gap: f64,
}

impl Default for FoldCfg {
    fn default() -> Self {
        Self {
            coplanar_eps: COPLANAR_EPS,
            merge_dedup_dist: MERGE_DEDUP_DIST,
            straight_cos_threshold: STRAIGHT_COS_THRESHOLD,
            stable_angle_eps: STABLE_ANGLE_EPS,
            paper_thickness: 0.001,
            layer_gap: 0.002,
        }
    }
}
