use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::adjacency::ProblemEdge;
use crate::face::{AnnotationDelta, FaceDescriptor};
use crate::fold::{MergeReport, SplitReport};
use crate::ids::FaceId;
use crate::lug::FoldCase;

/// Everything the renderer needs after one committed fold, split or merge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FoldReport {
    /// `None` for a bare split or merge outside a classified fold.
    pub case: Option<FoldCase>,
    pub created: Vec<FaceDescriptor>,
    pub removed: Vec<FaceId>,
    pub annotations: Vec<AnnotationDelta>,
    /// Face -> change in normal offset.
    pub offsets: BTreeMap<FaceId, f64>,
    pub splits: Vec<SplitReport>,
    pub merges: Vec<MergeReport>,
    /// Deferred joints no face matched; dropped from the graph.
    pub unresolved: Vec<ProblemEdge>,
}
