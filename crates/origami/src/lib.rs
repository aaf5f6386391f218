//! Fold state machine for one sheet of virtual paper.
//!
//! The paper is a set of polygonal faces, each kept as a crease-pattern
//! polygon plus its folded placement. An adjacency graph records which faces
//! share an edge and at what dihedral angle; a layered graph records which
//! faces lie on top of which. Folds split faces along new creases, move and
//! stack the mobile side, and merge faces back when a crease is unfolded.
//!
//! Layout
//! - `geom`: pure geometry (points, basis solves, fold axes, polygon predicates).
//! - `face`: face polygons with annotation points and lines, and the twin pair.
//! - `adjacency`: shared-edge graph with correlated-edge groups.
//! - `fold`: split/merge planning and commit.
//! - `lug`: layer components, the eight-case classifier and fold drivers.
//! - `store`: the owning `PaperStore` with copy-then-swap commits.
//! - `persist`: persistence records and the sink seam.
//!
//! API Policy
//! - Project-internal. Breaking changes are fine when they improve the design.

pub mod adjacency;
pub mod cfg;
pub mod error;
pub mod face;
pub mod fold;
pub mod geom;
pub mod ids;
pub mod lug;
pub mod persist;
pub mod store;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use cfg::FoldCfg;
pub use error::{ErrorKind, FoldError, Result};
pub use store::{FoldReport, PaperStore};

/// Common exports for callers driving a store.
pub mod prelude {
    pub use crate::cfg::FoldCfg;
    pub use crate::error::{ErrorKind, FoldError};
    pub use crate::face::{AnnotationDelta, FaceDescriptor, FaceTwin};
    pub use crate::fold::Side;
    pub use crate::ids::{ComponentId, EdgeId, FaceEdge, FaceId, GroupId, LineId, PointId};
    pub use crate::lug::{Crease, FoldCase, FoldCut, FoldRequest};
    pub use crate::persist::{PersistError, PersistenceRecord, PersistenceSink};
    pub use crate::store::{FoldReport, PaperStore};
    pub use nalgebra::{Vector2 as Vec2, Vector3 as Vec3};
}
