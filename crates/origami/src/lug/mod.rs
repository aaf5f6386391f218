//! Layered Undirected Graph: which faces lie on top of which.
//!
//! Purpose
//! - A forest of components; each component is an ordered stack of layers
//!   of `FaceNode`s with up/down links and an orientation bit.
//! - Component operations (split, partition, stack, merge, invert) restructure
//!   the stacks as folds create, move and remove faces.
//! - The eight-case classifier and the fold drivers live here too.
//!
//! Invariants
//! - Every live face is in exactly one component and one layer.
//! - Components are compressed: first and last layers are non-empty.
//! - `orientation == true` means the face normal points toward increasing
//!   layer index; every operation keeps that meaning, using `invert` to
//!   flip a component's frame before combining it with another.

mod cases;
mod component;
mod drive;
mod registry;

pub use cases::{FoldCase, Stability};
pub use component::{FaceNode, PaperComponent};
pub use drive::{align_fold, face_mutating_fold, mobile_set, Crease, FoldCut, FoldOutcome, FoldRequest};
pub(crate) use drive::offset_deltas;
pub use registry::{rotate_faces, FaceGeometry, Lug};

#[cfg(test)]
mod tests;
