//! Faces: polygons with id-stable annotations, in planar and folded form.
//!
//! Purpose
//! - `Face<D>` owns an immutable vertex list and mutable annotation tables.
//! - `FaceTwin` keeps a 2D crease-pattern face and its 3D folded placement in
//!   id-for-id correspondence and derives renderer records from them.
//!
//! Why this design
//! - Faces reference nothing outside themselves; neighbours and layers refer
//!   to faces by `FaceId` only, so split/merge can replace a face wholesale.

mod twin;
mod types;

pub use twin::{AnnotationDelta, FaceDescriptor, FaceTwin, LineRecord, PointRecord};
pub use types::{AnnotatedLine, AnnotatedPoint, Face};

#[cfg(test)]
mod tests;
