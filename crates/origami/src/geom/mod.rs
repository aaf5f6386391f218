//! Geometry primitives (pure functions, no state).
//!
//! Purpose
//! - Tagged 2D/3D points, basis solves and plane frames, fold-axis rotations,
//!   and the segment/polygon predicates the fold and layer code rely on.
//!
//! Conventions
//! - Coordinates are `f64` nalgebra vectors. Every predicate takes its tolerance
//!   explicitly; callers pass the values from `FoldCfg`.

pub mod rand;
mod solvers;
mod types;
mod util;

pub use solvers::{newell_normal, solve_for_scalars, Basis3, FoldAxis};
pub use types::{perp_dot, Point, Point2, Point3, PointContext};
pub use util::{
    centroid, distance_to_line, distance_to_segment, point_in_polygon_strict, point_on_segment,
    polygons_overlap, segment_param, segments_cross, segments_overlap, signed_area2,
};
