//! Small linear solvers: basis coefficients, plane bases, fold-axis rotations.
//!
//! - `solve_for_scalars`: coefficients `(α, β)` with `α v1 + β v2 = t`.
//! - `Basis3`: orthonormal frame of a plane, for projecting folded faces to 2D.
//! - `FoldAxis`: oriented rotation axis across a face edge.

use nalgebra::{Rotation3, Unit, Vector2, Vector3};

use crate::cfg::SOLVE_DET_EPS;

/// Solve `α v1 + β v2 = t` for `(α, β)`.
///
/// Uses the 2x2 normal equations of the (possibly 3D) basis. Returns `None`
/// when `v1` and `v2` are collinear (no planar solution) or when `t` is more
/// than `eps` away from their span.
pub fn solve_for_scalars(
    v1: &Vector3<f64>,
    v2: &Vector3<f64>,
    t: &Vector3<f64>,
    eps: f64,
) -> Option<(f64, f64)> {
    let g11 = v1.dot(v1);
    let g12 = v1.dot(v2);
    let g22 = v2.dot(v2);
    let det = g11 * g22 - g12 * g12;
    let scale = (g11 * g22).max(1.0);
    if !det.is_finite() || det.abs() <= SOLVE_DET_EPS * scale {
        return None;
    }
    let r1 = v1.dot(t);
    let r2 = v2.dot(t);
    let alpha = (r1 * g22 - r2 * g12) / det;
    let beta = (r2 * g11 - r1 * g12) / det;
    let residual = (v1 * alpha + v2 * beta - t).norm();
    if residual > eps {
        return None;
    }
    Some((alpha, beta))
}

/// Newell normal of a (roughly planar) polygon, normalized.
pub fn newell_normal(points: &[Vector3<f64>]) -> Option<Vector3<f64>> {
    if points.len() < 3 {
        return None;
    }
    let mut n: Vector3<f64> = Vector3::zeros();
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        n.x += (p.y - q.y) * (p.z + q.z);
        n.y += (p.z - q.z) * (p.x + q.x);
        n.z += (p.x - q.x) * (p.y + q.y);
    }
    let len = n.norm();
    if !len.is_finite() || len <= SOLVE_DET_EPS {
        return None;
    }
    Some(n / len)
}

/// Orthonormal frame `(origin, u, v, n)` of a plane.
#[derive(Clone, Copy, Debug)]
pub struct Basis3 {
    pub origin: Vector3<f64>,
    pub u: Vector3<f64>,
    pub v: Vector3<f64>,
    pub n: Vector3<f64>,
}

impl Basis3 {
    /// Frame with `u` along `dir` (projected into the plane) and `v = n × u`.
    pub fn from_plane(origin: Vector3<f64>, dir: Vector3<f64>, normal: Vector3<f64>) -> Option<Self> {
        let n = normal.try_normalize(SOLVE_DET_EPS)?;
        let u = (dir - n * n.dot(&dir)).try_normalize(SOLVE_DET_EPS)?;
        let v = n.cross(&u);
        Some(Self { origin, u, v, n })
    }

    /// Frame of a polygon: origin at its first vertex, `u` along its first edge.
    pub fn of_polygon(points: &[Vector3<f64>]) -> Option<Self> {
        let n = newell_normal(points)?;
        let origin = *points.first()?;
        let dir = *points.get(1)? - origin;
        Self::from_plane(origin, dir, n)
    }

    #[inline]
    pub fn project(&self, p: &Vector3<f64>) -> Vector2<f64> {
        let d = p - self.origin;
        Vector2::new(d.dot(&self.u), d.dot(&self.v))
    }

    #[inline]
    pub fn lift(&self, q: &Vector2<f64>) -> Vector3<f64> {
        self.origin + self.u * q.x + self.v * q.y
    }

    /// Signed distance of `p` from the plane along `n`.
    #[inline]
    pub fn height(&self, p: &Vector3<f64>) -> f64 {
        (p - self.origin).dot(&self.n)
    }
}

/// Rotation axis of a fold: a point on the crease and a unit direction.
///
/// Convention: for the anchor face the axis is oriented so that a positive
/// rotation lifts the region across the crease toward the anchor's normal.
/// With dihedral angle `α` (180 = flat, 0 = closed on the normal side), a fold
/// from `start` to `end` is a rotation by `start - end` degrees.
#[derive(Clone, Copy, Debug)]
pub struct FoldAxis {
    pub point: Vector3<f64>,
    pub dir: Unit<Vector3<f64>>,
}

impl FoldAxis {
    /// Axis along edge `edge` of the polygon `points` (anchor face, folded twin).
    pub fn across_edge(points: &[Vector3<f64>], edge: usize) -> Option<Self> {
        let n = newell_normal(points)?;
        let len = points.len();
        if edge >= len {
            return None;
        }
        let a = points[edge];
        let b = points[(edge + 1) % len];
        let along = (b - a).try_normalize(SOLVE_DET_EPS)?;
        let centroid = points.iter().sum::<Vector3<f64>>() / len as f64;
        let mid = (a + b) * 0.5;
        // In-plane direction from the anchor interior out across the edge.
        let out = mid - centroid;
        let out = (out - along * along.dot(&out)).try_normalize(SOLVE_DET_EPS)?;
        let dir = Unit::new_normalize(out.cross(&n));
        Some(Self { point: a, dir })
    }

    #[inline]
    pub fn rotation(&self, angle_rad: f64) -> Rotation3<f64> {
        Rotation3::from_axis_angle(&self.dir, angle_rad)
    }

    #[inline]
    pub fn rotate_point(&self, p: &Vector3<f64>, angle_rad: f64) -> Vector3<f64> {
        self.point + self.rotation(angle_rad) * (p - self.point)
    }
}
