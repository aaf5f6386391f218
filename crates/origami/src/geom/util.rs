//! Segment and polygon predicates used by split classification, edge matching
//! and layer overlap tests. All predicates take an explicit tolerance.

use nalgebra::{SVector, Vector2};

use super::types::perp_dot;

/// Parameter `t` of the orthogonal projection of `p` onto the line `a + t (b - a)`.
#[inline]
pub fn segment_param<const D: usize>(
    p: &SVector<f64, D>,
    a: &SVector<f64, D>,
    b: &SVector<f64, D>,
) -> f64 {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 <= f64::EPSILON {
        return 0.0;
    }
    (p - a).dot(&ab) / len2
}

/// Distance from `p` to the closed segment `[a, b]`.
#[inline]
pub fn distance_to_segment<const D: usize>(
    p: &SVector<f64, D>,
    a: &SVector<f64, D>,
    b: &SVector<f64, D>,
) -> f64 {
    let t = segment_param(p, a, b).clamp(0.0, 1.0);
    (p - (a + (b - a) * t)).norm()
}

#[inline]
pub fn point_on_segment<const D: usize>(
    p: &SVector<f64, D>,
    a: &SVector<f64, D>,
    b: &SVector<f64, D>,
    eps: f64,
) -> bool {
    distance_to_segment(p, a, b) <= eps
}

/// Distance from `p` to the infinite line through `a` and `b`.
#[inline]
pub fn distance_to_line<const D: usize>(
    p: &SVector<f64, D>,
    a: &SVector<f64, D>,
    b: &SVector<f64, D>,
) -> f64 {
    let t = segment_param(p, a, b);
    (p - (a + (b - a) * t)).norm()
}

/// True when segments `[a0, a1]` and `[b0, b1]` are collinear within `eps`
/// and share a stretch longer than `eps` (touching at a single point does not count).
pub fn segments_overlap<const D: usize>(
    a0: &SVector<f64, D>,
    a1: &SVector<f64, D>,
    b0: &SVector<f64, D>,
    b1: &SVector<f64, D>,
    eps: f64,
) -> bool {
    if distance_to_line(b0, a0, a1) > eps || distance_to_line(b1, a0, a1) > eps {
        return false;
    }
    let len = (a1 - a0).norm();
    if len <= eps {
        return false;
    }
    let t0 = segment_param(b0, a0, a1);
    let t1 = segment_param(b1, a0, a1);
    let (lo, hi) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };
    let shared = (hi.min(1.0) - lo.max(0.0)) * len;
    shared > eps
}

/// Twice the signed area (positive for counterclockwise order).
pub fn signed_area2(poly: &[Vector2<f64>]) -> f64 {
    let n = poly.len();
    (0..n).map(|i| perp_dot(poly[i], poly[(i + 1) % n])).sum()
}

pub fn centroid<const D: usize>(points: &[SVector<f64, D>]) -> Option<SVector<f64, D>> {
    if points.is_empty() {
        return None;
    }
    let sum = points.iter().fold(SVector::<f64, D>::zeros(), |acc, p| acc + p);
    Some(sum / points.len() as f64)
}

/// Strict containment: `p` is inside `poly` and farther than `eps` from its boundary.
pub fn point_in_polygon_strict(p: &Vector2<f64>, poly: &[Vector2<f64>], eps: f64) -> bool {
    let n = poly.len();
    if n < 3 {
        return false;
    }
    for i in 0..n {
        if point_on_segment(p, &poly[i], &poly[(i + 1) % n], eps) {
            return false;
        }
    }
    // Even-odd ray cast along +x.
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (pi, pj) = (poly[i], poly[j]);
        if (pi.y > p.y) != (pj.y > p.y) {
            let x_cross = pj.x + (p.y - pj.y) * (pi.x - pj.x) / (pi.y - pj.y);
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Proper crossing: the segments intersect at a single point interior to both.
pub fn segments_cross(
    a0: &Vector2<f64>,
    a1: &Vector2<f64>,
    b0: &Vector2<f64>,
    b1: &Vector2<f64>,
    eps: f64,
) -> bool {
    let d = a1 - a0;
    let e = b1 - b0;
    let s1 = perp_dot(d, b0 - a0);
    let s2 = perp_dot(d, b1 - a0);
    let s3 = perp_dot(e, a0 - b0);
    let s4 = perp_dot(e, a1 - b0);
    let tol_a = eps * d.norm();
    let tol_b = eps * e.norm();
    ((s1 > tol_a && s2 < -tol_a) || (s1 < -tol_a && s2 > tol_a))
        && ((s3 > tol_b && s4 < -tol_b) || (s3 < -tol_b && s4 > tol_b))
}

/// Interior overlap of two simple polygons.
///
/// Shared edges or touching corners do not count as overlap; identical or
/// nested polygons do (detected through vertex and centroid containment).
pub fn polygons_overlap(a: &[Vector2<f64>], b: &[Vector2<f64>], eps: f64) -> bool {
    if a.len() < 3 || b.len() < 3 {
        return false;
    }
    for i in 0..a.len() {
        let (a0, a1) = (a[i], a[(i + 1) % a.len()]);
        for j in 0..b.len() {
            if segments_cross(&a0, &a1, &b[j], &b[(j + 1) % b.len()], eps) {
                return true;
            }
        }
    }
    if a.iter().any(|p| point_in_polygon_strict(p, b, eps))
        || b.iter().any(|p| point_in_polygon_strict(p, a, eps))
    {
        return true;
    }
    match (centroid(a), centroid(b)) {
        (Some(ca), Some(cb)) => {
            point_in_polygon_strict(&ca, b, eps) || point_in_polygon_strict(&cb, a, eps)
        }
        _ => false,
    }
}
