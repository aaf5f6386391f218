//! Tagged points in 2D and 3D.
//!
//! - `Point<D>` wraps an `SVector<f64, D>` plus a `PointContext` saying whether
//!   it is an original polygon corner or a later annotation.
//! - Operators are defined only between points of the same dimension, so a
//!   mixed 2D/3D expression does not type-check.

use std::ops::{Add, Mul, Neg, Sub};

use nalgebra::{SVector, Vector2, Vector3};

/// Origin of a point: a polygon corner or an annotation added later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointContext {
    Vertex,
    Annotation,
}

/// Immutable coordinate tuple tagged with its context.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point<const D: usize> {
    pub coords: SVector<f64, D>,
    pub context: PointContext,
}

pub type Point2 = Point<2>;
pub type Point3 = Point<3>;

impl<const D: usize> Point<D> {
    #[inline]
    pub fn new(coords: SVector<f64, D>, context: PointContext) -> Self {
        Self { coords, context }
    }
    #[inline]
    pub fn vertex(coords: SVector<f64, D>) -> Self {
        Self::new(coords, PointContext::Vertex)
    }
    #[inline]
    pub fn annotation(coords: SVector<f64, D>) -> Self {
        Self::new(coords, PointContext::Annotation)
    }
    #[inline]
    pub fn with_context(self, context: PointContext) -> Self {
        Self { context, ..self }
    }
    #[inline]
    pub fn dot(&self, other: &Self) -> f64 {
        self.coords.dot(&other.coords)
    }
    #[inline]
    pub fn scale(&self, s: f64) -> Self {
        Self::annotation(self.coords * s)
    }
    #[inline]
    pub fn norm(&self) -> f64 {
        self.coords.norm()
    }
    /// Unit-length copy; `None` for a (near) zero vector.
    #[inline]
    pub fn normalize(&self) -> Option<Self> {
        let n = self.coords.norm();
        if !n.is_finite() || n <= f64::EPSILON {
            return None;
        }
        Some(Self::new(self.coords / n, self.context))
    }
    #[inline]
    pub fn distance(&self, other: &Self) -> f64 {
        (self.coords - other.coords).norm()
    }
}

impl Point<2> {
    #[inline]
    pub fn xy(x: f64, y: f64) -> Vector2<f64> {
        Vector2::new(x, y)
    }
    /// Scalar (z-component) cross product.
    #[inline]
    pub fn cross(&self, other: &Self) -> f64 {
        perp_dot(self.coords, other.coords)
    }
}

impl Point<3> {
    #[inline]
    pub fn cross(&self, other: &Self) -> Self {
        Self::annotation(self.coords.cross(&other.coords))
    }
    /// Embed a planar point at `z = 0`.
    #[inline]
    pub fn from_planar(p: &Point<2>) -> Self {
        Self::new(Vector3::new(p.coords.x, p.coords.y, 0.0), p.context)
    }
}

// Derived points are annotations regardless of their operands.
impl<const D: usize> Add for Point<D> {
    type Output = Point<D>;
    #[inline]
    fn add(self, rhs: Point<D>) -> Self::Output {
        Point::annotation(self.coords + rhs.coords)
    }
}
impl<const D: usize> Sub for Point<D> {
    type Output = Point<D>;
    #[inline]
    fn sub(self, rhs: Point<D>) -> Self::Output {
        Point::annotation(self.coords - rhs.coords)
    }
}
impl<const D: usize> Mul<f64> for Point<D> {
    type Output = Point<D>;
    #[inline]
    fn mul(self, rhs: f64) -> Self::Output {
        self.scale(rhs)
    }
}
impl<const D: usize> Neg for Point<D> {
    type Output = Point<D>;
    #[inline]
    fn neg(self) -> Self::Output {
        Point::annotation(-self.coords)
    }
}

/// `a.x * b.y - a.y * b.x`.
#[inline]
pub fn perp_dot(a: Vector2<f64>, b: Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}
