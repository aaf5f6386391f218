//! Face polygon with annotated points and lines.
//!
//! Invariants:
//! - The vertex list is fixed at construction (length `N >= 3`); point ids
//!   `0..N` name the vertices in polygon order.
//! - Annotation point ids are `>= N`; each carries the edge it lies on or `None`.
//! - Every line endpoint names a vertex or an annotation point of this face.

use std::collections::BTreeMap;

use nalgebra::SVector;

use crate::error::{FoldError, Result};
use crate::geom::{point_on_segment, segment_param, Point};
use crate::ids::{EdgeId, LineId, PointId};

/// Annotation point and the polygon edge it lies on (`None` for interior points).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnnotatedPoint<const D: usize> {
    pub point: Point<D>,
    pub edge: Option<EdgeId>,
}

/// Annotation line between two point ids of the same face.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AnnotatedLine {
    pub start: PointId,
    pub end: PointId,
}

impl AnnotatedLine {
    #[inline]
    pub fn touches(&self, id: PointId) -> bool {
        self.start == id || self.end == id
    }
    #[inline]
    pub fn joins(&self, a: PointId, b: PointId) -> bool {
        (self.start == a && self.end == b) || (self.start == b && self.end == a)
    }
    /// The endpoint opposite `id`.
    #[inline]
    pub fn other(&self, id: PointId) -> PointId {
        if self.start == id {
            self.end
        } else {
            self.start
        }
    }
}

/// Polygon face in `D` dimensions (2 = crease pattern, 3 = folded).
#[derive(Clone, Debug, PartialEq)]
pub struct Face<const D: usize> {
    vertices: Vec<Point<D>>,
    points: BTreeMap<PointId, AnnotatedPoint<D>>,
    lines: BTreeMap<LineId, AnnotatedLine>,
    next_point: usize,
    next_line: usize,
}

impl<const D: usize> Face<D> {
    pub fn new(vertices: Vec<SVector<f64, D>>) -> Result<Self> {
        Self::from_parts(vertices, BTreeMap::new(), BTreeMap::new())
    }

    /// Assemble a face from explicit ids (used when rebuilding after split/merge).
    pub fn from_parts(
        vertices: Vec<SVector<f64, D>>,
        points: BTreeMap<PointId, AnnotatedPoint<D>>,
        lines: BTreeMap<LineId, AnnotatedLine>,
    ) -> Result<Self> {
        if vertices.len() < 3 {
            return Err(FoldError::invalid(format!(
                "a face needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        if vertices.iter().any(|v| v.iter().any(|c| !c.is_finite())) {
            return Err(FoldError::invalid("face vertices must be finite"));
        }
        let n = vertices.len();
        let next_point = points.keys().last().map_or(n, |id| (id.0 + 1).max(n));
        let next_line = lines.keys().last().map_or(0, |id| id.0 + 1);
        let face = Self {
            vertices: vertices.into_iter().map(Point::vertex).collect(),
            points,
            lines,
            next_point,
            next_line,
        };
        face.validate()?;
        Ok(face)
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }
    #[inline]
    pub fn vertices(&self) -> &[Point<D>] {
        &self.vertices
    }
    pub fn vertex_coords(&self) -> Vec<SVector<f64, D>> {
        self.vertices.iter().map(|p| p.coords).collect()
    }
    #[inline]
    pub fn points(&self) -> &BTreeMap<PointId, AnnotatedPoint<D>> {
        &self.points
    }
    #[inline]
    pub fn lines(&self) -> &BTreeMap<LineId, AnnotatedLine> {
        &self.lines
    }
    #[inline]
    pub fn is_vertex(&self, id: PointId) -> bool {
        id.0 < self.vertices.len()
    }
    #[inline]
    pub fn contains_point(&self, id: PointId) -> bool {
        self.is_vertex(id) || self.points.contains_key(&id)
    }

    /// Coordinates of a vertex or annotation point.
    pub fn coords(&self, id: PointId) -> Option<SVector<f64, D>> {
        match self.vertices.get(id.0) {
            Some(v) => Some(v.coords),
            None => self.points.get(&id).map(|p| p.point.coords),
        }
    }

    /// Endpoints of polygon edge `e`.
    pub fn edge(&self, e: EdgeId) -> Option<(SVector<f64, D>, SVector<f64, D>)> {
        let n = self.vertices.len();
        if e.0 >= n {
            return None;
        }
        Some((self.vertices[e.0].coords, self.vertices[(e.0 + 1) % n].coords))
    }

    /// Position along the boundary, clockwise from vertex 0 in polygon order:
    /// `(edge, t)` with vertex `i` at `(i, 0)`. `None` for interior points.
    pub fn traversal_position(&self, id: PointId) -> Option<(usize, f64)> {
        if self.is_vertex(id) {
            return Some((id.0, 0.0));
        }
        let ap = self.points.get(&id)?;
        let e = ap.edge?;
        let (a, b) = self.edge(e)?;
        Some((e.0, segment_param(&ap.point.coords, &a, &b).clamp(0.0, 1.0)))
    }

    pub fn find_line(&self, a: PointId, b: PointId) -> Option<LineId> {
        self.lines
            .iter()
            .find(|(_, l)| l.joins(a, b))
            .map(|(id, _)| *id)
    }

    /// Validated insertion of an annotation point; returns its fresh id.
    pub fn add_point(
        &mut self,
        coords: SVector<f64, D>,
        edge: Option<EdgeId>,
        eps: f64,
    ) -> Result<PointId> {
        if coords.iter().any(|c| !c.is_finite()) {
            return Err(FoldError::invalid("annotation coordinates must be finite"));
        }
        if let Some(e) = edge {
            let (a, b) = self.edge(e).ok_or_else(|| {
                FoldError::invalid(format!("{e} is not an edge of a {}-gon", self.vertex_count()))
            })?;
            if !point_on_segment(&coords, &a, &b, eps) {
                return Err(FoldError::invalid(format!("point does not lie on {e}")));
            }
        }
        let id = PointId(self.next_point);
        self.insert_point_at(
            id,
            AnnotatedPoint {
                point: Point::annotation(coords),
                edge,
            },
        )?;
        Ok(id)
    }

    /// Insert an annotation point under a caller-chosen id (twin bookkeeping).
    pub fn insert_point_at(&mut self, id: PointId, ap: AnnotatedPoint<D>) -> Result<()> {
        if self.contains_point(id) {
            return Err(FoldError::conflict(format!("{id} already exists")));
        }
        if let Some(e) = ap.edge {
            if e.0 >= self.vertex_count() {
                return Err(FoldError::invalid(format!("{e} is not an edge of this face")));
            }
        }
        self.points.insert(id, ap);
        self.next_point = self.next_point.max(id.0 + 1);
        Ok(())
    }

    pub fn add_line(&mut self, a: PointId, b: PointId) -> Result<LineId> {
        let id = LineId(self.next_line);
        self.insert_line_at(id, AnnotatedLine { start: a, end: b })?;
        Ok(id)
    }

    pub fn insert_line_at(&mut self, id: LineId, line: AnnotatedLine) -> Result<()> {
        for p in [line.start, line.end] {
            if !self.contains_point(p) {
                return Err(FoldError::not_found(format!("{p} is not on this face")));
            }
        }
        if line.start == line.end {
            return Err(FoldError::invalid("a line needs two distinct points"));
        }
        if let Some(existing) = self.find_line(line.start, line.end) {
            return Err(FoldError::conflict(format!(
                "{existing} already joins {} and {}",
                line.start, line.end
            )));
        }
        if self.lines.contains_key(&id) {
            return Err(FoldError::conflict(format!("{id} already exists")));
        }
        self.lines.insert(id, line);
        self.next_line = self.next_line.max(id.0 + 1);
        Ok(())
    }

    /// Remove an annotation point together with every line touching it.
    pub fn remove_point(
        &mut self,
        id: PointId,
    ) -> Result<(AnnotatedPoint<D>, Vec<(LineId, AnnotatedLine)>)> {
        if self.is_vertex(id) {
            return Err(FoldError::invalid(format!("{id} is a polygon vertex")));
        }
        let ap = self
            .points
            .remove(&id)
            .ok_or_else(|| FoldError::not_found(format!("{id} is not on this face")))?;
        let touching: Vec<LineId> = self
            .lines
            .iter()
            .filter(|(_, l)| l.touches(id))
            .map(|(lid, _)| *lid)
            .collect();
        let removed = touching
            .into_iter()
            .filter_map(|lid| self.lines.remove(&lid).map(|l| (lid, l)))
            .collect();
        Ok((ap, removed))
    }

    pub fn remove_line(&mut self, id: LineId) -> Result<AnnotatedLine> {
        self.lines
            .remove(&id)
            .ok_or_else(|| FoldError::not_found(format!("{id} is not on this face")))
    }

    /// Apply a coordinate map to every vertex and annotation point (rigid motions).
    pub fn map_coords(&mut self, f: impl Fn(&SVector<f64, D>) -> SVector<f64, D>) {
        for v in &mut self.vertices {
            v.coords = f(&v.coords);
        }
        for ap in self.points.values_mut() {
            ap.point.coords = f(&ap.point.coords);
        }
    }

    /// Check the id invariants listed in the module docs.
    pub fn validate(&self) -> Result<()> {
        let n = self.vertex_count();
        for (id, ap) in &self.points {
            if id.0 < n {
                return Err(FoldError::invariant(format!(
                    "annotation {id} collides with a vertex id"
                )));
            }
            if let Some(e) = ap.edge {
                if e.0 >= n {
                    return Err(FoldError::invariant(format!(
                        "annotation {id} references missing {e}"
                    )));
                }
            }
        }
        for (id, l) in &self.lines {
            if !self.contains_point(l.start) || !self.contains_point(l.end) {
                return Err(FoldError::invariant(format!(
                    "{id} has a dangling endpoint ({} - {})",
                    l.start, l.end
                )));
            }
        }
        Ok(())
    }
}
