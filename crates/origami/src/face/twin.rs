//! The planar/folded face pair and the renderer-facing records derived from it.
//!
//! Both halves carry the same vertex count, the same annotation point ids
//! (with the same edge tags) and the same line table. Every edit goes through
//! `FaceTwin` so the two never drift apart.

use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};

use super::types::{AnnotatedLine, AnnotatedPoint, Face};
use crate::cfg::FoldCfg;
use crate::error::{FoldError, Result};
use crate::geom::{newell_normal, perp_dot, solve_for_scalars, FoldAxis, Point};
use crate::ids::{EdgeId, FaceId, LineId, PointId};

/// Face twin: crease-pattern polygon plus its current folded placement.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceTwin {
    pub planar: Face<2>,
    pub folded: Face<3>,
}

/// Polygon record handed to the mesh builder for a newly created face.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FaceDescriptor {
    pub face: FaceId,
    pub polygon: Vec<[f64; 3]>,
    pub thickness: f64,
    pub offset: f64,
    pub normal: [f64; 3],
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    pub id: PointId,
    pub planar: [f64; 2],
    pub folded: [f64; 3],
    pub edge: Option<EdgeId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRecord {
    pub id: LineId,
    pub start: PointId,
    pub end: PointId,
}

/// Annotation changes on one face, for overlay redraw.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotationDelta {
    pub face: FaceId,
    pub points_added: Vec<PointRecord>,
    pub points_removed: Vec<PointId>,
    pub lines_added: Vec<LineRecord>,
    pub lines_removed: Vec<LineId>,
}

impl AnnotationDelta {
    pub fn new(face: FaceId) -> Self {
        Self {
            face,
            points_added: Vec::new(),
            points_removed: Vec::new(),
            lines_added: Vec::new(),
            lines_removed: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points_added.is_empty()
            && self.points_removed.is_empty()
            && self.lines_added.is_empty()
            && self.lines_removed.is_empty()
    }
}

impl FaceTwin {
    /// Pair two halves after checking that their id tables agree.
    pub fn new(planar: Face<2>, folded: Face<3>) -> Result<Self> {
        let twin = Self { planar, folded };
        twin.validate()?;
        Ok(twin)
    }

    /// Unfolded face: the folded twin is the planar polygon at `z = 0`.
    pub fn flat(vertices: Vec<Vector2<f64>>) -> Result<Self> {
        let folded = vertices.iter().map(|v| Vector3::new(v.x, v.y, 0.0)).collect();
        Self::from_vertices(vertices, folded)
    }

    pub fn from_vertices(planar: Vec<Vector2<f64>>, folded: Vec<Vector3<f64>>) -> Result<Self> {
        let twin = Self::new(Face::new(planar)?, Face::new(folded)?)?;
        twin.affine_frame()?;
        Ok(twin)
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.planar.vertex_count()
    }

    /// Vertex indices `(0, j, k)` spanning the planar polygon.
    fn affine_frame(&self) -> Result<(usize, usize)> {
        let vs = self.planar.vertex_coords();
        let d1 = vs[1] - vs[0];
        let scale = d1.norm().max(1.0);
        (2..vs.len())
            .find(|&k| perp_dot(d1, vs[k] - vs[0]).abs() > 1e-9 * scale * scale)
            .map(|k| (1, k))
            .ok_or_else(|| FoldError::invalid("face polygon is degenerate (all vertices collinear)"))
    }

    /// Map a crease-pattern position to the folded placement of this face.
    pub fn lift(&self, q: &Vector2<f64>) -> Result<Vector3<f64>> {
        let (j, k) = self.affine_frame()?;
        let p = self.planar.vertex_coords();
        let f = self.folded.vertex_coords();
        let embed = |v: Vector2<f64>| Vector3::new(v.x, v.y, 0.0);
        let (alpha, beta) = solve_for_scalars(
            &embed(p[j] - p[0]),
            &embed(p[k] - p[0]),
            &embed(q - p[0]),
            f64::INFINITY,
        )
        .ok_or_else(|| FoldError::invalid("no planar solution for the face basis"))?;
        Ok(f[0] + (f[j] - f[0]) * alpha + (f[k] - f[0]) * beta)
    }

    /// Unit normal of the folded polygon (Newell).
    pub fn principal_normal(&self) -> Option<Vector3<f64>> {
        newell_normal(&self.folded.vertex_coords())
    }

    pub fn descriptor(&self, face: FaceId, cfg: &FoldCfg, offset: f64) -> FaceDescriptor {
        let n = self.principal_normal().unwrap_or_else(Vector3::z);
        FaceDescriptor {
            face,
            polygon: self
                .folded
                .vertex_coords()
                .iter()
                .map(|v| [v.x, v.y, v.z])
                .collect(),
            thickness: cfg.paper_thickness,
            offset,
            normal: [n.x, n.y, n.z],
        }
    }

    /// Rigid rotation of the folded twin about a crease axis.
    pub fn rotate(&mut self, axis: &FoldAxis, angle_rad: f64) {
        self.folded.map_coords(|p| axis.rotate_point(p, angle_rad));
    }

    /// Add an annotation point given in crease-pattern coordinates to both halves.
    pub fn add_point(
        &mut self,
        coords: Vector2<f64>,
        edge: Option<EdgeId>,
        eps: f64,
    ) -> Result<PointId> {
        let lifted = self.lift(&coords)?;
        let id = self.planar.add_point(coords, edge, eps)?;
        self.folded.insert_point_at(
            id,
            AnnotatedPoint {
                point: Point::annotation(lifted),
                edge,
            },
        )?;
        Ok(id)
    }

    pub fn add_line(&mut self, a: PointId, b: PointId) -> Result<LineId> {
        let id = self.planar.add_line(a, b)?;
        self.folded
            .insert_line_at(id, AnnotatedLine { start: a, end: b })?;
        Ok(id)
    }

    /// Remove an annotation point and its lines from both halves; returns the removed line ids.
    pub fn remove_point(&mut self, id: PointId) -> Result<Vec<LineId>> {
        let (_, lines) = self.planar.remove_point(id)?;
        self.folded.remove_point(id)?;
        Ok(lines.into_iter().map(|(lid, _)| lid).collect())
    }

    pub fn remove_line(&mut self, id: LineId) -> Result<AnnotatedLine> {
        let line = self.planar.remove_line(id)?;
        self.folded.remove_line(id)?;
        Ok(line)
    }

    pub fn point_record(&self, id: PointId) -> Option<PointRecord> {
        let p = self.planar.points().get(&id)?;
        let f = self.folded.points().get(&id)?;
        Some(PointRecord {
            id,
            planar: [p.point.coords.x, p.point.coords.y],
            folded: [f.point.coords.x, f.point.coords.y, f.point.coords.z],
            edge: p.edge,
        })
    }

    /// Every annotation of this face, reported as added.
    pub fn snapshot(&self, face: FaceId) -> AnnotationDelta {
        let mut delta = AnnotationDelta::new(face);
        delta.points_added = self
            .planar
            .points()
            .keys()
            .filter_map(|id| self.point_record(*id))
            .collect();
        delta.lines_added = self
            .planar
            .lines()
            .iter()
            .map(|(id, l)| LineRecord {
                id: *id,
                start: l.start,
                end: l.end,
            })
            .collect();
        delta
    }

    /// Every annotation of this face, reported as removed.
    pub fn teardown(&self, face: FaceId) -> AnnotationDelta {
        let mut delta = AnnotationDelta::new(face);
        delta.points_removed = self.planar.points().keys().copied().collect();
        delta.lines_removed = self.planar.lines().keys().copied().collect();
        delta
    }

    /// Check that both halves expose the same ids.
    pub fn validate(&self) -> Result<()> {
        self.planar.validate()?;
        self.folded.validate()?;
        if self.planar.vertex_count() != self.folded.vertex_count() {
            return Err(FoldError::invariant(format!(
                "twin vertex counts differ ({} vs {})",
                self.planar.vertex_count(),
                self.folded.vertex_count()
            )));
        }
        let same_points = self.planar.points().len() == self.folded.points().len()
            && self
                .planar
                .points()
                .iter()
                .zip(self.folded.points())
                .all(|((a, pa), (b, pb))| a == b && pa.edge == pb.edge);
        if !same_points {
            return Err(FoldError::invariant("twin annotation point ids differ"));
        }
        if self.planar.lines() != self.folded.lines() {
            return Err(FoldError::invariant("twin annotation lines differ"));
        }
        Ok(())
    }
}
