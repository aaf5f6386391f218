//! Split planning on the crease-pattern face.
//!
//! Steps: order the fold points along the boundary, cut the vertex cycle into
//! two children, classify every annotation to exactly one child, then assign
//! fresh ids. The plan is applied to both twins, so the 2D and 3D children
//! receive identical ids.

use std::collections::{BTreeMap, BTreeSet};

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::adjacency::{CutEdge, SplitEdgeMap};
use crate::cfg::FoldCfg;
use crate::error::{FoldError, Result};
use crate::face::{AnnotatedLine, AnnotatedPoint, Face};
use crate::geom::{distance_to_segment, perp_dot, point_on_segment, Point};
use crate::ids::{EdgeId, LineId, PointId};

/// Side of a directed fold line; `Left` is the counterclockwise side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn flip(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Recipe for one child face, in terms of parent point ids.
#[derive(Clone, Debug, PartialEq)]
pub struct ChildPlan {
    /// Parent point id of each child vertex, in polygon order.
    vertices: Vec<PointId>,
    /// `(child id, parent id, child edge)` for each kept annotation point.
    points: Vec<(PointId, PointId, Option<EdgeId>)>,
    lines: Vec<(LineId, AnnotatedLine)>,
}

impl ChildPlan {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn parent_vertices(&self) -> &[PointId] {
        &self.vertices
    }

    fn build<const D: usize>(&self, parent: &Face<D>) -> Result<Face<D>> {
        let coords = |id: PointId| {
            parent
                .coords(id)
                .ok_or_else(|| FoldError::invariant(format!("split source {id} vanished")))
        };
        let vertices = self
            .vertices
            .iter()
            .map(|id| coords(*id))
            .collect::<Result<Vec<_>>>()?;
        let points = self
            .points
            .iter()
            .map(|(new, old, edge)| {
                Ok((
                    *new,
                    AnnotatedPoint {
                        point: Point::annotation(coords(*old)?),
                        edge: *edge,
                    },
                ))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;
        Face::from_parts(vertices, points, self.lines.iter().copied().collect())
    }
}

/// Parent-to-child id maps of one split.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitMaps {
    pub left_points: BTreeMap<PointId, PointId>,
    pub right_points: BTreeMap<PointId, PointId>,
    pub left_lines: BTreeMap<LineId, LineId>,
    pub right_lines: BTreeMap<LineId, LineId>,
    pub edges: SplitEdgeMap,
    /// Annotation points on the fold line with no surviving line.
    pub discarded_points: Vec<PointId>,
    /// Lines collinear with the fold line.
    pub discarded_lines: Vec<LineId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SplitPlan {
    pub left: ChildPlan,
    pub right: ChildPlan,
    pub maps: SplitMaps,
    /// Fold points in traversal order; the left side is taken relative to `first -> second`.
    pub first: PointId,
    pub second: PointId,
}

impl SplitPlan {
    /// Build `(left, right)` children of either twin of the planned face.
    pub fn apply<const D: usize>(&self, parent: &Face<D>) -> Result<(Face<D>, Face<D>)> {
        Ok((self.left.build(parent)?, self.right.build(parent)?))
    }

    /// Side of the directed line `from -> to` that the plan calls `side`.
    pub fn side_for(&self, from: PointId, side: Side) -> Side {
        if from == self.first {
            side
        } else {
            side.flip()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Class {
    Side(Side),
    /// One of the two fold points.
    Fold,
    /// An annotation lying on the fold line, not yet assigned.
    OnLine,
}

fn cmp_position(a: (usize, f64), b: (usize, f64)) -> std::cmp::Ordering {
    a.0.cmp(&b.0).then(a.1.total_cmp(&b.1))
}

/// Plan the split of `face` along the line through boundary points `p` and `q`.
pub fn plan_split(face: &Face<2>, p: PointId, q: PointId, cfg: &FoldCfg) -> Result<SplitPlan> {
    let eps = cfg.coplanar_eps;
    if p == q {
        return Err(FoldError::invalid(format!("fold points must differ (both {p})")));
    }
    for id in [p, q] {
        if !face.contains_point(id) {
            return Err(FoldError::not_found(format!("{id} is not on this face")));
        }
    }
    if let Some(l) = face.find_line(p, q) {
        return Err(FoldError::conflict(format!("{l} already joins {p} and {q}")));
    }
    let position = |id: PointId| {
        face.traversal_position(id)
            .ok_or_else(|| FoldError::invalid(format!("{id} is not on the face boundary")))
    };
    let (pos_p, pos_q) = (position(p)?, position(q)?);
    let ((first, pos_first), (second, pos_second)) = match cmp_position(pos_p, pos_q) {
        std::cmp::Ordering::Less => ((p, pos_p), (q, pos_q)),
        std::cmp::Ordering::Greater => ((q, pos_q), (p, pos_p)),
        std::cmp::Ordering::Equal => {
            return Err(FoldError::invalid(format!("{p} and {q} coincide")));
        }
    };
    let coords = |id: PointId| {
        face.coords(id)
            .ok_or_else(|| FoldError::not_found(format!("{id} is not on this face")))
    };
    let (c_first, c_second) = (coords(first)?, coords(second)?);
    let dir = c_second - c_first;
    let len = dir.norm();
    if len <= eps {
        return Err(FoldError::invalid(format!("{first} and {second} coincide")));
    }
    tracing::debug!(%first, %second, "ordered fold points");

    // Cut the vertex cycle.
    let n = face.vertex_count();
    let strictly_before = |i: usize, pos: (usize, f64)| i < pos.0 || (i == pos.0 && pos.1 > 0.0);
    let mut child_a = vec![first];
    child_a.extend(
        (0..n)
            .filter(|&i| i > pos_first.0 && strictly_before(i, pos_second))
            .map(PointId),
    );
    child_a.push(second);
    let mut child_b = vec![second];
    child_b.extend((0..n).filter(|&i| i > pos_second.0).map(PointId));
    child_b.extend((0..n).filter(|&i| strictly_before(i, pos_first)).map(PointId));
    child_b.push(first);
    if child_a.len() < 3 || child_b.len() < 3 {
        return Err(FoldError::invalid(format!(
            "fold line {first}-{second} runs along the face boundary"
        )));
    }

    let signed = |x: &Vector2<f64>| perp_dot(dir, x - c_first) / len;
    let (_, witness) = child_a[1..child_a.len() - 1]
        .iter()
        .filter_map(|id| face.coords(*id))
        .map(|c| (signed(&c).abs(), signed(&c)))
        .fold((0.0, 0.0), |best, cur| if cur.0 > best.0 { cur } else { best });
    if witness.abs() <= eps {
        return Err(FoldError::invalid("no planar solution: child polygon is degenerate"));
    }
    let (left_src, right_src) = if witness > 0.0 {
        (child_a, child_b)
    } else {
        (child_b, child_a)
    };

    // Edge maps.
    let mut edges = SplitEdgeMap {
        fold: (EdgeId(left_src.len() - 1), EdgeId(right_src.len() - 1)),
        ..SplitEdgeMap::default()
    };
    let mut cut_pieces: BTreeMap<EdgeId, (Option<EdgeId>, Option<EdgeId>)> = BTreeMap::new();
    for (side, src) in [(Side::Left, &left_src), (Side::Right, &right_src)] {
        for k in 0..src.len() - 1 {
            let (from, to) = (src[k], src[k + 1]);
            let old = if face.is_vertex(from) {
                EdgeId(from.0)
            } else {
                face.points()
                    .get(&from)
                    .and_then(|ap| ap.edge)
                    .ok_or_else(|| FoldError::invariant(format!("fold point {from} lost its edge")))?
            };
            if face.is_vertex(from) && face.is_vertex(to) {
                match side {
                    Side::Left => edges.left.insert(old, EdgeId(k)),
                    Side::Right => edges.right.insert(old, EdgeId(k)),
                };
            } else {
                let slot = cut_pieces.entry(old).or_default();
                match side {
                    Side::Left => slot.0 = Some(EdgeId(k)),
                    Side::Right => slot.1 = Some(EdgeId(k)),
                }
            }
        }
    }
    for (old, pieces) in cut_pieces {
        match pieces {
            (Some(left), Some(right)) => edges.cut.push(CutEdge { old, left, right }),
            _ => {
                return Err(FoldError::invariant(format!(
                    "cut {old} has a piece in only one child"
                )));
            }
        }
    }

    // Classify annotations.
    let left_vertices: BTreeSet<PointId> = left_src.iter().copied().collect();
    let vertex_class = |id: PointId| {
        if id == first || id == second {
            Class::Fold
        } else if left_vertices.contains(&id) {
            Class::Side(Side::Left)
        } else {
            Class::Side(Side::Right)
        }
    };
    let piece_of = |src: &[PointId], k: EdgeId| -> Option<(Vector2<f64>, Vector2<f64>)> {
        Some((face.coords(src[k.0])?, face.coords(src[(k.0 + 1) % src.len()])?))
    };

    let mut class: BTreeMap<PointId, Class> = BTreeMap::new();
    let mut child_edge: BTreeMap<PointId, Option<EdgeId>> = BTreeMap::new();
    for (id, ap) in face.points() {
        if *id == first || *id == second {
            class.insert(*id, Class::Fold);
            continue;
        }
        let c = ap.point.coords;
        let d = signed(&c);
        if d.abs() <= eps && distance_to_segment(&c, &c_first, &c_second) <= eps {
            class.insert(*id, Class::OnLine);
            continue;
        }
        let (side, edge) = match ap.edge {
            Some(e) => {
                if let Some(k) = edges.left.get(&e) {
                    (Side::Left, Some(*k))
                } else if let Some(k) = edges.right.get(&e) {
                    (Side::Right, Some(*k))
                } else {
                    let cut = edges.cut.iter().find(|ce| ce.old == e).ok_or_else(|| {
                        FoldError::invariant(format!("{e} is in no split remap table"))
                    })?;
                    let on_left = piece_of(&left_src, cut.left)
                        .map_or(false, |(a, b)| point_on_segment(&c, &a, &b, eps));
                    if on_left {
                        (Side::Left, Some(cut.left))
                    } else {
                        (Side::Right, Some(cut.right))
                    }
                }
            }
            None if d > 0.0 => (Side::Left, None),
            None => (Side::Right, None),
        };
        class.insert(*id, Class::Side(side));
        child_edge.insert(*id, edge);
    }
    let class_of = |id: PointId, class: &BTreeMap<PointId, Class>| {
        if face.is_vertex(id) {
            vertex_class(id)
        } else {
            class.get(&id).copied().unwrap_or(Class::OnLine)
        }
    };

    // Collinear lines go first; on-line points take the side of their remaining lines.
    let mut discarded_lines = Vec::new();
    for (lid, l) in face.lines() {
        let on_fold = |c: Class| matches!(c, Class::Fold | Class::OnLine);
        if on_fold(class_of(l.start, &class)) && on_fold(class_of(l.end, &class)) {
            discarded_lines.push(*lid);
        }
    }
    let mut discarded_points = Vec::new();
    let on_line: Vec<PointId> = class
        .iter()
        .filter(|(_, c)| **c == Class::OnLine)
        .map(|(id, _)| *id)
        .collect();
    for id in on_line {
        let mut sides = BTreeSet::new();
        for (lid, l) in face.lines() {
            if !l.touches(id) || discarded_lines.contains(lid) {
                continue;
            }
            if let Class::Side(s) = class_of(l.other(id), &class) {
                sides.insert(s);
            }
        }
        let mut it = sides.iter();
        match (it.next(), it.next()) {
            (None, _) => {
                discarded_points.push(id);
                class.remove(&id);
            }
            (Some(&side), None) => {
                let fold_edge = match side {
                    Side::Left => edges.fold.0,
                    Side::Right => edges.fold.1,
                };
                class.insert(id, Class::Side(side));
                child_edge.insert(id, Some(fold_edge));
            }
            _ => {
                return Err(FoldError::conflict(format!(
                    "{id} lies on the fold line and is joined to both sides"
                )));
            }
        }
    }

    // Line sides.
    let mut line_side: BTreeMap<LineId, Side> = BTreeMap::new();
    for (lid, l) in face.lines() {
        if discarded_lines.contains(lid) {
            continue;
        }
        let ends = [class_of(l.start, &class), class_of(l.end, &class)];
        let sides: Vec<Side> = ends
            .iter()
            .filter_map(|c| match c {
                Class::Side(s) => Some(*s),
                _ => None,
            })
            .collect();
        match sides.as_slice() {
            [s] => {
                line_side.insert(*lid, *s);
            }
            [a, b] if a == b => {
                line_side.insert(*lid, *a);
            }
            [_, _] => {
                return Err(FoldError::conflict(format!("{lid} crosses the fold line")));
            }
            _ => {
                return Err(FoldError::invariant(format!("{lid} could not be classified")));
            }
        }
    }

    // Fresh ids.
    let mut maps = SplitMaps {
        edges,
        discarded_points,
        discarded_lines,
        ..SplitMaps::default()
    };
    let mut plans = Vec::with_capacity(2);
    for (side, src) in [(Side::Left, left_src), (Side::Right, right_src)] {
        let mut point_map: BTreeMap<PointId, PointId> = src
            .iter()
            .enumerate()
            .map(|(k, old)| (*old, PointId(k)))
            .collect();
        let mut points = Vec::new();
        let mut next = src.len();
        for (id, c) in &class {
            if *c != Class::Side(side) {
                continue;
            }
            let new = PointId(next);
            next += 1;
            point_map.insert(*id, new);
            points.push((new, *id, child_edge.get(id).copied().flatten()));
        }
        let mut line_map = BTreeMap::new();
        let mut lines = Vec::new();
        for (lid, l) in face.lines() {
            if line_side.get(lid) != Some(&side) {
                continue;
            }
            let (Some(start), Some(end)) = (point_map.get(&l.start), point_map.get(&l.end)) else {
                return Err(FoldError::invariant(format!("{lid} lost an endpoint in the split")));
            };
            let new = LineId(lines.len());
            line_map.insert(*lid, new);
            lines.push((new, AnnotatedLine { start: *start, end: *end }));
        }
        match side {
            Side::Left => {
                maps.left_points = point_map;
                maps.left_lines = line_map;
            }
            Side::Right => {
                maps.right_points = point_map;
                maps.right_lines = line_map;
            }
        }
        plans.push(ChildPlan { vertices: src, points, lines });
    }
    let right = plans.pop().ok_or_else(|| FoldError::invariant("split produced no right child"))?;
    let left = plans.pop().ok_or_else(|| FoldError::invariant("split produced no left child"))?;
    tracing::debug!(
        left_vertices = left.vertex_count(),
        right_vertices = right.vertex_count(),
        left_points = left.points.len(),
        right_points = right.points.len(),
        discarded_points = maps.discarded_points.len(),
        discarded_lines = maps.discarded_lines.len(),
        "planned split"
    );
    Ok(SplitPlan {
        left,
        right,
        maps,
        first,
        second,
    })
}
