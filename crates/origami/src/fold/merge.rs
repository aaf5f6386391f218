//! Merge planning: join two faces across their shared seam edge.
//!
//! The merged cycle walks face `a` from just past the seam all the way round,
//! then face `b` from just past the seam. Seam endpoints are kept unless the
//! boundary runs straight through them; a dropped endpoint survives as an
//! annotation point on the merged edge.

use std::collections::{BTreeMap, BTreeSet};

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::adjacency::MergeEdgeMap;
use crate::cfg::FoldCfg;
use crate::error::{FoldError, Result};
use crate::face::{AnnotatedLine, AnnotatedPoint, Face};
use crate::geom::Point;
use crate::ids::{EdgeId, LineId, PointId};

/// Which parent a merged point comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MergeSource {
    A(PointId),
    B(PointId),
}

/// Parent-to-merged id maps of one merge.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeMaps {
    pub a_points: BTreeMap<PointId, PointId>,
    pub b_points: BTreeMap<PointId, PointId>,
    pub a_lines: BTreeMap<LineId, LineId>,
    pub b_lines: BTreeMap<LineId, LineId>,
    pub edges: MergeEdgeMap,
    /// Seam endpoints (ids in `a`) dropped as straight continuations.
    pub dropped_endpoints: Vec<PointId>,
    /// Seam points of `b` folded onto an existing point.
    pub deduped_points: Vec<PointId>,
    /// Lines of `b` that became duplicates or degenerate.
    pub dropped_b_lines: Vec<LineId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MergePlan {
    vertices: Vec<MergeSource>,
    points: Vec<(PointId, MergeSource, Option<EdgeId>)>,
    lines: Vec<(LineId, AnnotatedLine)>,
    pub maps: MergeMaps,
}

impl MergePlan {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Build the merged face from either twin of the two parents.
    pub fn apply<const D: usize>(&self, a: &Face<D>, b: &Face<D>) -> Result<Face<D>> {
        let coords = |src: MergeSource| {
            let found = match src {
                MergeSource::A(id) => a.coords(id),
                MergeSource::B(id) => b.coords(id),
            };
            found.ok_or_else(|| FoldError::invariant(format!("merge source {src:?} vanished")))
        };
        let vertices = self
            .vertices
            .iter()
            .map(|s| coords(*s))
            .collect::<Result<Vec<_>>>()?;
        let points = self
            .points
            .iter()
            .map(|(id, src, edge)| {
                Ok((
                    *id,
                    AnnotatedPoint {
                        point: Point::annotation(coords(*src)?),
                        edge: *edge,
                    },
                ))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;
        Face::from_parts(vertices, points, self.lines.iter().copied().collect())
    }
}

/// Plan the merge of `a` and `b` across seam edges `ea` (of `a`) and `eb` (of `b`).
pub fn plan_merge(
    a: &Face<2>,
    ea: EdgeId,
    b: &Face<2>,
    eb: EdgeId,
    cfg: &FoldCfg,
) -> Result<MergePlan> {
    let eps = cfg.coplanar_eps;
    let (na, nb) = (a.vertex_count(), b.vertex_count());
    let (a0, a1) = a
        .edge(ea)
        .ok_or_else(|| FoldError::invalid(format!("{ea} is not an edge of the first face")))?;
    let (b0, b1) = b
        .edge(eb)
        .ok_or_else(|| FoldError::invalid(format!("{eb} is not an edge of the second face")))?;
    if (a0 - b1).norm() > eps || (a1 - b0).norm() > eps {
        return Err(FoldError::invalid("seam endpoints of the two faces do not line up"));
    }
    let x = PointId(ea.0);
    let y = PointId((ea.0 + 1) % na);

    // Full cycle: y .. x along `a`, then `b` past the seam.
    let mut cycle: Vec<MergeSource> = (1..=na)
        .map(|k| MergeSource::A(PointId((ea.0 + k) % na)))
        .collect();
    cycle.extend((2..nb).map(|k| MergeSource::B(PointId((eb.0 + k) % nb))));
    let at = |src: MergeSource| -> Vector2<f64> {
        match src {
            MergeSource::A(id) => a.coords(id),
            MergeSource::B(id) => b.coords(id),
        }
        .unwrap_or_else(Vector2::zeros)
    };
    let len = cycle.len();
    let straight = |i: usize| {
        let c = at(cycle[i]);
        let prev = at(cycle[(i + len - 1) % len]) - c;
        let next = at(cycle[(i + 1) % len]) - c;
        match (prev.try_normalize(f64::EPSILON), next.try_normalize(f64::EPSILON)) {
            (Some(u), Some(v)) => u.dot(&v) <= cfg.straight_cos_threshold,
            _ => true,
        }
    };
    let drop_y = straight(0);
    let drop_x = straight(na - 1);
    let keep = |i: usize| !((i == 0 && drop_y) || (i == na - 1 && drop_x));
    let vertices: Vec<MergeSource> = (0..len).filter(|&i| keep(i)).map(|i| cycle[i]).collect();
    if vertices.len() < 3 {
        return Err(FoldError::invalid("merged polygon would have fewer than 3 vertices"));
    }

    // Merged edge that starts at (or runs through) cycle position `i`.
    let mut edge_at = vec![0usize; len];
    {
        let first_kept = (0..len).find(|&i| keep(i)).unwrap_or(0);
        let mut last = vertices.len() - 1;
        let mut idx = 0usize;
        for step in 0..len {
            let i = (first_kept + step) % len;
            if keep(i) {
                last = idx;
                idx += 1;
            }
            edge_at[i] = last;
        }
    }
    let cycle_index: BTreeMap<MergeSource, usize> =
        cycle.iter().enumerate().map(|(i, s)| (*s, i)).collect();
    let merged_edge = |src: MergeSource| cycle_index.get(&src).map(|i| EdgeId(edge_at[*i]));

    // B seam endpoints stand for A's.
    let canon_b = |id: PointId| {
        if id.0 == (eb.0 + 1) % nb {
            MergeSource::A(x)
        } else if id.0 == eb.0 {
            MergeSource::A(y)
        } else {
            MergeSource::B(id)
        }
    };
    let eb_start = PointId(eb.0);

    let mut edges = MergeEdgeMap::default();
    for k in (0..na).filter(|k| *k != ea.0) {
        if let Some(e) = merged_edge(MergeSource::A(PointId(k))) {
            edges.a.insert(EdgeId(k), e);
        }
    }
    for k in (0..nb).filter(|k| *k != eb.0) {
        if let Some(e) = merged_edge(canon_b(PointId(k))) {
            edges.b.insert(EdgeId(k), e);
        }
    }

    let mut maps = MergeMaps {
        edges,
        ..MergeMaps::default()
    };
    let mut vertex_ids: BTreeMap<MergeSource, PointId> = vertices
        .iter()
        .enumerate()
        .map(|(i, s)| (*s, PointId(i)))
        .collect();
    let mut points: Vec<(PointId, MergeSource, Option<EdgeId>)> = Vec::new();
    let mut next = vertices.len();
    for (dropped, id, pos) in [(drop_x, x, na - 1), (drop_y, y, 0)] {
        if dropped {
            let new = PointId(next);
            next += 1;
            vertex_ids.insert(MergeSource::A(id), new);
            points.push((new, MergeSource::A(id), Some(EdgeId(edge_at[pos]))));
            maps.dropped_endpoints.push(id);
        }
    }
    for k in 0..na {
        if let Some(new) = vertex_ids.get(&MergeSource::A(PointId(k))) {
            maps.a_points.insert(PointId(k), *new);
        }
    }
    for k in 0..nb {
        if PointId(k) == eb_start || k == (eb.0 + 1) % nb {
            if let Some(new) = vertex_ids.get(&canon_b(PointId(k))) {
                maps.b_points.insert(PointId(k), *new);
            }
        } else if let Some(new) = vertex_ids.get(&MergeSource::B(PointId(k))) {
            maps.b_points.insert(PointId(k), *new);
        }
    }

    // Annotations of `a`: seam points become interior.
    let mut seam_targets: Vec<(Vector2<f64>, PointId)> = [x, y]
        .iter()
        .filter_map(|id| Some((a.coords(*id)?, *maps.a_points.get(id)?)))
        .collect();
    for (id, ap) in a.points() {
        let new = PointId(next);
        next += 1;
        let edge = match ap.edge {
            Some(e) if e == ea => {
                seam_targets.push((ap.point.coords, new));
                None
            }
            Some(e) => maps.edges.a.get(&e).copied(),
            None => None,
        };
        maps.a_points.insert(*id, new);
        points.push((new, MergeSource::A(*id), edge));
    }
    // Annotations of `b`: seam points dedup against `a`'s seam points.
    for (id, ap) in b.points() {
        let edge = match ap.edge {
            Some(e) if e == eb => {
                let near = seam_targets
                    .iter()
                    .map(|(c, target)| ((c - ap.point.coords).norm(), *target))
                    .filter(|(d, _)| *d <= cfg.merge_dedup_dist)
                    .min_by(|l, r| l.0.total_cmp(&r.0));
                if let Some((_, target)) = near {
                    maps.b_points.insert(*id, target);
                    maps.deduped_points.push(*id);
                    continue;
                }
                None
            }
            Some(e) => maps.edges.b.get(&e).copied(),
            None => None,
        };
        let new = PointId(next);
        next += 1;
        maps.b_points.insert(*id, new);
        points.push((new, MergeSource::B(*id), edge));
    }

    // Lines: `a` first, then `b` minus duplicates and degenerate ones.
    let mut lines: Vec<(LineId, AnnotatedLine)> = Vec::new();
    let mut joined: BTreeSet<(PointId, PointId)> = BTreeSet::new();
    let key = |s: PointId, e: PointId| if s <= e { (s, e) } else { (e, s) };
    for (from_a, parent) in [(true, a), (false, b)] {
        let point_map = if from_a { &maps.a_points } else { &maps.b_points };
        let mut line_map = BTreeMap::new();
        let mut dropped = Vec::new();
        for (lid, l) in parent.lines() {
            let (Some(s), Some(e)) = (point_map.get(&l.start), point_map.get(&l.end)) else {
                return Err(FoldError::invariant(format!("{lid} lost an endpoint in the merge")));
            };
            if s == e || !joined.insert(key(*s, *e)) {
                dropped.push(*lid);
                continue;
            }
            let new = LineId(lines.len());
            line_map.insert(*lid, new);
            lines.push((new, AnnotatedLine { start: *s, end: *e }));
        }
        if from_a {
            maps.a_lines = line_map;
        } else {
            maps.b_lines = line_map;
            maps.dropped_b_lines = dropped;
        }
    }

    tracing::debug!(
        vertices = vertices.len(),
        dropped_endpoints = maps.dropped_endpoints.len(),
        deduped = maps.deduped_points.len(),
        "planned merge"
    );
    Ok(MergePlan {
        vertices,
        points,
        lines,
        maps,
    })
}
