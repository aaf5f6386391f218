//! The owning context object for one sheet of paper.
//!
//! Purpose
//! - Hold the face table, adjacency graph and layer stack together, and
//!   expose every core operation as a method taking already-resolved ids.
//!
//! Why this design
//! - One writer, no globals: tests build a fresh store per case.
//! - Copy-then-swap: each mutating call works on a clone of `PaperState`,
//!   checks cross-structure invariants, and only then replaces the live
//!   state. A rejected call leaves no partial edit behind.

mod report;
mod state;

pub use report::FoldReport;
pub use state::PaperState;

use std::collections::{BTreeMap, BTreeSet};

use nalgebra::{Vector2, Vector3};

use crate::adjacency::ProblemEdge;
use crate::cfg::FoldCfg;
use crate::error::{ErrorKind, FoldError, Result};
use crate::face::{AnnotationDelta, FaceTwin, LineRecord};
use crate::fold::{self, MergeReport, SplitReport};
use crate::geom::segments_overlap;
use crate::ids::{EdgeId, FaceEdge, FaceId, GroupId, LineId, PointId};
use crate::lug::{self, FaceGeometry, FoldCase, FoldRequest};
use crate::persist::{PersistError, PersistenceRecord, PersistenceSink};

#[derive(Clone, Debug, Default)]
pub struct PaperStore {
    cfg: FoldCfg,
    state: PaperState,
    pending: Vec<PersistenceRecord>,
}

impl PaperStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cfg(cfg: FoldCfg) -> Self {
        Self {
            cfg,
            ..Self::default()
        }
    }

    pub fn cfg(&self) -> &FoldCfg {
        &self.cfg
    }

    pub fn state(&self) -> &PaperState {
        &self.state
    }

    pub fn face(&self, id: FaceId) -> Result<&FaceTwin> {
        self.state.face(id)
    }

    pub fn face_ids(&self) -> Vec<FaceId> {
        self.state.faces.keys().copied().collect()
    }

    pub fn pending_records(&self) -> &[PersistenceRecord] {
        &self.pending
    }

    pub fn check_invariants(&self) -> Result<()> {
        self.state.check_invariants()
    }

    /// Run `op` on a clone of the state; swap it in only if it and the
    /// invariant check succeed.
    fn transact<T>(
        &mut self,
        what: &'static str,
        op: impl FnOnce(&mut PaperState, &FoldCfg, &mut Vec<PersistenceRecord>) -> Result<T>,
    ) -> Result<T> {
        let mut next = self.state.clone();
        let mut records = Vec::new();
        let out = op(&mut next, &self.cfg, &mut records).and_then(|out| {
            next.check_invariants()?;
            Ok(out)
        });
        match out {
            Ok(out) => {
                self.state = next;
                self.pending.extend(records);
                Ok(out)
            }
            Err(e) => {
                if e.kind() != ErrorKind::InvariantViolation {
                    tracing::warn!(op = what, error = %e, "rejected");
                }
                Err(e)
            }
        }
    }

    /// Add a flat (unfolded) face lying in the `z = 0` plane.
    pub fn add_face(&mut self, vertices: Vec<Vector2<f64>>) -> Result<FaceId> {
        self.add_face_twin(FaceTwin::flat(vertices)?)
    }

    pub fn add_face_folded(
        &mut self,
        planar: Vec<Vector2<f64>>,
        folded: Vec<Vector3<f64>>,
    ) -> Result<FaceId> {
        self.add_face_twin(FaceTwin::from_vertices(planar, folded)?)
    }

    pub fn add_face_twin(&mut self, twin: FaceTwin) -> Result<FaceId> {
        self.transact("add_face", |state, _, records| {
            let id = state.insert_face(twin)?;
            records.extend(face_records(state, id)?);
            tracing::info!(face = %id, "added face");
            Ok(id)
        })
    }

    /// Declare a physical joint between two faces whose planar edges overlap.
    pub fn connect(&mut self, a: FaceEdge, b: FaceEdge, angle: f64) -> Result<GroupId> {
        self.transact("connect", |state, cfg, _| {
            let seg = |fe: FaceEdge| {
                state.face(fe.face)?.planar.edge(fe.edge).ok_or_else(|| {
                    FoldError::invalid(format!("{} is not an edge of {}", fe.edge, fe.face))
                })
            };
            let ((a0, a1), (b0, b1)) = (seg(a)?, seg(b)?);
            if !segments_overlap(&a0, &a1, &b0, &b1, cfg.coplanar_eps) {
                return Err(FoldError::invalid(format!("{a} and {b} do not touch")));
            }
            state.adjacency.connect(a, b, angle, None)
        })
    }

    pub fn add_point(
        &mut self,
        face: FaceId,
        coords: Vector2<f64>,
        edge: Option<EdgeId>,
    ) -> Result<(PointId, AnnotationDelta)> {
        self.transact("add_point", |state, cfg, records| {
            let twin = state.face_mut(face)?;
            let id = twin.add_point(coords, edge, cfg.coplanar_eps)?;
            let point = twin
                .point_record(id)
                .ok_or_else(|| FoldError::invariant(format!("{id} vanished after insert")))?;
            let mut delta = AnnotationDelta::new(face);
            delta.points_added.push(point.clone());
            records.push(PersistenceRecord::AddPoint { face, point });
            Ok((id, delta))
        })
    }

    pub fn add_line(
        &mut self,
        face: FaceId,
        a: PointId,
        b: PointId,
    ) -> Result<(LineId, AnnotationDelta)> {
        self.transact("add_line", |state, _, records| {
            let id = state.face_mut(face)?.add_line(a, b)?;
            let line = LineRecord { id, start: a, end: b };
            let mut delta = AnnotationDelta::new(face);
            delta.lines_added.push(line);
            records.push(PersistenceRecord::AddLine { face, line });
            Ok((id, delta))
        })
    }

    /// Delete an annotation point and every line touching it.
    pub fn delete_point(&mut self, face: FaceId, id: PointId) -> Result<AnnotationDelta> {
        self.transact("delete_point", |state, _, records| {
            let lines = state.face_mut(face)?.remove_point(id)?;
            let mut delta = AnnotationDelta::new(face);
            for line in &lines {
                records.push(PersistenceRecord::DeleteLine { face, line: *line });
            }
            records.push(PersistenceRecord::DeletePoint { face, point: id });
            delta.points_removed.push(id);
            delta.lines_removed = lines;
            Ok(delta)
        })
    }

    pub fn delete_line(&mut self, face: FaceId, id: LineId) -> Result<AnnotationDelta> {
        self.transact("delete_line", |state, _, records| {
            state.face_mut(face)?.remove_line(id)?;
            let mut delta = AnnotationDelta::new(face);
            delta.lines_removed.push(id);
            records.push(PersistenceRecord::DeleteLine { face, line: id });
            Ok(delta)
        })
    }

    /// Split one face along `p -> q`; the children stay side by side in one layer.
    ///
    /// Nothing rotates here, so `angle` must be flat (180); use `fold` to
    /// split and move in one step.
    pub fn split_face(&mut self, face: FaceId, p: PointId, q: PointId, angle: f64) -> Result<FoldReport> {
        let before = self.state.clone();
        self.transact("split_face", |state, cfg, records| {
            if !is_flat(angle, cfg) {
                return Err(FoldError::invalid(format!(
                    "split_face leaves the children flat; {angle} is not 180"
                )));
            }
            let component = state.lug.component_of(face)?;
            let old_offsets = state.lug.normal_offsets(cfg);
            let report = fold::create_split_face(state, face, p, q, angle, None, cfg)?;
            let unresolved = state.resolve_pending(report.problems.clone(), cfg)?;
            let descendants = BTreeMap::from([(face, vec![report.left, report.right])]);
            let stationary: BTreeSet<FaceId> = state.faces.keys().copied().collect();
            state.lug.split(component, &descendants, &stationary)?;
            let ancestors = BTreeMap::from([(report.left, face), (report.right, face)]);
            let offsets = lug::offset_deltas(&old_offsets, &state.lug.normal_offsets(cfg), &ancestors);
            finish(&before, state, cfg, records, None, vec![report], Vec::new(), unresolved, offsets)
        })
    }

    /// Merge two coplanar faces across their shared edge. The joint must be flat.
    pub fn merge_faces(&mut self, a: FaceId, b: FaceId) -> Result<FoldReport> {
        let before = self.state.clone();
        self.transact("merge_faces", |state, cfg, records| {
            if let Some(entry) = state.adjacency.entry(a, b) {
                if !is_flat(entry.angle, cfg) {
                    return Err(FoldError::invalid(format!(
                        "joint {a}-{b} is at {}; unfold it before merging",
                        entry.angle
                    )));
                }
            }
            let (ca, cb) = (state.lug.component_of(a)?, state.lug.component_of(b)?);
            let old_offsets = state.lug.normal_offsets(cfg);
            let same_side = match (state.faces.principal_normal(a), state.faces.principal_normal(b)) {
                (Some(na), Some(nb)) => na.dot(&nb) > 0.0,
                _ => true,
            };
            let report = fold::merge_faces(state, a, b, &BTreeSet::new(), cfg)?;
            let unresolved = state.resolve_pending(report.problems.clone(), cfg)?;
            let descendants = BTreeMap::from([(a, vec![report.merged]), (b, vec![report.merged])]);
            if ca != cb {
                let oa = state.lug.orientation(a)?;
                let ob = state.lug.orientation(b)?;
                if (oa == ob) != same_side {
                    state.lug.invert(cb)?;
                }
            }
            state.lug.merge(ca, cb, &descendants)?;
            let ancestors = BTreeMap::from([(report.merged, a)]);
            let offsets = lug::offset_deltas(&old_offsets, &state.lug.normal_offsets(cfg), &ancestors);
            finish(&before, state, cfg, records, None, Vec::new(), vec![report], unresolved, offsets)
        })
    }

    /// Classify and run one fold request.
    pub fn fold(&mut self, req: &FoldRequest) -> Result<FoldReport> {
        let case = FoldCase::classify(req.start, req.end, self.cfg.stable_angle_eps)?;
        tracing::debug!(?case, start = req.start, end = req.end, "classified fold");
        let before = self.state.clone();
        self.transact("fold", |state, cfg, records| {
            let outcome = if case.mutates_faces() {
                lug::face_mutating_fold(state, req, case, cfg)?
            } else {
                lug::align_fold(state, req, case, cfg)?
            };
            finish(
                &before,
                state,
                cfg,
                records,
                Some(case),
                outcome.splits,
                outcome.merges,
                outcome.unresolved,
                outcome.offsets,
            )
        })
    }

    /// Drain the pending records through `sink`. On failure nothing changes.
    pub fn flush(&mut self, sink: &mut impl PersistenceSink) -> std::result::Result<usize, PersistError> {
        if self.pending.is_empty() {
            return Ok(0);
        }
        match sink.submit(&self.pending) {
            Ok(()) => {
                let n = self.pending.len();
                self.pending.clear();
                tracing::debug!(records = n, "flushed");
                Ok(n)
            }
            Err(message) => {
                tracing::warn!(%message, pending = self.pending.len(), "persistence failed; keeping local state");
                Err(PersistError {
                    message,
                    pending: self.pending.len(),
                })
            }
        }
    }
}

fn is_flat(angle: f64, cfg: &FoldCfg) -> bool {
    (angle - 180.0).abs() <= cfg.stable_angle_eps.max(1e-9)
}

fn face_records(state: &PaperState, id: FaceId) -> Result<Vec<PersistenceRecord>> {
    let twin = state.face(id)?;
    let mut out = vec![PersistenceRecord::AddFace {
        face: id,
        planar: twin.planar.vertex_coords().iter().map(|v| [v.x, v.y]).collect(),
        folded: twin.folded.vertex_coords().iter().map(|v| [v.x, v.y, v.z]).collect(),
    }];
    let snap = twin.snapshot(id);
    out.extend(
        snap.points_added
            .into_iter()
            .map(|point| PersistenceRecord::AddPoint { face: id, point }),
    );
    out.extend(
        snap.lines_added
            .into_iter()
            .map(|line| PersistenceRecord::AddLine { face: id, line }),
    );
    Ok(out)
}

/// Package created/removed faces, annotation deltas and records for a committed fold.
#[allow(clippy::too_many_arguments)]
fn finish(
    before: &PaperState,
    state: &PaperState,
    cfg: &FoldCfg,
    records: &mut Vec<PersistenceRecord>,
    case: Option<FoldCase>,
    splits: Vec<SplitReport>,
    merges: Vec<MergeReport>,
    unresolved: Vec<ProblemEdge>,
    offsets: BTreeMap<FaceId, f64>,
) -> Result<FoldReport> {
    let removed: Vec<FaceId> = before
        .faces
        .keys()
        .copied()
        .filter(|f| !state.faces.contains_key(f))
        .collect();
    let created: Vec<FaceId> = state
        .faces
        .keys()
        .copied()
        .filter(|f| !before.faces.contains_key(f))
        .collect();
    let layer_offsets = state.lug.normal_offsets(cfg);

    let mut annotations = Vec::new();
    for f in &removed {
        let delta = before.face(*f)?.teardown(*f);
        if !delta.is_empty() {
            annotations.push(delta);
        }
        records.push(PersistenceRecord::DeleteFace { face: *f });
    }
    let mut descriptors = Vec::with_capacity(created.len());
    for f in &created {
        let twin = state.face(*f)?;
        descriptors.push(twin.descriptor(*f, cfg, layer_offsets.get(f).copied().unwrap_or(0.0)));
        let delta = twin.snapshot(*f);
        if !delta.is_empty() {
            annotations.push(delta);
        }
        records.extend(face_records(state, *f)?);
    }
    Ok(FoldReport {
        case,
        created: descriptors,
        removed,
        annotations,
        offsets,
        splits,
        merges,
        unresolved,
    })
}
