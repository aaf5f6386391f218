//! JSON fold scripts: a list of store operations replayed in order.

use anyhow::{Context, Result};
use origami::face::AnnotationDelta;
use origami::ids::{EdgeId, FaceEdge, FaceId, GroupId, LineId, PointId};
use origami::lug::FoldRequest;
use origami::prelude::Vec2;
use origami::{FoldCfg, FoldReport, PaperStore};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Script {
    /// Overrides for the default tolerances.
    #[serde(default)]
    pub cfg: Option<FoldCfg>,
    pub steps: Vec<Step>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    AddFace {
        vertices: Vec<[f64; 2]>,
    },
    AddPoint {
        face: FaceId,
        at: [f64; 2],
        #[serde(default)]
        edge: Option<EdgeId>,
    },
    AddLine {
        face: FaceId,
        a: PointId,
        b: PointId,
    },
    DeletePoint {
        face: FaceId,
        point: PointId,
    },
    DeleteLine {
        face: FaceId,
        line: LineId,
    },
    Connect {
        a: FaceEdge,
        b: FaceEdge,
        angle: f64,
    },
    Split {
        face: FaceId,
        p: PointId,
        q: PointId,
        angle: f64,
    },
    Merge {
        a: FaceId,
        b: FaceId,
    },
    Fold {
        request: FoldRequest,
    },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum StepOutcome {
    Face { face: FaceId },
    Point { point: PointId, delta: AnnotationDelta },
    Line { line: LineId, delta: AnnotationDelta },
    Delta { delta: AnnotationDelta },
    Group { group: GroupId },
    Fold { report: FoldReport },
}

pub fn load(path: &Path) -> Result<Script> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("decoding script {}", path.display()))
}

impl Script {
    pub fn store(&self) -> PaperStore {
        self.cfg.map_or_else(PaperStore::new, PaperStore::with_cfg)
    }
}

/// Apply every step to `store`; stops at the first rejected step.
pub fn replay(store: &mut PaperStore, steps: &[Step]) -> Result<Vec<StepOutcome>> {
    let mut out = Vec::with_capacity(steps.len());
    for (i, step) in steps.iter().enumerate() {
        let outcome = apply(store, step).with_context(|| format!("step {i} ({})", step.name()))?;
        tracing::debug!(step = i, op = step.name(), "applied");
        out.push(outcome);
    }
    Ok(out)
}

fn apply(store: &mut PaperStore, step: &Step) -> origami::Result<StepOutcome> {
    let v2 = |p: &[f64; 2]| Vec2::new(p[0], p[1]);
    Ok(match step {
        Step::AddFace { vertices } => StepOutcome::Face {
            face: store.add_face(vertices.iter().map(v2).collect())?,
        },
        Step::AddPoint { face, at, edge } => {
            let (point, delta) = store.add_point(*face, v2(at), *edge)?;
            StepOutcome::Point { point, delta }
        }
        Step::AddLine { face, a, b } => {
            let (line, delta) = store.add_line(*face, *a, *b)?;
            StepOutcome::Line { line, delta }
        }
        Step::DeletePoint { face, point } => StepOutcome::Delta {
            delta: store.delete_point(*face, *point)?,
        },
        Step::DeleteLine { face, line } => StepOutcome::Delta {
            delta: store.delete_line(*face, *line)?,
        },
        Step::Connect { a, b, angle } => StepOutcome::Group {
            group: store.connect(*a, *b, *angle)?,
        },
        Step::Split { face, p, q, angle } => StepOutcome::Fold {
            report: store.split_face(*face, *p, *q, *angle)?,
        },
        Step::Merge { a, b } => StepOutcome::Fold {
            report: store.merge_faces(*a, *b)?,
        },
        Step::Fold { request } => StepOutcome::Fold {
            report: store.fold(request)?,
        },
    })
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Step::AddFace { .. } => "add_face",
            Step::AddPoint { .. } => "add_point",
            Step::AddLine { .. } => "add_line",
            Step::DeletePoint { .. } => "delete_point",
            Step::DeleteLine { .. } => "delete_line",
            Step::Connect { .. } => "connect",
            Step::Split { .. } => "split",
            Step::Merge { .. } => "merge",
            Step::Fold { .. } => "fold",
        }
    }
}
