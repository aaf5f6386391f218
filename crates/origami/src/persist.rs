//! Persistence records and the sink seam.
//!
//! The core performs no I/O. Every committed edit queues records; a caller
//! drains them through a `PersistenceSink`. Local state is authoritative: a
//! failed submit leaves the queue and the paper untouched.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::face::{LineRecord, PointRecord};
use crate::ids::{FaceId, LineId, PointId};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PersistenceRecord {
    AddFace {
        face: FaceId,
        planar: Vec<[f64; 2]>,
        folded: Vec<[f64; 3]>,
    },
    DeleteFace {
        face: FaceId,
    },
    AddPoint {
        face: FaceId,
        point: PointRecord,
    },
    DeletePoint {
        face: FaceId,
        point: PointId,
    },
    AddLine {
        face: FaceId,
        line: LineRecord,
    },
    DeleteLine {
        face: FaceId,
        line: LineId,
    },
}

impl PersistenceRecord {
    pub fn face(&self) -> FaceId {
        match self {
            Self::AddFace { face, .. }
            | Self::DeleteFace { face }
            | Self::AddPoint { face, .. }
            | Self::DeletePoint { face, .. }
            | Self::AddLine { face, .. }
            | Self::DeleteLine { face, .. } => *face,
        }
    }
}

/// Transport for persistence records, implemented outside the core.
pub trait PersistenceSink {
    fn submit(&mut self, records: &[PersistenceRecord]) -> std::result::Result<(), String>;
}

impl PersistenceSink for Vec<PersistenceRecord> {
    fn submit(&mut self, records: &[PersistenceRecord]) -> std::result::Result<(), String> {
        self.extend_from_slice(records);
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("persistence failed ({pending} records kept): {message}")]
pub struct PersistError {
    pub message: String,
    pub pending: usize,
}
