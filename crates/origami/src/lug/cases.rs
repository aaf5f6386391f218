use serde::{Deserialize, Serialize};

use crate::error::{FoldError, Result};

/// Where a dihedral angle sits in the 0/180/360 stability model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stability {
    /// 0 or 360: folded flat against a neighbour.
    Closed,
    /// 180: flat, unfolded.
    Flat,
    Unstable,
}

impl Stability {
    pub fn of(angle: f64, eps: f64) -> Result<Self> {
        if !angle.is_finite() || angle < -eps || angle > 360.0 + eps {
            return Err(FoldError::invalid(format!(
                "fold angle {angle} is outside [0, 360]"
            )));
        }
        Ok(if angle.abs() <= eps || (angle - 360.0).abs() <= eps {
            Self::Closed
        } else if (angle - 180.0).abs() <= eps {
            Self::Flat
        } else {
            Self::Unstable
        })
    }
}

/// The eight fold cases, classified by `(start, end)` angle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FoldCase {
    CompleteSplit,
    CompleteMerge,
    PartialSplit,
    ResolvedMerge,
    CompleteAlign,
    PartialAlign,
    ResolvedAlign,
    AdjustedAlign,
}

impl FoldCase {
    pub fn classify(start: f64, end: f64, eps: f64) -> Result<Self> {
        use Stability::*;
        Ok(match (Stability::of(start, eps)?, Stability::of(end, eps)?) {
            (Flat, Closed) => Self::CompleteSplit,
            (Closed, Flat) => Self::CompleteMerge,
            (Flat, Unstable) => Self::PartialSplit,
            (Unstable, Flat) => Self::ResolvedMerge,
            (Closed, Closed) => Self::CompleteAlign,
            (Closed, Unstable) => Self::PartialAlign,
            (Unstable, Closed) => Self::ResolvedAlign,
            (Unstable, Unstable) => Self::AdjustedAlign,
            (Flat, Flat) => {
                return Err(FoldError::invalid(
                    "a flat-to-flat fold is outside the eight-case table",
                ));
            }
        })
    }

    /// Cases that create or destroy faces.
    pub fn mutates_faces(self) -> bool {
        matches!(
            self,
            Self::CompleteSplit | Self::PartialSplit | Self::CompleteMerge | Self::ResolvedMerge
        )
    }

    pub fn is_split(self) -> bool {
        matches!(self, Self::CompleteSplit | Self::PartialSplit)
    }

    pub fn is_merge(self) -> bool {
        matches!(self, Self::CompleteMerge | Self::ResolvedMerge)
    }

    /// Whether the moving part ends up stacked on the anchor's component.
    pub fn stacks(self) -> bool {
        matches!(
            self,
            Self::CompleteSplit | Self::CompleteAlign | Self::ResolvedAlign
        )
    }
}
