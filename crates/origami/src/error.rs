//! Error taxonomy shared by every core operation.
//!
//! `NotFound`, `InvalidArgument` and `Conflict` are recoverable: the operation
//! returns before touching any registry. `InvariantViolation` signals a bug in
//! the bookkeeping; it aborts the current fold and is logged with context.

use thiserror::Error;

/// Discriminant of [`FoldError`], for callers that branch on the failure class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    InvalidArgument,
    Conflict,
    InvariantViolation,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FoldError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl FoldError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::InvariantViolation(_) => ErrorKind::InvariantViolation,
        }
    }

    /// Short message naming the failed precondition, without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(m)
            | Self::InvalidArgument(m)
            | Self::Conflict(m)
            | Self::InvariantViolation(m) => m,
        }
    }

    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument(reason.into())
    }

    pub(crate) fn conflict(reason: impl Into<String>) -> Self {
        Self::Conflict(reason.into())
    }

    /// Build an invariant violation and log it with the full context string.
    pub(crate) fn invariant(context: impl Into<String>) -> Self {
        let context = context.into();
        tracing::error!(%context, "invariant violation");
        Self::InvariantViolation(context)
    }
}

pub type Result<T> = std::result::Result<T, FoldError>;
