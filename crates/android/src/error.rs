//! Terminal failures of the descriptor pipeline

use apkforge_core::validation::Violation;
use thiserror::Error;

/// Why a descriptor could not be resolved
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Structural or parse failure in the input
    #[error("malformed descriptor at `{path}`: {reason}")]
    MalformedDescriptor { path: String, reason: String },

    /// Well-formed but semantically invalid descriptor
    #[error("constraint violation ({rule}): {detail}")]
    ConstraintViolation { rule: String, detail: String },

    /// Unresolvable dependency version ambiguity
    #[error("version conflict for {coordinate}: {detail}")]
    VersionConflict { coordinate: String, detail: String },
}

impl ResolveError {
    pub(crate) fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedDescriptor {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn conflict(coordinate: impl ToString, detail: impl Into<String>) -> Self {
        Self::VersionConflict {
            coordinate: coordinate.to_string(),
            detail: detail.into(),
        }
    }

    /// Name of the violated rule, for constraint violations
    pub fn rule(&self) -> Option<&str> {
        match self {
            Self::ConstraintViolation { rule, .. } => Some(rule),
            _ => None,
        }
    }
}

impl From<Violation> for ResolveError {
    fn from(violation: Violation) -> Self {
        Self::ConstraintViolation {
            rule: violation.rule,
            detail: violation.message,
        }
    }
}

impl From<ResolveError> for apkforge_core::Error {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::MalformedDescriptor { path, reason } => Self::malformed(path, reason),
            ResolveError::ConstraintViolation { rule, detail } => {
                Self::constraint_violation(&rule, detail)
            }
            ResolveError::VersionConflict { coordinate, detail } => {
                Self::version_conflict(coordinate, detail)
            }
        }
    }
}

/// Result type for pipeline stages
pub type Result<T> = std::result::Result<T, ResolveError>;
