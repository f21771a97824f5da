// ABOUTME: Caller-facing error taxonomy for review workflow operations
// ABOUTME: Every failed operation surfaces exactly one of these variants

use thiserror::Error;

use crate::types::WorkflowAction;
use crate::validation::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReviewError {
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Action '{action}' not permitted: {reason}")]
    ActionNotPermitted {
        action: WorkflowAction,
        reason: String,
    },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Backing store unreachable: {0}")]
    Unreachable(String),
}

pub type ReviewResult<T> = Result<T, ReviewError>;

impl ReviewError {
    pub fn not_permitted(action: WorkflowAction, reason: impl Into<String>) -> Self {
        ReviewError::ActionNotPermitted {
            action,
            reason: reason.into(),
        }
    }

    /// Whether the caller may retry after re-reading the request
    pub fn is_retryable(&self) -> bool {
        matches!(self, ReviewError::Conflict(_) | ReviewError::Unreachable(_))
    }

    pub fn is_not_permitted(&self) -> bool {
        matches!(self, ReviewError::ActionNotPermitted { .. })
    }
}

impl From<ValidationError> for ReviewError {
    fn from(err: ValidationError) -> Self {
        ReviewError::ValidationFailed(err.to_string())
    }
}
