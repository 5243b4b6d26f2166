// crates/core/src/error.rs
use thiserror::Error;

use crate::run_state::{ControlRequest, RunStatus};
use crate::table::TableId;

/// Errors raised when ingesting tabular data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("failed to parse CSV input: {0}")]
    Csv(String),

    #[error("CSV input has no header row")]
    MissingHeader,

    #[error("duplicate field name: {0}")]
    DuplicateField(String),

    #[error("field names must not be empty")]
    EmptyFieldName,
}

/// Template-configuration validation failures. Rejected before any run
/// starts; these never touch run state or the run log.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("at least one template configuration is required")]
    NoConfigs,

    #[error("output field name must not be empty")]
    EmptyOutputName,

    #[error("output field name '{0}' collides with an existing table field")]
    OutputNameTaken(String),

    #[error("output field name '{0}' is used by more than one template")]
    DuplicateOutputName(String),

    #[error("output field name '{0}' contains a comma, quote, or newline")]
    UnsafeOutputName(String),

    #[error("template references unknown field '{0}'")]
    UnknownField(String),
}

/// Errors from the table store boundary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("table {0} not found")]
    TableNotFound(TableId),
}

/// An external control request that is not legal from the current status.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot {request} while {from}")]
pub struct TransitionError {
    pub from: RunStatus,
    pub request: ControlRequest,
}

/// Errors from the external control operations (start/pause/resume/stop).
#[derive(Debug, Error)]
pub enum ControlError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),
}

/// Terminal failures of an enrichment run.
///
/// Per-cell failures and rate limiting are not errors at this level: the
/// engine records sentinels or pauses and returns normally. Only credential
/// rejection and unclassified failures surface here, after run state and the
/// run log have been updated.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("generation service rejected credentials: {0}")]
    Auth(String),

    #[error("enrichment run failed: {0}")]
    Internal(String),
}

/// Errors from the table enrichment exporter.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to serialize table: {0}")]
    Csv(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_error_display() {
        let err = TransitionError {
            from: RunStatus::Idle,
            request: ControlRequest::Pause,
        };
        assert_eq!(err.to_string(), "cannot pause while idle");
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::TableNotFound(7);
        assert_eq!(err.to_string(), "table 7 not found");
    }

    #[test]
    fn test_run_error_from_store() {
        let err: RunError = StoreError::TableNotFound(1).into();
        assert!(matches!(err, RunError::Store(_)));
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::OutputNameTaken("age".into());
        assert!(err.to_string().contains("age"));
        assert!(err.to_string().contains("existing table field"));
    }
}
