// crates/core/src/run_state.rs
//! Run status state machine and live progress record.
//!
//! One `RunState` exists per table for the lifetime of the table. The engine
//! overwrites it in place as a run progresses; external control requests
//! (start/pause/resume/stop) are validated against the transition table
//! before they are applied.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TransitionError;

/// Status of a table's current (or most recent) enrichment run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Idle,
    Processing,
    Paused,
    Completed,
    Error,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Processing => "processing",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four externally permitted writes to run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlRequest {
    Start,
    Pause,
    Resume,
    Stop,
}

impl ControlRequest {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Stop => "stop",
        }
    }
}

impl fmt::Display for ControlRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RunStatus {
    /// Validate an external control request against the current status and
    /// return the status it transitions to.
    ///
    /// Transition table:
    /// - `start`:  idle | completed | error → processing
    /// - `pause`:  processing → paused
    /// - `resume`: paused → processing
    /// - `stop`:   processing | paused → idle
    pub fn apply(self, request: ControlRequest) -> Result<RunStatus, TransitionError> {
        use ControlRequest::*;
        use RunStatus::*;
        match (self, request) {
            (Idle | Completed | Error, Start) => Ok(Processing),
            (Processing, Pause) => Ok(Paused),
            (Paused, Resume) => Ok(Processing),
            (Processing | Paused, Stop) => Ok(Idle),
            (from, request) => Err(TransitionError { from, request }),
        }
    }
}

/// Live status/progress record for a table's enrichment run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunState {
    pub status: RunStatus,
    pub processed_rows: usize,
    pub total_rows: usize,
    pub progress_percent: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl RunState {
    pub fn idle() -> Self {
        Self {
            status: RunStatus::Idle,
            processed_rows: 0,
            total_rows: 0,
            progress_percent: 0,
            error_detail: None,
        }
    }

    pub fn processing(processed_rows: usize, total_rows: usize) -> Self {
        Self {
            status: RunStatus::Processing,
            processed_rows,
            total_rows,
            progress_percent: Self::percent(processed_rows, total_rows),
            error_detail: None,
        }
    }

    pub fn completed(total_rows: usize) -> Self {
        Self {
            status: RunStatus::Completed,
            processed_rows: total_rows,
            total_rows,
            progress_percent: 100,
            error_detail: None,
        }
    }

    pub fn error(processed_rows: usize, total_rows: usize, detail: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Error,
            processed_rows,
            total_rows,
            progress_percent: Self::percent(processed_rows, total_rows),
            error_detail: Some(detail.into()),
        }
    }

    /// Integer progress percentage, rounded. Zero-row tables report 0.
    pub fn percent(processed_rows: usize, total_rows: usize) -> u8 {
        if total_rows == 0 {
            return 0;
        }
        ((processed_rows as f64 / total_rows as f64) * 100.0).round() as u8
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::idle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_legal_transitions() {
        assert_eq!(
            RunStatus::Idle.apply(ControlRequest::Start),
            Ok(RunStatus::Processing)
        );
        assert_eq!(
            RunStatus::Completed.apply(ControlRequest::Start),
            Ok(RunStatus::Processing)
        );
        assert_eq!(
            RunStatus::Error.apply(ControlRequest::Start),
            Ok(RunStatus::Processing)
        );
        assert_eq!(
            RunStatus::Processing.apply(ControlRequest::Pause),
            Ok(RunStatus::Paused)
        );
        assert_eq!(
            RunStatus::Paused.apply(ControlRequest::Resume),
            Ok(RunStatus::Processing)
        );
        assert_eq!(
            RunStatus::Processing.apply(ControlRequest::Stop),
            Ok(RunStatus::Idle)
        );
        assert_eq!(
            RunStatus::Paused.apply(ControlRequest::Stop),
            Ok(RunStatus::Idle)
        );
    }

    #[test]
    fn test_illegal_transitions() {
        // start while already processing
        assert!(RunStatus::Processing.apply(ControlRequest::Start).is_err());
        // pause when not processing
        assert!(RunStatus::Idle.apply(ControlRequest::Pause).is_err());
        assert!(RunStatus::Paused.apply(ControlRequest::Pause).is_err());
        assert!(RunStatus::Completed.apply(ControlRequest::Pause).is_err());
        // resume when not paused
        assert!(RunStatus::Processing.apply(ControlRequest::Resume).is_err());
        assert!(RunStatus::Idle.apply(ControlRequest::Resume).is_err());
        // stop when neither processing nor paused
        assert!(RunStatus::Idle.apply(ControlRequest::Stop).is_err());
        assert!(RunStatus::Completed.apply(ControlRequest::Stop).is_err());
        assert!(RunStatus::Error.apply(ControlRequest::Stop).is_err());
    }

    #[test]
    fn test_percent_rounding() {
        assert_eq!(RunState::percent(0, 0), 0);
        assert_eq!(RunState::percent(1, 3), 33);
        assert_eq!(RunState::percent(2, 3), 67);
        assert_eq!(RunState::percent(3, 3), 100);
    }

    #[test]
    fn test_run_state_serde_shape() {
        let state = RunState::processing(1, 4);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["status"], "processing");
        assert_eq!(json["processedRows"], 1);
        assert_eq!(json["totalRows"], 4);
        assert_eq!(json["progressPercent"], 25);
        // errorDetail is skipped when None
        assert!(json.get("errorDetail").is_none());
    }

    #[test]
    fn test_error_state_carries_detail() {
        let state = RunState::error(2, 5, "bad credentials");
        assert_eq!(state.status, RunStatus::Error);
        assert_eq!(state.error_detail.as_deref(), Some("bad credentials"));
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["errorDetail"], "bad credentials");
    }

    #[test]
    fn test_completed_is_always_100() {
        let state = RunState::completed(0);
        assert_eq!(state.progress_percent, 100);
    }
}
