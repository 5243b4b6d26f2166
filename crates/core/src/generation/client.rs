// crates/core/src/generation/client.rs
//! Per-cell generation client: runs one call, logs it, and classifies the
//! outcome for the engine.

use crate::logbook::{preview, LogLevel, RunLogger};

use super::provider::GenerationProvider;
use super::types::GenerationError;

/// Maximum characters of prompt/response text shown in log entries.
pub const PREVIEW_CHARS: usize = 100;

/// Fixed log message when the endpoint rejects the configured credentials.
pub const AUTH_FAILURE_MESSAGE: &str =
    "Generation service rejected the configured API key; halting the run";

/// Where a generation call sits within the run, for log messages.
#[derive(Debug, Clone)]
pub struct CellContext {
    /// Zero-based row index; logged one-based.
    pub row_index: usize,
    pub output_field: String,
}

impl CellContext {
    fn row_number(&self) -> usize {
        self.row_index + 1
    }
}

/// What the engine should do with one cell's generation attempt.
#[derive(Debug)]
pub enum CellOutcome {
    /// Store the generated text in the output cell.
    Text(String),
    /// Record the `NO_RESPONSE` sentinel and continue.
    NoResponse,
    /// Record the `API_ERROR` sentinel and continue.
    ApiError(String),
    /// Pause the run; the caller resumes it later.
    RateLimited(String),
    /// Halt the run and surface the failure.
    Fatal(String),
}

/// One provider call per cell, with the logging contract attached: an info
/// entry before the call, and exactly one success/warning/error entry for
/// the outcome. No failure is swallowed silently.
pub struct GenerationClient<'a> {
    pub provider: &'a dyn GenerationProvider,
    pub logger: &'a RunLogger<'a>,
}

impl GenerationClient<'_> {
    pub async fn generate(&self, prompt: &str, ctx: &CellContext) -> CellOutcome {
        self.logger.log(
            LogLevel::Info,
            format!(
                "Row {} '{}': prompt: {}",
                ctx.row_number(),
                ctx.output_field,
                preview(prompt, PREVIEW_CHARS)
            ),
        );

        match self.provider.generate(prompt).await {
            Ok(text) => {
                self.logger.log(
                    LogLevel::Success,
                    format!(
                        "Row {} '{}': response: {}",
                        ctx.row_number(),
                        ctx.output_field,
                        preview(&text, PREVIEW_CHARS)
                    ),
                );
                CellOutcome::Text(text)
            }
            Err(GenerationError::Unauthorized(detail)) => {
                self.logger.log(LogLevel::Error, AUTH_FAILURE_MESSAGE);
                CellOutcome::Fatal(detail)
            }
            Err(GenerationError::RateLimited(detail)) => {
                self.logger.log(
                    LogLevel::Warning,
                    format!("Generation endpoint rate limited; pausing run ({detail})"),
                );
                CellOutcome::RateLimited(detail)
            }
            Err(err) if err.is_no_response() => {
                self.logger.log(
                    LogLevel::Warning,
                    format!(
                        "Row {} '{}': no response ({err})",
                        ctx.row_number(),
                        ctx.output_field
                    ),
                );
                CellOutcome::NoResponse
            }
            Err(err) => {
                let detail = err.to_string();
                self.logger.log(
                    LogLevel::Error,
                    format!(
                        "Row {} '{}': generation failed: {detail}",
                        ctx.row_number(),
                        ctx.output_field
                    ),
                );
                CellOutcome::ApiError(detail)
            }
        }
    }
}
