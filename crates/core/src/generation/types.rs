// crates/core/src/generation/types.rs
//! Error types and fixed request parameters for the generation transport.

use thiserror::Error;

/// System instruction sent with every generation request.
pub const SYSTEM_INSTRUCTION: &str = "be precise and concise";

/// Errors from one call to the generation endpoint, classified at the
/// transport boundary. The engine maps these onto run behavior: credential
/// rejection halts the run, rate limiting pauses it, everything else is
/// isolated to the cell being generated.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation endpoint rejected credentials: {0}")]
    Unauthorized(String),

    #[error("generation endpoint rate limited: {0}")]
    RateLimited(String),

    #[error("generation request timed out after {0}s")]
    Timeout(u64),

    #[error("generation endpoint returned no text")]
    EmptyResponse,

    #[error("could not reach generation endpoint: {0}")]
    Transport(String),

    #[error("generation request failed: {0}")]
    Api(String),
}

impl GenerationError {
    /// True for failures where no usable response arrived at all (timeouts,
    /// connection failures, empty completions). These record `NO_RESPONSE`;
    /// `Api` failures record `API_ERROR`.
    pub fn is_no_response(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::EmptyResponse | Self::Transport(_)
        )
    }
}
