// crates/core/src/generation/provider.rs
//! GenerationProvider trait defining the interface for text-generation
//! backends.

use async_trait::async_trait;

use super::types::GenerationError;

/// A text-generation backend the engine can call once per cell.
///
/// Implementations include:
/// - `HttpProvider` — OpenAI-compatible chat-completion endpoint
/// - test stubs with scripted outcomes
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Run one non-streaming completion for an already-filled prompt.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Provider name for logging/display (e.g. "openai-http").
    fn name(&self) -> &str;

    /// Model identifier.
    fn model(&self) -> &str;
}
