// crates/core/src/generation/config.rs
//! Generation endpoint configuration.

/// Configuration for the HTTP generation provider.
///
/// Sampling is fixed low-temperature and non-streaming: enrichment output
/// should be deterministic enough to land in a table cell.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Base URL of an OpenAI-compatible API (no trailing `/chat/completions`).
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    /// Repetition penalty (`frequency_penalty` on the wire).
    pub frequency_penalty: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".into(),
            api_key: None,
            model: "gpt-4o-mini".into(),
            timeout_secs: 30,
            max_tokens: 512,
            temperature: 0.2,
            top_p: 0.9,
            frequency_penalty: 0.5,
        }
    }
}

impl GenerationConfig {
    /// Build a config from `ROWFORGE_GENERATION_*` environment variables,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            endpoint: std::env::var("ROWFORGE_GENERATION_URL").unwrap_or(defaults.endpoint),
            api_key: std::env::var("ROWFORGE_GENERATION_KEY").ok(),
            model: std::env::var("ROWFORGE_GENERATION_MODEL").unwrap_or(defaults.model),
            timeout_secs: std::env::var("ROWFORGE_GENERATION_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_secs),
            ..defaults
        }
    }
}
