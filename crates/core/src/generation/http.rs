// crates/core/src/generation/http.rs
//! HTTP provider for OpenAI-compatible chat-completion endpoints.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::config::GenerationConfig;
use super::provider::GenerationProvider;
use super::types::{GenerationError, SYSTEM_INSTRUCTION};

/// Generation provider that POSTs to `{endpoint}/chat/completions`.
pub struct HttpProvider {
    client: reqwest::Client,
    config: GenerationConfig,
}

impl HttpProvider {
    pub fn new(config: GenerationConfig) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        )
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": SYSTEM_INSTRUCTION },
                { "role": "user", "content": prompt },
            ],
            "temperature": self.config.temperature,
            "top_p": self.config.top_p,
            "max_tokens": self.config.max_tokens,
            "frequency_penalty": self.config.frequency_penalty,
            "stream": false,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Classify an HTTP failure from the generation endpoint.
///
/// Status codes are authoritative. Body sniffing is only a fallback for
/// gateways that wrap upstream errors in generic statuses — a known
/// fragility of inconsistent upstream error shapes, kept as narrow as
/// possible.
pub fn classify_failure(status: u16, body: &str) -> GenerationError {
    let detail = crate::logbook::preview(body.trim(), 200);
    match status {
        401 | 403 => GenerationError::Unauthorized(detail),
        429 => GenerationError::RateLimited(detail),
        _ => {
            let lower = body.to_lowercase();
            if lower.contains("invalid api key") || lower.contains("invalid key") {
                GenerationError::Unauthorized(detail)
            } else if lower.contains("rate limit") {
                GenerationError::RateLimited(detail)
            } else {
                GenerationError::Api(format!("status {status}: {detail}"))
            }
        }
    }
}

#[async_trait]
impl GenerationProvider for HttpProvider {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let t0 = std::time::Instant::now();

        let mut request = self
            .client
            .post(self.completions_url())
            .json(&self.request_body(prompt));
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                tracing::warn!(
                    model = %self.config.model,
                    timeout_secs = self.config.timeout_secs,
                    "generation request timed out"
                );
                GenerationError::Timeout(self.config.timeout_secs)
            } else {
                GenerationError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(classify_failure(status.as_u16(), &body));
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| GenerationError::Api(format!("unexpected response shape: {e}")))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }

        tracing::debug!(
            model = %self.config.model,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            response_len = text.len(),
            "generation response received"
        );
        Ok(text)
    }

    fn name(&self) -> &str {
        "openai-http"
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> HttpProvider {
        HttpProvider::new(GenerationConfig {
            endpoint: server.uri(),
            api_key: Some("test-key".into()),
            timeout_secs: 5,
            ..GenerationConfig::default()
        })
        .unwrap()
    }

    fn chat_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [ { "message": { "role": "assistant", "content": content } } ]
        })
    }

    #[tokio::test]
    async fn test_generate_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("  Paris  ")))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let text = provider.generate("Capital of France?").await.unwrap();
        assert_eq!(text, "Paris");
    }

    #[tokio::test]
    async fn test_generate_sends_fixed_sampling() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(wiremock::matchers::body_partial_json(serde_json::json!({
                "temperature": 0.2,
                "top_p": 0.9,
                "stream": false,
                "messages": [ { "role": "system", "content": SYSTEM_INSTRUCTION } ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("ok")))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        provider.generate("hello").await.unwrap();
    }

    #[tokio::test]
    async fn test_generate_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let err = provider.generate("x").await.unwrap_err();
        assert!(matches!(err, GenerationError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_generate_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let err = provider.generate("x").await.unwrap_err();
        assert!(matches!(err, GenerationError::RateLimited(_)));
    }

    #[tokio::test]
    async fn test_generate_empty_content_is_no_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("")))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let err = provider.generate("x").await.unwrap_err();
        assert!(matches!(err, GenerationError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_generate_server_error_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let err = provider.generate("x").await.unwrap_err();
        assert!(matches!(err, GenerationError::Api(_)));
    }

    #[test]
    fn test_classify_failure_by_status() {
        assert!(matches!(
            classify_failure(401, "whatever"),
            GenerationError::Unauthorized(_)
        ));
        assert!(matches!(
            classify_failure(429, "whatever"),
            GenerationError::RateLimited(_)
        ));
        assert!(matches!(
            classify_failure(500, "whatever"),
            GenerationError::Api(_)
        ));
    }

    #[test]
    fn test_classify_failure_body_fallback() {
        // Gateways that hide the real status behind a 400.
        assert!(matches!(
            classify_failure(400, "Invalid API key provided"),
            GenerationError::Unauthorized(_)
        ));
        assert!(matches!(
            classify_failure(400, "Rate limit exceeded for model"),
            GenerationError::RateLimited(_)
        ));
    }

    #[test]
    fn test_completions_url_trailing_slash() {
        let provider = HttpProvider::new(GenerationConfig {
            endpoint: "http://localhost:9999/v1/".into(),
            ..GenerationConfig::default()
        })
        .unwrap();
        assert_eq!(
            provider.completions_url(),
            "http://localhost:9999/v1/chat/completions"
        );
    }
}
