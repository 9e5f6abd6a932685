//! Gemini AI provider implementation.
//!
//! Implements text generation using Google's Gemini `generateContent` API.

use super::{GenerationBackend, GenerationError};
use crate::config::GeminiConfig;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use service_core::observability::TracedClientExt;

const SERVICE: &str = "Gemini";

/// Gemini text provider.
pub struct GeminiBackend {
    config: GeminiConfig,
    client: Client,
}

impl GeminiBackend {
    pub fn new(config: GeminiConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { config, client })
    }

    /// Build the API URL for the configured model and the given method.
    /// The key is added separately as a query parameter.
    fn api_url(&self, method: &str) -> String {
        format!("{}/models/{}:{}", self.config.api_base, self.config.model, method)
    }

    /// Render a reqwest failure without its URL, which carries the API key.
    fn transport_error(err: reqwest::Error) -> GenerationError {
        GenerationError::Transport(format!(
            "An error occurred with the {} API: {}",
            SERVICE,
            err.without_url()
        ))
    }

    fn malformed() -> GenerationError {
        GenerationError::MalformedResponse(format!(
            "Sorry, I received an empty or malformed response from the {} API.",
            SERVICE
        ))
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    fn name(&self) -> &'static str {
        SERVICE
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let Some(api_key) = self.config.api_key.as_ref() else {
            return Err(GenerationError::NotConfigured { service: SERVICE });
        };

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        tracing::debug!(
            model = %self.config.model,
            prompt_len = prompt.len(),
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .traced_post(&self.api_url("generateContent"))
            .query(&[("key", api_key.expose_secret().as_str())])
            .json(&request)
            .send()
            .await
            .map_err(Self::transport_error)?;

        let response = response.error_for_status().map_err(Self::transport_error)?;

        let body = response.bytes().await.map_err(Self::transport_error)?;

        let api_response: GenerateContentResponse =
            serde_json::from_slice(&body).map_err(|_| Self::malformed())?;

        api_response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.text)
            .ok_or_else(Self::malformed)
    }
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MODEL: &str = "gemini-2.5-flash-preview-05-20";

    fn backend(api_base: String, api_key: Option<&str>) -> GeminiBackend {
        GeminiBackend::new(GeminiConfig {
            api_base,
            model: MODEL.to_string(),
            api_key: api_key.map(|k| Secret::new(k.to_string())),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn generate_path() -> String {
        format!("/v1beta/models/{}:generateContent", MODEL)
    }

    #[tokio::test]
    async fn missing_key_fails_without_a_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = backend(format!("{}/v1beta", server.uri()), None)
            .generate("hello")
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Gemini API key is not configured.");
        assert_eq!(err.kind(), "not_configured");
    }

    #[tokio::test]
    async fn extracts_first_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(generate_path()))
            .and(query_param("key", "test-key"))
            .and(body_json(serde_json::json!({
                "contents": [{"parts": [{"text": "hello"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [
                    {"content": {"role": "model", "parts": [{"text": "Hi there!"}]}},
                    {"content": {"role": "model", "parts": [{"text": "ignored"}]}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = backend(format!("{}/v1beta", server.uri()), Some("test-key"))
            .generate("hello")
            .await
            .unwrap();

        assert_eq!(text, "Hi there!");
    }

    #[tokio::test]
    async fn empty_candidates_are_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": []})),
            )
            .mount(&server)
            .await;

        let err = backend(format!("{}/v1beta", server.uri()), Some("test-key"))
            .generate("hello")
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Sorry, I received an empty or malformed response from the Gemini API."
        );
    }

    #[tokio::test]
    async fn candidate_without_text_part_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"finishReason": "SAFETY"}]
            })))
            .mount(&server)
            .await;

        let err = backend(format!("{}/v1beta", server.uri()), Some("test-key"))
            .generate("hello")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "malformed_response");
    }

    #[tokio::test]
    async fn error_status_does_not_leak_the_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
            .mount(&server)
            .await;

        let err = backend(format!("{}/v1beta", server.uri()), Some("super-secret"))
            .generate("hello")
            .await
            .unwrap_err();

        let message = err.to_string();
        assert_eq!(err.kind(), "transport");
        assert!(message.starts_with("An error occurred with the Gemini API: "));
        assert!(message.contains("403"));
        assert!(!message.contains("super-secret"));
    }

    #[tokio::test]
    async fn unreachable_api_is_a_plain_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = backend(format!("http://127.0.0.1:{}/v1beta", port), Some("k"))
            .generate("hello")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "transport");
    }
}
