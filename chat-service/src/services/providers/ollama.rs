//! Ollama provider: local `/api/generate` with streaming disabled.

use super::{GenerationBackend, GenerationError};
use crate::config::OllamaConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use service_core::observability::TracedClientExt;

const SERVICE: &str = "Ollama";

pub struct OllamaBackend {
    config: OllamaConfig,
    client: Client,
}

impl OllamaBackend {
    pub fn new(config: OllamaConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self { config, client })
    }

    fn transport_error(detail: impl std::fmt::Display) -> GenerationError {
        GenerationError::Transport(format!(
            "An error occurred with the {} request: {}",
            SERVICE, detail
        ))
    }

    fn malformed() -> GenerationError {
        GenerationError::MalformedResponse(format!("Empty or malformed response from {}.", SERVICE))
    }
}

#[async_trait]
impl GenerationBackend for OllamaBackend {
    fn name(&self) -> &'static str {
        SERVICE
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let request = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
        };

        tracing::debug!(
            model = %self.config.model,
            endpoint = %self.config.url,
            prompt_len = prompt.len(),
            "Sending request to Ollama"
        );

        let response = self
            .client
            .traced_post(&self.config.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    GenerationError::Unreachable {
                        service: SERVICE,
                        endpoint: self.config.url.clone(),
                    }
                } else {
                    Self::transport_error(e)
                }
            })?;

        let response = response.error_for_status().map_err(Self::transport_error)?;

        let body = response.bytes().await.map_err(Self::transport_error)?;

        let parsed: GenerateResponse =
            serde_json::from_slice(&body).map_err(|_| Self::malformed())?;

        parsed.response.ok_or_else(Self::malformed)
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend_for(url: String) -> OllamaBackend {
        OllamaBackend::new(OllamaConfig {
            url,
            model: "llama3.1".to_string(),
            timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(1),
        })
        .unwrap()
    }

    /// A local URL with nothing listening on it.
    fn closed_port_url() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("http://127.0.0.1:{}/api/generate", port)
    }

    #[tokio::test]
    async fn returns_response_field_and_disables_streaming() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_json(serde_json::json!({
                "model": "llama3.1",
                "prompt": "Why is the sky blue?",
                "stream": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "llama3.1",
                "response": "Rayleigh scattering.",
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend_for(format!("{}/api/generate", server.uri()));
        let text = backend.generate("Why is the sky blue?").await.unwrap();

        assert_eq!(text, "Rayleigh scattering.");
    }

    #[tokio::test]
    async fn missing_response_field_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"done": true})),
            )
            .mount(&server)
            .await;

        let err = backend_for(format!("{}/api/generate", server.uri()))
            .generate("hi")
            .await
            .unwrap_err();

        assert_eq!(
            err,
            GenerationError::MalformedResponse("Empty or malformed response from Ollama.".into())
        );
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
            .mount(&server)
            .await;

        let err = backend_for(format!("{}/api/generate", server.uri()))
            .generate("hi")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "malformed_response");
    }

    #[tokio::test]
    async fn closed_port_is_unreachable() {
        let url = closed_port_url();
        let err = backend_for(url.clone()).generate("hi").await.unwrap_err();

        assert!(err.is_unreachable());
        assert_eq!(
            err.to_string(),
            format!("Error: Could not connect to Ollama server at {}.", url)
        );
    }

    #[tokio::test]
    async fn error_status_is_a_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .mount(&server)
            .await;

        let err = backend_for(format!("{}/api/generate", server.uri()))
            .generate("hi")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "transport");
        let message = err.to_string();
        assert!(message.starts_with("An error occurred with the Ollama request: "));
        assert!(message.contains("404"));
    }

    #[tokio::test]
    async fn slow_reply_times_out_without_counting_as_unreachable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"response": "late"}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let backend = OllamaBackend::new(OllamaConfig {
            url: format!("{}/api/generate", server.uri()),
            model: "llama3.1".to_string(),
            timeout: Duration::from_millis(200),
            connect_timeout: Duration::from_secs(1),
        })
        .unwrap();

        let err = backend.generate("hi").await.unwrap_err();
        assert_eq!(err.kind(), "transport");
    }

    #[tokio::test]
    async fn hung_connect_is_unreachable_before_the_request_timeout() {
        // Non-routable address: the SYN is dropped or rejected outright.
        let url = "http://10.255.255.1:11434/api/generate".to_string();
        let backend = OllamaBackend::new(OllamaConfig {
            url: url.clone(),
            model: "llama3.1".to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_millis(300),
        })
        .unwrap();

        let start = std::time::Instant::now();
        let err = backend.generate("hi").await.unwrap_err();

        assert!(err.is_unreachable(), "got {:?}", err);
        assert_eq!(
            err.to_string(),
            format!("Error: Could not connect to Ollama server at {}.", url)
        );
        assert!(start.elapsed() < Duration::from_secs(10));
    }
}
