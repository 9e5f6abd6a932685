//! Text-generation backends.
//!
//! Every backend turns a prompt into generated text behind the same
//! [`GenerationBackend`] trait, so the dispatcher never depends on a concrete
//! provider (Ollama, Gemini, or the scripted test double).

pub mod gemini;
pub mod mock;
pub mod ollama;

use async_trait::async_trait;
use thiserror::Error;

/// Why a backend call produced no text.
///
/// The `Display` output is the message shown to the chat user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// A required credential is missing; no request was sent.
    #[error("{service} API key is not configured.")]
    NotConfigured { service: &'static str },

    /// The service could not be reached at all (refused, DNS, connect timeout).
    #[error("Error: Could not connect to {service} server at {endpoint}.")]
    Unreachable {
        service: &'static str,
        endpoint: String,
    },

    /// The service answered, but not with the expected shape.
    #[error("{0}")]
    MalformedResponse(String),

    /// Any other failure while talking to the service.
    #[error("{0}")]
    Transport(String),
}

impl GenerationError {
    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::NotConfigured { .. } => "not_configured",
            GenerationError::Unreachable { .. } => "unreachable",
            GenerationError::MalformedResponse(_) => "malformed_response",
            GenerationError::Transport(_) => "transport",
        }
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self, GenerationError::Unreachable { .. })
    }
}

/// A service that generates text for a prompt in a single, non-streaming call.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Human-readable service name, used in user-facing messages.
    fn name(&self) -> &'static str;

    /// Generate a complete response. Implementations make one attempt and
    /// never retry.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}
