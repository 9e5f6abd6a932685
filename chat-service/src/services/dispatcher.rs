//! Backend selection and the local-to-cloud fallback rule.

use crate::models::{BotChoice, ChatResult};
use crate::services::metrics;
use crate::services::providers::{GenerationBackend, GenerationError};
use std::sync::Arc;
use std::time::Instant;

pub const INVALID_BOT_MESSAGE: &str = "Invalid bot selected.";

/// Routes a prompt to the local or cloud backend.
///
/// The only cross-backend rule: when the local backend is unreachable, the
/// prompt is retried once against the cloud backend.
#[derive(Clone)]
pub struct Dispatcher {
    local: Arc<dyn GenerationBackend>,
    cloud: Arc<dyn GenerationBackend>,
}

impl Dispatcher {
    pub fn new(local: Arc<dyn GenerationBackend>, cloud: Arc<dyn GenerationBackend>) -> Self {
        Self { local, cloud }
    }

    /// Dispatch `prompt` according to the raw selector sent by the page.
    pub async fn dispatch(&self, prompt: &str, bot: Option<&str>) -> ChatResult {
        let Some(choice) = bot.and_then(|b| b.parse::<BotChoice>().ok()) else {
            tracing::warn!(bot = ?bot, "Rejected chat request with invalid bot selector");
            metrics::record_chat_request("invalid", "invalid_bot");
            return ChatResult::failure(INVALID_BOT_MESSAGE);
        };

        let result = match choice {
            BotChoice::Ollama => self.dispatch_local(prompt).await,
            BotChoice::Gemini => {
                let outcome = call(self.cloud.as_ref(), prompt).await;
                into_result(outcome)
            }
        };

        metrics::record_chat_request(
            choice.as_str(),
            if result.success { "success" } else { "failure" },
        );

        result
    }

    async fn dispatch_local(&self, prompt: &str) -> ChatResult {
        match call(self.local.as_ref(), prompt).await {
            Err(err) if err.is_unreachable() => {
                let notice = format!("Falling back to {}...", self.cloud.name());
                tracing::warn!(
                    from = self.local.name(),
                    to = self.cloud.name(),
                    error = %err,
                    "Local backend unreachable, falling back"
                );
                metrics::record_fallback(self.local.name(), self.cloud.name());

                match call(self.cloud.as_ref(), prompt).await {
                    Ok(text) => ChatResult::success(format!("{}\n{}", notice, text)),
                    Err(cloud_err) => ChatResult::failure(cloud_err.to_string()),
                }
            }
            outcome => into_result(outcome),
        }
    }
}

/// Run one backend call with timing and outcome logging.
async fn call(backend: &dyn GenerationBackend, prompt: &str) -> Result<String, GenerationError> {
    let start = Instant::now();
    let outcome = backend.generate(prompt).await;
    let elapsed = start.elapsed();

    let kind = match &outcome {
        Ok(text) => {
            tracing::info!(
                backend = backend.name(),
                elapsed_ms = elapsed.as_millis() as u64,
                response_len = text.len(),
                "Backend generated response"
            );
            "ok"
        }
        Err(err) => {
            tracing::warn!(
                backend = backend.name(),
                elapsed_ms = elapsed.as_millis() as u64,
                kind = err.kind(),
                error = %err,
                "Backend call failed"
            );
            err.kind()
        }
    };
    metrics::record_backend_call(backend.name(), kind, elapsed);

    outcome
}

fn into_result(outcome: Result<String, GenerationError>) -> ChatResult {
    match outcome {
        Ok(text) => ChatResult::success(text),
        Err(err) => ChatResult::failure(err.to_string()),
    }
}
