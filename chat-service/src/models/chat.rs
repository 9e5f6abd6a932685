//! Wire types for the `/chat` endpoint.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Body of `POST /chat`. Both fields are optional on the wire so the handler
/// can answer missing values with its own fixed messages.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub bot: Option<String>,
}

impl ChatRequest {
    /// The prompt, if present and non-empty.
    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref().filter(|p| !p.is_empty())
    }
}

/// Which backend the user picked in the page's selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotChoice {
    Ollama,
    Gemini,
}

impl BotChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            BotChoice::Ollama => "ollama",
            BotChoice::Gemini => "gemini",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownBot;

impl FromStr for BotChoice {
    type Err = UnknownBot;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ollama" => Ok(BotChoice::Ollama),
            "gemini" => Ok(BotChoice::Gemini),
            _ => Err(UnknownBot),
        }
    }
}

/// Outcome of one chat request, serialized as `{"response", "success"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatResult {
    pub response: String,
    pub success: bool,
}

impl ChatResult {
    pub fn success(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            success: true,
        }
    }

    pub fn failure(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            success: false,
        }
    }
}

/// Body of the 400 answer to a request without a prompt.
#[derive(Debug, Clone, Serialize)]
pub struct PromptRequired {
    pub response: &'static str,
}

impl Default for PromptRequired {
    fn default() -> Self {
        Self {
            response: "Please provide a prompt.",
        }
    }
}
