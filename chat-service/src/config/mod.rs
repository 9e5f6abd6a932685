use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

/// Local generation can take minutes on modest hardware.
const DEFAULT_OLLAMA_TIMEOUT_SECS: u64 = 600;
const DEFAULT_OLLAMA_CONNECT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_GEMINI_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub common: core_config::Config,
    pub ollama: OllamaConfig,
    pub gemini: GeminiConfig,
}

#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Full URL of the `/api/generate` endpoint.
    pub url: String,
    pub model: String,
    /// Whole-request budget, generation included.
    pub timeout: Duration,
    /// Budget for establishing the TCP connection alone.
    pub connect_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API root, e.g. `https://generativelanguage.googleapis.com/v1beta`.
    pub api_base: String,
    pub model: String,
    /// `None` when `GEMINI_API_KEY` is unset or blank.
    pub api_key: Option<Secret<String>>,
    pub timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:11434/api/generate".to_string(),
            model: "llama3.1".to_string(),
            timeout: Duration::from_secs(DEFAULT_OLLAMA_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_OLLAMA_CONNECT_TIMEOUT_SECS),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash-preview-05-20".to_string(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_GEMINI_TIMEOUT_SECS),
        }
    }
}

impl ChatConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        Self::from_vars(common, |key| env::var(key).ok())
    }

    /// Build the service settings from an arbitrary variable source.
    pub fn from_vars<F>(common: core_config::Config, var: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let ollama_defaults = OllamaConfig::default();
        let gemini_defaults = GeminiConfig::default();

        Ok(ChatConfig {
            common,
            ollama: OllamaConfig {
                url: var("OLLAMA_API_URL").unwrap_or(ollama_defaults.url),
                model: var("OLLAMA_MODEL").unwrap_or(ollama_defaults.model),
                timeout: get_timeout(&var, "OLLAMA_TIMEOUT_SECS", ollama_defaults.timeout)?,
                connect_timeout: get_timeout(
                    &var,
                    "OLLAMA_CONNECT_TIMEOUT_SECS",
                    ollama_defaults.connect_timeout,
                )?,
            },
            gemini: GeminiConfig {
                api_base: var("GEMINI_API_BASE")
                    .map(|base| base.trim_end_matches('/').to_string())
                    .unwrap_or(gemini_defaults.api_base),
                model: var("GEMINI_MODEL").unwrap_or(gemini_defaults.model),
                api_key: var("GEMINI_API_KEY")
                    .filter(|key| !key.trim().is_empty())
                    .map(Secret::new),
                timeout: get_timeout(&var, "GEMINI_TIMEOUT_SECS", gemini_defaults.timeout)?,
            },
        })
    }
}

fn get_timeout<F>(var: &F, key: &str, default: Duration) -> Result<Duration, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<u64>().map(Duration::from_secs).map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!(
                "{} must be a whole number of seconds, got {:?}: {}",
                key,
                raw,
                e
            ))
        }),
    }
}
