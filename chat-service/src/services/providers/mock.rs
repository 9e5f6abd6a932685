//! Mock provider implementations for testing.

use super::{GenerationBackend, GenerationError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Backend that replays a fixed outcome and counts how often it was called.
pub struct ScriptedBackend {
    name: &'static str,
    outcome: Result<String, GenerationError>,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn succeeding(name: &'static str, text: impl Into<String>) -> Self {
        Self::new(name, Ok(text.into()))
    }

    pub fn failing(name: &'static str, error: GenerationError) -> Self {
        Self::new(name, Err(error))
    }

    fn new(name: &'static str, outcome: Result<String, GenerationError>) -> Self {
        Self {
            name,
            outcome,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `generate` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}
