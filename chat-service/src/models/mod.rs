//! Domain models for the chat service.

pub mod chat;

pub use chat::{BotChoice, ChatRequest, ChatResult, PromptRequired};
