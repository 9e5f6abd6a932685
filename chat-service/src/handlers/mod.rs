//! HTTP handlers for the chat service.

pub mod app;
pub mod chat;
pub mod metrics;
