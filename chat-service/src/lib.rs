pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;

use services::Dispatcher;
use std::sync::Arc;

/// Shared application state: the backends behind the dispatcher.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }
}
