pub mod dispatcher;
pub mod metrics;
pub mod providers;

pub use dispatcher::Dispatcher;
