use ait::coordinator::Coordinator;
use ait::store::ConfigStore;
use std::sync::Arc;
use std::time::Duration;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Coordinator,
    pub store: Arc<dyn ConfigStore>,
    /// Applied to adapters built for connectivity tests.
    pub request_timeout: Duration,
}
