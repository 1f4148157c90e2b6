use crate::dispatch::Dispatcher;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Action dispatcher (owns the meeting registry)
    pub dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }
}
