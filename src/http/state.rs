use crate::router::SessionRegistry;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Live session routers (session_id → router)
    pub registry: SessionRegistry,

    /// Used when a schedule request gives no duration
    pub default_duration_minutes: u32,
}

impl AppState {
    pub fn new(registry: SessionRegistry) -> Self {
        Self {
            registry,
            default_duration_minutes: 60,
        }
    }

    pub fn with_default_duration(mut self, minutes: u32) -> Self {
        self.default_duration_minutes = minutes;
        self
    }
}
