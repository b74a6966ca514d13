use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status, always "ok" (the engine holds no external dependencies).
    pub status: String,
    /// Number of registered live sessions.
    pub sessions: usize,
}

impl HealthResponse {
    /// Create a health response for the given session count.
    pub fn ok(sessions: usize) -> Self {
        Self {
            status: "ok".to_string(),
            sessions,
        }
    }
}
