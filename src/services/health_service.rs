use crate::{dto::health::HealthResponse, state::SharedState};

/// Respond with the current health payload and active session count.
pub fn health_status(state: &SharedState) -> HealthResponse {
    HealthResponse::ok(state.session_count())
}
