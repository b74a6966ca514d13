use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod health;
pub mod session;
pub mod sse;

/// Assemble the full route tree: API endpoints plus documentation.
pub fn router(state: SharedState) -> Router<()> {
    let api = health::router().merge(session::router()).merge(sse::router());

    api.merge(docs::router(state.clone())).with_state(state)
}
