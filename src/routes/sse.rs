use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::Sse,
    routing::get,
};
use futures::Stream;
use tracing::info;
use uuid::Uuid;

use crate::{
    dto::sse::Handshake,
    error::AppError,
    services::{session_service, sse_events, sse_service},
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/sse/sessions/{id}",
    tag = "sse",
    params(("id" = String, Path, description = "Identifier of the session to follow")),
    responses(
        (status = 200, description = "Session SSE stream", content_type = "text/event-stream", body = String),
        (status = 404, description = "Unknown session")
    )
)]
/// Stream realtime snapshots of one session to connected display clients.
pub async fn session_stream(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>>, AppError> {
    let handle = session_service::session_handle(&state, id)?;
    let receiver = sse_service::subscribe(&handle);
    info!(session_id = %id, "new session SSE connection");
    sse_events::broadcast_handshake(
        &handle,
        &Handshake {
            session_id: id,
            message: "session stream connected".into(),
        },
    );
    Ok(sse_service::to_sse_stream(receiver, id))
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/sessions/{id}", get(session_stream))
}
