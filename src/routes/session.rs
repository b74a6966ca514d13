use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        session::{
            AnswerAccepted, CreateSessionRequest, JoinSessionRequest, ParticipantSummary,
            SessionSummary, SubmitAnswerRequest,
        },
        snapshot::SessionSnapshotDto,
    },
    error::AppError,
    services::session_service,
    state::SharedState,
};

/// Routes driving the live session lifecycle and answer ingestion.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", get(get_snapshot))
        .route("/sessions/{id}/join", post(join_session))
        .route("/sessions/{id}/start", post(start_session))
        .route("/sessions/{id}/end", post(end_session))
        .route("/sessions/{id}/answers", post(submit_answer))
}

/// Launch a new live session from a quiz definition.
#[utoipa::path(
    post,
    path = "/sessions",
    tag = "session",
    request_body = CreateSessionRequest,
    responses(
        (status = 200, description = "Session created", body = SessionSummary),
        (status = 400, description = "Malformed quiz definition")
    )
)]
pub async fn create_session(
    State(state): State<SharedState>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<Json<SessionSummary>, AppError> {
    Ok(Json(session_service::create_session(&state, payload).await?))
}

/// Return a consistent snapshot of the session for display clients.
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    tag = "session",
    params(("id" = String, Path, description = "Identifier of the session")),
    responses(
        (status = 200, description = "Current snapshot", body = SessionSnapshotDto),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn get_snapshot(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshotDto>, AppError> {
    Ok(Json(session_service::get_snapshot(&state, id).await?))
}

/// Join a session as a participant; joining twice with the same identity is idempotent.
#[utoipa::path(
    post,
    path = "/sessions/{id}/join",
    tag = "session",
    params(("id" = String, Path, description = "Identifier of the session")),
    request_body = JoinSessionRequest,
    responses(
        (status = 200, description = "Participant registered", body = ParticipantSummary),
        (status = 409, description = "Session already completed")
    )
)]
pub async fn join_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<JoinSessionRequest>,
) -> Result<Json<ParticipantSummary>, AppError> {
    Ok(Json(
        session_service::join_session(&state, id, payload).await?,
    ))
}

/// Start the session and its clock.
#[utoipa::path(
    post,
    path = "/sessions/{id}/start",
    tag = "session",
    params(("id" = String, Path, description = "Identifier of the session")),
    responses(
        (status = 200, description = "Session started", body = SessionSnapshotDto),
        (status = 409, description = "Session already started or completed")
    )
)]
pub async fn start_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshotDto>, AppError> {
    Ok(Json(session_service::start_session(&state, id).await?))
}

/// End the session; ending an already-completed session is a no-op success.
#[utoipa::path(
    post,
    path = "/sessions/{id}/end",
    tag = "session",
    params(("id" = String, Path, description = "Identifier of the session")),
    responses(
        (status = 200, description = "Session completed", body = SessionSnapshotDto),
        (status = 409, description = "Session never started")
    )
)]
pub async fn end_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshotDto>, AppError> {
    Ok(Json(session_service::end_session(&state, id).await?))
}

/// Submit one participant answer for one question.
#[utoipa::path(
    post,
    path = "/sessions/{id}/answers",
    tag = "session",
    params(("id" = String, Path, description = "Identifier of the session")),
    request_body = SubmitAnswerRequest,
    responses(
        (status = 200, description = "Answer accepted", body = AnswerAccepted),
        (status = 409, description = "Duplicate answer or session not accepting answers"),
        (status = 404, description = "Unknown session, participant, or question")
    )
)]
pub async fn submit_answer(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<Json<AnswerAccepted>, AppError> {
    Ok(Json(
        session_service::submit_answer(&state, id, payload).await?,
    ))
}
