use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the live quiz backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::session::create_session,
        crate::routes::session::get_snapshot,
        crate::routes::session::join_session,
        crate::routes::session::start_session,
        crate::routes::session::end_session,
        crate::routes::session::submit_answer,
        crate::routes::sse::session_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::session::CreateSessionRequest,
            crate::dto::session::QuestionInput,
            crate::dto::session::JoinSessionRequest,
            crate::dto::session::SubmitAnswerRequest,
            crate::dto::session::SessionSummary,
            crate::dto::session::AnswerAccepted,
            crate::dto::snapshot::SessionSnapshotDto,
            crate::dto::snapshot::SessionStatus,
            crate::dto::sse::Handshake,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "session", description = "Live quiz session lifecycle and answers"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;
