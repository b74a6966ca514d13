//! Business logic powering the session REST routes. These helpers validate
//! payloads, serialize every mutation through the per-session lock, and
//! republish a consistent snapshot after each accepted event.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use indexmap::IndexMap;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        session::{
            AnswerAccepted, CreateSessionRequest, JoinSessionRequest, ParticipantSummary,
            QuestionInput, SessionSummary, SubmitAnswerRequest,
        },
        snapshot::SessionSnapshotDto,
    },
    error::ServiceError,
    services::sse_events,
    state::{
        SessionHandle, SharedState,
        machine::SessionPhase,
        quiz::{Question, QuizDefinition},
        session::LiveSession,
    },
};

/// Launch a new session from a full quiz definition.
pub async fn create_session(
    state: &SharedState,
    request: CreateSessionRequest,
) -> Result<SessionSummary, ServiceError> {
    request.validate()?;

    let quiz = build_quiz(request.name, request.questions);
    let time_limit = request
        .time_limit_secs
        .map(Duration::from_secs)
        .unwrap_or(state.config().default_time_limit);

    let session = LiveSession::new(
        quiz,
        time_limit,
        state.config().fast_response_threshold,
        SystemTime::now(),
    );
    let summary = SessionSummary::from(&session);

    let session_id = session.id();
    state.insert_session(session);
    info!(%session_id, time_limit_secs = time_limit.as_secs(), "session created");

    Ok(summary)
}

/// Register a participant, then republish the session snapshot.
pub async fn join_session(
    state: &SharedState,
    session_id: Uuid,
    request: JoinSessionRequest,
) -> Result<ParticipantSummary, ServiceError> {
    request.validate()?;

    let handle = state.session(session_id)?;
    let now = SystemTime::now();

    let (participant, snapshot) = {
        let mut session = handle.session().lock().await;
        let participant = session.join(request.participant_id, request.name, now)?;
        (participant, session.snapshot(now))
    };

    info!(%session_id, participant_id = %participant.id, "participant joined");
    sse_events::broadcast_snapshot(&handle, &(&snapshot).into());

    Ok((&participant).into())
}

/// Move the session into the active phase and start the clock.
pub async fn start_session(
    state: &SharedState,
    session_id: Uuid,
) -> Result<SessionSnapshotDto, ServiceError> {
    let handle = state.session(session_id)?;
    let now = SystemTime::now();

    let snapshot = {
        let mut session = handle.session().lock().await;
        session.start(now)?;
        session.snapshot(now)
    };

    info!(%session_id, "session started");
    let dto: SessionSnapshotDto = (&snapshot).into();
    sse_events::broadcast_snapshot(&handle, &dto);

    Ok(dto)
}

/// End the session explicitly. Retrying against an already-completed session
/// succeeds without a state change.
pub async fn end_session(
    state: &SharedState,
    session_id: Uuid,
) -> Result<SessionSnapshotDto, ServiceError> {
    let handle = state.session(session_id)?;
    let now = SystemTime::now();

    let snapshot = {
        let mut session = handle.session().lock().await;
        session.end(now)?;
        session.snapshot(now)
    };

    info!(%session_id, "session ended");
    let dto: SessionSnapshotDto = (&snapshot).into();
    sse_events::broadcast_snapshot(&handle, &dto);

    Ok(dto)
}

/// Submit one answer, returning the per-answer outcome to the caller and
/// republishing the snapshot to subscribers.
pub async fn submit_answer(
    state: &SharedState,
    session_id: Uuid,
    request: SubmitAnswerRequest,
) -> Result<AnswerAccepted, ServiceError> {
    request.validate()?;

    let handle = state.session(session_id)?;
    let now = SystemTime::now();

    let (outcome, snapshot) = {
        let mut session = handle.session().lock().await;
        let outcome = session.submit_answer(
            request.participant_id,
            request.question_id,
            request.value,
            Duration::from_millis(request.elapsed_ms),
            now,
        )?;
        (outcome, session.snapshot(now))
    };

    debug!(
        %session_id,
        participant_id = %request.participant_id,
        question_id = request.question_id,
        correct = outcome.record.correct,
        "answer recorded"
    );
    sse_events::broadcast_snapshot(&handle, &(&snapshot).into());

    Ok((&outcome).into())
}

/// Compute an on-demand snapshot for REST readers.
pub async fn get_snapshot(
    state: &SharedState,
    session_id: Uuid,
) -> Result<SessionSnapshotDto, ServiceError> {
    let handle = state.session(session_id)?;
    let now = SystemTime::now();

    let snapshot = {
        let mut session = handle.session().lock().await;
        // Reads go through the same expiry gate so a stale "active" status is
        // never observed past the deadline.
        session.expire_if_due(now);
        session.snapshot(now)
    };

    Ok((&snapshot).into())
}

/// One ticker pass: expire overdue sessions and refresh remaining-time
/// snapshots for active ones, so displays stay current without new answers.
pub async fn tick_sessions(state: &SharedState) {
    let handles: Vec<_> = state
        .sessions()
        .iter()
        .map(|entry| entry.value().clone())
        .collect();

    let now = SystemTime::now();
    for handle in handles {
        let snapshot = {
            let mut session = handle.session().lock().await;
            if session.expire_if_due(now) {
                info!(session_id = %session.id(), "session expired by ticker");
                Some(session.snapshot(now))
            } else if matches!(session.phase(), SessionPhase::Active { .. }) {
                // Waiting sessions have a static clock and completed ones are
                // frozen; only active sessions need a remaining-time refresh.
                Some(session.snapshot(now))
            } else {
                None
            }
        };

        if let Some(snapshot) = snapshot {
            sse_events::broadcast_snapshot(&handle, &(&snapshot).into());
        }
    }
}

fn build_quiz(name: String, questions: Vec<QuestionInput>) -> QuizDefinition {
    let questions: IndexMap<u32, Question> = questions
        .into_iter()
        .enumerate()
        .map(|(index, input)| {
            (
                index as u32 + 1,
                Question {
                    text: input.text,
                    options: input.options,
                    answer: input.answer,
                    points: input.points,
                },
            )
        })
        .collect();

    QuizDefinition::new(name, questions)
}

/// Borrow a session handle for SSE subscription.
pub fn session_handle(
    state: &SharedState,
    session_id: Uuid,
) -> Result<Arc<SessionHandle>, ServiceError> {
    state.session(session_id)
}
