use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        format_system_time,
        snapshot::SessionStatus,
        validation::{validate_answer_value, validate_display_name},
    },
    state::{
        quiz::Question,
        score::AnswerRecord,
        session::{AnswerOutcome, LiveSession, Participant},
    },
};

/// Payload used to launch a new live session from a full quiz definition.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateSessionRequest {
    /// Quiz display name.
    #[validate(custom(function = validate_display_name))]
    pub name: String,
    /// Session time limit in seconds; the configured default applies when omitted.
    #[serde(default)]
    #[validate(range(min = 1))]
    pub time_limit_secs: Option<u64>,
    /// Ordered question sequence.
    #[validate(length(min = 1), nested)]
    pub questions: Vec<QuestionInput>,
}

/// Incoming question definition for the session bootstrap.
#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
pub struct QuestionInput {
    /// Question text shown to participants.
    #[validate(custom(function = validate_answer_value))]
    pub text: String,
    /// Proposed options; empty for free-text questions.
    #[serde(default)]
    pub options: Vec<String>,
    /// Answer key the submissions are matched against.
    #[validate(custom(function = validate_answer_value))]
    pub answer: String,
    /// Points awarded on a correct answer.
    #[validate(range(min = 1))]
    pub points: u32,
}

/// Payload for joining a session. Identity comes from the external
/// auth/join flow; the core trusts it as given.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinSessionRequest {
    /// Participant identifier supplied by the identity layer.
    pub participant_id: Uuid,
    /// Display name.
    #[validate(custom(function = validate_display_name))]
    pub name: String,
}

/// Answer submission event for one question.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SubmitAnswerRequest {
    /// Submitting participant.
    pub participant_id: Uuid,
    /// Question being answered.
    pub question_id: u32,
    /// Submitted value; matched case- and whitespace-insensitively.
    #[validate(custom(function = validate_answer_value))]
    pub value: String,
    /// Time since the question was presented to this participant.
    #[validate(range(min = 1))]
    pub elapsed_ms: u64,
}

/// Summary returned once a session has been created.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionSummary {
    pub id: Uuid,
    pub quiz_name: String,
    pub status: SessionStatus,
    pub created_at: String,
    pub updated_at: String,
    pub time_limit_secs: u64,
    pub questions: Vec<QuestionSummary>,
    pub participants: Vec<ParticipantSummary>,
}

/// Public projection of a question. The answer key is never exposed.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionSummary {
    pub id: u32,
    pub text: String,
    pub options: Vec<String>,
    pub points: u32,
}

#[derive(Debug, Serialize, ToSchema, Clone)]
/// Public projection of a participant exposed to REST/SSE clients.
pub struct ParticipantSummary {
    pub id: Uuid,
    pub name: String,
    pub joined_at: String,
}

/// Outcome returned to the submitter after an accepted answer.
#[derive(Debug, Serialize, ToSchema)]
pub struct AnswerAccepted {
    pub question_id: u32,
    pub correct: bool,
    pub points_awarded: u32,
    pub total_points: u32,
    pub streak: u32,
    pub longest_streak: u32,
    pub answered: u32,
}

impl From<(u32, &Question)> for QuestionSummary {
    fn from((id, question): (u32, &Question)) -> Self {
        Self {
            id,
            text: question.text.clone(),
            options: question.options.clone(),
            points: question.points,
        }
    }
}

impl From<&Participant> for ParticipantSummary {
    fn from(participant: &Participant) -> Self {
        Self {
            id: participant.id,
            name: participant.name.clone(),
            joined_at: format_system_time(participant.joined_at),
        }
    }
}

impl From<&LiveSession> for SessionSummary {
    fn from(session: &LiveSession) -> Self {
        Self {
            id: session.id(),
            quiz_name: session.quiz().name.clone(),
            status: (&session.phase()).into(),
            created_at: format_system_time(session.created_at()),
            updated_at: format_system_time(session.updated_at()),
            time_limit_secs: session.time_limit().as_secs(),
            questions: session
                .quiz()
                .questions
                .iter()
                .map(|(id, question)| (*id, question).into())
                .collect(),
            participants: session.participants().values().map(Into::into).collect(),
        }
    }
}

impl From<&AnswerOutcome> for AnswerAccepted {
    fn from(outcome: &AnswerOutcome) -> Self {
        let AnswerRecord {
            question_id,
            correct,
            points_awarded,
            ..
        } = outcome.record;

        Self {
            question_id,
            correct,
            points_awarded,
            total_points: outcome.state.points,
            streak: outcome.state.streak,
            longest_streak: outcome.state.longest_streak,
            answered: outcome.state.answered(),
        }
    }
}
