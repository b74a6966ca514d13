use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::{format_system_time, session::ParticipantSummary},
    state::{
        leaderboard::LeaderboardEntry,
        machine::SessionPhase,
        metrics::SessionMetrics,
        session::SessionSnapshot,
    },
};

/// Session lifecycle status exposed to clients (REST/SSE).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Session created; participants may join, no answers accepted yet.
    Waiting,
    /// Session is live and accepting answers.
    Active,
    /// Session finished; read-only from here on.
    Completed,
}

impl From<&SessionPhase> for SessionStatus {
    fn from(phase: &SessionPhase) -> Self {
        match phase {
            SessionPhase::Waiting => SessionStatus::Waiting,
            SessionPhase::Active { .. } => SessionStatus::Active,
            SessionPhase::Completed { .. } => SessionStatus::Completed,
        }
    }
}

/// One ranked leaderboard row.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct LeaderboardEntryDto {
    /// 1-based rank after tie-breaking.
    pub rank: usize,
    pub participant_id: Uuid,
    pub name: String,
    pub points: u32,
    pub correct: u32,
    pub answered: u32,
    /// Correct answers as a percentage of the question count.
    pub percentage: f64,
    /// Average response time in milliseconds, absent until the first answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_ms: Option<u64>,
}

/// Badge set derived from the accumulated answer history.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct SessionMetricsDto {
    /// Fastest average responder, when someone qualifies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_demon: Option<Uuid>,
    /// Participants with a perfect score.
    pub perfectionists: Vec<Uuid>,
    /// Holder of the longest streak, when anyone has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streak_master: Option<Uuid>,
    /// Whether the session median response time beat the fast threshold.
    pub lightning_round: bool,
}

impl From<&SessionMetrics> for SessionMetricsDto {
    fn from(metrics: &SessionMetrics) -> Self {
        Self {
            speed_demon: metrics.speed_demon,
            perfectionists: metrics.perfectionists.clone(),
            streak_master: metrics.streak_master,
            lightning_round: metrics.lightning_round,
        }
    }
}

/// Consistent view of a session published after every accepted event and on
/// each timer tick.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct SessionSnapshotDto {
    pub session_id: Uuid,
    pub quiz_name: String,
    pub status: SessionStatus,
    pub question_count: usize,
    /// Seconds left on the session clock.
    pub remaining_secs: u64,
    /// Participants in join order.
    pub participants: Vec<ParticipantSummary>,
    pub leaderboard: Vec<LeaderboardEntryDto>,
    pub metrics: SessionMetricsDto,
}

impl From<&SessionSnapshot> for SessionSnapshotDto {
    fn from(snapshot: &SessionSnapshot) -> Self {
        Self {
            session_id: snapshot.session_id,
            quiz_name: snapshot.quiz_name.clone(),
            status: (&snapshot.phase).into(),
            question_count: snapshot.question_count,
            remaining_secs: snapshot.remaining.as_secs(),
            participants: snapshot
                .participants
                .iter()
                .map(|participant| ParticipantSummary {
                    id: participant.id,
                    name: participant.name.clone(),
                    joined_at: format_system_time(participant.joined_at),
                })
                .collect(),
            leaderboard: snapshot
                .leaderboard
                .iter()
                .enumerate()
                .map(|(index, entry)| entry_dto(index + 1, entry))
                .collect(),
            metrics: (&snapshot.metrics).into(),
        }
    }
}

fn entry_dto(rank: usize, entry: &LeaderboardEntry) -> LeaderboardEntryDto {
    LeaderboardEntryDto {
        rank,
        participant_id: entry.participant_id,
        name: entry.name.clone(),
        points: entry.points,
        correct: entry.correct,
        answered: entry.answered,
        percentage: entry.percentage,
        average_ms: entry
            .average_elapsed
            .map(|average| average.as_millis() as u64),
    }
}
