use std::time::{Duration, SystemTime};

use indexmap::IndexMap;
use uuid::Uuid;

use crate::{
    error::ServiceError,
    state::{
        leaderboard::{self, LeaderboardEntry},
        machine::{CompletionReason, SessionEvent, SessionPhase, SessionStateMachine},
        metrics::{self, SessionMetrics},
        quiz::QuizDefinition,
        score::{AnswerRecord, ParticipantScoreState, ScoreAccumulator},
    },
};

/// One participant of a live session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// Identifier supplied by the external identity flow.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// When the participant joined.
    pub joined_at: SystemTime,
}

/// Result of one accepted answer submission.
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    /// The immutable record that was accepted.
    pub record: AnswerRecord,
    /// The participant's score state after folding the record in.
    pub state: ParticipantScoreState,
}

/// Complete, consistent, read-only view of a session at one instant.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Session identifier.
    pub session_id: Uuid,
    /// Name of the quiz being played.
    pub quiz_name: String,
    /// Lifecycle phase at the snapshot instant.
    pub phase: SessionPhase,
    /// Number of questions in the quiz.
    pub question_count: usize,
    /// Participants in join order.
    pub participants: Vec<Participant>,
    /// Ranked leaderboard, recomputed from scratch.
    pub leaderboard: Vec<LeaderboardEntry>,
    /// Derived badges.
    pub metrics: SessionMetrics,
    /// Time left on the session clock.
    pub remaining: Duration,
}

/// All state for one running session: lifecycle machine, participants, and
/// the score accumulator, mutated strictly sequentially by its single owner.
///
/// Every mutating entry point takes `now` explicitly and first evaluates time
/// expiry, so an answer racing the deadline is rejected rather than accepted
/// after the nominal limit. All inputs being explicit also makes replaying an
/// event stream deterministic.
#[derive(Debug, Clone)]
pub struct LiveSession {
    id: Uuid,
    quiz: QuizDefinition,
    time_limit: Duration,
    fast_threshold: Duration,
    machine: SessionStateMachine,
    participants: IndexMap<Uuid, Participant>,
    scores: ScoreAccumulator,
    created_at: SystemTime,
    updated_at: SystemTime,
}

impl LiveSession {
    /// Create a session in the waiting phase around an immutable quiz.
    pub fn new(
        quiz: QuizDefinition,
        time_limit: Duration,
        fast_threshold: Duration,
        now: SystemTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            quiz,
            time_limit,
            fast_threshold,
            machine: SessionStateMachine::new(),
            participants: IndexMap::new(),
            scores: ScoreAccumulator::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Session identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        self.machine.phase()
    }

    /// The quiz this session runs.
    pub fn quiz(&self) -> &QuizDefinition {
        &self.quiz
    }

    /// Configured time limit.
    pub fn time_limit(&self) -> Duration {
        self.time_limit
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// Last mutation timestamp.
    pub fn updated_at(&self) -> SystemTime {
        self.updated_at
    }

    /// Participants in join order.
    pub fn participants(&self) -> &IndexMap<Uuid, Participant> {
        &self.participants
    }

    /// Complete the session if its time limit has elapsed.
    ///
    /// Evaluated before every inbound event so expiry and the event are
    /// ordered atomically under the session's single owner. Returns true when
    /// the session transitioned.
    pub fn expire_if_due(&mut self, now: SystemTime) -> bool {
        let Some(started_at) = self.machine.started_at() else {
            return false;
        };
        let elapsed = now.duration_since(started_at).unwrap_or_default();
        if elapsed < self.time_limit {
            return false;
        }

        // Infallible: the machine is active, so End is a legal event.
        let _ = self.machine.apply(SessionEvent::End {
            reason: CompletionReason::TimeExpired,
        });
        self.updated_at = now;
        true
    }

    /// Register a participant. Joins are accepted while waiting or active
    /// (late joiners allowed); a duplicate join by the same identity is
    /// idempotent and returns the existing participant.
    pub fn join(
        &mut self,
        participant_id: Uuid,
        name: String,
        now: SystemTime,
    ) -> Result<Participant, ServiceError> {
        self.expire_if_due(now);

        if self.machine.is_completed() {
            return Err(ServiceError::SessionClosed);
        }

        if let Some(existing) = self.participants.get(&participant_id) {
            return Ok(existing.clone());
        }

        let participant = Participant {
            id: participant_id,
            name,
            joined_at: now,
        };
        self.participants.insert(participant_id, participant.clone());
        self.updated_at = now;
        Ok(participant)
    }

    /// Start the session, recording the start timestamp.
    pub fn start(&mut self, now: SystemTime) -> Result<SessionPhase, ServiceError> {
        self.expire_if_due(now);

        if self.machine.is_completed() {
            return Err(ServiceError::SessionClosed);
        }

        let phase = self.machine.apply(SessionEvent::Start { at: now })?;
        self.updated_at = now;
        Ok(phase)
    }

    /// End the session explicitly. Ending an already-completed session is a
    /// no-op success so trainer clients can retry safely.
    pub fn end(&mut self, now: SystemTime) -> Result<SessionPhase, ServiceError> {
        self.expire_if_due(now);

        if self.machine.is_completed() {
            return Ok(self.machine.phase());
        }

        let phase = self.machine.apply(SessionEvent::End {
            reason: CompletionReason::ManualStop,
        })?;
        self.updated_at = now;
        Ok(phase)
    }

    /// Submit one answer. Accepted only while active, from a known
    /// participant, for a known question not yet answered by them.
    /// Rejections are all-or-nothing: no state changes on failure.
    pub fn submit_answer(
        &mut self,
        participant_id: Uuid,
        question_id: u32,
        value: String,
        elapsed: Duration,
        now: SystemTime,
    ) -> Result<AnswerOutcome, ServiceError> {
        self.expire_if_due(now);

        match self.machine.phase() {
            SessionPhase::Waiting => return Err(ServiceError::SessionNotStarted),
            SessionPhase::Completed { .. } => return Err(ServiceError::SessionClosed),
            SessionPhase::Active { .. } => {}
        }

        if !self.participants.contains_key(&participant_id) {
            return Err(ServiceError::UnknownParticipant(participant_id));
        }

        let (record, state) =
            self.scores
                .record_answer(&self.quiz, participant_id, question_id, value, now, elapsed)?;
        self.updated_at = now;
        Ok(AnswerOutcome { record, state })
    }

    /// Time left on the session clock: the full limit while waiting, the
    /// saturating remainder while active, zero once completed.
    pub fn remaining(&self, now: SystemTime) -> Duration {
        match self.machine.phase() {
            SessionPhase::Waiting => self.time_limit,
            SessionPhase::Active { started_at } => {
                let elapsed = now.duration_since(started_at).unwrap_or_default();
                self.time_limit.saturating_sub(elapsed)
            }
            SessionPhase::Completed { .. } => Duration::ZERO,
        }
    }

    /// Build a consistent read-only snapshot: phase, participants, ranked
    /// leaderboard, derived badges, and remaining time.
    pub fn snapshot(&self, now: SystemTime) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            quiz_name: self.quiz.name.clone(),
            phase: self.machine.phase(),
            question_count: self.quiz.question_count(),
            participants: self.participants.values().cloned().collect(),
            leaderboard: leaderboard::rank(
                &self.participants,
                &self.scores,
                self.quiz.question_count(),
            ),
            metrics: metrics::evaluate(
                &self.participants,
                &self.scores,
                self.quiz.question_count(),
                self.fast_threshold,
            ),
            remaining: self.remaining(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::quiz::Question;

    const LIMIT: Duration = Duration::from_secs(60);
    const FAST: Duration = Duration::from_secs(5);

    fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn paris_quiz() -> QuizDefinition {
        let mut questions = IndexMap::new();
        questions.insert(
            1,
            Question {
                text: "capital of France?".into(),
                options: vec!["Paris".into(), "Rome".into()],
                answer: "Paris".into(),
                points: 1,
            },
        );
        questions.insert(
            2,
            Question {
                text: "answer to everything?".into(),
                options: vec![],
                answer: "42".into(),
                points: 1,
            },
        );
        QuizDefinition::new("warmup".into(), questions)
    }

    fn started_session() -> (LiveSession, Uuid, Uuid) {
        let mut session = LiveSession::new(paris_quiz(), LIMIT, FAST, at(0));
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        session.join(a, "Ada".into(), at(1)).unwrap();
        session.join(b, "Brian".into(), at(2)).unwrap();
        session.start(at(10)).unwrap();
        (session, a, b)
    }

    #[test]
    fn answers_rejected_before_start() {
        let mut session = LiveSession::new(paris_quiz(), LIMIT, FAST, at(0));
        let p = Uuid::new_v4();
        session.join(p, "Ada".into(), at(1)).unwrap();

        let err = session
            .submit_answer(p, 1, "Paris".into(), Duration::from_secs(5), at(2))
            .unwrap_err();
        assert!(matches!(err, ServiceError::SessionNotStarted));
    }

    #[test]
    fn two_question_scenario_scores_and_streaks() {
        let (mut session, a, b) = started_session();

        // A: Q1 correct (5s), Q2 incorrect (10s).
        let outcome = session
            .submit_answer(a, 1, "Paris".into(), Duration::from_secs(5), at(15))
            .unwrap();
        assert!(outcome.record.correct);
        let outcome = session
            .submit_answer(a, 2, "41".into(), Duration::from_secs(10), at(25))
            .unwrap();
        assert!(!outcome.record.correct);
        assert_eq!(outcome.state.points, 1);
        assert_eq!(outcome.state.streak, 0);
        assert_eq!(outcome.state.longest_streak, 1);

        // B: Q1 incorrect (6s), Q2 correct (4s) -> faster average.
        session
            .submit_answer(b, 1, "Rome".into(), Duration::from_secs(6), at(16))
            .unwrap();
        session
            .submit_answer(b, 2, "42".into(), Duration::from_secs(4), at(20))
            .unwrap();

        let snapshot = session.snapshot(at(30));
        // Tied on points and correct count; B's 5s average beats A's 7.5s.
        assert_eq!(snapshot.leaderboard[0].participant_id, b);
        assert_eq!(snapshot.leaderboard[1].participant_id, a);
        assert_eq!(snapshot.leaderboard[0].points, 1);
        assert_eq!(snapshot.leaderboard[1].percentage, 50.0);
    }

    #[test]
    fn perfectionist_awarded_only_for_full_score() {
        let (mut session, a, b) = started_session();

        session
            .submit_answer(a, 1, "Paris".into(), Duration::from_secs(5), at(15))
            .unwrap();
        session
            .submit_answer(a, 2, "42".into(), Duration::from_secs(5), at(20))
            .unwrap();
        session
            .submit_answer(b, 1, "Paris".into(), Duration::from_secs(5), at(15))
            .unwrap();
        session
            .submit_answer(b, 2, "41".into(), Duration::from_secs(5), at(20))
            .unwrap();

        let snapshot = session.snapshot(at(30));
        assert_eq!(snapshot.metrics.perfectionists, vec![a]);
    }

    #[test]
    fn duplicate_answer_rejected_without_state_change() {
        let (mut session, a, _) = started_session();

        session
            .submit_answer(a, 1, "Paris".into(), Duration::from_secs(5), at(15))
            .unwrap();
        let before = session.snapshot(at(16));

        let err = session
            .submit_answer(a, 1, "Rome".into(), Duration::from_secs(2), at(17))
            .unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateAnswer { .. }));

        let after = session.snapshot(at(16));
        assert_eq!(before.leaderboard, after.leaderboard);
    }

    #[test]
    fn unknown_participant_rejected() {
        let (mut session, _, _) = started_session();
        let stranger = Uuid::new_v4();

        let err = session
            .submit_answer(stranger, 1, "Paris".into(), Duration::from_secs(5), at(15))
            .unwrap_err();
        assert!(matches!(err, ServiceError::UnknownParticipant(id) if id == stranger));
    }

    #[test]
    fn answer_after_time_limit_rejected_without_explicit_end() {
        let (mut session, a, _) = started_session();

        // Started at t=10 with a 60s limit: t=71 is past the deadline.
        let err = session
            .submit_answer(a, 1, "Paris".into(), Duration::from_secs(5), at(71))
            .unwrap_err();
        assert!(matches!(err, ServiceError::SessionClosed));
        assert_eq!(
            session.phase(),
            SessionPhase::Completed {
                reason: CompletionReason::TimeExpired
            }
        );
    }

    #[test]
    fn expiry_at_the_exact_deadline() {
        let (mut session, a, _) = started_session();

        // elapsed == limit already expires.
        let err = session
            .submit_answer(a, 1, "Paris".into(), Duration::from_secs(5), at(70))
            .unwrap_err();
        assert!(matches!(err, ServiceError::SessionClosed));
    }

    #[test]
    fn end_is_idempotent() {
        let (mut session, _, _) = started_session();

        let first = session.end(at(20)).unwrap();
        assert_eq!(
            first,
            SessionPhase::Completed {
                reason: CompletionReason::ManualStop
            }
        );
        let updated = session.updated_at();

        // Second end: success, same phase, no state change.
        let second = session.end(at(25)).unwrap();
        assert_eq!(second, first);
        assert_eq!(session.updated_at(), updated);
    }

    #[test]
    fn completed_session_rejects_everything_but_reads() {
        let (mut session, a, _) = started_session();
        session.end(at(20)).unwrap();

        assert!(matches!(
            session
                .submit_answer(a, 1, "Paris".into(), Duration::from_secs(5), at(21))
                .unwrap_err(),
            ServiceError::SessionClosed
        ));
        assert!(matches!(
            session.start(at(22)).unwrap_err(),
            ServiceError::SessionClosed
        ));
        assert!(matches!(
            session.join(Uuid::new_v4(), "Late".into(), at(23)).unwrap_err(),
            ServiceError::SessionClosed
        ));

        // Snapshots remain available.
        let snapshot = session.snapshot(at(24));
        assert_eq!(snapshot.remaining, Duration::ZERO);
    }

    #[test]
    fn late_join_during_active_is_allowed() {
        let (mut session, _, _) = started_session();
        let late = Uuid::new_v4();

        let participant = session.join(late, "Late".into(), at(30)).unwrap();
        assert_eq!(participant.joined_at, at(30));
        assert_eq!(session.participants().len(), 3);
    }

    #[test]
    fn rejoin_is_idempotent() {
        let (mut session, a, _) = started_session();

        let again = session.join(a, "Ada II".into(), at(30)).unwrap();
        // Existing participant returned unchanged.
        assert_eq!(again.name, "Ada");
        assert_eq!(session.participants().len(), 2);
    }

    #[test]
    fn remaining_time_tracks_the_clock() {
        let (session, _, _) = started_session();

        assert_eq!(session.remaining(at(10)), LIMIT);
        assert_eq!(session.remaining(at(40)), Duration::from_secs(30));
        assert_eq!(session.remaining(at(200)), Duration::ZERO);
    }

    #[test]
    fn replaying_events_yields_identical_snapshots() {
        let build = || {
            let (mut session, a, b) = started_session();
            session
                .submit_answer(a, 1, "Paris".into(), Duration::from_secs(5), at(15))
                .unwrap();
            session
                .submit_answer(b, 1, "Rome".into(), Duration::from_secs(6), at(16))
                .unwrap();
            session
                .submit_answer(b, 2, "42".into(), Duration::from_secs(4), at(20))
                .unwrap();
            session
        };

        let first = build().snapshot(at(30));
        let second = build().snapshot(at(30));
        assert_eq!(first.leaderboard.len(), second.leaderboard.len());
        for (left, right) in first.leaderboard.iter().zip(second.leaderboard.iter()) {
            assert_eq!(left.points, right.points);
            assert_eq!(left.correct, right.correct);
            assert_eq!(left.average_elapsed, right.average_elapsed);
        }
        assert_eq!(first.metrics.lightning_round, second.metrics.lightning_round);
    }
}
