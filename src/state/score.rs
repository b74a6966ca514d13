use std::collections::HashSet;
use std::time::{Duration, SystemTime};

use indexmap::IndexMap;
use uuid::Uuid;

use crate::{error::ServiceError, state::quiz::QuizDefinition};

/// One accepted answer. Immutable once recorded; resubmission for the same
/// (participant, question) pair is rejected, never overwritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    /// Participant who submitted the answer.
    pub participant_id: Uuid,
    /// Question the answer targets.
    pub question_id: u32,
    /// Submitted value as received (before normalization).
    pub value: String,
    /// Wall-clock submission timestamp.
    pub submitted_at: SystemTime,
    /// Time the participant took since the question was presented to them.
    pub elapsed: Duration,
    /// Whether the value matched the answer key.
    pub correct: bool,
    /// Points awarded; the question's value when correct, zero otherwise.
    pub points_awarded: u32,
}

/// Running score state for one participant, a pure fold over that
/// participant's ordered answer stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParticipantScoreState {
    /// Cumulative points.
    pub points: u32,
    /// Count of correct answers.
    pub correct: u32,
    /// Count of incorrect answers.
    pub incorrect: u32,
    /// Per-question response times, in submission order.
    pub elapsed_times: Vec<Duration>,
    /// Current consecutive-correct streak.
    pub streak: u32,
    /// Highest streak observed so far.
    pub longest_streak: u32,
    /// When the longest streak was reached; used for tie-breaking.
    pub longest_streak_at: Option<SystemTime>,
}

impl ParticipantScoreState {
    /// Total answers recorded for this participant.
    pub fn answered(&self) -> u32 {
        self.correct + self.incorrect
    }

    /// Average response time across answered questions, if any.
    pub fn average_elapsed(&self) -> Option<Duration> {
        if self.elapsed_times.is_empty() {
            return None;
        }
        let total: Duration = self.elapsed_times.iter().sum();
        Some(total / self.elapsed_times.len() as u32)
    }

    fn fold(&mut self, record: &AnswerRecord) {
        self.points = self.points.saturating_add(record.points_awarded);
        self.elapsed_times.push(record.elapsed);

        if record.correct {
            self.correct += 1;
            self.streak += 1;
            if self.streak > self.longest_streak {
                self.longest_streak = self.streak;
                self.longest_streak_at = Some(record.submitted_at);
            }
        } else {
            self.incorrect += 1;
            self.streak = 0;
        }
    }
}

/// Accumulates answers into per-participant score state as they arrive.
///
/// Out-of-order per-question answers are accepted since participants progress
/// independently; duplicate-submission protection is the only ordering
/// invariant enforced. Recording an answer mutates only the state of the
/// named participant.
#[derive(Debug, Clone, Default)]
pub struct ScoreAccumulator {
    states: IndexMap<Uuid, ParticipantScoreState>,
    answered: HashSet<(Uuid, u32)>,
    records: Vec<AnswerRecord>,
}

impl ScoreAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one answer, returning the accepted record and the participant's
    /// updated score state.
    ///
    /// Correctness is determined against the quiz's answer key; the award is
    /// the question's point value or zero, with no partial credit. Rejections
    /// leave the accumulator untouched.
    pub fn record_answer(
        &mut self,
        quiz: &QuizDefinition,
        participant_id: Uuid,
        question_id: u32,
        value: String,
        submitted_at: SystemTime,
        elapsed: Duration,
    ) -> Result<(AnswerRecord, ParticipantScoreState), ServiceError> {
        let question = quiz
            .question(question_id)
            .ok_or(ServiceError::UnknownQuestion(question_id))?;

        if self.answered.contains(&(participant_id, question_id)) {
            return Err(ServiceError::DuplicateAnswer {
                participant_id,
                question_id,
            });
        }

        let correct = question.matches(&value);
        let record = AnswerRecord {
            participant_id,
            question_id,
            value,
            submitted_at,
            elapsed,
            correct,
            points_awarded: if correct { question.points } else { 0 },
        };

        self.answered.insert((participant_id, question_id));
        let state = self.states.entry(participant_id).or_default();
        state.fold(&record);
        let state = state.clone();
        self.records.push(record.clone());

        Ok((record, state))
    }

    /// Per-participant score states, in first-answer order.
    pub fn states(&self) -> &IndexMap<Uuid, ParticipantScoreState> {
        &self.states
    }

    /// Score state for one participant, if they answered anything yet.
    pub fn state(&self, participant_id: Uuid) -> Option<&ParticipantScoreState> {
        self.states.get(&participant_id)
    }

    /// Every accepted answer, in arrival order.
    pub fn records(&self) -> &[AnswerRecord] {
        &self.records
    }

    /// Response times across all participants and all questions.
    pub fn all_elapsed(&self) -> Vec<Duration> {
        self.records.iter().map(|record| record.elapsed).collect()
    }
}
