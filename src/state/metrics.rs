use std::time::Duration;

use indexmap::IndexMap;
use uuid::Uuid;

use crate::state::{score::ScoreAccumulator, session::Participant};

/// Badges derived from the accumulated answer history.
///
/// Every field is a pure function of the accumulator snapshot; there are no
/// incrementally mutated flags, so the whole struct can be re-derived from
/// the same state at any time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionMetrics {
    /// Fastest average responder among participants who answered at least
    /// half the questions.
    pub speed_demon: Option<Uuid>,
    /// Every participant with a perfect score; multiple winners possible.
    pub perfectionists: Vec<Uuid>,
    /// Holder of the single highest longest-streak; ties go to whoever
    /// reached that streak first.
    pub streak_master: Option<Uuid>,
    /// Session-level flag: median response time across all answers fell
    /// below the configured fast-response threshold.
    pub lightning_round: bool,
}

/// Derive all badges from the current accumulator state.
pub fn evaluate(
    participants: &IndexMap<Uuid, Participant>,
    scores: &ScoreAccumulator,
    question_count: usize,
    fast_threshold: Duration,
) -> SessionMetrics {
    SessionMetrics {
        speed_demon: speed_demon(participants, scores, question_count),
        perfectionists: perfectionists(participants, scores, question_count),
        streak_master: streak_master(participants, scores),
        lightning_round: lightning_round(&scores.all_elapsed(), fast_threshold),
    }
}

/// Participant with the lowest average elapsed time across answered
/// questions, among those who answered at least half the questions. The gate
/// keeps a single lucky fast guess from winning the badge.
pub fn speed_demon(
    participants: &IndexMap<Uuid, Participant>,
    scores: &ScoreAccumulator,
    question_count: usize,
) -> Option<Uuid> {
    let mut best: Option<(Uuid, Duration)> = None;

    for participant in participants.values() {
        let Some(state) = scores.state(participant.id) else {
            continue;
        };
        if (state.answered() as usize) * 2 < question_count {
            continue;
        }
        let Some(average) = state.average_elapsed() else {
            continue;
        };

        // Strict comparison keeps the earliest joiner on an exact tie.
        if best.map(|(_, current)| average < current).unwrap_or(true) {
            best = Some((participant.id, average));
        }
    }

    best.map(|(id, _)| id)
}

/// Every participant whose correct count equals the question count.
pub fn perfectionists(
    participants: &IndexMap<Uuid, Participant>,
    scores: &ScoreAccumulator,
    question_count: usize,
) -> Vec<Uuid> {
    if question_count == 0 {
        return Vec::new();
    }

    participants
        .values()
        .filter(|participant| {
            scores
                .state(participant.id)
                .map(|state| state.correct as usize == question_count)
                .unwrap_or(false)
        })
        .map(|participant| participant.id)
        .collect()
}

/// Holder of the single highest longest-streak value. A tie on length is
/// broken by whoever reached that streak earlier.
pub fn streak_master(
    participants: &IndexMap<Uuid, Participant>,
    scores: &ScoreAccumulator,
) -> Option<Uuid> {
    let mut best: Option<(Uuid, u32, std::time::SystemTime)> = None;

    for participant in participants.values() {
        let Some(state) = scores.state(participant.id) else {
            continue;
        };
        if state.longest_streak == 0 {
            continue;
        }
        let Some(reached_at) = state.longest_streak_at else {
            continue;
        };

        let wins = match best {
            None => true,
            Some((_, streak, at)) => {
                state.longest_streak > streak
                    || (state.longest_streak == streak && reached_at < at)
            }
        };
        if wins {
            best = Some((participant.id, state.longest_streak, reached_at));
        }
    }

    best.map(|(id, _, _)| id)
}

/// True when the median response time across all participants and questions
/// falls below the fast-response threshold.
pub fn lightning_round(all_elapsed: &[Duration], fast_threshold: Duration) -> bool {
    let Some(median) = median(all_elapsed) else {
        return false;
    };
    median < fast_threshold
}

fn median(values: &[Duration]) -> Option<Duration> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_unstable();

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2)
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::state::quiz::{Question, QuizDefinition};

    fn quiz(answers: &[(&str, u32)]) -> QuizDefinition {
        let mut questions = IndexMap::new();
        for (index, (answer, points)) in answers.iter().enumerate() {
            questions.insert(
                index as u32 + 1,
                Question {
                    text: format!("q{}", index + 1),
                    options: vec![],
                    answer: (*answer).into(),
                    points: *points,
                },
            );
        }
        QuizDefinition::new("quiz".into(), questions)
    }

    fn join(participants: &mut IndexMap<Uuid, Participant>, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        participants.insert(
            id,
            Participant {
                id,
                name: name.into(),
                joined_at: SystemTime::UNIX_EPOCH,
            },
        );
        id
    }

    fn answer(
        acc: &mut ScoreAccumulator,
        quiz: &QuizDefinition,
        participant: Uuid,
        question: u32,
        value: &str,
        submitted_secs: u64,
        elapsed_secs: u64,
    ) {
        acc.record_answer(
            quiz,
            participant,
            question,
            value.into(),
            SystemTime::UNIX_EPOCH + Duration::from_secs(submitted_secs),
            Duration::from_secs(elapsed_secs),
        )
        .unwrap();
    }

    #[test]
    fn speed_demon_requires_half_the_questions() {
        let quiz = quiz(&[("a", 1), ("b", 1), ("c", 1), ("d", 1)]);
        let mut participants = IndexMap::new();
        let lucky = join(&mut participants, "lucky");
        let steady = join(&mut participants, "steady");

        let mut acc = ScoreAccumulator::new();
        // One very fast guess does not qualify (1 of 4 answered).
        answer(&mut acc, &quiz, lucky, 1, "a", 1, 1);
        // Two answers at 4s average qualify (2 of 4 answered).
        answer(&mut acc, &quiz, steady, 1, "a", 4, 4);
        answer(&mut acc, &quiz, steady, 2, "b", 8, 4);

        assert_eq!(
            speed_demon(&participants, &acc, quiz.question_count()),
            Some(steady)
        );
    }

    #[test]
    fn speed_demon_none_when_nobody_qualifies() {
        let quiz = quiz(&[("a", 1), ("b", 1)]);
        let participants = IndexMap::new();
        let acc = ScoreAccumulator::new();
        assert_eq!(speed_demon(&participants, &acc, quiz.question_count()), None);
    }

    #[test]
    fn perfectionist_requires_every_question_correct() {
        let quiz = quiz(&[("Paris", 1), ("42", 1)]);
        let mut participants = IndexMap::new();
        let perfect = join(&mut participants, "perfect");
        let partial = join(&mut participants, "partial");

        let mut acc = ScoreAccumulator::new();
        answer(&mut acc, &quiz, perfect, 1, "Paris", 5, 5);
        answer(&mut acc, &quiz, perfect, 2, "42", 10, 5);
        answer(&mut acc, &quiz, partial, 1, "Paris", 5, 5);
        answer(&mut acc, &quiz, partial, 2, "41", 10, 5);

        assert_eq!(
            perfectionists(&participants, &acc, quiz.question_count()),
            vec![perfect]
        );
    }

    #[test]
    fn perfectionist_allows_multiple_winners() {
        let quiz = quiz(&[("x", 1)]);
        let mut participants = IndexMap::new();
        let a = join(&mut participants, "a");
        let b = join(&mut participants, "b");

        let mut acc = ScoreAccumulator::new();
        answer(&mut acc, &quiz, a, 1, "x", 2, 2);
        answer(&mut acc, &quiz, b, 1, "x", 3, 3);

        assert_eq!(
            perfectionists(&participants, &acc, quiz.question_count()),
            vec![a, b]
        );
    }

    #[test]
    fn streak_master_tie_goes_to_the_earlier_streak() {
        let quiz = quiz(&[("a", 1), ("b", 1)]);
        let mut participants = IndexMap::new();
        let late = join(&mut participants, "late");
        let early = join(&mut participants, "early");

        let mut acc = ScoreAccumulator::new();
        // Both reach a streak of 2; "early" reaches it at t=20, "late" at t=30.
        answer(&mut acc, &quiz, early, 1, "a", 10, 5);
        answer(&mut acc, &quiz, early, 2, "b", 20, 5);
        answer(&mut acc, &quiz, late, 1, "a", 15, 5);
        answer(&mut acc, &quiz, late, 2, "b", 30, 5);

        assert_eq!(streak_master(&participants, &acc), Some(early));
    }

    #[test]
    fn streak_master_none_without_any_correct_answer() {
        let quiz = quiz(&[("a", 1)]);
        let mut participants = IndexMap::new();
        let p = join(&mut participants, "p");

        let mut acc = ScoreAccumulator::new();
        answer(&mut acc, &quiz, p, 1, "nope", 5, 5);

        assert_eq!(streak_master(&participants, &acc), None);
    }

    #[test]
    fn lightning_round_uses_the_median() {
        let threshold = Duration::from_secs(5);

        // Median 4s: below threshold.
        let fast = [
            Duration::from_secs(2),
            Duration::from_secs(4),
            Duration::from_secs(30),
        ];
        assert!(lightning_round(&fast, threshold));

        // Median 6s: one outlier cannot carry the badge.
        let slow = [
            Duration::from_secs(1),
            Duration::from_secs(6),
            Duration::from_secs(8),
        ];
        assert!(!lightning_round(&slow, threshold));

        // Even count averages the middle pair: (4 + 6) / 2 = 5, not below.
        let boundary = [
            Duration::from_secs(4),
            Duration::from_secs(6),
        ];
        assert!(!lightning_round(&boundary, threshold));

        assert!(!lightning_round(&[], threshold));
    }
}
