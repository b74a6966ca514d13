use std::cmp::Ordering;
use std::time::Duration;

use indexmap::IndexMap;
use uuid::Uuid;

use crate::state::{score::ScoreAccumulator, session::Participant};

/// One ranked row of the leaderboard.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    /// Participant identifier.
    pub participant_id: Uuid,
    /// Display name.
    pub name: String,
    /// Cumulative points.
    pub points: u32,
    /// Correct answer count.
    pub correct: u32,
    /// Total answers recorded.
    pub answered: u32,
    /// Correct answers as a percentage of the quiz's question count.
    pub percentage: f64,
    /// Average response time, absent until the first answer.
    pub average_elapsed: Option<Duration>,
}

/// Produce a deterministic ranking from the current accumulator state.
///
/// Recomputed from scratch on every call rather than incrementally cached;
/// participant counts are classroom-scale. Sort chain: points descending,
/// correct count descending, average response time ascending (participants
/// with no answers sort after any that answered), join order ascending. The
/// final key makes the order total: joins are serialized per session, so join
/// order never ties.
pub fn rank(
    participants: &IndexMap<Uuid, Participant>,
    scores: &ScoreAccumulator,
    question_count: usize,
) -> Vec<LeaderboardEntry> {
    let mut indexed: Vec<(usize, LeaderboardEntry)> = participants
        .values()
        .enumerate()
        .map(|(join_index, participant)| {
            let state = scores.state(participant.id).cloned().unwrap_or_default();
            let percentage = if question_count == 0 {
                0.0
            } else {
                f64::from(state.correct) / question_count as f64 * 100.0
            };

            (
                join_index,
                LeaderboardEntry {
                    participant_id: participant.id,
                    name: participant.name.clone(),
                    points: state.points,
                    correct: state.correct,
                    answered: state.answered(),
                    percentage,
                    average_elapsed: state.average_elapsed(),
                },
            )
        })
        .collect();

    indexed.sort_by(|(left_join, left), (right_join, right)| {
        right
            .points
            .cmp(&left.points)
            .then_with(|| right.correct.cmp(&left.correct))
            .then_with(|| cmp_average(left.average_elapsed, right.average_elapsed))
            .then_with(|| left_join.cmp(right_join))
    });

    indexed.into_iter().map(|(_, entry)| entry).collect()
}

/// Faster average wins; a participant without answers ranks after any that
/// has answered.
fn cmp_average(left: Option<Duration>, right: Option<Duration>) -> Ordering {
    match (left, right) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
