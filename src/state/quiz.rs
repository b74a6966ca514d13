use indexmap::IndexMap;
use uuid::Uuid;

/// A single question of a quiz, with its answer key and point value.
#[derive(Debug, Clone)]
pub struct Question {
    /// Question text shown to participants.
    pub text: String,
    /// Proposed options, empty for free-text questions.
    pub options: Vec<String>,
    /// Expected answer the submitted value is matched against.
    pub answer: String,
    /// Points awarded for a correct answer.
    pub points: u32,
}

impl Question {
    /// Whether a submitted value matches the answer key.
    ///
    /// Comparison is case- and whitespace-insensitive: both sides are trimmed,
    /// lowercased, and internal whitespace runs are collapsed before the exact
    /// match. There is no partial credit.
    pub fn matches(&self, submitted: &str) -> bool {
        normalize_answer(submitted) == normalize_answer(&self.answer)
    }
}

/// Immutable quiz definition supplied once at session creation.
///
/// Question identifiers double as the presentation order: the map preserves
/// insertion order, so iterating yields the ordered question sequence.
#[derive(Debug, Clone)]
pub struct QuizDefinition {
    /// Stable identifier for the quiz.
    pub id: Uuid,
    /// Human readable quiz name.
    pub name: String,
    /// Ordered questions keyed by their identifier.
    pub questions: IndexMap<u32, Question>,
}

impl QuizDefinition {
    /// Build a new in-memory quiz definition, allocating a fresh identifier.
    pub fn new(name: String, questions: IndexMap<u32, Question>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            questions,
        }
    }

    /// Number of questions in the quiz.
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Look up a question by its identifier.
    pub fn question(&self, id: u32) -> Option<&Question> {
        self.questions.get(&id)
    }
}

/// Canonical form used for answer comparison: trimmed, lowercased, with
/// internal whitespace runs collapsed to a single space.
pub fn normalize_answer(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(answer: &str) -> Question {
        Question {
            text: "capital of France?".into(),
            options: vec![],
            answer: answer.into(),
            points: 1,
        }
    }

    #[test]
    fn normalization_ignores_case_and_whitespace() {
        assert_eq!(normalize_answer("  Paris "), "paris");
        assert_eq!(normalize_answer("NEW   york\tcity"), "new york city");
        assert_eq!(normalize_answer(""), "");
    }

    #[test]
    fn matching_is_exact_after_normalization() {
        let q = question("Paris");
        assert!(q.matches("paris"));
        assert!(q.matches(" PARIS  "));
        assert!(!q.matches("pari"));
        assert!(!q.matches("paris france"));
    }

    #[test]
    fn question_lookup_preserves_order() {
        let mut questions = IndexMap::new();
        questions.insert(2, question("a"));
        questions.insert(1, question("b"));
        let quiz = QuizDefinition::new("history".into(), questions);

        assert_eq!(quiz.question_count(), 2);
        let ids: Vec<u32> = quiz.questions.keys().copied().collect();
        assert_eq!(ids, vec![2, 1]);
        assert!(quiz.question(1).is_some());
        assert!(quiz.question(3).is_none());
    }
}
