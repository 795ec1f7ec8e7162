use serde::Serialize;
use thiserror::Error;

use crate::model::ids::QuestionId;

/// Every question carries exactly this many answer options.
pub const OPTION_COUNT: usize = 4;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text is empty")]
    EmptyText,
    #[error("expected {OPTION_COUNT} options, got {got}")]
    BadOptionCount { got: usize },
    #[error("correct option index {index} is out of range")]
    CorrectIndexOutOfRange { index: i64 },
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// Difficulty level of a question.
///
/// The remote service is loose here: most records carry a number, some carry
/// an opaque label. Numeric-looking strings are coerced to numbers upstream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Difficulty {
    Numeric(f64),
    Label(String),
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::Numeric(0.0)
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single multiple-choice question, immutable once loaded.
///
/// Invariants, enforced at construction: non-empty question text, exactly
/// [`OPTION_COUNT`] options, correct index within range. A batch containing
/// any question that fails these checks is rejected wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    id: QuestionId,
    domain: String,
    level: Difficulty,
    text: String,
    options: [String; OPTION_COUNT],
    correct_index: usize,
    explanation: Option<String>,
}

impl Question {
    /// Builds a question, validating the session invariants.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyText` if the text is blank,
    /// `QuestionError::BadOptionCount` unless exactly four options are given,
    /// and `QuestionError::CorrectIndexOutOfRange` for an unusable correct
    /// index.
    pub fn new(
        id: QuestionId,
        domain: impl Into<String>,
        level: Difficulty,
        text: impl Into<String>,
        options: Vec<String>,
        correct_index: i64,
        explanation: Option<String>,
    ) -> Result<Self, QuestionError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }

        let got = options.len();
        let options: [String; OPTION_COUNT] = options
            .try_into()
            .map_err(|_| QuestionError::BadOptionCount { got })?;

        let correct = usize::try_from(correct_index)
            .ok()
            .filter(|index| *index < OPTION_COUNT)
            .ok_or(QuestionError::CorrectIndexOutOfRange {
                index: correct_index,
            })?;

        Ok(Self {
            id,
            domain: domain.into(),
            level,
            text,
            options,
            correct_index: correct,
            explanation: explanation.filter(|e| !e.trim().is_empty()),
        })
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    #[must_use]
    pub fn level(&self) -> &Difficulty {
        &self.level
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String; OPTION_COUNT] {
        &self.options
    }

    /// Option text at a canonical index.
    #[must_use]
    pub fn option(&self, canonical: usize) -> Option<&str> {
        self.options.get(canonical).map(String::as_str)
    }

    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    /// Exact equality on canonical indices.
    #[must_use]
    pub fn is_correct(&self, canonical: usize) -> bool {
        canonical == self.correct_index
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn options(values: [&str; 4]) -> Vec<String> {
        values.into_iter().map(str::to_string).collect()
    }

    #[test]
    fn builds_a_valid_question() {
        let question = Question::new(
            QuestionId::from_number(1),
            "History",
            Difficulty::Numeric(2.0),
            "Who?",
            options(["a", "b", "c", "d"]),
            3,
            Some("Because.".into()),
        )
        .unwrap();

        assert_eq!(question.correct_index(), 3);
        assert!(question.is_correct(3));
        assert!(!question.is_correct(0));
        assert_eq!(question.option(1), Some("b"));
    }

    #[test]
    fn rejects_blank_text() {
        let err = Question::new(
            QuestionId::from_number(1),
            "—",
            Difficulty::default(),
            "   ",
            options(["a", "b", "c", "d"]),
            0,
            None,
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::EmptyText);
    }

    #[test]
    fn rejects_wrong_option_count() {
        let err = Question::new(
            QuestionId::from_number(1),
            "—",
            Difficulty::default(),
            "Q",
            vec!["a".into(), "b".into()],
            0,
            None,
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::BadOptionCount { got: 2 });
    }

    #[test]
    fn rejects_out_of_range_correct_index() {
        for bad in [-1_i64, 4, 99] {
            let err = Question::new(
                QuestionId::from_number(1),
                "—",
                Difficulty::default(),
                "Q",
                options(["a", "b", "c", "d"]),
                bad,
                None,
            )
            .unwrap_err();
            assert_eq!(err, QuestionError::CorrectIndexOutOfRange { index: bad });
        }
    }

    #[test]
    fn blank_explanation_is_dropped() {
        let question = Question::new(
            QuestionId::from_number(1),
            "—",
            Difficulty::default(),
            "Q",
            options(["a", "b", "c", "d"]),
            0,
            Some("  ".into()),
        )
        .unwrap();
        assert_eq!(question.explanation(), None);
    }
}
