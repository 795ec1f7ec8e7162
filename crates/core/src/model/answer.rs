use serde::Serialize;
use std::fmt;

use crate::model::ids::QuestionId;

/// Display letter recorded for a question that timed out.
pub const TIMEOUT_LETTER: char = '-';

/// Mutually exclusive outcome of a resolved question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerStatus {
    Correct,
    Wrong,
    Timeout,
}

impl fmt::Display for AnswerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            AnswerStatus::Correct => "correct",
            AnswerStatus::Wrong => "wrong",
            AnswerStatus::Timeout => "timeout",
        };
        write!(f, "{tag}")
    }
}

/// One append-only entry of the per-question answer log.
///
/// The selected index lives in canonical (unshuffled) space; `None` records
/// "no answer / timeout" and becomes the −1 sentinel on the wire. The display
/// letter is kept for audit: it is the post-shuffle position the user saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedAnswer {
    question_id: QuestionId,
    selected_index: Option<usize>,
    selected_letter: char,
}

impl RecordedAnswer {
    #[must_use]
    pub fn answered(question_id: QuestionId, canonical: usize, display_letter: char) -> Self {
        Self {
            question_id,
            selected_index: Some(canonical),
            selected_letter: display_letter,
        }
    }

    #[must_use]
    pub fn timed_out(question_id: QuestionId) -> Self {
        Self {
            question_id,
            selected_index: None,
            selected_letter: TIMEOUT_LETTER,
        }
    }

    #[must_use]
    pub fn question_id(&self) -> &QuestionId {
        &self.question_id
    }

    /// Selected canonical index; `None` for a timeout.
    #[must_use]
    pub fn selected_index(&self) -> Option<usize> {
        self.selected_index
    }

    #[must_use]
    pub fn selected_letter(&self) -> char {
        self.selected_letter
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.selected_index.is_none()
    }
}
