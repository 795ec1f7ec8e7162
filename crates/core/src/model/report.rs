use serde::{Serialize, Serializer};

use crate::model::answer::{AnswerStatus, RecordedAnswer};
use crate::model::ids::QuestionId;
use crate::model::question::{OPTION_COUNT, Question};
use crate::model::shuffle::LETTERS;
use crate::time::format_seconds;

/// Mode tag identifying this ritual variant to the backend.
pub const RITUAL_MODE: &str = "rituel_full_v1";

/// Analysis tag carried by the completion payload for the feedback text.
pub const ANALYSIS_MODE: &str = "nova_writing_score_v1";

/// Wire sentinel for "no answer / timeout".
pub const WIRE_NO_ANSWER: i64 = -1;

fn serialize_selected_index<S: Serializer>(
    selected: &Option<usize>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match selected {
        Some(index) => serializer.serialize_i64(*index as i64),
        None => serializer.serialize_i64(WIRE_NO_ANSWER),
    }
}

//
// ─── SCORED ANSWERS ────────────────────────────────────────────────────────────
//

/// Per-answer enriched record as reported to the backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredAnswer {
    /// 1-based position of the answer in the session log.
    pub q: usize,
    pub question_id: QuestionId,
    /// Canonical selected index; the −1 sentinel on timeout.
    #[serde(serialize_with = "serialize_selected_index")]
    pub selected_index: Option<usize>,
    /// Display letter the user saw (post-shuffle), `-` on timeout.
    pub selected_letter: char,
    /// Canonical correct index; null when the question id is unmatched.
    pub correct_index: Option<usize>,
    /// Letter of the correct option in canonical space.
    pub correct_letter: Option<char>,
    pub status: AnswerStatus,
    pub is_correct: bool,
}

/// Final outcome of a session, recomputed from the answer log.
///
/// The running counter kept during the session is display-only; the score
/// reported here is derived by cross-referencing every recorded answer
/// against the original question set. An answer whose question id cannot be
/// found scores as not-correct with a null correct-index, without raising an
/// error.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreReport {
    score: u32,
    total: u32,
    time_total_seconds: u64,
    answers: Vec<ScoredAnswer>,
}

impl ScoreReport {
    #[must_use]
    pub fn from_log(
        questions: &[Question],
        log: &[RecordedAnswer],
        time_total_seconds: u64,
    ) -> Self {
        let mut score = 0;
        let answers = log
            .iter()
            .enumerate()
            .map(|(i, answer)| {
                let question = questions
                    .iter()
                    .find(|q| q.id() == answer.question_id());
                let correct_index = question.map(Question::correct_index);

                let is_correct = match (answer.selected_index(), correct_index) {
                    (Some(selected), Some(correct)) => selected == correct,
                    _ => false,
                };
                let status = if answer.is_timeout() {
                    AnswerStatus::Timeout
                } else if is_correct {
                    AnswerStatus::Correct
                } else {
                    AnswerStatus::Wrong
                };
                if is_correct {
                    score += 1;
                }

                ScoredAnswer {
                    q: i + 1,
                    question_id: answer.question_id().clone(),
                    selected_index: answer.selected_index(),
                    selected_letter: answer.selected_letter(),
                    correct_index,
                    correct_letter: correct_index
                        .filter(|index| *index < OPTION_COUNT)
                        .map(|index| LETTERS[index]),
                    status,
                    is_correct,
                }
            })
            .collect();

        Self {
            score,
            total: questions.len() as u32,
            time_total_seconds,
            answers,
        }
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn time_total_seconds(&self) -> u64 {
        self.time_total_seconds
    }

    #[must_use]
    pub fn answers(&self) -> &[ScoredAnswer] {
        &self.answers
    }
}

//
// ─── COMPLETION PAYLOAD ────────────────────────────────────────────────────────
//

/// The completion payload, built exactly once after the final question
/// resolves and never mutated afterwards. Submission retries resend this
/// identical object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionPayload {
    pub mode: String,
    pub score: u32,
    pub total: u32,
    pub time_spent_seconds: u64,
    pub time_total_seconds: u64,
    pub time_formatted: String,
    pub answers: Vec<ScoredAnswer>,
    pub comment_text: String,
    pub analysis_mode: String,
    pub attempt_id: String,
    /// Alias of `attempt_id` kept for server-side compatibility.
    pub attempt_record_id: String,
    pub telegram_user_id: Option<String>,
}

impl CompletionPayload {
    #[must_use]
    pub fn build(
        report: &ScoreReport,
        feedback: &str,
        attempt_id: &str,
        telegram_user_id: Option<&str>,
    ) -> Self {
        Self {
            mode: RITUAL_MODE.to_string(),
            score: report.score(),
            total: report.total(),
            time_spent_seconds: report.time_total_seconds(),
            time_total_seconds: report.time_total_seconds(),
            time_formatted: format_seconds(report.time_total_seconds()),
            answers: report.answers().to_vec(),
            comment_text: feedback.trim().to_string(),
            analysis_mode: ANALYSIS_MODE.to_string(),
            attempt_id: attempt_id.to_string(),
            attempt_record_id: attempt_id.to_string(),
            telegram_user_id: telegram_user_id.map(str::to_string),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::question::Difficulty;

    fn question(id: i64, correct: i64) -> Question {
        Question::new(
            QuestionId::from_number(id),
            "—",
            Difficulty::default(),
            format!("Q{id}"),
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct,
            None,
        )
        .unwrap()
    }

    #[test]
    fn score_matches_correct_count_for_every_session_length() {
        for len in 0..=15_i64 {
            let questions: Vec<Question> = (1..=len).map(|id| question(id, 1)).collect();
            // Alternate correct / wrong / timeout across the log.
            let log: Vec<RecordedAnswer> = (1..=len)
                .map(|id| match id % 3 {
                    0 => RecordedAnswer::timed_out(QuestionId::from_number(id)),
                    1 => RecordedAnswer::answered(QuestionId::from_number(id), 1, 'A'),
                    _ => RecordedAnswer::answered(QuestionId::from_number(id), 0, 'B'),
                })
                .collect();

            let report = ScoreReport::from_log(&questions, &log, 0);
            let expected = report.answers().iter().filter(|a| a.is_correct).count() as u32;
            assert_eq!(report.score(), expected);
            assert_eq!(report.total(), len as u32);
            assert_eq!(report.answers().len(), len as usize);
        }
    }

    #[test]
    fn unmatched_question_id_scores_as_not_correct() {
        let questions = vec![question(1, 0)];
        let log = vec![RecordedAnswer::answered(
            QuestionId::from_number(999),
            0,
            'A',
        )];

        let report = ScoreReport::from_log(&questions, &log, 5);
        assert_eq!(report.score(), 0);
        let answer = &report.answers()[0];
        assert_eq!(answer.correct_index, None);
        assert_eq!(answer.correct_letter, None);
        assert_eq!(answer.status, AnswerStatus::Wrong);
        assert!(!answer.is_correct);
    }

    #[test]
    fn timeout_never_counts_as_correct() {
        let questions = vec![question(1, 0)];
        let log = vec![RecordedAnswer::timed_out(QuestionId::from_number(1))];

        let report = ScoreReport::from_log(&questions, &log, 61);
        assert_eq!(report.score(), 0);
        assert_eq!(report.answers()[0].status, AnswerStatus::Timeout);
    }

    #[test]
    fn wire_shape_uses_sentinel_and_null() {
        let questions = vec![question(1, 2)];
        let log = vec![
            RecordedAnswer::timed_out(QuestionId::from_number(1)),
            RecordedAnswer::answered(QuestionId::from_number(77), 2, 'C'),
        ];
        let report = ScoreReport::from_log(&questions, &log, 75);
        let payload = CompletionPayload::build(&report, "merci", "AT-1", Some("42"));

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["answers"][0]["selected_index"], -1);
        assert_eq!(json["answers"][0]["selected_letter"], "-");
        assert_eq!(json["answers"][0]["status"], "timeout");
        assert_eq!(json["answers"][1]["correct_index"], serde_json::Value::Null);
        assert_eq!(json["answers"][0]["correct_letter"], "C");
        assert_eq!(json["mode"], RITUAL_MODE);
        assert_eq!(json["time_formatted"], "01:15");
        assert_eq!(json["attempt_record_id"], "AT-1");
    }

    #[test]
    fn payload_is_built_from_the_report_once() {
        let questions = vec![question(1, 0)];
        let log = vec![RecordedAnswer::answered(QuestionId::from_number(1), 0, 'D')];
        let report = ScoreReport::from_log(&questions, &log, 10);

        let payload = CompletionPayload::build(&report, "  trimmed  ", "AT-2", None);
        assert_eq!(payload.score, 1);
        assert_eq!(payload.comment_text, "trimmed");
        assert_eq!(payload.telegram_user_id, None);
        assert_eq!(payload.attempt_id, payload.attempt_record_id);
    }
}
