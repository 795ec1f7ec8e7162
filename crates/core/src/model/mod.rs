mod answer;
mod ids;
pub mod question;
pub mod report;
pub mod shuffle;

pub use answer::{AnswerStatus, RecordedAnswer};
pub use ids::QuestionId;
pub use question::{Difficulty, OPTION_COUNT, Question, QuestionError};
pub use report::{
    ANALYSIS_MODE, CompletionPayload, RITUAL_MODE, ScoreReport, ScoredAnswer, WIRE_NO_ANSWER,
};
pub use shuffle::{DisplayShuffle, LETTERS, ShuffleError};
