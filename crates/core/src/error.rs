use thiserror::Error;

use crate::model::question::QuestionError;
use crate::model::shuffle::ShuffleError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Shuffle(#[from] ShuffleError),
}
