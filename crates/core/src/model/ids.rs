use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identifier of a question as issued by the remote service.
///
/// Sources are inconsistent: some records carry integer ids, some strings,
/// and some nothing at all (the caller then assigns the 1-based record
/// position). All variants are held in canonical string form so that
/// matching the answer log against the question set is a plain equality.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct QuestionId(String);

impl QuestionId {
    /// Creates an id from an integer source value.
    #[must_use]
    pub fn from_number(id: i64) -> Self {
        Self(id.to_string())
    }

    /// Creates an id from a string source value.
    #[must_use]
    pub fn from_text(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fallback id for a record with no identifier: its 1-based position.
    #[must_use]
    pub fn from_position(position: usize) -> Self {
        Self((position + 1).to_string())
    }

    /// Returns the canonical string form used for matching.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionId({})", self.0)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for QuestionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Self::from_number(n),
            Raw::Text(s) => Self::from_text(s),
        })
    }
}
