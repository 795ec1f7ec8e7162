//! Question normalizer: maps heterogeneous remote records into canonical
//! [`Question`]s.
//!
//! The remote service is a thin veneer over a spreadsheet, so the same
//! logical field shows up under several capitalizations and aliases, and the
//! options list sometimes arrives as a JSON-encoded string. Alias resolution
//! is a declarative table per logical field, evaluated in priority order.

use serde_json::Value;

use ritual_core::model::{Difficulty, OPTION_COUNT, Question, QuestionError, QuestionId};

use crate::canon::canonicalize;
use crate::error::QuestionSourceError;

const ID_FIELDS: &[&str] = &["id", "ID", "ID_question"];
const DOMAIN_FIELDS: &[&str] = &["domain", "Domaine", "domaine", "DOMAINE"];
const LEVEL_FIELDS: &[&str] = &["level", "Niveau", "niveau", "LEVEL"];
const QUESTION_FIELDS: &[&str] = &["question", "Question", "texte"];
const OPTIONS_FIELDS: &[&str] = &["options", "Options", "choices", "Options (JSON)"];
const CORRECT_FIELDS: &[&str] = &["correct_index", "Correct_index"];
const EXPLANATION_FIELDS: &[&str] = &["explanation", "Explanation", "Explication", "explication"];

/// Placeholder domain label for records that carry none.
pub const UNKNOWN_DOMAIN: &str = "—";

fn first_field<'a>(record: &'a Value, names: &[&str]) -> Option<&'a Value> {
    let object = record.as_object()?;
    names
        .iter()
        .find_map(|name| object.get(*name))
        .filter(|value| !value.is_null())
}

/// Unwraps the response envelope: `{questions: [...]}`, `{items: [...]}`, or
/// a bare array. Anything else yields no records.
#[must_use]
pub fn extract_items(body: &Value) -> Vec<Value> {
    let items = match body {
        Value::Object(map) => map
            .get("questions")
            .or_else(|| map.get("items"))
            .and_then(Value::as_array),
        Value::Array(items) => Some(items),
        _ => None,
    };
    items.cloned().unwrap_or_default()
}

/// Normalizes one raw record at the given 0-based position.
///
/// # Errors
///
/// Returns `QuestionError` when the normalized record still lacks non-empty
/// text, exactly four options, or a usable correct index. The caller must
/// treat any failure as fatal for the whole batch.
pub fn normalize_record(record: &Value, position: usize) -> Result<Question, QuestionError> {
    let id = match first_field(record, ID_FIELDS) {
        Some(Value::Number(n)) => match n.as_i64() {
            Some(n) => QuestionId::from_number(n),
            None => QuestionId::from_text(n.to_string()),
        },
        Some(Value::String(s)) => QuestionId::from_text(s.clone()),
        _ => QuestionId::from_position(position),
    };

    let domain = match first_field(record, DOMAIN_FIELDS) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => UNKNOWN_DOMAIN.to_string(),
    };

    let level = match first_field(record, LEVEL_FIELDS) {
        Some(Value::Number(n)) => Difficulty::Numeric(n.as_f64().unwrap_or(0.0)),
        Some(Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Difficulty::Numeric(n),
            _ => Difficulty::Label(s.clone()),
        },
        _ => Difficulty::default(),
    };

    let text = first_field(record, QUESTION_FIELDS)
        .and_then(Value::as_str)
        .unwrap_or_default();

    let options = normalize_options(first_field(record, OPTIONS_FIELDS));

    let correct_index = match first_field(record, CORRECT_FIELDS) {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<i64>().unwrap_or(0),
        _ => 0,
    };

    let explanation = first_field(record, EXPLANATION_FIELDS)
        .and_then(Value::as_str)
        .map(canonicalize);

    Question::new(
        id,
        domain,
        level,
        canonicalize(text),
        options,
        correct_index,
        explanation,
    )
}

/// Truncates to four options and pads with empty strings; a JSON-encoded
/// string is parsed, falling back to an empty list on parse failure.
fn normalize_options(raw: Option<&Value>) -> Vec<String> {
    let items: Vec<Value> = match raw {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::String(encoded)) => serde_json::from_str(encoded).unwrap_or_default(),
        _ => Vec::new(),
    };

    let mut options: Vec<String> = items
        .into_iter()
        .take(OPTION_COUNT)
        .map(|item| match item {
            Value::String(s) => canonicalize(&s),
            Value::Number(n) => n.to_string(),
            _ => String::new(),
        })
        .collect();
    options.resize(OPTION_COUNT, String::new());
    options
}

/// Normalizes a full batch, rejecting it wholesale on any failure.
///
/// # Errors
///
/// Returns `QuestionSourceError::TooFew` when the service yielded fewer
/// records than requested, and `QuestionSourceError::Invalid` when any
/// record fails validation after normalization (no partial sessions).
pub fn normalize_batch(
    raw: &[Value],
    count: usize,
) -> Result<Vec<Question>, QuestionSourceError> {
    if raw.len() < count {
        return Err(QuestionSourceError::TooFew {
            got: raw.len(),
            need: count,
        });
    }

    raw.iter()
        .take(count)
        .enumerate()
        .map(|(position, record)| normalize_record(record, position).map_err(Into::into))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_aliased_record_with_encoded_options() {
        let record = json!({
            "Question": "X",
            "Options": "[\"a\",\"b\"]",
            "Correct_index": 1
        });

        let question = normalize_record(&record, 4).unwrap();
        assert_eq!(question.text(), "X");
        assert_eq!(question.options(), &["a", "b", "", ""]);
        assert_eq!(question.correct_index(), 1);
        // Missing id falls back to the 1-based record position.
        assert_eq!(question.id().as_str(), "5");
        assert_eq!(question.domain(), UNKNOWN_DOMAIN);
    }

    #[test]
    fn resolves_aliases_in_priority_order() {
        let record = json!({
            "ID_question": 12,
            "Domaine": "Histoire",
            "Niveau": "3",
            "texte": "Qui?",
            "choices": ["un", "deux", "trois", "quatre"],
            "Explication": "Parce que."
        });

        let question = normalize_record(&record, 0).unwrap();
        assert_eq!(question.id().as_str(), "12");
        assert_eq!(question.domain(), "Histoire");
        assert_eq!(question.level(), &Difficulty::Numeric(3.0));
        assert_eq!(question.text(), "Qui?");
        assert_eq!(question.explanation(), Some("Parce que."));
        // Missing correct index defaults to 0.
        assert_eq!(question.correct_index(), 0);
    }

    #[test]
    fn non_numeric_level_stays_an_opaque_label() {
        let record = json!({
            "question": "Q",
            "options": ["a", "b", "c", "d"],
            "level": "expert"
        });
        let question = normalize_record(&record, 0).unwrap();
        assert_eq!(question.level(), &Difficulty::Label("expert".into()));
    }

    #[test]
    fn unparseable_encoded_options_fall_back_to_empty() {
        let record = json!({
            "question": "Q",
            "options": "not json",
            "correct_index": 0
        });
        // Parse failure falls back to an empty list, which pads to four
        // empty options; the question still validates structurally.
        let question = normalize_record(&record, 0).unwrap();
        assert_eq!(question.options(), &["", "", "", ""]);
    }

    #[test]
    fn canonicalizes_free_text_fields() {
        let record = json!({
            "question": "Où est le cœur?",
            "options": ["à gauche", "b", "c", "d"],
            "explanation": "Évident"
        });
        let question = normalize_record(&record, 0).unwrap();
        assert_eq!(question.text(), "Ou est le coeur?");
        assert_eq!(question.option(0), Some("a gauche"));
        assert_eq!(question.explanation(), Some("Evident"));
    }

    #[test]
    fn extracts_every_envelope_shape() {
        let bare = json!([{"question": "Q"}]);
        let wrapped = json!({"questions": [{"question": "Q"}]});
        let items = json!({"items": [{"question": "Q"}, {"question": "R"}]});

        assert_eq!(extract_items(&bare).len(), 1);
        assert_eq!(extract_items(&wrapped).len(), 1);
        assert_eq!(extract_items(&items).len(), 2);
        assert!(extract_items(&json!({"status": "ok"})).is_empty());
    }

    #[test]
    fn batch_fails_wholesale_when_too_few() {
        let raw = vec![json!({"question": "Q", "options": ["a","b","c","d"]})];
        let err = normalize_batch(&raw, 2).unwrap_err();
        assert!(matches!(
            err,
            QuestionSourceError::TooFew { got: 1, need: 2 }
        ));
    }

    #[test]
    fn batch_fails_wholesale_on_invalid_record() {
        let raw = vec![
            json!({"question": "Q", "options": ["a","b","c","d"]}),
            json!({"question": "", "options": ["a","b","c","d"]}),
        ];
        let err = normalize_batch(&raw, 2).unwrap_err();
        assert!(matches!(err, QuestionSourceError::Invalid(_)));
    }

    #[test]
    fn batch_truncates_extra_records() {
        let raw: Vec<Value> = (0..20)
            .map(|i| json!({"id": i, "question": "Q", "options": ["a","b","c","d"]}))
            .collect();
        let questions = normalize_batch(&raw, 15).unwrap();
        assert_eq!(questions.len(), 15);
    }
}
