//! HTTP client for the remote ritual service, behind object-safe ports so
//! flows can be exercised with counting fakes.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::Value;

use ritual_core::model::{CompletionPayload, ScoredAnswer};

use crate::config::ApiConfig;
use crate::error::{AttemptError, QuestionSourceError, ReportError};
use crate::normalize::extract_items;

/// Host-identity header forwarded to the backend when available.
const INIT_DATA_HEADER: &str = "X-Telegram-InitData";

//
// ─── PORTS ─────────────────────────────────────────────────────────────────────
//

/// Source of raw question records.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Fetches up to `count` raw records; envelope already unwrapped.
    async fn fetch_random(&self, count: usize) -> Result<Vec<Value>, QuestionSourceError>;
}

/// Attempt-start endpoint.
#[async_trait]
pub trait AttemptApi: Send + Sync {
    /// Returns the server-issued attempt identifier.
    async fn start_attempt(
        &self,
        mode: &str,
        telegram_user_id: Option<&str>,
    ) -> Result<String, AttemptError>;
}

/// Completion endpoint.
#[async_trait]
pub trait CompletionApi: Send + Sync {
    /// Any 2xx acknowledgement is success.
    async fn submit_completion(&self, request: &CompletionRequest) -> Result<(), ReportError>;
}

//
// ─── WIRE SHAPES ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
struct StartAttemptRequest<'a> {
    mode: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    telegram_user_id: Option<&'a str>,
}

/// Body of `POST {base}/ritual/complete`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub attempt_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telegram_user_id: Option<String>,
    pub mode: String,
    pub score_raw: u32,
    pub score_max: u32,
    pub time_total_seconds: u64,
    pub completed_at: String,
    pub answers: Vec<ScoredAnswer>,
    pub feedback_text: String,
    /// The full client payload, mirrored for server-side bookkeeping.
    pub client_payload: CompletionPayload,
}

impl CompletionRequest {
    #[must_use]
    pub fn from_payload(payload: &CompletionPayload, completed_at: DateTime<Utc>) -> Self {
        Self {
            attempt_id: payload.attempt_id.clone(),
            telegram_user_id: payload.telegram_user_id.clone(),
            mode: payload.mode.clone(),
            score_raw: payload.score,
            score_max: payload.total,
            time_total_seconds: payload.time_total_seconds,
            completed_at: completed_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            answers: payload.answers.clone(),
            feedback_text: payload.comment_text.clone(),
            client_payload: payload.clone(),
        }
    }
}

//
// ─── CLIENT ────────────────────────────────────────────────────────────────────
//

/// `reqwest`-backed implementation of all three ports.
///
/// Requests carry no explicit timeout: timeout semantics of the ritual are
/// wall-clock driven, and a hanging call only prolongs the loading state.
#[derive(Clone)]
pub struct RitualApi {
    client: Client,
    config: ApiConfig,
    init_data: Option<String>,
}

impl RitualApi {
    #[must_use]
    pub fn new(config: ApiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
            init_data: None,
        }
    }

    /// Attach the host-provided identity blob forwarded with every request.
    #[must_use]
    pub fn with_init_data(mut self, init_data: impl Into<String>) -> Self {
        let init_data = init_data.into();
        self.init_data = (!init_data.is_empty()).then_some(init_data);
        self
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn with_headers(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.init_data {
            Some(init_data) => request.header(INIT_DATA_HEADER, init_data),
            None => request,
        }
    }
}

#[async_trait]
impl QuestionSource for RitualApi {
    async fn fetch_random(&self, count: usize) -> Result<Vec<Value>, QuestionSourceError> {
        let url = self.config.endpoint(&format!("questions/random?count={count}"));
        let response = self.with_headers(self.client.get(&url)).send().await?;
        if !response.status().is_success() {
            return Err(QuestionSourceError::HttpStatus(response.status()));
        }
        let body: Value = response.json().await?;
        Ok(extract_items(&body))
    }
}

#[async_trait]
impl AttemptApi for RitualApi {
    async fn start_attempt(
        &self,
        mode: &str,
        telegram_user_id: Option<&str>,
    ) -> Result<String, AttemptError> {
        let url = self.config.endpoint("ritual/start");
        let body = StartAttemptRequest {
            mode,
            telegram_user_id,
        };
        let response = self
            .with_headers(self.client.post(&url))
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(AttemptError::HttpStatus(response.status()));
        }

        let body: Value = response.json().await?;
        // The identifier may travel under any of three names.
        ["attempt_id", "attemptId", "id"]
            .iter()
            .find_map(|key| match body.get(*key) {
                Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
                Some(Value::Number(id)) => Some(id.to_string()),
                _ => None,
            })
            .ok_or(AttemptError::MissingId)
    }
}

#[async_trait]
impl CompletionApi for RitualApi {
    async fn submit_completion(&self, request: &CompletionRequest) -> Result<(), ReportError> {
        let url = self.config.endpoint("ritual/complete");
        let response = self
            .with_headers(self.client.post(&url))
            .json(request)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ReportError::HttpStatus(response.status()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ritual_core::model::{RITUAL_MODE, RecordedAnswer, QuestionId, ScoreReport};
    use ritual_core::time::fixed_now;

    #[test]
    fn completion_request_mirrors_the_payload() {
        let log = vec![RecordedAnswer::timed_out(QuestionId::from_number(1))];
        let report = ScoreReport::from_log(&[], &log, 30);
        let payload = CompletionPayload::build(&report, "fb", "AT-9", Some("7"));

        let request = CompletionRequest::from_payload(&payload, fixed_now());
        assert_eq!(request.attempt_id, "AT-9");
        assert_eq!(request.mode, RITUAL_MODE);
        assert_eq!(request.score_raw, payload.score);
        assert_eq!(request.score_max, payload.total);
        assert_eq!(request.feedback_text, "fb");
        assert_eq!(request.completed_at, "2023-11-14T22:13:20.000Z");
        assert_eq!(request.client_payload, payload);
    }
}
