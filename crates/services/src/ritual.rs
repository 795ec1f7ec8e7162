//! Orchestration of one ritual: identity, question loading, completion.

use std::sync::Arc;

use tracing::{debug, info};

use ritual_core::Clock;
use ritual_core::model::{CompletionPayload, ScoreReport};

use crate::api::{AttemptApi, CompletionApi, QuestionSource};
use crate::attempt::AttemptService;
use crate::error::QuestionSourceError;
use crate::host::HostBridge;
use crate::normalize::normalize_batch;
use crate::report::CompletionReporter;
use crate::session::{RitualSession, SESSION_LENGTH};

/// Wires the ritual components: the identity manager, the question source,
/// and the completion reporter. Owns nothing visual; the driver renders.
pub struct RitualService {
    questions: Arc<dyn QuestionSource>,
    completion: Arc<dyn CompletionApi>,
    host: Arc<dyn HostBridge>,
    attempt: AttemptService,
    clock: Clock,
    question_count: usize,
}

impl RitualService {
    #[must_use]
    pub fn new(
        questions: Arc<dyn QuestionSource>,
        completion: Arc<dyn CompletionApi>,
        attempt_api: Arc<dyn AttemptApi>,
        host: Arc<dyn HostBridge>,
        clock: Clock,
    ) -> Self {
        let attempt = AttemptService::new(attempt_api, host.user_id(), clock);
        Self {
            questions,
            completion,
            host,
            attempt,
            clock,
            question_count: SESSION_LENGTH,
        }
    }

    /// Overrides the session length (default [`SESSION_LENGTH`]).
    #[must_use]
    pub fn with_question_count(mut self, question_count: usize) -> Self {
        self.question_count = question_count;
        self
    }

    #[must_use]
    pub fn host(&self) -> Arc<dyn HostBridge> {
        Arc::clone(&self.host)
    }

    #[must_use]
    pub fn attempt_id(&self) -> Option<&str> {
        self.attempt.attempt_id()
    }

    /// Starts a ritual: resolves the attempt identifier (degraded-ok),
    /// fetches and normalizes the question batch (fatal on failure), and
    /// returns the running session in `Presenting(0)`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionSourceError` when the batch cannot be fetched,
    /// yields too few questions, or fails validation. The caller should
    /// show the unavailable state and offer a reload.
    pub async fn begin(&mut self) -> Result<RitualSession, QuestionSourceError> {
        // Best effort before the blocking fetch; failures already degraded
        // to a local identifier inside the service.
        let attempt_id = self.attempt.ensure_attempt_started().await;
        debug!(attempt_id = %attempt_id, "ritual starting");

        self.host.expand_viewport();

        let raw = self.questions.fetch_random(self.question_count).await?;
        let questions = normalize_batch(&raw, self.question_count)?;
        info!(count = questions.len(), "question batch loaded");

        RitualSession::start(questions, &self.clock).map_err(|_| QuestionSourceError::TooFew {
            got: 0,
            need: self.question_count,
        })
    }

    /// Builds the completion payload exactly once from the finished
    /// session's report and returns the reporter that will submit it.
    pub async fn complete(&mut self, report: &ScoreReport, feedback: &str) -> CompletionReporter {
        let attempt_id = self.attempt.ensure_attempt_started().await;
        let payload = CompletionPayload::build(
            report,
            feedback,
            &attempt_id,
            self.attempt.telegram_user_id(),
        );
        CompletionReporter::new(
            Arc::clone(&self.completion),
            Arc::clone(&self.host),
            self.clock,
            payload,
        )
    }
}
