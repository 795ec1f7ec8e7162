//! Dual-channel completion reporting.
//!
//! The payload is captured once at construction and never mutated; retries
//! resend the identical object. Each channel keeps its own sent flag, so a
//! retry skips whatever already succeeded and only re-attempts the rest.
//! Channel failure is logged and never surfaces to the user flow.

use std::sync::Arc;

use tracing::{debug, info, warn};

use ritual_core::Clock;
use ritual_core::model::CompletionPayload;

use crate::api::{CompletionApi, CompletionRequest};
use crate::error::HostError;
use crate::host::HostBridge;

/// Per-channel result of one `submit` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// The HTTP channel has succeeded, now or on an earlier call.
    pub http_sent: bool,
    /// The host-messaging channel has succeeded, now or on an earlier call.
    pub host_sent: bool,
}

impl SubmitOutcome {
    #[must_use]
    pub fn is_fully_sent(&self) -> bool {
        self.http_sent && self.host_sent
    }
}

pub struct CompletionReporter {
    api: Arc<dyn CompletionApi>,
    host: Arc<dyn HostBridge>,
    clock: Clock,
    payload: CompletionPayload,
    http_sent: bool,
    host_sent: bool,
}

impl CompletionReporter {
    #[must_use]
    pub fn new(
        api: Arc<dyn CompletionApi>,
        host: Arc<dyn HostBridge>,
        clock: Clock,
        payload: CompletionPayload,
    ) -> Self {
        Self {
            api,
            host,
            clock,
            payload,
            http_sent: false,
            host_sent: false,
        }
    }

    /// Attempts both channels, skipping any that already succeeded.
    pub async fn submit(&mut self) -> SubmitOutcome {
        if !self.http_sent {
            let request = CompletionRequest::from_payload(&self.payload, self.clock.now());
            match self.api.submit_completion(&request).await {
                Ok(()) => {
                    info!(attempt_id = %self.payload.attempt_id, "completion reported over http");
                    self.http_sent = true;
                }
                Err(err) => {
                    warn!(error = %err, "http completion report failed, host channel still attempted");
                }
            }
        }

        if !self.host_sent {
            match serde_json::to_string(&self.payload) {
                Ok(encoded) => match self.host.send_data(&encoded) {
                    Ok(()) => {
                        info!(payload_len = encoded.len(), "completion handed to host channel");
                        self.host_sent = true;
                    }
                    Err(HostError::Unavailable) => {
                        debug!("host data channel absent, skipping");
                    }
                    Err(err) => {
                        warn!(error = %err, "host completion send failed");
                    }
                },
                Err(err) => {
                    warn!(error = %err, "completion payload could not be encoded for the host");
                }
            }
        }

        self.outcome()
    }

    #[must_use]
    pub fn outcome(&self) -> SubmitOutcome {
        SubmitOutcome {
            http_sent: self.http_sent,
            host_sent: self.host_sent,
        }
    }

    /// The immutable payload this reporter resends on every retry.
    #[must_use]
    pub fn payload(&self) -> &CompletionPayload {
        &self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use ritual_core::model::{QuestionId, RecordedAnswer, ScoreReport};
    use ritual_core::time::fixed_clock;

    use crate::error::ReportError;

    #[derive(Default)]
    struct FakeCompletionApi {
        calls: AtomicUsize,
        fail_first: AtomicUsize,
    }

    #[async_trait]
    impl CompletionApi for FakeCompletionApi {
        async fn submit_completion(&self, _request: &CompletionRequest) -> Result<(), ReportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_first.load(Ordering::SeqCst) > 0 {
                self.fail_first.fetch_sub(1, Ordering::SeqCst);
                return Err(ReportError::HttpStatus(
                    reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                ));
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingHost {
        sends: AtomicUsize,
    }

    impl HostBridge for RecordingHost {
        fn send_data(&self, _payload: &str) -> Result<(), HostError> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct AbsentHost;

    impl HostBridge for AbsentHost {}

    fn payload() -> CompletionPayload {
        let log = vec![RecordedAnswer::timed_out(QuestionId::from_number(1))];
        let report = ScoreReport::from_log(&[], &log, 12);
        CompletionPayload::build(&report, "fb", "AT-7", None)
    }

    #[tokio::test]
    async fn both_channels_succeed_in_one_call() {
        let api = Arc::new(FakeCompletionApi::default());
        let host = Arc::new(RecordingHost::default());
        let mut reporter =
            CompletionReporter::new(api.clone(), host.clone(), fixed_clock(), payload());

        let outcome = reporter.submit().await;
        assert!(outcome.is_fully_sent());
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
        assert_eq!(host.sends.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn successful_channels_are_not_reissued() {
        let api = Arc::new(FakeCompletionApi::default());
        let host = Arc::new(RecordingHost::default());
        let mut reporter =
            CompletionReporter::new(api.clone(), host.clone(), fixed_clock(), payload());

        reporter.submit().await;
        reporter.submit().await;

        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
        assert_eq!(host.sends.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_http_channel_does_not_block_the_host_channel() {
        let api = Arc::new(FakeCompletionApi::default());
        api.fail_first.store(1, Ordering::SeqCst);
        let host = Arc::new(RecordingHost::default());
        let mut reporter =
            CompletionReporter::new(api.clone(), host.clone(), fixed_clock(), payload());

        let first = reporter.submit().await;
        assert!(!first.http_sent);
        assert!(first.host_sent);

        // The retry re-issues only the failed http channel.
        let second = reporter.submit().await;
        assert!(second.is_fully_sent());
        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
        assert_eq!(host.sends.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn absent_host_channel_is_recoverable() {
        let api = Arc::new(FakeCompletionApi::default());
        let mut reporter =
            CompletionReporter::new(api.clone(), Arc::new(AbsentHost), fixed_clock(), payload());

        let outcome = reporter.submit().await;
        assert!(outcome.http_sent);
        assert!(!outcome.host_sent);

        // Absence stays recoverable: later retries keep trying the host
        // channel without re-issuing the http call.
        reporter.submit().await;
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }
}
