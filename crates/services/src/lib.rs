#![forbid(unsafe_code)]

pub mod api;
pub mod attempt;
pub mod canon;
pub mod config;
pub mod error;
pub mod host;
pub mod normalize;
pub mod report;
pub mod ritual;
pub mod session;

pub use ritual_core::Clock;

pub use api::{AttemptApi, CompletionApi, CompletionRequest, QuestionSource, RitualApi};
pub use attempt::{AttemptService, LOCAL_ATTEMPT_PREFIX, local_attempt_id};
pub use config::ApiConfig;
pub use error::{
    AttemptError, HostError, QuestionSourceError, ReportError, SessionStateError,
};
pub use host::{HostBridge, NoopHost};
pub use report::{CompletionReporter, SubmitOutcome};
pub use ritual::RitualService;
pub use session::{
    ANSWER_SECONDS, CountdownKind, READING_SECONDS, RitualSession, SESSION_LENGTH, Selection,
    SessionPhase, SessionView, VerdictView, is_signature_position,
};
