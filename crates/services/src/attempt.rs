//! Session identity: one attempt identifier per ritual.

use std::sync::Arc;

use rand::Rng;
use tracing::{debug, warn};

use ritual_core::Clock;
use ritual_core::model::RITUAL_MODE;

use crate::api::AttemptApi;

/// Prefix of locally synthesized attempt identifiers.
pub const LOCAL_ATTEMPT_PREFIX: &str = "AT-LOCAL-";

/// Synthesizes a local attempt identifier: fixed prefix, current timestamp
/// in milliseconds, and a 6-hex-digit random suffix.
#[must_use]
pub fn local_attempt_id(clock: &Clock) -> String {
    let millis = clock.now().timestamp_millis();
    let suffix: u32 = rand::rng().random_range(0..0x100_0000);
    format!("{LOCAL_ATTEMPT_PREFIX}{millis}-{suffix:06x}")
}

/// Resolves and caches the attempt identifier for the session.
///
/// The first call reaches the backend; every later call returns the cached
/// identifier without another network call. Backend failure is a silent
/// degrade to a local identifier, never a fatal error: the ritual proceeds
/// regardless of backend availability.
pub struct AttemptService {
    backend: Arc<dyn AttemptApi>,
    telegram_user_id: Option<String>,
    clock: Clock,
    resolved: Option<String>,
}

impl AttemptService {
    #[must_use]
    pub fn new(backend: Arc<dyn AttemptApi>, telegram_user_id: Option<String>, clock: Clock) -> Self {
        Self {
            backend,
            telegram_user_id,
            clock,
            resolved: None,
        }
    }

    /// Idempotent: resolves the attempt identifier on first call, returns
    /// the cached value afterwards.
    pub async fn ensure_attempt_started(&mut self) -> String {
        if let Some(id) = &self.resolved {
            return id.clone();
        }

        let id = match self
            .backend
            .start_attempt(RITUAL_MODE, self.telegram_user_id.as_deref())
            .await
        {
            Ok(id) => {
                debug!(attempt_id = %id, "attempt started");
                id
            }
            Err(err) => {
                let fallback = local_attempt_id(&self.clock);
                warn!(error = %err, attempt_id = %fallback, "attempt start unavailable, using local fallback");
                fallback
            }
        };

        self.resolved = Some(id.clone());
        id
    }

    /// The resolved identifier, if any call has completed yet.
    #[must_use]
    pub fn attempt_id(&self) -> Option<&str> {
        self.resolved.as_deref()
    }

    #[must_use]
    pub fn telegram_user_id(&self) -> Option<&str> {
        self.telegram_user_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ritual_core::time::fixed_clock;

    #[test]
    fn local_ids_follow_the_fallback_format() {
        let id = local_attempt_id(&fixed_clock());
        let rest = id.strip_prefix(LOCAL_ATTEMPT_PREFIX).unwrap();
        let (millis, suffix) = rest.split_once('-').unwrap();
        assert_eq!(millis, "1700000000000");
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn local_ids_vary_in_their_random_suffix() {
        let clock = fixed_clock();
        let a = local_attempt_id(&clock);
        let b = local_attempt_id(&clock);
        // Same clock, so any difference comes from the suffix. Collisions
        // are possible but vanishingly unlikely across two draws.
        assert_eq!(&a[..LOCAL_ATTEMPT_PREFIX.len()], LOCAL_ATTEMPT_PREFIX);
        assert_eq!(a.len(), b.len());
    }
}
