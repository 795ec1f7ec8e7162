//! Optional host platform surface.
//!
//! The embedding host may offer identity lookup, haptics, an outbound data
//! channel, and viewport expansion. All capabilities are optional: the
//! default method bodies encode absence, and every call site treats failure
//! as recoverable.

use crate::error::HostError;

/// Capabilities of the embedding host platform.
pub trait HostBridge: Send + Sync {
    /// Host-provided user identity, when the platform exposes one.
    fn user_id(&self) -> Option<String> {
        None
    }

    /// Short haptic pulse for the signature-question cue.
    fn haptic_pulse(&self) {}

    /// Hands a JSON-encoded payload to the host's outbound data channel.
    ///
    /// # Errors
    ///
    /// Returns `HostError::Unavailable` when the host offers no channel.
    fn send_data(&self, payload: &str) -> Result<(), HostError> {
        let _ = payload;
        Err(HostError::Unavailable)
    }

    /// Asks the host to expand the viewport. Best effort.
    fn expand_viewport(&self) {}
}

/// Host bridge for environments without a host platform.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHost;

impl HostBridge for NoopHost {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_host_has_no_capabilities() {
        let host = NoopHost;
        assert_eq!(host.user_id(), None);
        assert!(matches!(
            host.send_data("{}"),
            Err(HostError::Unavailable)
        ));
        // Cosmetic calls are callable and do nothing.
        host.haptic_pulse();
        host.expand_viewport();
    }
}
