//! Base address resolution for the remote ritual service.

/// Default backend address.
pub const DEFAULT_API_URL: &str = "https://oracle--velvet-elite.replit.app";

/// Marker of the dead legacy backend. Stale links cached by host clients
/// still pass it as an override; it is rewritten to the default so even
/// ancient entry points keep working.
const LEGACY_API_MARKER: &str = "velvet-mcp-core";

/// Resolved remote-service configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    base_url: String,
}

impl ApiConfig {
    /// Resolves the base address: a caller-supplied override takes
    /// precedence over the hard-coded default; trailing slashes are trimmed;
    /// the stale legacy backend is rewritten to the default.
    #[must_use]
    pub fn resolve(override_url: Option<&str>) -> Self {
        let raw = override_url
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_API_URL);
        let base = raw.trim_end_matches('/');

        let base_url = if base.contains(LEGACY_API_MARKER) {
            tracing::warn!(stale = base, "legacy backend override rewritten to default");
            DEFAULT_API_URL.to_string()
        } else {
            base.to_string()
        };

        Self { base_url }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Joins an endpoint path onto the base address.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::resolve(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_override() {
        assert_eq!(ApiConfig::resolve(None).base_url(), DEFAULT_API_URL);
        assert_eq!(ApiConfig::resolve(Some("  ")).base_url(), DEFAULT_API_URL);
    }

    #[test]
    fn override_takes_precedence_and_is_trimmed() {
        let config = ApiConfig::resolve(Some("https://example.test/api///"));
        assert_eq!(config.base_url(), "https://example.test/api");
    }

    #[test]
    fn legacy_backend_is_rewritten() {
        let config = ApiConfig::resolve(Some("https://velvet-mcp-core.replit.app"));
        assert_eq!(config.base_url(), DEFAULT_API_URL);
    }

    #[test]
    fn endpoint_joins_paths() {
        let config = ApiConfig::resolve(Some("https://example.test"));
        assert_eq!(
            config.endpoint("/questions/random"),
            "https://example.test/questions/random"
        );
    }
}
