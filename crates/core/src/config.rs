//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the editor, the HTTP
//! client and the image path resolver. Library code never reads environment variables itself;
//! binaries do that and hand the raw values to the `*_from_env_value` helpers below.

use crate::constants::{
    DEFAULT_API_ORIGIN, DEFAULT_MAX_FIELD_DEPTH, DEFAULT_REQUEST_TIMEOUT_SECS,
};
use crate::{FolioError, FolioResult};
use std::time::Duration;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    api_origin: String,
    request_timeout: Duration,
    max_field_depth: usize,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `FolioError::InvalidConfig` if the origin is not an `http(s)://` URL, the timeout
    /// is zero, or the depth limit is zero.
    pub fn new(
        api_origin: impl Into<String>,
        request_timeout: Duration,
        max_field_depth: usize,
    ) -> FolioResult<Self> {
        let api_origin = api_origin.into().trim().trim_end_matches('/').to_string();

        if !(api_origin.starts_with("http://") || api_origin.starts_with("https://")) {
            return Err(FolioError::InvalidConfig(format!(
                "api origin must start with http:// or https:// (got {api_origin:?})"
            )));
        }
        if request_timeout.is_zero() {
            return Err(FolioError::InvalidConfig(
                "request timeout must be greater than zero".into(),
            ));
        }
        if max_field_depth == 0 {
            return Err(FolioError::InvalidConfig(
                "max field depth must be at least 1".into(),
            ));
        }

        Ok(Self {
            api_origin,
            request_timeout,
            max_field_depth,
        })
    }

    /// Origin of the portfolio API, without a trailing slash.
    pub fn api_origin(&self) -> &str {
        &self.api_origin
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn max_field_depth(&self) -> usize {
        self.max_field_depth
    }

    /// Returns a copy pointing at a different origin (used by tests binding ephemeral ports).
    pub fn with_api_origin(&self, api_origin: impl Into<String>) -> FolioResult<Self> {
        Self::new(api_origin, self.request_timeout, self.max_field_depth)
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            api_origin: DEFAULT_API_ORIGIN.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_field_depth: DEFAULT_MAX_FIELD_DEPTH,
        }
    }
}

/// Resolve the API origin from an optional raw value, falling back to the default.
pub fn api_origin_from_env_value(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_API_ORIGIN.to_string())
}

/// Parse the request timeout (whole seconds) from an optional raw value.
///
/// `None` or empty/whitespace yields the default.
pub fn request_timeout_from_env_value(value: Option<String>) -> FolioResult<Duration> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let secs = match value {
        Some(v) => v.parse::<u64>().map_err(|_| {
            FolioError::InvalidConfig(format!("request timeout must be whole seconds (got {v:?})"))
        })?,
        None => DEFAULT_REQUEST_TIMEOUT_SECS,
    };

    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_trailing_slash() {
        let cfg = CoreConfig::new("https://api.example.com/", Duration::from_secs(5), 4).unwrap();
        assert_eq!(cfg.api_origin(), "https://api.example.com");
        assert_eq!(cfg.request_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.max_field_depth(), 4);
    }

    #[test]
    fn test_new_rejects_invalid_values() {
        assert!(CoreConfig::new("api.example.com", Duration::from_secs(5), 4).is_err());
        assert!(CoreConfig::new("http://x", Duration::ZERO, 4).is_err());
        assert!(CoreConfig::new("http://x", Duration::from_secs(1), 0).is_err());
    }

    #[test]
    fn test_default_matches_constants() {
        let cfg = CoreConfig::default();
        assert_eq!(cfg.api_origin(), DEFAULT_API_ORIGIN);
        assert_eq!(
            cfg.request_timeout(),
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_env_value_helpers() {
        assert_eq!(api_origin_from_env_value(None), DEFAULT_API_ORIGIN);
        assert_eq!(
            api_origin_from_env_value(Some(" http://10.0.0.2:5000 ".into())),
            "http://10.0.0.2:5000"
        );
        assert_eq!(
            request_timeout_from_env_value(Some("30".into())).unwrap(),
            Duration::from_secs(30)
        );
        assert_eq!(
            request_timeout_from_env_value(Some("  ".into())).unwrap(),
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
        );
        assert!(request_timeout_from_env_value(Some("soon".into())).is_err());
    }
}
