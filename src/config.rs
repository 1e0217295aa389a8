//! Viewer configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use crate::consts::DEFAULT_ANNOTATION_COLOR;

pub const DEFAULT_REGISTRY_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Errors produced while reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set but its value cannot be used.
    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid { var: &'static str, value: String, reason: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerConfig {
    /// Base URL of the slide registry, without a trailing slash.
    pub registry_base_url: String,
    /// Whole-request timeout for registry calls (ignored on wasm).
    pub request_timeout_secs: u64,
    /// Connect timeout for registry calls (ignored on wasm).
    pub connect_timeout_secs: u64,
    /// Color given to new annotations.
    pub annotation_color: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            registry_base_url: DEFAULT_REGISTRY_URL.to_owned(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            annotation_color: DEFAULT_ANNOTATION_COLOR.to_owned(),
        }
    }
}

impl ViewerConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `SLIDE_REGISTRY_URL`: default `http://127.0.0.1:5000`
    /// - `SLIDE_REQUEST_TIMEOUT_SECS`: default 30
    /// - `SLIDE_CONNECT_TIMEOUT_SECS`: default 10
    /// - `ANNOTATION_COLOR`: `#rgb` or `#rrggbb`, default `#ff0000`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Unset and non-UTF-8 variables both count as absent.
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build typed config from an arbitrary key lookup. Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a variable is set to an unusable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let registry_base_url = get("SLIDE_REGISTRY_URL")
            .map_or_else(|| DEFAULT_REGISTRY_URL.to_owned(), |v| v.trim().trim_end_matches('/').to_owned());
        let request_timeout_secs =
            parse_secs("SLIDE_REQUEST_TIMEOUT_SECS", get("SLIDE_REQUEST_TIMEOUT_SECS"), DEFAULT_REQUEST_TIMEOUT_SECS)?;
        let connect_timeout_secs =
            parse_secs("SLIDE_CONNECT_TIMEOUT_SECS", get("SLIDE_CONNECT_TIMEOUT_SECS"), DEFAULT_CONNECT_TIMEOUT_SECS)?;
        let annotation_color = match get("ANNOTATION_COLOR") {
            Some(raw) => parse_color("ANNOTATION_COLOR", &raw)?,
            None => DEFAULT_ANNOTATION_COLOR.to_owned(),
        };

        Ok(Self { registry_base_url, request_timeout_secs, connect_timeout_secs, annotation_color })
    }
}

fn parse_secs(var: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid { var, value: raw, reason: "must be at least 1 second" }),
        Ok(secs) => Ok(secs),
        Err(_) => Err(ConfigError::Invalid { var, value: raw, reason: "expected a whole number of seconds" }),
    }
}

/// Accept `#rgb` / `#rrggbb` CSS hex colors, normalized to lowercase.
pub(crate) fn parse_color(var: &'static str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    let valid = trimmed
        .strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()));
    if !valid {
        return Err(ConfigError::Invalid { var, value: raw.to_owned(), reason: "expected #rgb or #rrggbb" });
    }
    Ok(trimmed.to_ascii_lowercase())
}
