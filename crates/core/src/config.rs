//! # Client Configuration
//!
//! Where the backend lives and the limits applied to selected files.
//! This module never reads the environment; the embedding shell decides
//! how values are sourced.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default upload limit: 10 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Configuration for a try-on client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the try-on API (e.g. "http://localhost:8000")
    pub api_base_url: String,
    /// Base URL that image references are resolved against.
    /// Falls back to `api_base_url` when unset.
    #[serde(default)]
    pub static_base_url: Option<String>,
    /// Optional per-request timeout. `None` means requests may hang.
    #[serde(default, with = "optional_secs")]
    pub request_timeout: Option<Duration>,
    /// Largest accepted file, inclusive
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
    /// Display name sent when creating the ephemeral identity
    #[serde(default = "default_identity_name")]
    pub identity_name: String,
}

fn default_max_upload_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_identity_name() -> String {
    "Anonymous User".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            static_base_url: None,
            request_timeout: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            identity_name: default_identity_name(),
        }
    }
}

impl ClientConfig {
    /// Create a config pointing at the given API
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_static_base_url(mut self, url: impl Into<String>) -> Self {
        self.static_base_url = Some(url.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_max_upload_bytes(mut self, limit: u64) -> Self {
        self.max_upload_bytes = limit;
        self
    }

    pub fn with_identity_name(mut self, name: impl Into<String>) -> Self {
        self.identity_name = name.into();
        self
    }

    /// API base without a trailing slash
    pub fn api_base(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }

    /// Static-asset base without a trailing slash
    pub fn static_base(&self) -> &str {
        self.static_base_url
            .as_deref()
            .unwrap_or(&self.api_base_url)
            .trim_end_matches('/')
    }
}

mod optional_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&d.as_secs_f64()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let secs: Option<f64> = Option::deserialize(d)?;
        Ok(secs.filter(|s| *s > 0.0).map(Duration::from_secs_f64))
    }
}
