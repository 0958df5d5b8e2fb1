//! # Errors
//!
//! Every action in a try-on session is independently fallible. Failures are
//! caught where the action was triggered and reduced to one user-visible
//! message; nothing here is fatal to the session.

use thiserror::Error;

/// Client-side rejection of a selected file, raised before any network call
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unsupported file type: {media_type} (expected JPG, PNG, GIF, BMP or WebP)")]
    UnsupportedType { media_type: String },

    #[error("File is too large: {size} bytes (max {limit} bytes)")]
    TooLarge { size: u64, limit: u64 },

    #[error("File is empty")]
    Empty,
}

/// Errors produced by try-on session operations
#[derive(Debug, Clone, Error)]
pub enum TryOnError {
    /// The selected file was rejected locally
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Transport failure: no response was received
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status
    #[error("HTTP {status}{}", fmt_detail(.detail))]
    Http {
        status: u16,
        /// `detail` field of the error payload, when the backend sent one
        detail: Option<String>,
    },

    /// A success response whose body could not be understood
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Another commit or generation request is still in flight
    #[error("Another request is already in progress")]
    Busy,

    /// The session moved on (reset or replacement) before the response arrived
    #[error("Request was superseded before it completed")]
    Superseded,

    /// The action's preconditions do not hold
    #[error("{0}")]
    Precondition(String),

    /// Download or share failed
    #[error("Export failed: {0}")]
    Export(String),
}

impl TryOnError {
    /// Reduce this error to the single message shown to the user.
    ///
    /// Server-provided `detail` wins; validation and precondition errors
    /// speak for themselves; everything else collapses to `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            TryOnError::Http {
                detail: Some(detail),
                ..
            } if !detail.trim().is_empty() => detail.clone(),
            TryOnError::Validation(e) => e.to_string(),
            TryOnError::Precondition(msg) => msg.clone(),
            _ => fallback.to_string(),
        }
    }

    /// Whether the error happened on the wire rather than locally
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            TryOnError::Network(_) | TryOnError::Http { .. } | TryOnError::MalformedResponse(_)
        )
    }
}

impl From<reqwest::Error> for TryOnError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TryOnError::MalformedResponse(err.to_string())
        } else if let Some(status) = err.status() {
            TryOnError::Http {
                status: status.as_u16(),
                detail: None,
            }
        } else {
            TryOnError::Network(err.to_string())
        }
    }
}

fn fmt_detail(detail: &Option<String>) -> String {
    detail.as_ref().map(|d| format!(": {d}")).unwrap_or_default()
}

/// Result type for try-on operations
pub type TryOnResult<T> = Result<T, TryOnError>;
