//! # Share Strategy
//!
//! Native sharing when the host offers it, the clipboard otherwise.
//! Capabilities are probed once when the strategy is built.

use crate::error::{TryOnError, TryOnResult};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Title attached to every share
pub const SHARE_TITLE: &str = "My Virtual Try-On Result";
/// Shown after the link was copied instead of shared
pub const COPIED_NOTIFICATION: &str = "Link copied to clipboard!";

/// What gets shared
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharePayload {
    pub title: String,
    pub url: String,
}

impl SharePayload {
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            title: SHARE_TITLE.to_string(),
            url: url.into(),
        }
    }
}

/// Host share sheet
#[async_trait]
pub trait NativeShare: Send + Sync {
    /// Whether the host can share at all
    fn is_available(&self) -> bool {
        true
    }

    async fn share(&self, payload: &SharePayload) -> TryOnResult<()>;
}

/// Host clipboard
#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> TryOnResult<()>;
}

/// A short-lived message for the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub message: String,
    #[serde(skip)]
    pub display_for: Duration,
}

impl Notification {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            display_for: Duration::from_secs(3),
        }
    }
}

/// How a share request was satisfied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareOutcome {
    /// Handed to the native share sheet
    Shared,
    /// Copied to the clipboard
    Copied(Notification),
}

/// The export strategy chosen for this host
#[derive(Clone)]
pub enum ShareStrategy {
    /// Native sharing, with the clipboard as fallback if one exists
    Native {
        native: Arc<dyn NativeShare>,
        fallback: Option<Arc<dyn Clipboard>>,
    },
    /// Clipboard only
    Clipboard(Arc<dyn Clipboard>),
    /// Neither capability exists
    Unavailable,
}

impl ShareStrategy {
    /// Pick a strategy from whatever the host provides
    pub fn probe(
        native: Option<Arc<dyn NativeShare>>,
        clipboard: Option<Arc<dyn Clipboard>>,
    ) -> Self {
        let strategy = match (native.filter(|n| n.is_available()), clipboard) {
            (Some(native), fallback) => ShareStrategy::Native { native, fallback },
            (None, Some(clipboard)) => ShareStrategy::Clipboard(clipboard),
            (None, None) => ShareStrategy::Unavailable,
        };
        tracing::debug!(strategy = strategy.name(), "Share strategy selected");
        strategy
    }

    pub fn name(&self) -> &'static str {
        match self {
            ShareStrategy::Native { .. } => "native",
            ShareStrategy::Clipboard(_) => "clipboard",
            ShareStrategy::Unavailable => "unavailable",
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, ShareStrategy::Unavailable)
    }

    /// Share the payload. A failed native share falls through to the clipboard.
    pub async fn share(&self, payload: &SharePayload) -> TryOnResult<ShareOutcome> {
        match self {
            ShareStrategy::Native { native, fallback } => match native.share(payload).await {
                Ok(()) => Ok(ShareOutcome::Shared),
                Err(e) => {
                    tracing::warn!("Native share failed: {}", e);
                    match fallback {
                        Some(clipboard) => copy(clipboard.as_ref(), payload).await,
                        None => Err(TryOnError::Export(format!("Share failed: {}", e))),
                    }
                }
            },
            ShareStrategy::Clipboard(clipboard) => copy(clipboard.as_ref(), payload).await,
            ShareStrategy::Unavailable => Err(TryOnError::Export(
                "Sharing is not available on this device".to_string(),
            )),
        }
    }
}

impl std::fmt::Debug for ShareStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ShareStrategy").field(&self.name()).finish()
    }
}

async fn copy(clipboard: &dyn Clipboard, payload: &SharePayload) -> TryOnResult<ShareOutcome> {
    clipboard.write_text(&payload.url).await.map_err(|e| {
        tracing::warn!("Clipboard write failed: {}", e);
        TryOnError::Export(format!("Failed to copy link: {}", e))
    })?;
    Ok(ShareOutcome::Copied(Notification::transient(COPIED_NOTIFICATION)))
}
