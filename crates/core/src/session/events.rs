//! # Session Events
//!
//! Change notifications a UI listens to so it knows when to re-render.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of session event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionEventKind {
    /// All startup calls have settled
    BootstrapCompleted,
    /// Identity was (re)created
    IdentityCreated,
    /// A local file was accepted for an asset kind
    AssetSelected,
    /// An asset received its remote identifier
    AssetCommitted,
    /// The catalog list changed
    CatalogUpdated,
    /// An existing catalog entry became the product
    ProductPicked,
    /// A generation request was sent
    GenerationStarted,
    /// Generation produced an artifact
    GenerationCompleted,
    /// Generation failed
    GenerationFailed,
    /// A user-visible error message was set
    ErrorRaised,
    /// Everything downstream of bootstrap was cleared
    Reset,
}

/// An event in the session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    /// Timestamp
    pub timestamp: DateTime<Utc>,
    /// Kind of event
    pub kind: SessionEventKind,
    /// Associated data (JSON)
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl SessionEvent {
    /// Create a new event
    pub fn new(kind: SessionEventKind) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            data: None,
        }
    }

    /// Add data to the event
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}
