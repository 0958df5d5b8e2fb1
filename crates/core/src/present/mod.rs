//! # Result Presenter
//!
//! Renders the generated artifact and exports it: download to a file, or
//! share the link. Reset goes back through the session.

pub mod share;

pub use share::{
    Clipboard, NativeShare, Notification, ShareOutcome, SharePayload, ShareStrategy,
    COPIED_NOTIFICATION, SHARE_TITLE,
};

use crate::error::{TryOnError, TryOnResult};
use crate::models::{RemoteId, TryOnArtifact};
use crate::session::TryOnSession;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Suggested file name for downloads
pub const DOWNLOAD_FILENAME: &str = "tryon-result.png";

/// What the result view shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultView {
    pub session_id: RemoteId,
    /// Artifact image resolved against the static-asset base
    pub image_url: String,
    /// Name of the product that was tried on, when known
    pub product_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Presents the terminal artifact of a session
pub struct ResultPresenter {
    session: Arc<TryOnSession>,
    share: ShareStrategy,
}

impl ResultPresenter {
    pub fn new(session: Arc<TryOnSession>, share: ShareStrategy) -> Self {
        Self { session, share }
    }

    pub fn session(&self) -> &Arc<TryOnSession> {
        &self.session
    }

    pub fn share_strategy(&self) -> &ShareStrategy {
        &self.share
    }

    fn resolve(&self, artifact: &TryOnArtifact) -> String {
        artifact
            .output_image_ref
            .resolve(self.session.config().static_base())
    }

    fn require_artifact(&self) -> TryOnResult<TryOnArtifact> {
        self.session
            .artifact()
            .ok_or_else(|| TryOnError::Precondition("No try-on result yet".to_string()))
    }

    /// The result view, if the session has completed
    pub fn view(&self) -> Option<ResultView> {
        let snapshot = self.session.snapshot();
        let artifact = snapshot.artifact.as_ref()?;

        let product_name = snapshot
            .selected_catalog_id
            .and_then(|id| snapshot.catalog.iter().find(|e| e.id == id))
            .map(|e| e.name.clone())
            .or_else(|| {
                let name = snapshot.product_name.trim();
                (!name.is_empty()).then(|| name.to_string())
            });

        Some(ResultView {
            session_id: artifact.session_id,
            image_url: self.resolve(artifact),
            product_name,
            created_at: artifact.created_at,
        })
    }

    /// Download the artifact image into `dir` as `tryon-result.png`
    #[tracing::instrument(skip(self, dir))]
    pub async fn download(&self, dir: impl AsRef<Path>) -> TryOnResult<PathBuf> {
        let artifact = self.require_artifact()?;
        let url = self.resolve(&artifact);

        let bytes = self.session.backend().fetch_asset(&url).await.map_err(|e| {
            tracing::warn!("Failed to fetch result image: {}", e);
            TryOnError::Export(format!("Failed to download image: {}", e))
        })?;

        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| TryOnError::Export(format!("Failed to create {}: {}", dir.display(), e)))?;
        let path = dir.join(DOWNLOAD_FILENAME);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| TryOnError::Export(format!("Failed to write {}: {}", path.display(), e)))?;

        tracing::info!(path = %path.display(), bytes = bytes.len(), "Result downloaded");
        Ok(path)
    }

    /// Share the artifact's resolved URL
    #[tracing::instrument(skip(self))]
    pub async fn share(&self) -> TryOnResult<ShareOutcome> {
        let artifact = self.require_artifact()?;
        let payload = SharePayload::for_url(self.resolve(&artifact));
        let outcome = self.share.share(&payload).await?;
        tracing::info!(strategy = self.share.name(), ?outcome, "Result shared");
        Ok(outcome)
    }

    /// Start over
    pub fn reset(&self) {
        self.session.reset();
    }
}
