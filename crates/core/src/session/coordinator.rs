//! # Try-On Session
//!
//! Orchestrates one page load: bootstrap, the two asset pipelines, and the
//! single generation request they gate.
//!
//! ## Request token
//!
//! Commits and generation share one in-flight slot. A trigger claims the
//! slot synchronously, before its first await, so a second trigger that
//! fires before the UI re-renders finds the slot taken and is rejected.
//! Responses are applied only if their token is still current; `reset()`
//! or replacing an asset makes an outstanding response stale.
//!
//! A generation request is also tracked on its own. `reset()` frees the
//! shared slot so commits can start again, but `generate()` stays rejected
//! until the abandoned generation's response lands, so at most one
//! generation is ever on the wire.

use super::bootstrap::{self, BootstrapSummary, IDENTITY_FAILURE_MESSAGE};
use super::events::{SessionEvent, SessionEventKind};
use crate::api::TryOnBackend;
use crate::config::ClientConfig;
use crate::error::{TryOnError, TryOnResult};
use crate::models::{CatalogEntry, HealthStatus, Identity, RemoteId, TryOnArtifact, TryOnRequest};
use crate::state::{
    lock, Asset, AssetIntake, AssetKind, GenerateRejection, LocalFile, PreviewRegistry,
    RequestToken, ValidationState, WorkflowPhase, WorkflowState,
};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

/// Shown when generation fails without a server-provided detail
pub const GENERATION_FAILURE_MESSAGE: &str = "Try-on failed";
/// Shown when the backend reports success but produced no image
pub const EMPTY_OUTPUT_MESSAGE: &str = "Try-on generation returned no image";

/// Result of a `generate()` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateOutcome {
    /// The workflow is now `Completed` with this artifact
    Completed(TryOnArtifact),
    /// The workflow is now `Failed` with this message
    Failed(String),
    /// Nothing was sent
    Rejected(GenerateRejection),
    /// The response arrived after a reset or asset change and was discarded
    Superseded,
}

/// User-visible view of one asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetView {
    pub kind: AssetKind,
    pub remote_id: Option<RemoteId>,
    pub preview_url: Option<String>,
    pub file_name: Option<String>,
    pub pending: bool,
    pub validation_state: ValidationState,
}

impl From<&Asset> for AssetView {
    fn from(asset: &Asset) -> Self {
        Self {
            kind: asset.kind,
            remote_id: asset.remote_id,
            preview_url: asset.preview_url().map(str::to_string),
            file_name: asset.local_file.as_ref().map(|f| f.name.clone()),
            pending: asset.is_pending(),
            validation_state: asset.validation_state.clone(),
        }
    }
}

/// Everything a UI needs to render the session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub phase: WorkflowPhase,
    pub health: Option<HealthStatus>,
    pub identity: Option<Identity>,
    pub catalog: Vec<CatalogEntry>,
    pub subject: Option<AssetView>,
    pub product: Option<AssetView>,
    pub product_name: String,
    pub selected_catalog_id: Option<RemoteId>,
    pub artifact: Option<TryOnArtifact>,
    /// Banner message: the last action's error, or the generation failure
    pub error: Option<String>,
    /// A commit or generation request is outstanding
    pub is_loading: bool,
    /// A generation request is still on the wire, possibly abandoned by reset
    pub generation_pending: bool,
}

impl SessionSnapshot {
    fn remote_id(view: &Option<AssetView>) -> Option<RemoteId> {
        view.as_ref().and_then(|v| v.remote_id)
    }

    /// Whether the generate control should be enabled
    pub fn can_generate(&self) -> bool {
        !self.is_loading
            && !self.generation_pending
            && Self::remote_id(&self.subject).is_some()
            && Self::remote_id(&self.product).is_some()
    }

    /// Prompt for the next missing step
    pub fn next_step_hint(&self) -> Option<&'static str> {
        if Self::remote_id(&self.subject).is_none() {
            Some("Please upload your photo first")
        } else if Self::remote_id(&self.product).is_none() {
            Some("Please upload a product photo")
        } else {
            None
        }
    }
}

struct SessionInner {
    health: Option<HealthStatus>,
    identity: Option<Identity>,
    catalog: Vec<CatalogEntry>,
    intake: AssetIntake,
    product_name: String,
    selected_catalog_id: Option<RemoteId>,
    workflow: WorkflowState,
    in_flight: Option<RequestToken>,
    /// Outstanding generation; survives reset until its response lands
    generation_in_flight: Option<RequestToken>,
    error: Option<String>,
}

/// What a commit sends, captured before the lock is released
enum Upload {
    Subject { user_id: RemoteId, file: LocalFile },
    Product { name: String, file: LocalFile },
}

/// One try-on session
pub struct TryOnSession {
    backend: Arc<dyn TryOnBackend>,
    config: ClientConfig,
    previews: PreviewRegistry,
    inner: Mutex<SessionInner>,
    next_token: AtomicU64,
    bootstrapped: AtomicBool,
    event_tx: Option<mpsc::UnboundedSender<SessionEvent>>,
}

impl TryOnSession {
    /// Create a session in the `Idle` state
    pub fn new(config: ClientConfig, backend: Arc<dyn TryOnBackend>) -> Self {
        let previews = PreviewRegistry::new();
        let intake = AssetIntake::new(previews.clone(), config.max_upload_bytes);
        Self {
            backend,
            config,
            previews,
            inner: Mutex::new(SessionInner {
                health: None,
                identity: None,
                catalog: Vec::new(),
                intake,
                product_name: String::new(),
                selected_catalog_id: None,
                workflow: WorkflowState::Idle,
                in_flight: None,
                generation_in_flight: None,
                error: None,
            }),
            next_token: AtomicU64::new(1),
            bootstrapped: AtomicBool::new(false),
            event_tx: None,
        }
    }

    /// Set event channel for streaming change notifications
    pub fn with_event_channel(mut self, tx: mpsc::UnboundedSender<SessionEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<dyn TryOnBackend> {
        &self.backend
    }

    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        lock(&self.inner)
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event);
        }
    }

    fn issue_token(&self) -> RequestToken {
        RequestToken(self.next_token.fetch_add(1, Ordering::Relaxed))
    }

    // === Bootstrap ===

    /// Run the three startup calls concurrently. Runs once; later calls
    /// only report the current state.
    #[tracing::instrument(skip(self))]
    pub async fn bootstrap(&self) -> BootstrapSummary {
        if self.bootstrapped.swap(true, Ordering::SeqCst) {
            tracing::debug!("Bootstrap already ran");
            return self.bootstrap_summary();
        }

        let backend = self.backend.as_ref();
        let health = async {
            let status = bootstrap::probe_health(backend).await;
            self.lock().health = Some(status);
        };
        let identity = async {
            let result = bootstrap::create_identity(backend, &self.config.identity_name).await;
            let _ = self.install_identity(result);
        };
        let catalog = async {
            let entries = bootstrap::fetch_catalog(backend).await;
            self.merge_catalog(entries);
        };
        tokio::join!(health, identity, catalog);

        let summary = self.bootstrap_summary();
        self.emit(
            SessionEvent::new(SessionEventKind::BootstrapCompleted).with_data(serde_json::json!({
                "api_status": summary.health.api_status,
                "identity_ready": summary.identity_ready,
                "catalog_size": summary.catalog_size,
            })),
        );
        summary
    }

    fn bootstrap_summary(&self) -> BootstrapSummary {
        let inner = self.lock();
        BootstrapSummary {
            health: inner.health.clone().unwrap_or_else(HealthStatus::degraded),
            identity_ready: inner.identity.is_some(),
            catalog_size: inner.catalog.len(),
        }
    }

    fn install_identity(&self, result: TryOnResult<Identity>) -> TryOnResult<Identity> {
        let event = {
            let mut inner = self.lock();
            match &result {
                Ok(identity) => {
                    inner.identity = Some(identity.clone());
                    if inner.error.as_deref() == Some(IDENTITY_FAILURE_MESSAGE) {
                        inner.error = None;
                    }
                    SessionEvent::new(SessionEventKind::IdentityCreated)
                        .with_data(serde_json::json!({ "user_id": identity.id }))
                }
                Err(_) => {
                    inner.error = Some(IDENTITY_FAILURE_MESSAGE.to_string());
                    SessionEvent::new(SessionEventKind::ErrorRaised)
                        .with_data(serde_json::json!({ "message": IDENTITY_FAILURE_MESSAGE }))
                }
            }
        };
        self.emit(event);
        result
    }

    /// Replace the catalog with a fetched list, keeping entries appended
    /// locally that the fetch did not include yet
    fn merge_catalog(&self, fetched: Vec<CatalogEntry>) {
        {
            let mut inner = self.lock();
            let local_only: Vec<CatalogEntry> = inner
                .catalog
                .drain(..)
                .filter(|entry| !fetched.iter().any(|f| f.id == entry.id))
                .collect();
            inner.catalog = fetched;
            inner.catalog.extend(local_only);
        }
        self.emit(SessionEvent::new(SessionEventKind::CatalogUpdated));
    }

    /// Try identity creation again after a failure. No-op once an identity exists.
    #[tracing::instrument(skip(self))]
    pub async fn retry_identity(&self) -> TryOnResult<Identity> {
        if let Some(identity) = self.lock().identity.clone() {
            return Ok(identity);
        }
        let result =
            bootstrap::create_identity(self.backend.as_ref(), &self.config.identity_name).await;
        self.install_identity(result)
    }

    /// Re-fetch the catalog on demand; returns the new size
    pub async fn refresh_catalog(&self) -> usize {
        let entries = bootstrap::fetch_catalog(self.backend.as_ref()).await;
        self.merge_catalog(entries);
        self.lock().catalog.len()
    }

    // === Asset intake ===

    /// Validate a picked file and make it the pending asset for `kind`.
    /// Returns the new preview URL. No network call is made.
    pub fn select_asset(&self, kind: AssetKind, file: LocalFile) -> TryOnResult<String> {
        let file_name = file.name.clone();
        let event = {
            let mut inner = self.lock();
            let selected = inner
                .intake
                .select(kind, file)
                .map(|asset| asset.preview_url().unwrap_or_default().to_string());

            match selected {
                Ok(preview_url) => {
                    if kind == AssetKind::Product {
                        inner.selected_catalog_id = None;
                    }
                    let ids = inner.intake.remote_ids();
                    inner.workflow.on_assets_changed(ids);
                    inner.error = None;
                    tracing::info!(%kind, file = %file_name, phase = ?inner.workflow.phase(), "Asset selected");
                    Ok((
                        preview_url.clone(),
                        SessionEvent::new(SessionEventKind::AssetSelected).with_data(
                            serde_json::json!({ "kind": kind, "preview_url": preview_url }),
                        ),
                    ))
                }
                Err(e) => {
                    tracing::warn!(%kind, file = %file_name, "File rejected: {}", e);
                    inner.error = Some(e.to_string());
                    Err((
                        TryOnError::from(e.clone()),
                        SessionEvent::new(SessionEventKind::ErrorRaised)
                            .with_data(serde_json::json!({ "message": e.to_string() })),
                    ))
                }
            }
        };

        match event {
            Ok((preview_url, event)) => {
                self.emit(event);
                Ok(preview_url)
            }
            Err((err, event)) => {
                self.emit(event);
                Err(err)
            }
        }
    }

    /// Set the name a product upload is committed under
    pub fn set_product_name(&self, name: impl Into<String>) {
        self.lock().product_name = name.into();
    }

    /// Upload the pending file for `kind` and record its remote identifier.
    ///
    /// Rejected with `Busy` while any commit or generation is in flight.
    /// On failure the asset keeps its prior state and the commit may be retried.
    #[tracing::instrument(skip(self))]
    pub async fn commit_asset(&self, kind: AssetKind) -> TryOnResult<RemoteId> {
        let (token, revision, upload) = {
            let mut inner = self.lock();
            if inner.in_flight.is_some() {
                return Err(TryOnError::Busy);
            }

            let no_file = || TryOnError::Precondition(format!("No {} photo selected", kind));
            let asset = inner.intake.get(kind).ok_or_else(no_file)?;
            let file = asset.local_file.clone().ok_or_else(no_file)?;
            let revision = asset.revision;

            let upload = match kind {
                AssetKind::Subject => {
                    let user_id = inner.identity.as_ref().map(|i| i.id).ok_or_else(|| {
                        TryOnError::Precondition("User is not initialized yet".to_string())
                    })?;
                    Upload::Subject { user_id, file }
                }
                AssetKind::Product => {
                    let name = inner.product_name.trim().to_string();
                    if name.is_empty() {
                        return Err(TryOnError::Precondition(
                            "Product name is required".to_string(),
                        ));
                    }
                    Upload::Product { name, file }
                }
            };

            let token = self.issue_token();
            inner.in_flight = Some(token);
            inner.error = None;
            (token, revision, upload)
        };
        tracing::debug!(%token, "Request token acquired");

        let result = match &upload {
            Upload::Subject { user_id, file } => self
                .backend
                .upload_user_photo(*user_id, file)
                .await
                .map(|photo| (photo.id, None)),
            Upload::Product { name, file } => self
                .backend
                .upload_product_photo(name, file)
                .await
                .map(|entry| (entry.id, Some(entry))),
        };

        let mut events = Vec::new();
        let outcome = {
            let mut inner = self.lock();
            let current = inner.in_flight == Some(token);
            if current {
                inner.in_flight = None;
            }

            match result {
                Ok((id, entry)) => {
                    if let Some(entry) = entry {
                        if !inner.catalog.iter().any(|e| e.id == entry.id) {
                            inner.catalog.push(entry);
                            events.push(SessionEvent::new(SessionEventKind::CatalogUpdated));
                        }
                    }

                    if current && inner.intake.assign_remote(kind, revision, id) {
                        if kind == AssetKind::Product {
                            inner.selected_catalog_id = Some(id);
                        }
                        let ids = inner.intake.remote_ids();
                        inner.workflow.on_assets_changed(ids);
                        tracing::info!(%kind, remote_id = %id, phase = ?inner.workflow.phase(), "Asset committed");
                        events.push(
                            SessionEvent::new(SessionEventKind::AssetCommitted)
                                .with_data(serde_json::json!({ "kind": kind, "remote_id": id })),
                        );
                        Ok(id)
                    } else {
                        tracing::debug!(%kind, %token, "Commit response discarded as stale");
                        Err(TryOnError::Superseded)
                    }
                }
                Err(e) => {
                    tracing::warn!(%kind, "Upload failed: {}", e);
                    if current {
                        let message = e.user_message(kind.upload_failure_message());
                        events.push(
                            SessionEvent::new(SessionEventKind::ErrorRaised)
                                .with_data(serde_json::json!({ "message": message })),
                        );
                        inner.error = Some(message);
                    }
                    Err(e)
                }
            }
        };

        for event in events {
            self.emit(event);
        }
        outcome
    }

    /// Use an existing catalog entry as the product, without uploading
    pub fn pick_catalog_entry(&self, product_id: RemoteId) -> TryOnResult<()> {
        {
            let mut inner = self.lock();
            let entry = inner
                .catalog
                .iter()
                .find(|e| e.id == product_id)
                .cloned()
                .ok_or_else(|| TryOnError::Precondition(format!("Unknown product {}", product_id)))?;

            inner.selected_catalog_id = Some(product_id);
            if inner.intake.remote_ids().product == Some(product_id) {
                return Ok(());
            }

            inner.intake.pick_catalog_entry(&entry);
            let ids = inner.intake.remote_ids();
            inner.workflow.on_assets_changed(ids);
            tracing::info!(product_id = %product_id, name = %entry.name, "Catalog product picked");
        }
        self.emit(
            SessionEvent::new(SessionEventKind::ProductPicked)
                .with_data(serde_json::json!({ "product_id": product_id })),
        );
        Ok(())
    }

    // === Generation ===

    /// Send the generation request if both identifiers exist and nothing is
    /// in flight. Errors are reduced into the `Failed` state.
    #[tracing::instrument(skip(self))]
    pub async fn generate(&self) -> GenerateOutcome {
        let (token, request) = {
            let mut inner = self.lock();
            if let Some(held) = inner.in_flight {
                let reason = if inner.workflow.phase() == WorkflowPhase::Generating {
                    GenerateRejection::AlreadyGenerating
                } else {
                    GenerateRejection::Busy
                };
                tracing::debug!(%held, ?reason, "Generate rejected");
                return GenerateOutcome::Rejected(reason);
            }
            if let Some(held) = inner.generation_in_flight {
                tracing::debug!(%held, "Generate rejected while an abandoned request is outstanding");
                return GenerateOutcome::Rejected(GenerateRejection::Busy);
            }

            let token = self.issue_token();
            let ids = inner.intake.remote_ids();
            match inner.workflow.begin_generation(ids, token) {
                Ok((user_id, product_id)) => {
                    inner.in_flight = Some(token);
                    inner.generation_in_flight = Some(token);
                    inner.error = None;
                    (
                        token,
                        TryOnRequest {
                            user_id,
                            product_id,
                        },
                    )
                }
                Err(reason) => {
                    tracing::debug!(?reason, "Generate rejected");
                    return GenerateOutcome::Rejected(reason);
                }
            }
        };

        tracing::info!(%token, user_id = %request.user_id, product_id = %request.product_id, "Generating try-on");
        self.emit(
            SessionEvent::new(SessionEventKind::GenerationStarted)
                .with_data(serde_json::json!(request)),
        );

        let result = match self.backend.create_tryon(request).await {
            Ok(artifact) if artifact.has_image() => Ok(artifact),
            Ok(artifact) => {
                tracing::warn!(session_id = %artifact.session_id, "Try-on returned no image");
                Err(EMPTY_OUTPUT_MESSAGE.to_string())
            }
            Err(e) => {
                tracing::warn!("Try-on failed: {}", e);
                Err(e.user_message(GENERATION_FAILURE_MESSAGE))
            }
        };

        let (outcome, event) = {
            let mut inner = self.lock();
            if inner.in_flight == Some(token) {
                inner.in_flight = None;
            }
            if inner.generation_in_flight == Some(token) {
                inner.generation_in_flight = None;
            }

            match result {
                Ok(artifact) => {
                    if inner.workflow.complete(token, artifact.clone()) {
                        tracing::info!(session_id = %artifact.session_id, "Try-on completed");
                        let event = SessionEvent::new(SessionEventKind::GenerationCompleted)
                            .with_data(serde_json::json!({ "session_id": artifact.session_id }));
                        (GenerateOutcome::Completed(artifact), Some(event))
                    } else {
                        (GenerateOutcome::Superseded, None)
                    }
                }
                Err(message) => {
                    if inner.workflow.fail(token, message.clone()) {
                        let event = SessionEvent::new(SessionEventKind::GenerationFailed)
                            .with_data(serde_json::json!({ "message": message }));
                        (GenerateOutcome::Failed(message), Some(event))
                    } else {
                        (GenerateOutcome::Superseded, None)
                    }
                }
            }
        };

        match event {
            Some(event) => self.emit(event),
            None => tracing::debug!(%token, "Generation response discarded as stale"),
        }
        outcome
    }

    /// Return to `Idle`: release both previews, clear both assets, the
    /// artifact, and the error. Identity and catalog are kept.
    pub fn reset(&self) {
        {
            let mut inner = self.lock();
            if let Some(token) = inner.in_flight.take() {
                tracing::debug!(%token, "Abandoning in-flight request");
            }
            // generation_in_flight is kept: generate stays blocked until the
            // abandoned response lands
            inner.intake.clear();
            inner.workflow.reset();
            inner.error = None;
            inner.product_name.clear();
            inner.selected_catalog_id = None;
        }
        tracing::info!("Session reset");
        self.emit(SessionEvent::new(SessionEventKind::Reset));
    }

    // === Queries ===

    pub fn phase(&self) -> WorkflowPhase {
        self.lock().workflow.phase()
    }

    pub fn artifact(&self) -> Option<TryOnArtifact> {
        self.lock().workflow.artifact().cloned()
    }

    pub fn catalog(&self) -> Vec<CatalogEntry> {
        self.lock().catalog.clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.lock().identity.clone()
    }

    pub fn product_name(&self) -> String {
        self.lock().product_name.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.lock();
        SessionSnapshot {
            phase: inner.workflow.phase(),
            health: inner.health.clone(),
            identity: inner.identity.clone(),
            catalog: inner.catalog.clone(),
            subject: inner.intake.get(AssetKind::Subject).map(AssetView::from),
            product: inner.intake.get(AssetKind::Product).map(AssetView::from),
            product_name: inner.product_name.clone(),
            selected_catalog_id: inner.selected_catalog_id,
            artifact: inner.workflow.artifact().cloned(),
            error: inner
                .error
                .clone()
                .or_else(|| inner.workflow.failure().map(str::to_string)),
            is_loading: inner.in_flight.is_some(),
            generation_pending: inner.generation_in_flight.is_some(),
        }
    }
}
