//! # Bootstrap
//!
//! The three startup calls. None depends on another and each failure stays
//! inside its own slice: a failed health probe degrades the status record,
//! a failed identity call surfaces a banner, a failed catalog fetch leaves
//! the list empty.

use crate::api::TryOnBackend;
use crate::error::TryOnResult;
use crate::models::{CatalogEntry, HealthStatus, Identity};

/// Banner shown when identity creation fails
pub const IDENTITY_FAILURE_MESSAGE: &str = "Failed to initialize user";

/// Probe service health; never fails
pub async fn probe_health(backend: &dyn TryOnBackend) -> HealthStatus {
    match backend.health().await {
        Ok(status) => {
            tracing::info!(
                api = %status.api_status,
                dependency = %status.dependency_status,
                "Health probe completed"
            );
            status
        }
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            HealthStatus::degraded()
        }
    }
}

/// Create the session's ephemeral identity
pub async fn create_identity(backend: &dyn TryOnBackend, name: &str) -> TryOnResult<Identity> {
    let identity = backend.create_user(name).await.map_err(|e| {
        tracing::warn!("Failed to create user: {}", e);
        e
    })?;
    tracing::info!(user_id = %identity.id, "Identity created");
    Ok(identity)
}

/// Fetch the product catalog; an unreachable catalog is simply empty
pub async fn fetch_catalog(backend: &dyn TryOnBackend) -> Vec<CatalogEntry> {
    match backend.list_products().await {
        Ok(entries) => {
            tracing::info!(count = entries.len(), "Catalog loaded");
            entries
        }
        Err(e) => {
            tracing::warn!("Failed to load products: {}", e);
            Vec::new()
        }
    }
}

/// What bootstrap left behind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapSummary {
    pub health: HealthStatus,
    pub identity_ready: bool,
    pub catalog_size: usize,
}
