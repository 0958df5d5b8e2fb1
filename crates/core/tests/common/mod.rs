//! Scripted in-memory backend shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;
use tryon_core::api::TryOnBackend;
use tryon_core::models::{TryOnRequest, TryOnSessionRecord, UploadedPhoto};
use tryon_core::{
    CatalogEntry, ClientConfig, HealthStatus, Identity, ImageRef, LocalFile, RemoteId,
    TryOnArtifact, TryOnError, TryOnResult, TryOnSession,
};

pub const STATIC_BASE: &str = "http://cdn.test";
pub const RESULT_BYTES: &[u8] = b"\x89PNG result";

pub struct Script {
    pub health_ok: bool,
    pub user_failures: usize,
    pub products_ok: bool,
    pub products: Vec<CatalogEntry>,
    pub upload_errors: VecDeque<TryOnError>,
    pub tryon: VecDeque<TryOnResult<TryOnArtifact>>,
    pub gate_uploads: bool,
    pub gate_tryon: bool,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            health_ok: true,
            user_failures: 0,
            products_ok: true,
            products: vec![entry(1, "Kurta"), entry(2, "Denim Jacket")],
            upload_errors: VecDeque::new(),
            tryon: VecDeque::new(),
            gate_uploads: false,
            gate_tryon: false,
        }
    }
}

/// In-memory backend. Calls are recorded; responses follow the script.
#[derive(Default)]
pub struct FakeBackend {
    calls: Mutex<Vec<String>>,
    script: Mutex<Script>,
    gate: Arc<Notify>,
    next_id: AtomicI64,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicI64::new(100),
            ..Self::default()
        })
    }

    pub fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }

    /// Let one gated call proceed
    pub fn release(&self) {
        self.gate.notify_one();
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn next_id(&self) -> RemoteId {
        RemoteId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn wait_if(&self, gated: bool) {
        if gated {
            self.gate.notified().await;
        }
    }
}

pub fn entry(id: i64, name: &str) -> CatalogEntry {
    CatalogEntry {
        id: RemoteId(id),
        name: name.to_string(),
        image_ref: ImageRef::StoragePath(format!("products/{}.jpg", id)),
        created_at: Utc::now(),
    }
}

pub fn artifact(session_id: i64) -> TryOnArtifact {
    TryOnArtifact {
        session_id: RemoteId(session_id),
        output_image_ref: ImageRef::Url(format!("/static/results/tryon_{}.png", session_id)),
        created_at: Utc::now(),
    }
}

pub fn jpeg(name: &str) -> LocalFile {
    LocalFile::new(name, "image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3])
}

pub fn session(backend: &Arc<FakeBackend>) -> TryOnSession {
    let config = ClientConfig::new("http://api.test").with_static_base_url(STATIC_BASE);
    TryOnSession::new(config, backend.clone())
}

#[async_trait]
impl TryOnBackend for FakeBackend {
    async fn health(&self) -> TryOnResult<HealthStatus> {
        self.record("health");
        if self.script().health_ok {
            Ok(HealthStatus {
                api_status: "healthy".to_string(),
                dependency_status: "connected".to_string(),
            })
        } else {
            Err(TryOnError::Network("connection refused".to_string()))
        }
    }

    async fn create_user(&self, name: &str) -> TryOnResult<Identity> {
        self.record(format!("create_user:{}", name));
        {
            let mut script = self.script();
            if script.user_failures > 0 {
                script.user_failures -= 1;
                return Err(TryOnError::Http {
                    status: 500,
                    detail: None,
                });
            }
        }
        Ok(Identity {
            id: RemoteId(7),
            display_name: Some(name.to_string()),
            created_at: Utc::now(),
        })
    }

    async fn list_products(&self) -> TryOnResult<Vec<CatalogEntry>> {
        self.record("list_products");
        let script = self.script();
        if script.products_ok {
            Ok(script.products.clone())
        } else {
            Err(TryOnError::Network("timed out".to_string()))
        }
    }

    async fn upload_user_photo(
        &self,
        user_id: RemoteId,
        file: &LocalFile,
    ) -> TryOnResult<UploadedPhoto> {
        self.record(format!("upload_user_photo:{}:{}", user_id, file.name));
        let gated = self.script().gate_uploads;
        self.wait_if(gated).await;
        if let Some(err) = self.script().upload_errors.pop_front() {
            return Err(err);
        }
        Ok(UploadedPhoto {
            id: user_id,
            filepath: Some(format!("users/{}/photos/{}", user_id, file.name)),
        })
    }

    async fn upload_product_photo(
        &self,
        name: &str,
        file: &LocalFile,
    ) -> TryOnResult<CatalogEntry> {
        self.record(format!("upload_product_photo:{}:{}", name, file.name));
        let gated = self.script().gate_uploads;
        self.wait_if(gated).await;
        if let Some(err) = self.script().upload_errors.pop_front() {
            return Err(err);
        }
        let id = self.next_id();
        Ok(CatalogEntry {
            id,
            name: name.to_string(),
            image_ref: ImageRef::StoragePath(format!("products/{}", file.name)),
            created_at: Utc::now(),
        })
    }

    async fn create_tryon(&self, request: TryOnRequest) -> TryOnResult<TryOnArtifact> {
        self.record(format!(
            "create_tryon:{}:{}",
            request.user_id, request.product_id
        ));
        let gated = self.script().gate_tryon;
        self.wait_if(gated).await;
        let scripted = self.script().tryon.pop_front();
        match scripted {
            Some(result) => result,
            None => Ok(artifact(self.next_id().0)),
        }
    }

    async fn get_tryon_session(&self, session_id: RemoteId) -> TryOnResult<TryOnSessionRecord> {
        self.record(format!("get_tryon_session:{}", session_id));
        Err(TryOnError::Http {
            status: 404,
            detail: Some("Try-on session not found".to_string()),
        })
    }

    async fn fetch_asset(&self, url: &str) -> TryOnResult<Vec<u8>> {
        self.record(format!("fetch_asset:{}", url));
        Ok(RESULT_BYTES.to_vec())
    }
}
