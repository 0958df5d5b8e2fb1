//! # Backend API
//!
//! The try-on backend as seen by the session. `HttpBackend` talks to the real
//! service; tests substitute their own implementation.
//!
//! | Method | Endpoint |
//! |---|---|
//! | `health` | `GET /health` |
//! | `create_user` | `POST /users` |
//! | `list_products` | `GET /products` |
//! | `upload_user_photo` | `POST /upload-user-photo` (multipart) |
//! | `upload_product_photo` | `POST /upload-product-photo` (multipart) |
//! | `create_tryon` | `POST /tryon` |
//! | `get_tryon_session` | `GET /tryon/{id}` |
//! | `fetch_asset` | any resolved static image URL |

pub mod http;

pub use http::HttpBackend;

use crate::error::TryOnResult;
use crate::models::{
    CatalogEntry, HealthStatus, Identity, RemoteId, TryOnArtifact, TryOnRequest,
    TryOnSessionRecord, UploadedPhoto,
};
use crate::state::LocalFile;
use async_trait::async_trait;

/// Request/response access to the try-on backend
#[async_trait]
pub trait TryOnBackend: Send + Sync {
    /// Probe service and image-model health
    async fn health(&self) -> TryOnResult<HealthStatus>;

    /// Create an ephemeral identity
    async fn create_user(&self, name: &str) -> TryOnResult<Identity>;

    /// Fetch all catalog entries
    async fn list_products(&self) -> TryOnResult<Vec<CatalogEntry>>;

    /// Upload the subject photo for `user_id`
    async fn upload_user_photo(
        &self,
        user_id: RemoteId,
        file: &LocalFile,
    ) -> TryOnResult<UploadedPhoto>;

    /// Upload a product photo, creating a catalog entry
    async fn upload_product_photo(&self, name: &str, file: &LocalFile)
        -> TryOnResult<CatalogEntry>;

    /// Generate a try-on image
    async fn create_tryon(&self, request: TryOnRequest) -> TryOnResult<TryOnArtifact>;

    /// Look up a stored try-on session
    async fn get_tryon_session(&self, session_id: RemoteId) -> TryOnResult<TryOnSessionRecord>;

    /// Download image bytes from an already-resolved URL
    async fn fetch_asset(&self, url: &str) -> TryOnResult<Vec<u8>>;
}
