//! HTTP implementation of the backend seam

use super::TryOnBackend;
use crate::config::ClientConfig;
use crate::error::{TryOnError, TryOnResult};
use crate::models::{
    CatalogEntry, CreateIdentityRequest, ErrorPayload, HealthStatus, Identity, RemoteId,
    TryOnArtifact, TryOnRequest, TryOnSessionRecord, UploadedPhoto,
};
use crate::state::LocalFile;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

/// Talks to the try-on backend over HTTP
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Build a client for the configured API base
    pub fn new(config: &ClientConfig) -> TryOnResult<Self> {
        let mut builder = Client::builder().user_agent("tryon-client/0.1");
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TryOnError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base().to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn file_part(file: &LocalFile) -> TryOnResult<Part> {
        Part::bytes(file.bytes.to_vec())
            .file_name(file.name.clone())
            .mime_str(&file.media_type)
            .map_err(|_| {
                TryOnError::Validation(crate::error::ValidationError::UnsupportedType {
                    media_type: file.media_type.clone(),
                })
            })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> TryOnResult<T> {
        let response = self.client.get(self.url(path)).send().await?;
        handle_response(response).await
    }

    async fn post_json<B: serde::Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> TryOnResult<T> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        handle_response(response).await
    }

    async fn post_form<T: DeserializeOwned>(&self, path: &str, form: Form) -> TryOnResult<T> {
        let response = self
            .client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await?;
        handle_response(response).await
    }
}

/// Decode a success body, or turn a failure status into `TryOnError::Http`
async fn handle_response<T: DeserializeOwned>(response: Response) -> TryOnResult<T> {
    let status = response.status();
    if status.is_success() {
        let body = response.bytes().await?;
        return serde_json::from_slice(&body)
            .map_err(|e| TryOnError::MalformedResponse(e.to_string()));
    }

    let detail = response
        .text()
        .await
        .ok()
        .and_then(|body| serde_json::from_str::<ErrorPayload>(&body).ok())
        .and_then(|payload| payload.message());

    Err(TryOnError::Http {
        status: status.as_u16(),
        detail,
    })
}

#[async_trait]
impl TryOnBackend for HttpBackend {
    async fn health(&self) -> TryOnResult<HealthStatus> {
        self.get("/health").await
    }

    async fn create_user(&self, name: &str) -> TryOnResult<Identity> {
        let body = CreateIdentityRequest {
            name: name.to_string(),
        };
        self.post_json("/users", &body).await
    }

    async fn list_products(&self) -> TryOnResult<Vec<CatalogEntry>> {
        self.get("/products").await
    }

    async fn upload_user_photo(
        &self,
        user_id: RemoteId,
        file: &LocalFile,
    ) -> TryOnResult<UploadedPhoto> {
        let form = Form::new()
            .part("file", Self::file_part(file)?)
            .text("user_id", user_id.to_string());
        self.post_form("/upload-user-photo", form).await
    }

    async fn upload_product_photo(
        &self,
        name: &str,
        file: &LocalFile,
    ) -> TryOnResult<CatalogEntry> {
        let form = Form::new()
            .part("file", Self::file_part(file)?)
            .text("name", name.to_string());
        self.post_form("/upload-product-photo", form).await
    }

    async fn create_tryon(&self, request: TryOnRequest) -> TryOnResult<TryOnArtifact> {
        self.post_json("/tryon", &request).await
    }

    async fn get_tryon_session(&self, session_id: RemoteId) -> TryOnResult<TryOnSessionRecord> {
        self.get(&format!("/tryon/{}", session_id)).await
    }

    async fn fetch_asset(&self, url: &str) -> TryOnResult<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TryOnError::Http {
                status: status.as_u16(),
                detail: None,
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}
