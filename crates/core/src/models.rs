//! # Try-On Models
//!
//! Wire types exchanged with the try-on backend and the domain records built
//! from them. Field names follow the backend's JSON; Rust-side names follow
//! what the session does with them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier assigned by the backend to a committed asset, user, or product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(pub i64);

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RemoteId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// The ephemeral identity created once per session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: RemoteId,
    #[serde(rename = "name", default)]
    pub display_name: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /users`
#[derive(Debug, Clone, Serialize)]
pub struct CreateIdentityRequest {
    pub name: String,
}

/// Service health as reported by `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(rename = "status")]
    pub api_status: String,
    #[serde(rename = "gemini_api")]
    pub dependency_status: String,
}

impl HealthStatus {
    /// Status recorded when the probe itself fails
    pub fn degraded() -> Self {
        Self {
            api_status: "unhealthy".to_string(),
            dependency_status: "disconnected".to_string(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.api_status == "healthy"
    }

    pub fn dependency_connected(&self) -> bool {
        self.dependency_status == "connected"
    }
}

/// Where an image lives on the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ImageRef {
    /// Server-relative URL such as `/static/results/7.png`
    Url(String),
    /// Path relative to the backend's storage root, served under `/static/`
    StoragePath(String),
}

impl ImageRef {
    /// Resolve against the static-asset base (no trailing slash expected)
    pub fn resolve(&self, static_base: &str) -> String {
        let base = static_base.trim_end_matches('/');
        match self {
            ImageRef::Url(url) if url.starts_with("http://") || url.starts_with("https://") => {
                url.clone()
            }
            ImageRef::Url(url) => format!("{}/{}", base, url.trim_start_matches('/')),
            ImageRef::StoragePath(path) => {
                format!("{}/static/{}", base, path.trim_start_matches('/'))
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ImageRef::Url(s) | ImageRef::StoragePath(s) => s.trim().is_empty(),
        }
    }
}

/// A product available for try-on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCatalogEntry", into = "RawCatalogEntry")]
pub struct CatalogEntry {
    pub id: RemoteId,
    pub name: String,
    pub image_ref: ImageRef,
    pub created_at: DateTime<Utc>,
}

/// Product as the backend sends it: either `image_url` or `filepath`
#[derive(Serialize, Deserialize)]
struct RawCatalogEntry {
    id: RemoteId,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    filepath: Option<String>,
    #[serde(with = "timestamp")]
    created_at: DateTime<Utc>,
}

impl TryFrom<RawCatalogEntry> for CatalogEntry {
    type Error = String;

    fn try_from(raw: RawCatalogEntry) -> Result<Self, Self::Error> {
        let image_ref = match (raw.image_url, raw.filepath) {
            (Some(url), _) if !url.is_empty() => ImageRef::Url(url),
            (_, Some(path)) if !path.is_empty() => ImageRef::StoragePath(path),
            _ => return Err(format!("product {} has no image reference", raw.id)),
        };
        Ok(Self {
            id: raw.id,
            name: raw.name,
            image_ref,
            created_at: raw.created_at,
        })
    }
}

impl From<CatalogEntry> for RawCatalogEntry {
    fn from(entry: CatalogEntry) -> Self {
        let (image_url, filepath) = match entry.image_ref {
            ImageRef::Url(url) => (Some(url), None),
            ImageRef::StoragePath(path) => (None, Some(path)),
        };
        Self {
            id: entry.id,
            name: entry.name,
            image_url,
            filepath,
            created_at: entry.created_at,
        }
    }
}

/// Response of `POST /upload-user-photo`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedPhoto {
    #[serde(alias = "user_id")]
    pub id: RemoteId,
    #[serde(default)]
    pub filepath: Option<String>,
}

/// Body of `POST /tryon`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TryOnRequest {
    pub user_id: RemoteId,
    pub product_id: RemoteId,
}

/// The generated composite image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawArtifact", into = "RawArtifact")]
pub struct TryOnArtifact {
    pub session_id: RemoteId,
    pub output_image_ref: ImageRef,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
struct RawArtifact {
    session_id: RemoteId,
    #[serde(default)]
    output_image_url: String,
    #[serde(with = "timestamp")]
    created_at: DateTime<Utc>,
}

impl From<RawArtifact> for TryOnArtifact {
    fn from(raw: RawArtifact) -> Self {
        Self {
            session_id: raw.session_id,
            output_image_ref: ImageRef::Url(raw.output_image_url),
            created_at: raw.created_at,
        }
    }
}

impl From<TryOnArtifact> for RawArtifact {
    fn from(artifact: TryOnArtifact) -> Self {
        // Storage paths become the server-relative URL they resolve to
        let output_image_url = match artifact.output_image_ref {
            ImageRef::Url(url) => url,
            ImageRef::StoragePath(path) => format!("/static/{}", path.trim_start_matches('/')),
        };
        Self {
            session_id: artifact.session_id,
            output_image_url,
            created_at: artifact.created_at,
        }
    }
}

impl TryOnArtifact {
    /// The backend answers 200 with an empty URL when generation fails on its side
    pub fn has_image(&self) -> bool {
        !self.output_image_ref.is_empty()
    }
}

/// Stored try-on session, from `GET /tryon/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TryOnSessionRecord {
    pub id: RemoteId,
    pub user_id: RemoteId,
    pub product_id: RemoteId,
    pub input_user_photo_path: String,
    pub input_product_photo_path: String,
    #[serde(default)]
    pub output_image_path: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl TryOnSessionRecord {
    /// Output image as a storage reference, if generation produced one
    pub fn output_image_ref(&self) -> Option<ImageRef> {
        self.output_image_path
            .as_ref()
            .filter(|p| !p.is_empty())
            .map(|p| ImageRef::StoragePath(p.clone()))
    }
}

/// Error payload sent with non-success statuses.
///
/// `detail` is usually a string; request validation failures send a list of
/// `{ loc, msg, type }` objects instead.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorPayload {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorPayload {
    /// Flatten `detail` into one displayable message
    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Array(items) => {
                let msgs: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                    .collect();
                if msgs.is_empty() {
                    None
                } else {
                    Some(msgs.join("; "))
                }
            }
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

/// Timestamps arrive as RFC 3339 or as naive ISO-8601, which is taken as UTC
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(|naive| naive.and_utc())
    }
}
