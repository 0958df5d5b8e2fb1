//! # Asset Intake
//!
//! Tracks the subject photo and the product photo from local selection,
//! through validation, to the remote identifier obtained on commit.

use super::preview::{PreviewHandle, PreviewRegistry};
use crate::error::ValidationError;
use crate::models::{CatalogEntry, RemoteId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Media types accepted for either asset kind
pub const ACCEPTED_MEDIA_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/bmp",
    "image/webp",
];

/// Which of the two assets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// The person trying the garment on
    Subject,
    /// The garment or product
    Product,
}

impl AssetKind {
    /// Display name for UI
    pub fn display_name(&self) -> &'static str {
        match self {
            AssetKind::Subject => "Your Photo",
            AssetKind::Product => "Product",
        }
    }

    /// Message shown when committing this kind fails without a server detail
    pub fn upload_failure_message(&self) -> &'static str {
        match self {
            AssetKind::Subject => "Failed to upload user photo",
            AssetKind::Product => "Failed to upload product photo",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Subject => write!(f, "subject"),
            AssetKind::Product => write!(f, "product"),
        }
    }
}

/// A file picked by the user, held in memory until committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Arc<[u8]>,
}

impl LocalFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, guessing its media type from the extension
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let media_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());

        Ok(Self::new(name, media_type, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Check a selected file against the accepted types and the size limit
pub fn validate_file(file: &LocalFile, max_bytes: u64) -> Result<(), ValidationError> {
    let media_type = file.media_type.to_ascii_lowercase();
    if !ACCEPTED_MEDIA_TYPES.contains(&media_type.as_str()) {
        return Err(ValidationError::UnsupportedType {
            media_type: file.media_type.clone(),
        });
    }
    if file.size() > max_bytes {
        return Err(ValidationError::TooLarge {
            size: file.size(),
            limit: max_bytes,
        });
    }
    if file.bytes.is_empty() {
        return Err(ValidationError::Empty);
    }
    Ok(())
}

/// How an asset came to exist
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ValidationState {
    /// A local file that passed validation
    Accepted { media_type: String, size: u64 },
    /// An existing catalog entry; nothing local to validate
    NotRequired,
}

/// One asset slot's contents
#[derive(Debug)]
pub struct Asset {
    pub kind: AssetKind,
    /// Bumped on every new selection, so a late commit can tell it is stale
    pub revision: u64,
    pub local_file: Option<LocalFile>,
    pub preview: Option<PreviewHandle>,
    pub remote_id: Option<RemoteId>,
    pub validation_state: ValidationState,
}

impl Asset {
    pub fn preview_url(&self) -> Option<&str> {
        self.preview.as_ref().map(|p| p.url())
    }

    /// Selected locally and not yet committed
    pub fn is_pending(&self) -> bool {
        self.local_file.is_some() && self.remote_id.is_none()
    }
}

/// Remote identifiers of both assets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssetIds {
    pub subject: Option<RemoteId>,
    pub product: Option<RemoteId>,
}

impl AssetIds {
    /// Both identifiers, if both exist
    pub fn both(&self) -> Option<(RemoteId, RemoteId)> {
        Some((self.subject?, self.product?))
    }
}

/// Owner of both asset slots and their preview handles
#[derive(Debug)]
pub struct AssetIntake {
    previews: PreviewRegistry,
    max_upload_bytes: u64,
    revision: u64,
    subject: Option<Asset>,
    product: Option<Asset>,
}

impl AssetIntake {
    pub fn new(previews: PreviewRegistry, max_upload_bytes: u64) -> Self {
        Self {
            previews,
            max_upload_bytes,
            revision: 0,
            subject: None,
            product: None,
        }
    }

    fn slot_mut(&mut self, kind: AssetKind) -> &mut Option<Asset> {
        match kind {
            AssetKind::Subject => &mut self.subject,
            AssetKind::Product => &mut self.product,
        }
    }

    pub fn get(&self, kind: AssetKind) -> Option<&Asset> {
        match kind {
            AssetKind::Subject => self.subject.as_ref(),
            AssetKind::Product => self.product.as_ref(),
        }
    }

    fn next_revision(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    /// Validate and install a newly selected file.
    ///
    /// On rejection nothing changes. On success the previous preview handle
    /// for this kind is released before the new one is created.
    pub fn select(&mut self, kind: AssetKind, file: LocalFile) -> Result<&Asset, ValidationError> {
        validate_file(&file, self.max_upload_bytes)?;

        drop(self.slot_mut(kind).take());

        let preview = self.previews.create(&file);
        let revision = self.next_revision();
        let validation_state = ValidationState::Accepted {
            media_type: file.media_type.clone(),
            size: file.size(),
        };
        let slot = self.slot_mut(kind);
        Ok(slot.insert(Asset {
            kind,
            revision,
            local_file: Some(file),
            preview: Some(preview),
            remote_id: None,
            validation_state,
        }))
    }

    /// Use an existing catalog entry as the product, bypassing upload
    pub fn pick_catalog_entry(&mut self, entry: &CatalogEntry) -> &Asset {
        drop(self.product.take());
        let revision = self.next_revision();
        self.product.insert(Asset {
            kind: AssetKind::Product,
            revision,
            local_file: None,
            preview: None,
            remote_id: Some(entry.id),
            validation_state: ValidationState::NotRequired,
        })
    }

    /// Record the identifier returned by a commit.
    ///
    /// Returns `false` when the asset was replaced or cleared since the
    /// commit started; the identifier is then not applied.
    pub fn assign_remote(&mut self, kind: AssetKind, revision: u64, id: RemoteId) -> bool {
        match self.slot_mut(kind) {
            Some(asset) if asset.revision == revision => {
                asset.remote_id = Some(id);
                true
            }
            _ => false,
        }
    }

    pub fn remote_ids(&self) -> AssetIds {
        AssetIds {
            subject: self.subject.as_ref().and_then(|a| a.remote_id),
            product: self.product.as_ref().and_then(|a| a.remote_id),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.subject.is_none() && self.product.is_none()
    }

    /// Drop both assets, releasing their preview handles
    pub fn clear(&mut self) {
        drop(self.subject.take());
        drop(self.product.take());
    }

    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }
}
