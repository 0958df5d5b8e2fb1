//! # Try-On Core
//!
//! Client-side orchestration for virtual try-on: everything between
//! "the page loaded" and "here is your generated image".
//!
//! ## Architecture
//!
//! - `api/` - The backend seam (`TryOnBackend`) and its HTTP implementation
//! - `state/` - Asset intake, preview handles, and the workflow state machine
//! - `session/` - Bootstrap and the `TryOnSession` coordinator
//! - `present/` - Result view, download, and share
//! - `models` - Wire types exchanged with the backend
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tryon_core::{AssetKind, ClientConfig, HttpBackend, LocalFile, TryOnSession};
//!
//! let config = ClientConfig::new("http://localhost:8000");
//! let backend = Arc::new(HttpBackend::new(&config)?);
//! let session = TryOnSession::new(config, backend);
//!
//! session.bootstrap().await;
//! session.select_asset(AssetKind::Subject, LocalFile::from_path("me.jpg").await?)?;
//! session.commit_asset(AssetKind::Subject).await?;
//! session.pick_catalog_entry(catalog_id)?;
//! let outcome = session.generate().await;
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod present;
pub mod session;
pub mod state;

pub use api::{HttpBackend, TryOnBackend};
pub use config::ClientConfig;
pub use error::{TryOnError, TryOnResult, ValidationError};
pub use models::{CatalogEntry, HealthStatus, Identity, ImageRef, RemoteId, TryOnArtifact};
pub use present::{ResultPresenter, ResultView, ShareOutcome, ShareStrategy, DOWNLOAD_FILENAME};
pub use session::{GenerateOutcome, SessionEvent, SessionEventKind, SessionSnapshot, TryOnSession};
pub use state::{AssetKind, LocalFile, WorkflowPhase};
