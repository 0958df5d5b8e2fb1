//! Try-On CLI
//!
//! Drives one try-on session from the terminal: bootstrap, upload both
//! photos (or pick a catalog product), generate, then download or share.

mod clipboard;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use clipboard::Osc52Clipboard;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tryon_core::present::Clipboard;
use tryon_core::session::IDENTITY_FAILURE_MESSAGE;
use tryon_core::{
    AssetKind, ClientConfig, GenerateOutcome, HttpBackend, LocalFile, RemoteId, ResultPresenter,
    SessionEvent, ShareOutcome, ShareStrategy, TryOnSession,
};

#[derive(Parser)]
#[command(author, version, about = "Virtual try-on client")]
struct Args {
    /// Base URL of the try-on API
    #[arg(long, env = "TRYON_API_URL", default_value = "http://localhost:8000")]
    api_url: String,

    /// Base URL that image paths are resolved against (defaults to the API URL)
    #[arg(long, env = "TRYON_STATIC_URL")]
    static_url: Option<String>,

    /// Display name for the session's identity
    #[arg(long, env = "TRYON_USER_NAME", default_value = "Anonymous User")]
    user_name: String,

    /// Per-request timeout in seconds (no timeout when unset)
    #[arg(long, env = "TRYON_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Emit logs as JSON
    #[arg(long, env = "TRYON_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Show API and image-model status
    Status,
    /// List catalog products
    Products,
    /// Generate a try-on image
    Run {
        /// Your photo
        #[arg(long)]
        photo: PathBuf,
        /// Product photo to upload
        #[arg(long, requires = "name", conflicts_with = "catalog_id")]
        product: Option<PathBuf>,
        /// Name for the uploaded product
        #[arg(long)]
        name: Option<String>,
        /// Use an existing catalog product instead of uploading one
        #[arg(long, required_unless_present = "product")]
        catalog_id: Option<i64>,
        /// Directory to download the result into
        #[arg(long)]
        out: Option<PathBuf>,
        /// Share the result link
        #[arg(long)]
        share: bool,
    },
}

fn init_tracing(json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "warn,tryon_core=info".into());

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn build_config(args: &Args) -> ClientConfig {
    let mut config = ClientConfig::new(&args.api_url).with_identity_name(&args.user_name);
    if let Some(url) = &args.static_url {
        config = config.with_static_base_url(url);
    }
    if let Some(secs) = args.timeout_secs {
        config = config.with_request_timeout(Duration::from_secs(secs));
    }
    config
}

fn spawn_event_logger(mut rx: mpsc::UnboundedReceiver<SessionEvent>) {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            tracing::debug!(kind = ?event.kind, data = ?event.data, "Session event");
        }
    });
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();
    init_tracing(args.log_json);

    let config = build_config(&args);
    let backend = Arc::new(HttpBackend::new(&config).context("Failed to create API client")?);
    let (tx, rx) = mpsc::unbounded_channel();
    spawn_event_logger(rx);
    let session = Arc::new(TryOnSession::new(config, backend).with_event_channel(tx));

    match args.command {
        CliCommand::Status => status(&session).await,
        CliCommand::Products => products(&session).await,
        CliCommand::Run {
            photo,
            product,
            name,
            catalog_id,
            out,
            share,
        } => {
            let product = match (product, catalog_id) {
                (Some(path), _) => ProductSource::Upload {
                    path,
                    name: name.unwrap_or_default(),
                },
                (None, Some(id)) => ProductSource::Catalog(RemoteId(id)),
                (None, None) => bail!("Either --product or --catalog-id is required"),
            };
            run(session, photo, product, out, share).await
        }
    }
}

async fn status(session: &TryOnSession) -> Result<ExitCode> {
    let summary = session.bootstrap().await;
    println!("API:       {}", summary.health.api_status);
    println!("Image API: {}", summary.health.dependency_status);
    println!("Products:  {}", summary.catalog_size);
    println!(
        "User:      {}",
        session
            .identity()
            .map(|i| i.id.to_string())
            .unwrap_or_else(|| IDENTITY_FAILURE_MESSAGE.to_string())
    );

    Ok(if summary.health.is_healthy() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn products(session: &TryOnSession) -> Result<ExitCode> {
    session.bootstrap().await;
    let static_base = session.config().static_base().to_string();
    let catalog = session.catalog();
    if catalog.is_empty() {
        println!("No products yet");
    }
    for entry in catalog {
        println!(
            "{:>5}  {:<30}  {}",
            entry.id,
            entry.name,
            entry.image_ref.resolve(&static_base)
        );
    }
    Ok(ExitCode::SUCCESS)
}

enum ProductSource {
    Upload { path: PathBuf, name: String },
    Catalog(RemoteId),
}

async fn load(path: &Path) -> Result<LocalFile> {
    LocalFile::from_path(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

async fn run(
    session: Arc<TryOnSession>,
    photo: PathBuf,
    product: ProductSource,
    out: Option<PathBuf>,
    share: bool,
) -> Result<ExitCode> {
    let summary = session.bootstrap().await;
    if !summary.health.is_healthy() {
        tracing::warn!(status = %summary.health.api_status, "API reports unhealthy");
    }
    if !summary.identity_ready {
        bail!(IDENTITY_FAILURE_MESSAGE);
    }

    session.select_asset(AssetKind::Subject, load(&photo).await?)?;
    let subject_id = session
        .commit_asset(AssetKind::Subject)
        .await
        .context(AssetKind::Subject.upload_failure_message())?;
    println!("{} uploaded ({})", AssetKind::Subject.display_name(), subject_id);

    match product {
        ProductSource::Upload { path, name } => {
            session.select_asset(AssetKind::Product, load(&path).await?)?;
            session.set_product_name(name);
            let product_id = session
                .commit_asset(AssetKind::Product)
                .await
                .context(AssetKind::Product.upload_failure_message())?;
            println!("{} uploaded ({})", AssetKind::Product.display_name(), product_id);
        }
        ProductSource::Catalog(id) => {
            session.pick_catalog_entry(id)?;
            println!("{} picked from catalog ({})", AssetKind::Product.display_name(), id);
        }
    }

    println!("Generating try-on...");
    match session.generate().await {
        GenerateOutcome::Completed(_) => {}
        GenerateOutcome::Failed(message) => {
            eprintln!("Error: {}", message);
            return Ok(ExitCode::FAILURE);
        }
        GenerateOutcome::Rejected(reason) => bail!("Generation not started: {:?}", reason),
        GenerateOutcome::Superseded => bail!("Generation was superseded"),
    }

    let clipboard = Osc52Clipboard::detect().map(|c| Arc::new(c) as Arc<dyn Clipboard>);
    let presenter = ResultPresenter::new(session, ShareStrategy::probe(None, clipboard));
    let view = presenter
        .view()
        .context("Generation completed without a result")?;
    match &view.product_name {
        Some(name) => println!("Try-on ready ({}): {}", name, view.image_url),
        None => println!("Try-on ready: {}", view.image_url),
    }

    if let Some(dir) = out {
        let path = presenter.download(&dir).await?;
        println!("Saved {}", path.display());
    }

    if share {
        if presenter.share_strategy().is_available() {
            match presenter.share().await? {
                ShareOutcome::Shared => println!("Shared"),
                ShareOutcome::Copied(note) => println!("{}", note.message),
            }
        } else {
            println!("{}", view.image_url);
        }
    }

    Ok(ExitCode::SUCCESS)
}
