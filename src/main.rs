use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

use kubeshelf::ErrorCode;
use kubeshelf::catalog::{CatalogError, HttpShelfCatalog, ShelfCatalog, ShelfRecord};
use kubeshelf::config::{ConfigError, KubeConfig};
use kubeshelf::kube::reconcile;
use kubeshelf::kube::{FetchError, HttpLocationSource, LocationCache, LocationError, LocationGeometry, LocationId};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Source(#[from] FetchError),
    #[error(transparent)]
    Location(#[from] LocationError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("floor plan is not available ({state})")]
    Unavailable { state: String },
    #[error("unknown location: {0}")]
    UnknownLocation(String),
    #[error("could not read {path}: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

impl ErrorCode for CliError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Source(e) => e.error_code(),
            Self::Location(e) => e.error_code(),
            Self::Catalog(e) => e.error_code(),
            Self::Unavailable { .. } => "E_UNAVAILABLE",
            Self::UnknownLocation(_) => "E_UNKNOWN_LOCATION",
            Self::ReadFile { .. } => "E_READ_FILE",
            Self::Json(_) => "E_JSON",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "kubeshelf", about = "Library floor-plan locations and shelf assignments")]
struct Cli {
    /// Overrides `KUBESHELF_BASE_URL`.
    #[arg(long)]
    base_url: Option<String>,

    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the cache state of the floor plan.
    Status,
    /// List location ids in display order.
    Ids,
    /// Show the geometry of one location.
    Show { kube: String },
    /// List every location with the shelf assigned to it.
    Occupancy,
    /// List locations with no shelf assigned.
    Free {
        /// Shelf being edited; its current location counts as free.
        #[arg(long)]
        excluding: Option<String>,
    },
    /// Upload a floor-plan SVG, creating or replacing the current one.
    Upload { file: PathBuf },
    /// Delete the floor plan.
    Delete,
}

/// Composition root: one cache per process, shared with every command.
struct App {
    cache: Arc<LocationCache>,
    catalog: HttpShelfCatalog,
    json: bool,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        tracing::debug!(code = e.error_code(), retryable = e.retryable(), "command failed");
        eprintln!("error [{}]: {e}", e.error_code());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = KubeConfig::from_env()?;
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url);
    }
    let source = HttpLocationSource::new(&config)?;
    tracing::debug!(url = source.url(), "using floor plan endpoint");
    let app = App {
        cache: Arc::new(LocationCache::new(Arc::new(source))),
        catalog: HttpShelfCatalog::new(&config)?,
        json: cli.json,
    };

    match cli.command {
        Command::Status => run_status(&app).await,
        Command::Ids => run_ids(&app).await,
        Command::Show { kube } => run_show(&app, &LocationId::from(kube)).await,
        Command::Occupancy => run_occupancy(&app).await,
        Command::Free { excluding } => run_free(&app, excluding.as_deref()).await,
        Command::Upload { file } => run_upload(&app, file).await,
        Command::Delete => run_delete(&app).await,
    }
}

async fn run_status(app: &App) -> Result<(), CliError> {
    let available = app.cache.is_available().await?;
    let state = app.cache.state();
    if app.json {
        return print_json(&json!({ "state": state, "available": available, "count": app.cache.count() }));
    }
    println!("state: {state}");
    println!("locations: {}", app.cache.count());
    Ok(())
}

/// Load once and fail with the cache state when there is nothing to show.
async fn require_locations(app: &App) -> Result<Vec<LocationId>, CliError> {
    if !app.cache.is_already_loaded() {
        app.cache.load(false).await?;
    }
    if !app.cache.is_available_sync() {
        return Err(CliError::Unavailable { state: app.cache.state().to_string() });
    }
    Ok(app.cache.list_ids())
}

async fn run_ids(app: &App) -> Result<(), CliError> {
    let ids = require_locations(app).await?;
    if app.json {
        return print_json(&serde_json::to_value(&ids)?);
    }
    for id in ids {
        println!("{id}");
    }
    Ok(())
}

async fn run_show(app: &App, id: &LocationId) -> Result<(), CliError> {
    require_locations(app).await?;
    let geometry = app
        .cache
        .get_sync(id)
        .ok_or_else(|| CliError::UnknownLocation(id.to_string()))?;
    if app.json {
        return print_json(&json!({ "id": id, "geometry": geometry }));
    }
    print_geometry(id, &geometry);
    Ok(())
}

async fn run_occupancy(app: &App) -> Result<(), CliError> {
    let ids = require_locations(app).await?;
    let shelves = app.catalog.list_shelves().await?;
    let rows = reconcile::occupancy(&ids, &shelves);
    let orphans = reconcile::orphaned_shelves(&ids, &shelves);
    if !orphans.is_empty() {
        tracing::warn!(count = orphans.len(), "shelves assigned to locations missing from the floor plan");
    }

    if app.json {
        let rows: Vec<Value> = rows
            .iter()
            .map(|(id, shelf)| json!({ "id": id, "shelf": shelf }))
            .collect();
        return print_json(&json!({ "locations": rows, "orphaned": orphans }));
    }
    for (id, shelf) in &rows {
        println!("{id}\t{}", shelf.map_or("-", ShelfRecord::label));
    }
    for shelf in orphans {
        let location = shelf.location.as_ref().map(LocationId::as_str).unwrap_or_default();
        println!("! {} -> {location} (not on floor plan)", shelf.label());
    }
    Ok(())
}

async fn run_free(app: &App, excluding: Option<&str>) -> Result<(), CliError> {
    let ids = require_locations(app).await?;
    let shelves = app.catalog.list_shelves().await?;
    let free = reconcile::free_locations(&ids, &shelves, excluding);
    if app.json {
        return print_json(&serde_json::to_value(&free)?);
    }
    for id in free {
        println!("{id}");
    }
    Ok(())
}

async fn run_upload(app: &App, file: PathBuf) -> Result<(), CliError> {
    let document = tokio::fs::read_to_string(&file)
        .await
        .map_err(|source| CliError::ReadFile { path: file.clone(), source })?;

    // The write verb depends on whether a plan already exists. A stored plan
    // that does not parse stays `unknown`, which overwrites it.
    if !app.cache.state().is_resolved() {
        match app.cache.load(false).await {
            Ok(_) => {}
            Err(LocationError::Malformed(detail)) => {
                tracing::warn!(error = %detail, "stored floor plan is malformed; replacing it");
            }
            Err(e) => return Err(e.into()),
        }
    }
    let loaded = app.cache.upload(&document).await?;
    let count = loaded.as_ref().map_or(0, |map| map.len());
    if app.json {
        return print_json(&json!({ "state": app.cache.state(), "count": count }));
    }
    println!("uploaded {}: {count} locations ({})", file.display(), app.cache.state());
    Ok(())
}

async fn run_delete(app: &App) -> Result<(), CliError> {
    app.cache.delete().await?;
    if app.json {
        return print_json(&json!({ "state": app.cache.state() }));
    }
    println!("floor plan deleted");
    Ok(())
}

fn print_geometry(id: &LocationId, geometry: &LocationGeometry) {
    let LocationGeometry { outer, inner, inner_style_class } = geometry;
    println!("{id}");
    println!("  outer: x={} y={} w={} h={}", outer.x, outer.y, outer.width, outer.height);
    println!("  inner: x={} y={} w={} h={}", inner.x, inner.y, inner.width, inner.height);
    if !inner_style_class.is_empty() {
        println!("  class: {inner_style_class}");
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
