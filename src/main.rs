//! Annotation workbench - tag people, places and events in JSON-LD text records.
//!
//! This is the main entry point for the workbench web server.
//! The application is organized into the following modules:
//!
//! - `loader` / `jsonld`: Dataset fetching and JSON-LD normalization
//! - `annotator` / `memory`: The annotation widget capability and its in-process implementation
//! - `surface`: One widget binding per rendered entry
//! - `summary` / `export`: Live tag counts and JSON export
//! - `workbench`: The controller owning all UI state
//! - `templates` / `handlers`: HTML rendering and HTTP routes

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn};

use annotate::annotator::AnnotatorFactory;
use annotate::config::Config;
use annotate::handlers::load_descriptor;
use annotate::workbench::NO_DATASETS;
use annotate::{build_router, AppState, MemoryAnnotatorFactory};

#[derive(Parser, Debug)]
#[command(name = "annotate", version, about = "Annotation workbench for JSON-LD text datasets")]
struct Args {
    /// TOML config file listing datasets
    #[arg(long, env = "ANNOTATE_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, env = "ANNOTATE_BIND")]
    bind: Option<String>,

    /// Directory holding dataset files
    #[arg(long, env = "ANNOTATE_DATA_ROOT")]
    data_root: Option<PathBuf>,
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting annotation workbench v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())
        .map_err(|e| {
            error!("{}", e);
            e
        })?
        .with_overrides(args.bind, args.data_root);

    let factory: Arc<dyn AnnotatorFactory> = Arc::new(MemoryAnnotatorFactory);
    let state = Arc::new(AppState::new(&config, Some(factory)));

    // Open the first dataset so the page is never empty on first visit
    match state.datasets.first().cloned() {
        Some(first) => {
            let outcome = load_descriptor(&state, &first).await;
            info!(dataset = %first.id, ?outcome, "initial dataset");
        }
        None => {
            warn!("no datasets configured or discovered");
            state.workbench().show_message(NO_DATASETS, false, true, true);
        }
    }

    let app = build_router(state.clone());

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    info!("Workbench running at http://{}", config.bind);
    info!("Data directory: {}", config.data_root.display());

    axum::serve(listener, app).await?;

    Ok(())
}
