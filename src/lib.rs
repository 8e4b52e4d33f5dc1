//! Annotation workbench library - re-exports for testing and external use.
//!
//! This module provides public access to all the application's modules
//! for testing purposes and potential library use.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::services::ServeDir;

pub mod annotator;
pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod handlers;
pub mod jsonld;
pub mod loader;
pub mod memory;
pub mod models;
pub mod summary;
pub mod surface;
pub mod templates;
pub mod workbench;

use crate::annotator::AnnotatorFactory;
use crate::config::Config;
use crate::models::DatasetDescriptor;

// ============================================================================
// Configuration
// ============================================================================

pub const DATA_DIR: &str = "data";
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const MODULE_NAME: &str = "annotate";
/// Largest accepted dataset upload
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

// ============================================================================
// Application State
// ============================================================================

pub struct AppState {
    pub data_root: PathBuf,
    /// Configured datasets followed by any discovered under `data_root`
    pub datasets: Vec<DatasetDescriptor>,
    pub client: reqwest::Client,
    workbench: Mutex<Workbench>,
}

impl AppState {
    pub fn new(config: &Config, factory: Option<Arc<dyn AnnotatorFactory>>) -> Self {
        let mut datasets = config.datasets.clone();
        if config.discover {
            let discovered = loader::discover_datasets(&config.data_root, &datasets);
            tracing::info!(count = discovered.len(), root = %config.data_root.display(), "discovered local datasets");
            datasets.extend(discovered);
        }

        Self {
            data_root: config.data_root.clone(),
            datasets,
            client: reqwest::Client::new(),
            workbench: Mutex::new(Workbench::new(factory)),
        }
    }

    /// Lock the workbench. Never hold the guard across an `.await`.
    pub fn workbench(&self) -> MutexGuard<'_, Workbench> {
        self.workbench.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn dataset(&self, id: &str) -> Option<&DatasetDescriptor> {
        self.datasets.iter().find(|d| d.id == id)
    }
}

/// Build the application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let data_dir = ServeDir::new(&state.data_root);

    Router::new()
        // Page
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        // Datasets
        .route("/api/datasets", get(handlers::list_datasets))
        .route("/api/datasets/{id}/load", post(handlers::load_dataset))
        .route("/api/upload", post(handlers::upload_dataset))
        // Workbench state
        .route("/api/state", get(handlers::workbench_state))
        .route("/api/search", get(handlers::search))
        .route("/api/reset", post(handlers::reset))
        .route("/api/export", get(handlers::export))
        // Annotations
        .route(
            "/api/entries/{position}/annotations",
            get(handlers::list_annotations).post(handlers::create_annotation),
        )
        .route(
            "/api/entries/{position}/annotations/{id}",
            put(handlers::update_annotation).delete(handlers::delete_annotation),
        )
        .nest_service("/data", data_dir)
        .layer(axum::extract::DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

// Re-export commonly used types
pub use error::{Result, WorkbenchError};
pub use models::{
    Annotation, AnnotationEdit, AnnotationEvent, BindingId, Dataset, Entry, EntryPanel,
    ExportRecord, StatusMessage, SummaryView, WidgetEvent, WorkbenchSnapshot,
};

pub use annotator::{Annotator, EventSink, WidgetConfig, WidgetKind, TAG_VOCABULARY};
pub use export::{export_filename, prepare_export, slugify, ExportFile};
pub use jsonld::{parse_jsonld, probe_first};
pub use memory::{MemoryAnnotator, MemoryAnnotatorFactory};
pub use summary::{build_summary, collect_annotations, tally, AggregatedAnnotation, TagTotals};
pub use surface::{SurfaceManager, WidgetBinding};
pub use workbench::{LoadKind, LoadOutcome, LoadTicket, Workbench};
