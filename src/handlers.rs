//! HTTP route handlers for the web application.
//!
//! Every mutating handler answers with the updated workbench state together
//! with freshly rendered entries and summary fragments.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::WorkbenchError;
use crate::loader::{load_local, load_remote};
use crate::models::{AnnotationEdit, DatasetDescriptor};
use crate::templates::{render_entries, render_summary, render_workbench};
use crate::workbench::{LoadKind, LoadOutcome, Workbench};
use crate::{AppState, MODULE_NAME};

// ============================================================================
// Responses
// ============================================================================

impl IntoResponse for WorkbenchError {
    fn into_response(self) -> Response {
        let status = match &self {
            WorkbenchError::NotFound(_) => StatusCode::NOT_FOUND,
            WorkbenchError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            WorkbenchError::Parse(_) => StatusCode::UNPROCESSABLE_ENTITY,
            WorkbenchError::Load(_) => StatusCode::BAD_GATEWAY,
            WorkbenchError::WidgetUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            WorkbenchError::Config(_) | WorkbenchError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

/// Workbench state plus the fragments the page swaps in.
fn update_payload(workbench: &Workbench) -> serde_json::Value {
    let state = workbench.snapshot();
    serde_json::json!({
        "entries_html": render_entries(
            state.message.as_ref(),
            &state.panels,
            &workbench.annotations_by_panel()
        ),
        "summary_html": render_summary(&state.summary),
        "state": state,
    })
}

// ============================================================================
// Page
// ============================================================================

pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let workbench = state.workbench();
    let selected = state
        .datasets
        .iter()
        .find(|d| d.label == workbench.dataset_label())
        .map(|d| d.id.as_str());
    Html(render_workbench(&state.datasets, selected, &workbench))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: MODULE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Dataset Loading
// ============================================================================

pub async fn list_datasets(State(state): State<Arc<AppState>>) -> Json<Vec<DatasetDescriptor>> {
    Json(state.datasets.clone())
}

/// Load a named dataset into the workbench.
///
/// The lock is released while the dataset is fetched; a newer load started
/// in the meantime wins.
pub async fn load_descriptor(state: &AppState, descriptor: &DatasetDescriptor) -> LoadOutcome {
    let ticket = state.workbench().begin_load(&descriptor.label, LoadKind::Dataset);
    let result = load_remote(&state.client, &state.data_root, descriptor).await;
    state.workbench().finish_load(&ticket, result)
}

pub async fn load_dataset(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let Some(descriptor) = state.dataset(&id).cloned() else {
        return WorkbenchError::NotFound(format!("dataset {}", id)).into_response();
    };

    let outcome = load_descriptor(&state, &descriptor).await;
    let payload = update_payload(&state.workbench());
    let status = match outcome {
        LoadOutcome::Loaded(_) => StatusCode::OK,
        LoadOutcome::Stale => StatusCode::CONFLICT,
        LoadOutcome::Empty | LoadOutcome::Failed => StatusCode::UNPROCESSABLE_ENTITY,
    };
    (status, Json(payload)).into_response()
}

pub async fn upload_dataset(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Response {
    let mut upload: Option<(String, Vec<u8>)> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "malformed multipart upload");
                return WorkbenchError::InvalidInput(format!("Malformed upload: {}", e))
                    .into_response();
            }
        };
        if field.name() == Some("file") {
            let file_name = field.file_name().unwrap_or("").to_string();
            match field.bytes().await {
                Ok(bytes) => upload = Some((file_name, bytes.to_vec())),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read upload");
                    return WorkbenchError::InvalidInput(format!("Failed to read file: {}", e))
                        .into_response();
                }
            }
            break;
        }
    }

    let Some((file_name, bytes)) = upload else {
        return WorkbenchError::InvalidInput("No file provided".to_string()).into_response();
    };

    let mut workbench = state.workbench();
    let ticket = workbench.begin_load(&file_name, LoadKind::File);
    let outcome = workbench.finish_load(&ticket, load_local(&file_name, &bytes));

    let status = match outcome {
        LoadOutcome::Loaded(_) => StatusCode::OK,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    };
    (status, Json(update_payload(&workbench))).into_response()
}

// ============================================================================
// Workbench State
// ============================================================================

pub async fn workbench_state(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(update_payload(&state.workbench()))
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub visible: usize,
    /// One-based positions of hidden panels
    pub hidden: Vec<usize>,
}

pub async fn search(
    Query(query): Query<SearchQuery>,
    State(state): State<Arc<AppState>>,
) -> Json<SearchResponse> {
    let mut workbench = state.workbench();
    let visible = workbench.filter(&query.q.unwrap_or_default());
    let hidden = workbench
        .panels()
        .iter()
        .filter(|p| p.hidden)
        .map(|p| p.position)
        .collect();
    Json(SearchResponse { visible, hidden })
}

pub async fn reset(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let mut workbench = state.workbench();
    workbench.reset();
    Json(update_payload(&workbench))
}

pub async fn export(State(state): State<Arc<AppState>>) -> Response {
    let file = match state.workbench().export(Utc::now()) {
        Ok(Some(file)) => file,
        Ok(None) => return StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize export");
            return e.into_response();
        }
    };

    tracing::info!(filename = %file.filename, "exporting annotations");
    (
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.filename),
            ),
        ],
        file.body,
    )
        .into_response()
}

// ============================================================================
// Annotations
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateAnnotationRequest {
    pub start: usize,
    pub end: usize,
    #[serde(default)]
    pub tags: Vec<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAnnotationRequest {
    #[serde(default)]
    pub tags: Vec<String>,
    pub comment: Option<String>,
}

fn apply_edit(state: &AppState, position: usize, edit: AnnotationEdit) -> Response {
    let mut workbench = state.workbench();
    match workbench.apply_edit(position, edit) {
        Ok(annotation) => {
            let mut payload = update_payload(&workbench);
            payload["annotation"] = annotation.0;
            Json(payload).into_response()
        }
        Err(e) => {
            tracing::warn!(position, error = %e, "annotation edit rejected");
            e.into_response()
        }
    }
}

pub async fn list_annotations(
    Path(position): Path<usize>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let annotations = state.workbench().annotations_by_panel();
    match position.checked_sub(1).and_then(|i| annotations.into_iter().nth(i)) {
        Some(list) => Json(list).into_response(),
        None => WorkbenchError::NotFound(format!("entry {}", position)).into_response(),
    }
}

pub async fn create_annotation(
    Path(position): Path<usize>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateAnnotationRequest>,
) -> Response {
    apply_edit(
        &state,
        position,
        AnnotationEdit::Create {
            start: body.start,
            end: body.end,
            tags: body.tags,
            comment: body.comment,
        },
    )
}

pub async fn update_annotation(
    Path((position, id)): Path<(usize, String)>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<UpdateAnnotationRequest>,
) -> Response {
    apply_edit(
        &state,
        position,
        AnnotationEdit::Update {
            id,
            tags: body.tags,
            comment: body.comment,
        },
    )
}

pub async fn delete_annotation(
    Path((position, id)): Path<(usize, String)>,
    State(state): State<Arc<AppState>>,
) -> Response {
    apply_edit(&state, position, AnnotationEdit::Delete { id })
}
