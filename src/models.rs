//! Data models for the annotation workbench.
//!
//! This module contains the core data structures shared by the loader,
//! normalizer, widget surface, summary and export code, along with the
//! serializable view models handed to the page.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::jsonld::truthy_str;

// ============================================================================
// Dataset Types
// ============================================================================

/// One normalized textual record derived from a JSON-LD node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Position of the node in the original graph (not the filtered position)
    pub index: usize,
    pub id: String,
    pub date: String,
    pub source: String,
    pub description: String,
    pub raw: Value,
}

/// The currently loaded dataset. Replaced wholesale on every load.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub label: String,
    pub entries: Vec<Entry>,
}

/// A selectable dataset, either configured or discovered under the data root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetDescriptor {
    pub id: String,
    pub label: String,
    /// An http(s) URL, or a path relative to the data root
    pub path: String,
}

// ============================================================================
// Annotations
// ============================================================================

/// A W3C-style web annotation, owned by the widget that created it.
///
/// The workbench never reshapes an annotation; it only reads tags and quotes
/// out of it and copies it verbatim into exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Annotation(pub Value);

impl Annotation {
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    /// Tag labels from bodies whose purpose is `tagging`.
    ///
    /// Each body contributes its `value`, `label` or `id` (first non-empty).
    pub fn tags(&self) -> Vec<String> {
        let bodies = self
            .0
            .get("body")
            .filter(|b| !b.is_null())
            .or_else(|| self.0.get("bodies"));

        let Some(bodies) = bodies.and_then(Value::as_array) else {
            return Vec::new();
        };

        bodies
            .iter()
            .filter(|body| body.get("purpose").and_then(Value::as_str) == Some("tagging"))
            .filter_map(|body| {
                ["value", "label", "id"]
                    .iter()
                    .find_map(|key| body.get(*key).and_then(truthy_str))
            })
            .map(str::to_string)
            .collect()
    }

    /// The quoted text span: `quote`, else the first `TextQuoteSelector`'s
    /// `exact`, else an empty string.
    pub fn quote(&self) -> String {
        if let Some(quote) = self.0.get("quote").and_then(truthy_str) {
            return quote.to_string();
        }

        let selector = self.0.get("target").and_then(|t| t.get("selector"));
        let exact = match selector {
            Some(Value::Array(items)) => items
                .iter()
                .find(|item| item.get("type").and_then(Value::as_str) == Some("TextQuoteSelector"))
                .and_then(|item| item.get("exact"))
                .and_then(truthy_str),
            Some(selector) => selector.get("exact").and_then(truthy_str),
            None => None,
        };

        exact.unwrap_or_default().to_string()
    }

    /// Character range from the first `TextPositionSelector`, if any.
    pub fn position(&self) -> Option<(usize, usize)> {
        let selector = self.0.get("target")?.get("selector")?;
        let position = match selector {
            Value::Array(items) => items
                .iter()
                .find(|item| item.get("type").and_then(Value::as_str) == Some("TextPositionSelector"))?,
            single => single,
        };
        let start = position.get("start")?.as_u64()? as usize;
        let end = position.get("end")?.as_u64()? as usize;
        (start < end).then_some((start, end))
    }
}

/// Identifies one widget binding within one render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BindingId {
    /// Render generation; bumped every time the surface is rebuilt
    pub generation: u64,
    /// Zero-based position of the bound entry among the rendered entries
    pub position: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationEvent {
    Created,
    Updated,
    Deleted,
}

/// An annotation change reported by a widget instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetEvent {
    pub binding: BindingId,
    pub event: AnnotationEvent,
}

/// User interaction forwarded to a widget instance.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationEdit {
    /// Highlight the character range `start..end` of the panel text
    Create {
        start: usize,
        end: usize,
        tags: Vec<String>,
        comment: Option<String>,
    },
    /// Replace the tag and comment bodies of an existing annotation
    Update {
        id: String,
        tags: Vec<String>,
        comment: Option<String>,
    },
    Delete {
        id: String,
    },
}

// ============================================================================
// Export
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportEntry {
    pub index: usize,
    pub id: Option<String>,
    pub date: Option<String>,
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub entry: ExportEntry,
    pub annotation: Annotation,
}

// ============================================================================
// View Models
// ============================================================================

/// Inline message shown in the entries panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

/// A rendered entry panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryPanel {
    /// One-based position among the rendered entries
    pub position: usize,
    pub entry_id: String,
    pub text_id: String,
    pub date_label: String,
    pub source_label: String,
    pub number_label: String,
    pub description: String,
    /// Lowercased `date source description`, used by the filter
    #[serde(skip)]
    pub search: String,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryCard {
    pub title: String,
    pub count: usize,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationRow {
    pub tags: String,
    pub quote: String,
    pub meta: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationDetails {
    pub title: String,
    pub open: bool,
    pub rows: Vec<AnnotationRow>,
    pub remainder: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SummaryView {
    Placeholder {
        message: String,
    },
    Counts {
        cards: Vec<SummaryCard>,
        details: AnnotationDetails,
    },
}

/// Everything the page needs to redraw itself.
#[derive(Debug, Clone, Serialize)]
pub struct WorkbenchSnapshot {
    pub dataset_label: String,
    pub status_label: String,
    pub message: Option<StatusMessage>,
    pub query: String,
    pub panels: Vec<EntryPanel>,
    pub summary: SummaryView,
    pub export_enabled: bool,
}
