//! Annotation export.
//!
//! Serializes every aggregated annotation, together with the metadata of the
//! entry it was made on, into a pretty-printed JSON download.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::error::Result;
use crate::models::{ExportEntry, ExportRecord};
use crate::summary::AggregatedAnnotation;

const DEFAULT_BASENAME: &str = "annotations";

/// A ready-to-download export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub filename: String,
    pub body: String,
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

pub fn export_records(annotations: &[AggregatedAnnotation]) -> Vec<ExportRecord> {
    annotations
        .iter()
        .map(|item| ExportRecord {
            entry: ExportEntry {
                index: item.entry.index,
                id: non_empty(&item.entry.id),
                date: non_empty(&item.entry.date),
                source: non_empty(&item.entry.source),
            },
            annotation: item.annotation.clone(),
        })
        .collect()
}

/// Lowercase, collapse every run of non-alphanumerics to one hyphen, and trim
/// hyphens from both ends.
pub fn slugify(text: &str) -> String {
    static NON_ALNUM: OnceLock<Regex> = OnceLock::new();
    let re = NON_ALNUM.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("valid slug regex"));

    re.replace_all(&text.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

/// ISO-8601 timestamp with millisecond precision, safe for filenames.
pub fn filename_timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
        .replace([':', '.'], "-")
}

pub fn export_filename(dataset_label: &str, now: DateTime<Utc>) -> String {
    let label = if dataset_label.is_empty() { DEFAULT_BASENAME } else { dataset_label };
    let slug = slugify(label);
    let base = if slug.is_empty() { DEFAULT_BASENAME } else { slug.as_str() };
    format!("{}-{}.json", base, filename_timestamp(now))
}

/// Build the export, or `None` when there is nothing to export.
pub fn prepare_export(
    dataset_label: &str,
    annotations: &[AggregatedAnnotation],
    now: DateTime<Utc>,
) -> Result<Option<ExportFile>> {
    if annotations.is_empty() {
        return Ok(None);
    }

    let body = serde_json::to_string_pretty(&export_records(annotations))?;
    Ok(Some(ExportFile {
        filename: export_filename(dataset_label, now),
        body,
    }))
}
