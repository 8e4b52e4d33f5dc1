//! Live annotation summary.
//!
//! The summary is always recomputed from scratch by pulling the full
//! annotation set out of every live binding.

use std::sync::Arc;

use crate::models::{
    Annotation, AnnotationDetails, AnnotationRow, Entry, SummaryCard, SummaryView,
};
use crate::surface::WidgetBinding;

pub const MAX_ANNOTATION_LIST: usize = 300;
pub const MAX_QUOTE_LENGTH: usize = 220;
/// Detail lists at or below this size start expanded.
pub const OPEN_DETAILS_THRESHOLD: usize = 10;

pub const EMPTY_SUMMARY_MESSAGE: &str =
    "No annotations yet. Tag people, places, and events to see live counts.";
pub const DEFAULT_PLACEHOLDER: &str = "No annotations yet.";
pub const WIDGET_REQUIRED_MESSAGE: &str =
    "The annotation widget is required for annotation. Please check the server configuration and reload the page.";

/// An annotation together with the entry it was made on.
#[derive(Debug, Clone)]
pub struct AggregatedAnnotation {
    pub entry: Arc<Entry>,
    pub annotation: Annotation,
}

/// Query every binding for its current annotations.
pub fn collect_annotations(bindings: &[WidgetBinding]) -> Vec<AggregatedAnnotation> {
    bindings
        .iter()
        .flat_map(|binding| {
            binding
                .instance
                .annotations()
                .into_iter()
                .map(move |annotation| AggregatedAnnotation {
                    entry: Arc::clone(&binding.entry),
                    annotation,
                })
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagTotals {
    pub total: usize,
    pub person: usize,
    pub place: usize,
    pub event: usize,
    pub untagged: usize,
    /// Custom tags keyed by lowercase name, in first-seen order
    pub other: Vec<(String, usize)>,
}

impl TagTotals {
    fn bump_other(&mut self, key: String) {
        match self.other.iter_mut().find(|(k, _)| *k == key) {
            Some((_, count)) => *count += 1,
            None => self.other.push((key, 1)),
        }
    }
}

pub fn tally(annotations: &[AggregatedAnnotation]) -> TagTotals {
    let mut totals = TagTotals {
        total: annotations.len(),
        ..TagTotals::default()
    };

    for item in annotations {
        let tags = item.annotation.tags();
        if tags.is_empty() {
            totals.untagged += 1;
        }
        for tag in tags {
            let key = tag.to_lowercase();
            match key.as_str() {
                "person" => totals.person += 1,
                "place" => totals.place += 1,
                "event" => totals.event += 1,
                _ => totals.bump_other(key),
            }
        }
    }

    totals
}

/// Truncate to `max_length` characters, ending in an ellipsis when cut.
pub fn truncate_text(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_length.saturating_sub(1)).collect();
    format!("{}…", kept)
}

pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn card(title: &str, count: usize, description: &str) -> SummaryCard {
    SummaryCard {
        title: title.to_string(),
        count,
        description: description.to_string(),
    }
}

fn annotation_row(item: &AggregatedAnnotation) -> AnnotationRow {
    let tags = item.annotation.tags();
    let quote = item.annotation.quote();
    let quote = if quote.is_empty() { "(no quote selected)".to_string() } else { quote };
    let date = if item.entry.date.is_empty() { "Undated" } else { item.entry.date.as_str() };

    AnnotationRow {
        tags: if tags.is_empty() { "Untagged".to_string() } else { tags.join(", ") },
        quote: truncate_text(&quote, MAX_QUOTE_LENGTH),
        meta: format!("{} • Entry {}", date, item.entry.index + 1),
    }
}

pub fn annotation_details(annotations: &[AggregatedAnnotation]) -> AnnotationDetails {
    let rows: Vec<AnnotationRow> = annotations
        .iter()
        .take(MAX_ANNOTATION_LIST)
        .map(annotation_row)
        .collect();

    let remainder = (annotations.len() > rows.len())
        .then(|| format!("…and {} more annotations.", annotations.len() - rows.len()));

    AnnotationDetails {
        title: format!("Annotations ({})", annotations.len()),
        open: annotations.len() <= OPEN_DETAILS_THRESHOLD,
        rows,
        remainder,
    }
}

/// Build the summary panel for the aggregated annotations.
pub fn build_summary(annotations: &[AggregatedAnnotation]) -> SummaryView {
    if annotations.is_empty() {
        return SummaryView::Placeholder {
            message: EMPTY_SUMMARY_MESSAGE.to_string(),
        };
    }

    let totals = tally(annotations);

    let mut cards = vec![
        card("Total", totals.total, "All annotations in view"),
        card("People", totals.person, "Annotations tagged as Person"),
        card("Places", totals.place, "Annotations tagged as Place"),
        card("Events", totals.event, "Annotations tagged as Event"),
    ];
    if totals.untagged > 0 {
        cards.push(card("Untagged", totals.untagged, "Annotations without tags"));
    }
    for (key, count) in &totals.other {
        cards.push(card(&capitalize(key), *count, "Custom tag"));
    }

    SummaryView::Counts {
        cards,
        details: annotation_details(annotations),
    }
}
