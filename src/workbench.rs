//! The workbench controller.
//!
//! `Workbench` owns every piece of mutable UI state: the loaded dataset, the
//! rendered panels and their widget bindings, the status label and inline
//! message, the filter query and the summary. Handlers drive it one
//! operation at a time under a lock.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::annotator::AnnotatorFactory;
use crate::error::{Result, WorkbenchError};
use crate::export::{prepare_export, ExportFile};
use crate::filter::{apply_filter, normalize_query};
use crate::jsonld::parse_jsonld;
use crate::models::{
    Annotation, AnnotationEdit, Dataset, Entry, EntryPanel, StatusMessage, SummaryView,
    WidgetEvent, WorkbenchSnapshot,
};
use crate::summary::{
    build_summary, collect_annotations, DEFAULT_PLACEHOLDER, EMPTY_SUMMARY_MESSAGE,
    WIDGET_REQUIRED_MESSAGE,
};
use crate::surface::SurfaceManager;

// ============================================================================
// User-facing messages
// ============================================================================

pub const LOADING_DATASET: &str = "Loading dataset…";
pub const READING_FILE: &str = "Reading local file…";
pub const DATASET_LOAD_FAILED: &str =
    "Unable to load the dataset. Ensure the dataset path is reachable from the server.";
pub const FILE_NOT_JSONLD: &str = "The selected file is not valid JSON-LD.";
pub const FILE_UNREADABLE: &str = "The selected file could not be read.";
pub const NO_TEXTUAL_ENTRIES: &str = "The selected dataset does not contain any textual entries.";
pub const WIDGET_UNAVAILABLE: &str =
    "The annotation widget could not be loaded. Please check the server configuration.";
pub const RENDER_FAILED: &str = "The entries could not be prepared for annotation.";
pub const NO_DATASETS: &str =
    "No datasets have been configured yet. Use the file picker to load a JSON-LD file.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    /// A named dataset from the selector
    Dataset,
    /// A file uploaded through the picker
    File,
}

/// Proof that a load was started. Only the most recent ticket may commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    kind: LoadKind,
    label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(usize),
    /// Valid document without any textual entries
    Empty,
    Failed,
    /// A newer load started before this one finished; result discarded
    Stale,
}

pub struct Workbench {
    dataset: Dataset,
    status_label: String,
    message: Option<StatusMessage>,
    query: String,
    panels: Vec<EntryPanel>,
    summary: SummaryView,
    export_enabled: bool,
    surface: SurfaceManager,
    events_rx: mpsc::UnboundedReceiver<WidgetEvent>,
    load_generation: u64,
}

impl Workbench {
    pub fn new(factory: Option<Arc<dyn AnnotatorFactory>>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            dataset: Dataset::default(),
            status_label: String::new(),
            message: None,
            query: String::new(),
            panels: Vec::new(),
            summary: SummaryView::Placeholder {
                message: DEFAULT_PLACEHOLDER.to_string(),
            },
            export_enabled: false,
            surface: SurfaceManager::new(factory, events_tx),
            events_rx,
            load_generation: 0,
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn entries(&self) -> &[Entry] {
        &self.dataset.entries
    }

    pub fn dataset_label(&self) -> &str {
        &self.dataset.label
    }

    pub fn status_label(&self) -> &str {
        &self.status_label
    }

    pub fn message(&self) -> Option<&StatusMessage> {
        self.message.as_ref()
    }

    pub fn panels(&self) -> &[EntryPanel] {
        &self.panels
    }

    pub fn summary(&self) -> &SummaryView {
        &self.summary
    }

    pub fn export_enabled(&self) -> bool {
        self.export_enabled
    }

    pub fn binding_count(&self) -> usize {
        self.surface.bindings().len()
    }

    /// Current annotations of each rendered panel, in panel order.
    pub fn annotations_by_panel(&self) -> Vec<Vec<Annotation>> {
        self.surface
            .bindings()
            .iter()
            .map(|binding| binding.instance.annotations())
            .collect()
    }

    pub fn snapshot(&self) -> WorkbenchSnapshot {
        WorkbenchSnapshot {
            dataset_label: self.dataset.label.clone(),
            status_label: self.status_label.clone(),
            message: self.message.clone(),
            query: self.query.clone(),
            panels: self.panels.clone(),
            summary: self.summary.clone(),
            export_enabled: self.export_enabled,
        }
    }

    // ------------------------------------------------------------------------
    // Entries panel
    // ------------------------------------------------------------------------

    /// Replace the entries panel with a message, tearing down all bindings.
    pub fn show_message(&mut self, text: &str, is_error: bool, reset_state: bool, clear_label: bool) {
        self.surface.destroy_all();
        self.panels.clear();

        if reset_state {
            self.dataset.entries.clear();
        }
        if clear_label {
            self.dataset.label.clear();
            self.status_label.clear();
        }

        self.message = Some(StatusMessage {
            text: text.to_string(),
            is_error,
        });
    }

    pub fn clear_summary(&mut self, message: Option<&str>) {
        self.summary = SummaryView::Placeholder {
            message: message.unwrap_or(DEFAULT_PLACEHOLDER).to_string(),
        };
    }

    fn disable_export(&mut self) {
        self.export_enabled = false;
    }

    // ------------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------------

    /// Start a load: reset the panels, mark the label as loading and hand out
    /// a ticket that supersedes every earlier one.
    pub fn begin_load(&mut self, label: &str, kind: LoadKind) -> LoadTicket {
        self.load_generation += 1;
        self.dataset.label = label.to_string();

        let placeholder = match kind {
            LoadKind::Dataset => LOADING_DATASET,
            LoadKind::File => READING_FILE,
        };
        self.status_label = if label.is_empty() {
            placeholder.to_string()
        } else {
            format!("{} — loading…", label)
        };

        self.show_message(placeholder, false, true, false);
        self.clear_summary(None);
        self.disable_export();

        tracing::debug!(generation = self.load_generation, label, ?kind, "load started");

        LoadTicket {
            generation: self.load_generation,
            kind,
            label: label.to_string(),
        }
    }

    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.generation == self.load_generation
    }

    /// Commit the result of a load started with `ticket`.
    pub fn finish_load(&mut self, ticket: &LoadTicket, result: Result<Value>) -> LoadOutcome {
        if !self.is_current(ticket) {
            tracing::info!(label = %ticket.label, "discarding result of superseded load");
            return LoadOutcome::Stale;
        }

        match result {
            Ok(payload) => {
                let entries = parse_jsonld(&payload);
                self.handle_loaded_entries(entries, &ticket.label)
            }
            Err(e) => {
                self.fail_load(ticket, &e);
                LoadOutcome::Failed
            }
        }
    }

    fn fail_load(&mut self, ticket: &LoadTicket, error: &WorkbenchError) {
        match ticket.kind {
            LoadKind::Dataset => {
                tracing::error!(label = %ticket.label, error = %error, "failed to load dataset");
                self.status_label = if ticket.label.is_empty() {
                    "Failed to load dataset".to_string()
                } else {
                    format!("{} — failed to load", ticket.label)
                };
                self.show_message(DATASET_LOAD_FAILED, true, true, false);
            }
            LoadKind::File => {
                tracing::error!(file = %ticket.label, error = %error, "failed to read local file");
                let text = match error {
                    WorkbenchError::Parse(_) => FILE_NOT_JSONLD,
                    _ => FILE_UNREADABLE,
                };
                self.show_message(text, true, false, false);
            }
        }
    }

    fn handle_loaded_entries(&mut self, entries: Vec<Entry>, label: &str) -> LoadOutcome {
        self.dataset.label = label.to_string();

        if entries.is_empty() {
            tracing::warn!(label, "dataset holds no textual entries");
            self.status_label = if label.is_empty() {
                String::new()
            } else {
                format!("{} — 0 entries", label)
            };
            self.show_message(NO_TEXTUAL_ENTRIES, true, true, false);
            self.clear_summary(None);
            return LoadOutcome::Empty;
        }

        let count = entries.len();
        self.dataset.entries = entries;
        self.status_label = if label.is_empty() {
            format!("{} entries", count)
        } else {
            format!("{} — {} entries", label, count)
        };
        self.query.clear();
        if !self.render() {
            return LoadOutcome::Failed;
        }

        tracing::info!(label, count, "dataset loaded");
        LoadOutcome::Loaded(count)
    }

    // ------------------------------------------------------------------------
    // Rendering and summary
    // ------------------------------------------------------------------------

    /// Rebuild every panel and binding for the current entries.
    ///
    /// Returns false when the entries could not be bound to widgets.
    fn render(&mut self) -> bool {
        let result = self.surface.render(&self.dataset.entries, &self.dataset.label);
        match result {
            Ok(panels) => {
                self.panels = panels;
                self.message = None;
                apply_filter(&mut self.panels, &self.query);
                self.refresh_summary();
                true
            }
            Err(WorkbenchError::WidgetUnavailable) => {
                tracing::error!("annotation widget unavailable, entries not rendered");
                self.show_message(WIDGET_UNAVAILABLE, true, false, false);
                self.clear_summary(Some(WIDGET_REQUIRED_MESSAGE));
                self.disable_export();
                false
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to render entries");
                self.show_message(RENDER_FAILED, true, false, false);
                self.clear_summary(None);
                self.disable_export();
                false
            }
        }
    }

    /// Recompute the summary from every live binding.
    pub fn refresh_summary(&mut self) {
        let annotations = collect_annotations(self.surface.bindings());
        if annotations.is_empty() {
            self.clear_summary(Some(EMPTY_SUMMARY_MESSAGE));
            self.disable_export();
            return;
        }

        self.summary = build_summary(&annotations);
        self.export_enabled = true;
    }

    /// Drain pending widget events; refresh once if any came from a live binding.
    ///
    /// Returns the number of live events handled.
    pub fn pump_events(&mut self) -> usize {
        let mut live = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            if self.surface.is_current(event.binding) {
                live += 1;
            } else {
                tracing::debug!(?event, "ignoring event from stale binding");
            }
        }

        if live > 0 {
            self.refresh_summary();
        }
        live
    }

    // ------------------------------------------------------------------------
    // User actions
    // ------------------------------------------------------------------------

    /// Forward an edit to the widget on the panel at one-based `position`.
    pub fn apply_edit(&mut self, position: usize, edit: AnnotationEdit) -> Result<Annotation> {
        let binding = self
            .surface
            .binding_mut(position)
            .ok_or_else(|| WorkbenchError::NotFound(format!("entry {}", position)))?;
        let annotation = binding.instance.apply(edit)?;
        self.pump_events();
        Ok(annotation)
    }

    /// Filter the panels; returns the number left visible.
    pub fn filter(&mut self, query: &str) -> usize {
        self.query = normalize_query(query);
        apply_filter(&mut self.panels, &self.query)
    }

    /// Discard all annotations by rebuilding the current entries.
    ///
    /// Returns false when there is nothing to reset or the entries could not
    /// be rebuilt.
    pub fn reset(&mut self) -> bool {
        if self.dataset.entries.is_empty() {
            return false;
        }
        self.query.clear();
        let rendered = self.render();
        self.disable_export();
        tracing::info!(label = %self.dataset.label, rendered, "annotations reset");
        rendered
    }

    pub fn export(&self, now: DateTime<Utc>) -> Result<Option<ExportFile>> {
        let annotations = collect_annotations(self.surface.bindings());
        prepare_export(&self.dataset.label, &annotations, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotator::{Annotator, EventSink, WidgetConfig};
    use crate::memory::{MemoryAnnotator, MemoryAnnotatorFactory};
    use crate::models::AnnotationEvent;
    use serde_json::json;
    use std::sync::Mutex;

    /// Memory widgets that also hand out every sink they are given.
    struct SinkRecordingFactory {
        sinks: Arc<Mutex<Vec<EventSink>>>,
    }

    struct SinkRecordingAnnotator {
        inner: MemoryAnnotator,
        sinks: Arc<Mutex<Vec<EventSink>>>,
    }

    impl AnnotatorFactory for SinkRecordingFactory {
        fn create(&self, config: WidgetConfig) -> Result<Box<dyn Annotator>> {
            Ok(Box::new(SinkRecordingAnnotator {
                inner: MemoryAnnotator::new(config),
                sinks: self.sinks.clone(),
            }))
        }
    }

    impl Annotator for SinkRecordingAnnotator {
        fn annotations(&self) -> Vec<Annotation> {
            self.inner.annotations()
        }

        fn subscribe(&mut self, sink: EventSink) {
            self.sinks.lock().unwrap().push(sink.clone());
            self.inner.subscribe(sink);
        }

        fn apply(&mut self, edit: AnnotationEdit) -> Result<Annotation> {
            self.inner.apply(edit)
        }

        fn destroy(&mut self) {
            self.inner.destroy();
        }
    }

    fn workbench() -> Workbench {
        let factory: Arc<dyn AnnotatorFactory> = Arc::new(MemoryAnnotatorFactory);
        Workbench::new(Some(factory))
    }

    fn graph() -> Value {
        json!({ "@graph": [
            { "@id": "ac:1", "dc:date": "1224", "dc:description": "Cathal Crobderg died at Knockmoy." },
            { "title": "no text" },
            { "@id": "ac:3", "dc:date": "1225", "dc:description": "A great war in Connacht." }
        ] })
    }

    fn loaded() -> Workbench {
        let mut wb = workbench();
        let ticket = wb.begin_load("Annals of Connacht", LoadKind::Dataset);
        assert_eq!(wb.finish_load(&ticket, Ok(graph())), LoadOutcome::Loaded(2));
        wb
    }

    fn tag(wb: &mut Workbench, position: usize, tag: &str) -> Annotation {
        wb.apply_edit(
            position,
            AnnotationEdit::Create {
                start: 0,
                end: 6,
                tags: vec![tag.to_string()],
                comment: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_begin_load_sets_loading_state() {
        let mut wb = loaded();
        tag(&mut wb, 1, "Person");
        assert!(wb.export_enabled());

        wb.begin_load("Annals of Ulster", LoadKind::Dataset);
        assert_eq!(wb.status_label(), "Annals of Ulster — loading…");
        assert_eq!(wb.message().unwrap().text, LOADING_DATASET);
        assert!(wb.entries().is_empty());
        assert_eq!(wb.binding_count(), 0);
        assert!(!wb.export_enabled());

        wb.begin_load("", LoadKind::File);
        assert_eq!(wb.status_label(), READING_FILE);
    }

    #[test]
    fn test_successful_load_renders_bindings() {
        let wb = loaded();
        assert_eq!(wb.status_label(), "Annals of Connacht — 2 entries");
        assert_eq!(wb.binding_count(), 2);
        assert_eq!(wb.panels().len(), 2);
        assert!(wb.message().is_none());
        assert!(!wb.export_enabled());
        assert_eq!(
            wb.summary(),
            &SummaryView::Placeholder { message: EMPTY_SUMMARY_MESSAGE.to_string() }
        );
    }

    #[test]
    fn test_stale_ticket_never_commits() {
        let mut wb = workbench();
        let first = wb.begin_load("First", LoadKind::Dataset);
        let second = wb.begin_load("Second", LoadKind::Dataset);

        assert_eq!(wb.finish_load(&first, Ok(graph())), LoadOutcome::Stale);
        assert!(wb.entries().is_empty());
        assert_eq!(wb.status_label(), "Second — loading…");

        assert_eq!(wb.finish_load(&second, Ok(graph())), LoadOutcome::Loaded(2));
        assert_eq!(wb.dataset_label(), "Second");
    }

    #[test]
    fn test_dataset_failure_messages() {
        let mut wb = workbench();
        let ticket = wb.begin_load("Annals", LoadKind::Dataset);
        let outcome = wb.finish_load(&ticket, Err(WorkbenchError::Load("404 Not Found".into())));
        assert_eq!(outcome, LoadOutcome::Failed);
        assert_eq!(wb.status_label(), "Annals — failed to load");
        let message = wb.message().unwrap();
        assert_eq!(message.text, DATASET_LOAD_FAILED);
        assert!(message.is_error);
    }

    #[test]
    fn test_file_failure_messages() {
        let mut wb = workbench();
        let ticket = wb.begin_load("broken.jsonld", LoadKind::File);
        wb.finish_load(&ticket, Err(WorkbenchError::Parse("eof".into())));
        assert_eq!(wb.message().unwrap().text, FILE_NOT_JSONLD);

        let ticket = wb.begin_load("binary.jsonld", LoadKind::File);
        wb.finish_load(&ticket, Err(WorkbenchError::Load("utf-8".into())));
        assert_eq!(wb.message().unwrap().text, FILE_UNREADABLE);
    }

    #[test]
    fn test_empty_dataset() {
        let mut wb = workbench();
        let ticket = wb.begin_load("Empty", LoadKind::Dataset);
        assert_eq!(wb.finish_load(&ticket, Ok(json!([{ "title": "x" }]))), LoadOutcome::Empty);
        assert_eq!(wb.status_label(), "Empty — 0 entries");
        assert_eq!(wb.message().unwrap().text, NO_TEXTUAL_ENTRIES);
        assert_eq!(wb.binding_count(), 0);
    }

    #[test]
    fn test_widget_unavailable_fails_gracefully() {
        let mut wb = Workbench::new(None);
        let ticket = wb.begin_load("Annals", LoadKind::Dataset);
        assert_eq!(wb.finish_load(&ticket, Ok(graph())), LoadOutcome::Failed);

        assert_eq!(wb.message().unwrap().text, WIDGET_UNAVAILABLE);
        assert_eq!(
            wb.summary(),
            &SummaryView::Placeholder { message: WIDGET_REQUIRED_MESSAGE.to_string() }
        );
        assert!(!wb.export_enabled());
        assert_eq!(wb.binding_count(), 0);
    }

    #[test]
    fn test_export_toggles_with_annotation_count() {
        let mut wb = loaded();
        assert!(!wb.export_enabled());

        let annotation = tag(&mut wb, 2, "Event");
        assert!(wb.export_enabled());

        wb.apply_edit(2, AnnotationEdit::Delete { id: annotation.id().unwrap().to_string() })
            .unwrap();
        assert!(!wb.export_enabled());
    }

    #[test]
    fn test_reset_rebuilds_bindings() {
        let mut wb = loaded();
        tag(&mut wb, 1, "Person");
        tag(&mut wb, 2, "Place");

        assert!(wb.reset());
        assert_eq!(wb.binding_count(), wb.entries().len());
        assert!(!wb.export_enabled());
        assert_eq!(wb.export(Utc::now()).unwrap(), None);

        assert!(!workbench().reset());
    }

    #[test]
    fn test_filter_does_not_change_counts() {
        let mut wb = loaded();
        tag(&mut wb, 1, "Person");
        tag(&mut wb, 2, "Person");

        assert_eq!(wb.filter("KNOCKMOY"), 1);
        assert!(wb.panels()[1].hidden);

        let SummaryView::Counts { cards, .. } = wb.summary().clone() else {
            panic!("expected counts");
        };
        assert_eq!(cards[0].count, 2);
        assert_eq!(cards[1].count, 2);

        let file = wb.export(Utc::now()).unwrap().unwrap();
        assert!(file.filename.starts_with("annals-of-connacht-"));
        let records: Value = serde_json::from_str(&file.body).unwrap();
        assert_eq!(records.as_array().unwrap().len(), 2);
        assert_eq!(records[1]["entry"]["index"], 2);
    }

    #[test]
    fn test_new_load_clears_filter() {
        let mut wb = loaded();
        wb.filter("war");
        let ticket = wb.begin_load("Again", LoadKind::Dataset);
        wb.finish_load(&ticket, Ok(graph()));
        assert!(wb.panels().iter().all(|p| !p.hidden));
        assert_eq!(wb.snapshot().query, "");
    }

    #[test]
    fn test_edit_unknown_position() {
        let mut wb = loaded();
        let result = wb.apply_edit(9, AnnotationEdit::Delete { id: "#x".into() });
        assert!(matches!(result, Err(WorkbenchError::NotFound(_))));
    }

    #[test]
    fn test_reset_clears_filter() {
        let mut wb = loaded();
        assert_eq!(wb.filter("knockmoy"), 1);
        assert!(wb.panels()[1].hidden);

        assert!(wb.reset());
        assert!(wb.panels().iter().all(|p| !p.hidden));
        assert_eq!(wb.snapshot().query, "");
    }

    #[test]
    fn test_reset_without_widget_reports_failure() {
        let mut wb = Workbench::new(None);
        let ticket = wb.begin_load("Annals", LoadKind::Dataset);
        wb.finish_load(&ticket, Ok(graph()));
        assert!(!wb.reset());
        assert_eq!(wb.message().unwrap().text, WIDGET_UNAVAILABLE);
    }

    #[test]
    fn test_events_from_destroyed_bindings_are_ignored() {
        let sinks = Arc::new(Mutex::new(Vec::new()));
        let factory: Arc<dyn AnnotatorFactory> = Arc::new(SinkRecordingFactory { sinks: sinks.clone() });
        let mut wb = Workbench::new(Some(factory));
        let ticket = wb.begin_load("Annals of Connacht", LoadKind::Dataset);
        wb.finish_load(&ticket, Ok(graph()));

        let old_sinks: Vec<EventSink> = sinks.lock().unwrap().drain(..).collect();
        assert_eq!(old_sinks.len(), 2);

        assert!(wb.reset());
        tag(&mut wb, 1, "Person");
        let summary = wb.summary().clone();

        old_sinks[0].emit(AnnotationEvent::Created);
        old_sinks[1].emit(AnnotationEvent::Deleted);
        assert_eq!(wb.pump_events(), 0);
        assert_eq!(wb.summary(), &summary);
        assert!(wb.export_enabled());

        let live_sinks = sinks.lock().unwrap().clone();
        live_sinks[1].emit(AnnotationEvent::Updated);
        assert_eq!(wb.pump_events(), 1);
    }
}
