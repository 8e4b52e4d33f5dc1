//! Widget surface management.
//!
//! Builds one entry panel per entry and binds one widget instance to each
//! panel's text container. Every rebuild destroys all previous instances
//! first, so the number of live bindings always equals the number of rendered
//! entries.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::annotator::{Annotator, AnnotatorFactory, EventSink, WidgetConfig};
use crate::error::{Result, WorkbenchError};
use crate::filter::search_haystack;
use crate::models::{BindingId, Entry, EntryPanel, WidgetEvent};

/// A widget instance paired with the entry it annotates.
pub struct WidgetBinding {
    pub id: BindingId,
    pub entry: Arc<Entry>,
    pub instance: Box<dyn Annotator>,
}

/// Build the panel for the entry rendered at zero-based `position`.
pub fn build_panel(entry: &Entry, position: usize, dataset_label: &str) -> EntryPanel {
    let number = position + 1;

    let entry_id = if entry.id.is_empty() {
        format!("entry-{}", number)
    } else {
        entry.id.clone()
    };

    let date_label = if entry.date.is_empty() {
        "Undated".to_string()
    } else {
        entry.date.clone()
    };

    let source_label = [entry.source.as_str(), dataset_label]
        .into_iter()
        .find(|s| !s.is_empty())
        .unwrap_or("Unknown source")
        .to_string();

    let number_label = if entry.id.is_empty() {
        format!("Entry {}", number)
    } else {
        format!("Entry {} • {}", number, entry.id)
    };

    EntryPanel {
        position: number,
        entry_id,
        text_id: format!("entry-text-{}", number),
        date_label,
        source_label,
        number_label,
        description: entry.description.clone(),
        search: search_haystack(entry),
        hidden: false,
    }
}

pub struct SurfaceManager {
    factory: Option<Arc<dyn AnnotatorFactory>>,
    bindings: Vec<WidgetBinding>,
    generation: u64,
    events_tx: mpsc::UnboundedSender<WidgetEvent>,
}

impl SurfaceManager {
    pub fn new(
        factory: Option<Arc<dyn AnnotatorFactory>>,
        events_tx: mpsc::UnboundedSender<WidgetEvent>,
    ) -> Self {
        Self {
            factory,
            bindings: Vec::new(),
            generation: 0,
            events_tx,
        }
    }

    pub fn bindings(&self) -> &[WidgetBinding] {
        &self.bindings
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether an event from `id` belongs to the live render.
    pub fn is_current(&self, id: BindingId) -> bool {
        id.generation == self.generation && id.position < self.bindings.len()
    }

    /// Binding for the panel at one-based `position`.
    pub fn binding_mut(&mut self, position: usize) -> Option<&mut WidgetBinding> {
        position
            .checked_sub(1)
            .and_then(move |i| self.bindings.get_mut(i))
    }

    /// Destroy every live instance. Events they emitted earlier become stale.
    pub fn destroy_all(&mut self) {
        if self.bindings.is_empty() {
            return;
        }
        for binding in self.bindings.iter_mut() {
            binding.instance.destroy();
        }
        tracing::debug!(count = self.bindings.len(), generation = self.generation, "destroyed widget bindings");
        self.bindings.clear();
        self.generation += 1;
    }

    /// Rebuild panels and bindings for `entries`.
    pub fn render(&mut self, entries: &[Entry], dataset_label: &str) -> Result<Vec<EntryPanel>> {
        self.destroy_all();

        let factory = self.factory.clone().ok_or(WorkbenchError::WidgetUnavailable)?;
        self.generation += 1;

        let mut panels = Vec::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            let panel = build_panel(entry, position, dataset_label);
            let config = WidgetConfig::standard(panel.text_id.clone(), entry.description.clone());

            let mut instance = match factory.create(config) {
                Ok(instance) => instance,
                Err(e) => {
                    tracing::error!(position, error = %e, "failed to create annotation widget");
                    self.destroy_all();
                    return Err(e);
                }
            };

            let id = BindingId {
                generation: self.generation,
                position,
            };
            instance.subscribe(EventSink::new(id, self.events_tx.clone()));

            self.bindings.push(WidgetBinding {
                id,
                entry: Arc::new(entry.clone()),
                instance,
            });
            panels.push(panel);
        }

        tracing::info!(count = self.bindings.len(), generation = self.generation, "rendered entries");
        Ok(panels)
    }
}

impl Drop for SurfaceManager {
    fn drop(&mut self) {
        self.destroy_all();
    }
}
