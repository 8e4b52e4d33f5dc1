//! The annotation widget capability.
//!
//! A widget instance is bound to one text container. It owns the annotations
//! made on that container, reports changes through an [`EventSink`], and must
//! be destroyed before the container is thrown away.

use serde::Serialize;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::models::{Annotation, AnnotationEdit, AnnotationEvent, BindingId, WidgetEvent};

/// Tags offered by the tag widget. Other values typed by the user are kept.
pub const TAG_VOCABULARY: &[&str] = &["Person", "Place", "Event"];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "widget", rename_all = "UPPERCASE")]
pub enum WidgetKind {
    Comment,
    Tag { vocabulary: Vec<String> },
}

/// Construction parameters for one widget instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetConfig {
    /// DOM id of the text container
    pub container_id: String,
    /// Text the container is seeded with
    pub content: String,
    pub widgets: Vec<WidgetKind>,
}

impl WidgetConfig {
    /// Comment widget plus a tag widget over [`TAG_VOCABULARY`].
    pub fn standard(container_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            content: content.into(),
            widgets: vec![
                WidgetKind::Comment,
                WidgetKind::Tag {
                    vocabulary: TAG_VOCABULARY.iter().map(|t| t.to_string()).collect(),
                },
            ],
        }
    }

    pub fn has_comments(&self) -> bool {
        self.widgets.iter().any(|w| matches!(w, WidgetKind::Comment))
    }

    pub fn has_tags(&self) -> bool {
        self.widgets.iter().any(|w| matches!(w, WidgetKind::Tag { .. }))
    }
}

/// Sending half of the workbench event channel, stamped with the binding it
/// belongs to.
#[derive(Debug, Clone)]
pub struct EventSink {
    binding: BindingId,
    tx: mpsc::UnboundedSender<WidgetEvent>,
}

impl EventSink {
    pub fn new(binding: BindingId, tx: mpsc::UnboundedSender<WidgetEvent>) -> Self {
        Self { binding, tx }
    }

    pub fn emit(&self, event: AnnotationEvent) {
        let message = WidgetEvent {
            binding: self.binding,
            event,
        };
        if let Err(err) = self.tx.send(message) {
            tracing::debug!(event = ?err.0, "event channel closed, dropping widget event");
        }
    }
}

/// One live widget instance.
pub trait Annotator: Send {
    /// Full current annotation set, in creation order.
    fn annotations(&self) -> Vec<Annotation>;

    /// Register the sink that receives create/update/delete notifications.
    fn subscribe(&mut self, sink: EventSink);

    /// Forward a user interaction to the widget.
    fn apply(&mut self, edit: AnnotationEdit) -> Result<Annotation>;

    /// Release the instance. Afterwards it reports no annotations and emits no events.
    fn destroy(&mut self);
}

/// Creates widget instances.
pub trait AnnotatorFactory: Send + Sync {
    fn create(&self, config: WidgetConfig) -> Result<Box<dyn Annotator>>;
}
