//! In-process annotation widget.
//!
//! Keeps W3C web annotations in memory for one text container. Selections
//! arrive as character offsets from the page script.

use chrono::Utc;
use serde_json::{json, Value};

use crate::annotator::{Annotator, AnnotatorFactory, EventSink, WidgetConfig};
use crate::error::{Result, WorkbenchError};
use crate::models::{Annotation, AnnotationEdit, AnnotationEvent};

const ANNOTATION_CONTEXT: &str = "http://www.w3.org/ns/anno.jsonld";

fn generate_annotation_id() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let bytes: [u8; 16] = rng.gen();
    let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    format!("#{}", hex)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryAnnotatorFactory;

impl AnnotatorFactory for MemoryAnnotatorFactory {
    fn create(&self, config: WidgetConfig) -> Result<Box<dyn Annotator>> {
        Ok(Box::new(MemoryAnnotator::new(config)))
    }
}

pub struct MemoryAnnotator {
    config: WidgetConfig,
    annotations: Vec<Annotation>,
    sinks: Vec<EventSink>,
    destroyed: bool,
}

impl MemoryAnnotator {
    pub fn new(config: WidgetConfig) -> Self {
        Self {
            config,
            annotations: Vec::new(),
            sinks: Vec::new(),
            destroyed: false,
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn emit(&self, event: AnnotationEvent) {
        for sink in &self.sinks {
            sink.emit(event);
        }
    }

    /// Build the body list for a set of tags and an optional comment.
    fn bodies(&self, tags: &[String], comment: Option<&str>) -> Result<Vec<Value>> {
        let mut bodies = Vec::new();

        if let Some(comment) = comment.map(str::trim).filter(|c| !c.is_empty()) {
            if !self.config.has_comments() {
                return Err(WorkbenchError::InvalidInput(
                    "comments are not enabled for this widget".to_string(),
                ));
            }
            bodies.push(json!({
                "type": "TextualBody",
                "value": comment,
                "purpose": "commenting"
            }));
        }

        let tags: Vec<&str> = tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()).collect();
        if !tags.is_empty() && !self.config.has_tags() {
            return Err(WorkbenchError::InvalidInput(
                "tags are not enabled for this widget".to_string(),
            ));
        }
        for tag in tags {
            bodies.push(json!({
                "type": "TextualBody",
                "value": tag,
                "purpose": "tagging"
            }));
        }

        Ok(bodies)
    }

    fn position_of(&self, id: &str) -> Result<usize> {
        self.annotations
            .iter()
            .position(|a| a.id() == Some(id))
            .ok_or_else(|| WorkbenchError::NotFound(format!("annotation {}", id)))
    }

    fn create(&mut self, start: usize, end: usize, tags: &[String], comment: Option<&str>) -> Result<Annotation> {
        let length = self.config.content.chars().count();
        if start >= end || end > length {
            return Err(WorkbenchError::InvalidInput(format!(
                "selection {}..{} is outside the text (length {})",
                start, end, length
            )));
        }

        let exact: String = self.config.content.chars().skip(start).take(end - start).collect();
        let bodies = self.bodies(tags, comment)?;

        let annotation = Annotation(json!({
            "@context": ANNOTATION_CONTEXT,
            "type": "Annotation",
            "id": generate_annotation_id(),
            "created": Utc::now().to_rfc3339(),
            "body": bodies,
            "target": {
                "source": format!("#{}", self.config.container_id),
                "selector": [
                    { "type": "TextQuoteSelector", "exact": exact },
                    { "type": "TextPositionSelector", "start": start, "end": end }
                ]
            }
        }));

        self.annotations.push(annotation.clone());
        self.emit(AnnotationEvent::Created);
        Ok(annotation)
    }

    fn update(&mut self, id: &str, tags: &[String], comment: Option<&str>) -> Result<Annotation> {
        let position = self.position_of(id)?;
        let bodies = self.bodies(tags, comment)?;

        let annotation = &mut self.annotations[position];
        if let Some(map) = annotation.0.as_object_mut() {
            map.insert("body".to_string(), Value::Array(bodies));
            map.insert("modified".to_string(), json!(Utc::now().to_rfc3339()));
        }
        let updated = annotation.clone();

        self.emit(AnnotationEvent::Updated);
        Ok(updated)
    }

    fn delete(&mut self, id: &str) -> Result<Annotation> {
        let position = self.position_of(id)?;
        let removed = self.annotations.remove(position);
        self.emit(AnnotationEvent::Deleted);
        Ok(removed)
    }
}

impl Annotator for MemoryAnnotator {
    fn annotations(&self) -> Vec<Annotation> {
        self.annotations.clone()
    }

    fn subscribe(&mut self, sink: EventSink) {
        if !self.destroyed {
            self.sinks.push(sink);
        }
    }

    fn apply(&mut self, edit: AnnotationEdit) -> Result<Annotation> {
        if self.destroyed {
            return Err(WorkbenchError::InvalidInput("widget has been destroyed".to_string()));
        }

        match edit {
            AnnotationEdit::Create { start, end, tags, comment } => {
                self.create(start, end, &tags, comment.as_deref())
            }
            AnnotationEdit::Update { id, tags, comment } => {
                self.update(&id, &tags, comment.as_deref())
            }
            AnnotationEdit::Delete { id } => self.delete(&id),
        }
    }

    fn destroy(&mut self) {
        self.annotations.clear();
        self.sinks.clear();
        self.destroyed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BindingId, WidgetEvent};
    use tokio::sync::mpsc;

    fn widget(text: &str) -> (MemoryAnnotator, mpsc::UnboundedReceiver<WidgetEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut annotator = MemoryAnnotator::new(WidgetConfig::standard("entry-text-1", text));
        annotator.subscribe(EventSink::new(BindingId { generation: 1, position: 0 }, tx));
        (annotator, rx)
    }

    fn create(start: usize, end: usize, tags: &[&str]) -> AnnotationEdit {
        AnnotationEdit::Create {
            start,
            end,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            comment: None,
        }
    }

    #[test]
    fn test_create_builds_quote_and_tag_bodies() {
        let (mut annotator, mut rx) = widget("Áed son of Cathal went to Rome.");
        let annotation = annotator
            .apply(AnnotationEdit::Create {
                start: 0,
                end: 3,
                tags: vec!["Person".to_string(), "  ".to_string()],
                comment: Some("the king".to_string()),
            })
            .unwrap();

        assert_eq!(annotation.quote(), "Áed");
        assert_eq!(annotation.tags(), vec!["Person"]);
        assert!(annotation.id().unwrap().starts_with('#'));
        assert_eq!(annotator.annotations().len(), 1);

        let event = rx.try_recv().unwrap();
        assert_eq!(event.event, AnnotationEvent::Created);
        assert_eq!(event.binding.position, 0);
    }

    #[test]
    fn test_create_rejects_bad_ranges() {
        let (mut annotator, mut rx) = widget("short");
        assert!(matches!(
            annotator.apply(create(3, 3, &[])),
            Err(WorkbenchError::InvalidInput(_))
        ));
        assert!(annotator.apply(create(2, 9, &[])).is_err());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_update_and_delete_emit_events() {
        let (mut annotator, mut rx) = widget("Tuam was burned.");
        let id = annotator.apply(create(0, 4, &["Place"])).unwrap().id().unwrap().to_string();

        let updated = annotator
            .apply(AnnotationEdit::Update {
                id: id.clone(),
                tags: vec!["Event".to_string()],
                comment: None,
            })
            .unwrap();
        assert_eq!(updated.tags(), vec!["Event"]);
        assert_eq!(updated.quote(), "Tuam");

        annotator.apply(AnnotationEdit::Delete { id: id.clone() }).unwrap();
        assert!(annotator.annotations().is_empty());
        assert!(matches!(
            annotator.apply(AnnotationEdit::Delete { id }),
            Err(WorkbenchError::NotFound(_))
        ));

        let kinds: Vec<AnnotationEvent> = std::iter::from_fn(|| rx.try_recv().ok()).map(|e| e.event).collect();
        assert_eq!(
            kinds,
            vec![AnnotationEvent::Created, AnnotationEvent::Updated, AnnotationEvent::Deleted]
        );
    }

    #[test]
    fn test_tags_rejected_without_tag_widget() {
        let config = WidgetConfig {
            container_id: "c".to_string(),
            content: "text".to_string(),
            widgets: vec![crate::annotator::WidgetKind::Comment],
        };
        let mut annotator = MemoryAnnotator::new(config);
        assert!(annotator.apply(create(0, 2, &["Person"])).is_err());
        assert!(annotator.apply(create(0, 2, &[])).is_ok());
    }

    #[test]
    fn test_destroy_discards_state() {
        let (mut annotator, mut rx) = widget("Connacht");
        annotator.apply(create(0, 8, &["Place"])).unwrap();
        let _ = rx.try_recv();

        annotator.destroy();
        assert!(annotator.is_destroyed());
        assert!(annotator.annotations().is_empty());
        assert!(annotator.apply(create(0, 8, &[])).is_err());
        assert!(rx.try_recv().is_err());
    }
}
