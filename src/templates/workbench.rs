//! Workbench page template.
//!
//! Renders the entries panel (with highlighted annotations), the summary
//! panel and the page script. Fragments are re-sent by the JSON API after
//! each action so the page never duplicates the rendering rules.

use serde_json::Value;

use crate::annotator::TAG_VOCABULARY;
use crate::models::{
    Annotation, AnnotationDetails, DatasetDescriptor, EntryPanel, StatusMessage, SummaryView,
};
use crate::workbench::Workbench;

use super::components::{annotation_editor_html, base_html, html_escape, toolbar};

// ============================================================================
// Entries Panel
// ============================================================================

fn annotation_comment(annotation: &Annotation) -> String {
    annotation
        .0
        .get("body")
        .and_then(Value::as_array)
        .and_then(|bodies| {
            bodies
                .iter()
                .find(|b| b.get("purpose").and_then(Value::as_str) == Some("commenting"))
        })
        .and_then(|b| b.get("value"))
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

fn mark_class(tags: &[String]) -> &'static str {
    match tags.first().map(|t| t.to_lowercase()).as_deref() {
        None => "annotation untagged",
        Some("person") => "annotation tag-person",
        Some("place") => "annotation tag-place",
        Some("event") => "annotation tag-event",
        Some(_) => "annotation",
    }
}

fn escape_chars(chars: &[char]) -> String {
    html_escape(&chars.iter().collect::<String>())
}

/// Entry text with every non-overlapping annotation wrapped in a `<mark>`.
pub fn highlight_text(text: &str, annotations: &[Annotation]) -> String {
    let chars: Vec<char> = text.chars().collect();

    let mut spans: Vec<(usize, usize, &Annotation)> = annotations
        .iter()
        .filter_map(|a| a.position().map(|(start, end)| (start, end, a)))
        .filter(|(_, end, _)| *end <= chars.len())
        .collect();
    spans.sort_by_key(|(start, end, _)| (*start, *end));

    let mut html = String::new();
    let mut cursor = 0;
    for (start, end, annotation) in spans {
        // Overlaps stay listed in the summary but are not drawn
        if start < cursor {
            continue;
        }
        let tags = annotation.tags();
        html.push_str(&escape_chars(&chars[cursor..start]));
        html.push_str(&format!(
            r#"<mark class="{class}" data-annotation-id="{id}" data-tags="{tags}" data-comment="{comment}" title="{title}">{text}</mark>"#,
            class = mark_class(&tags),
            id = html_escape(annotation.id().unwrap_or("")),
            tags = html_escape(&tags.join(",")),
            comment = html_escape(&annotation_comment(annotation)),
            title = html_escape(&if tags.is_empty() { "Untagged".to_string() } else { tags.join(", ") }),
            text = escape_chars(&chars[start..end]),
        ));
        cursor = end;
    }
    html.push_str(&escape_chars(&chars[cursor..]));
    html
}

pub fn render_entries(
    message: Option<&StatusMessage>,
    panels: &[EntryPanel],
    annotations: &[Vec<Annotation>],
) -> String {
    if let Some(message) = message {
        return format!(
            r#"<p class="placeholder{error}">{text}</p>"#,
            error = if message.is_error { " error" } else { "" },
            text = html_escape(&message.text),
        );
    }

    let mut html = String::new();
    for (i, panel) in panels.iter().enumerate() {
        let panel_annotations = annotations.get(i).map(Vec::as_slice).unwrap_or(&[]);
        html.push_str(&format!(
            r#"<article class="entry{hidden}" data-position="{position}" data-entry-id="{entry_id}">
                <div class="entry-header">
                    <span class="entry-date">{date}</span>
                    <span class="entry-source">{source}</span>
                    <span class="entry-number">{number}</span>
                </div>
                <div class="entry-text" id="{text_id}" data-position="{position}">{text}</div>
            </article>"#,
            hidden = if panel.hidden { " hidden" } else { "" },
            position = panel.position,
            entry_id = html_escape(&panel.entry_id),
            date = html_escape(&panel.date_label),
            source = html_escape(&panel.source_label),
            number = html_escape(&panel.number_label),
            text_id = html_escape(&panel.text_id),
            text = highlight_text(&panel.description, panel_annotations),
        ));
    }
    html
}

// ============================================================================
// Summary Panel
// ============================================================================

fn render_details(details: &AnnotationDetails) -> String {
    let mut rows = String::new();
    for row in &details.rows {
        rows.push_str(&format!(
            r#"<li><span class="annotation-tag">{tags}</span><span class="annotation-quote">{quote}</span><span class="annotation-meta">{meta}</span></li>"#,
            tags = html_escape(&row.tags),
            quote = html_escape(&row.quote),
            meta = html_escape(&row.meta),
        ));
    }
    if let Some(remainder) = &details.remainder {
        rows.push_str(&format!(r#"<li class="annotation-note">{}</li>"#, html_escape(remainder)));
    }

    format!(
        r#"<details class="annotation-details"{open}><summary>{title}</summary><ul class="annotation-list">{rows}</ul></details>"#,
        open = if details.open { " open" } else { "" },
        title = html_escape(&details.title),
        rows = rows,
    )
}

pub fn render_summary(summary: &SummaryView) -> String {
    match summary {
        SummaryView::Placeholder { message } => {
            format!(r#"<p class="placeholder">{}</p>"#, html_escape(message))
        }
        SummaryView::Counts { cards, details } => {
            let mut html = String::new();
            for card in cards {
                html.push_str(&format!(
                    r#"<div class="tag-count"><strong>{count}</strong><span>{title}</span><small>{description}</small></div>"#,
                    count = card.count,
                    title = html_escape(&card.title),
                    description = html_escape(&card.description),
                ));
            }
            html.push_str(&render_details(details));
            html
        }
    }
}

// ============================================================================
// Page
// ============================================================================

pub fn render_workbench(datasets: &[DatasetDescriptor], selected: Option<&str>, workbench: &Workbench) -> String {
    let header = toolbar(
        datasets,
        selected,
        workbench.status_label(),
        workbench.export_enabled(),
    );

    let content = format!(
        r#"<main class="layout">
            <section class="entries" id="entries">{entries}</section>
            <aside class="summary">
                <h2>Summary</h2>
                <div class="summary-content" id="summary-content">{summary}</div>
            </aside>
        </main>
        {editor}"#,
        entries = render_entries(
            workbench.message(),
            workbench.panels(),
            &workbench.annotations_by_panel()
        ),
        summary = render_summary(workbench.summary()),
        editor = annotation_editor_html(TAG_VOCABULARY),
    );

    base_html("Annotation Workbench", &header, &content, WORKBENCH_JS)
}

const WORKBENCH_JS: &str = r#"
(() => {
    'use strict';

    const datasetSelect = document.getElementById('dataset-select');
    const fileInput = document.getElementById('file-input');
    const searchInput = document.getElementById('search-input');
    const entriesContainer = document.getElementById('entries');
    const summaryContent = document.getElementById('summary-content');
    const exportButton = document.getElementById('export-btn');
    const resetButton = document.getElementById('reset-btn');
    const datasetLabel = document.getElementById('dataset-label');
    const editor = document.getElementById('annotation-editor');

    let pending = null;
    let loadController = null;

    function applyUpdate(data) {
        entriesContainer.innerHTML = data.entries_html;
        summaryContent.innerHTML = data.summary_html;
        datasetLabel.textContent = data.state.status_label;
        exportButton.disabled = !data.state.export_enabled;
    }

    function showLocalError(message) {
        entriesContainer.innerHTML = '';
        const p = document.createElement('p');
        p.className = 'placeholder error';
        p.textContent = message;
        entriesContainer.appendChild(p);
    }

    async function send(url, options) {
        const response = await fetch(url, options);
        if (!response.ok && response.status !== 422) {
            throw new Error(await response.text());
        }
        return response.json();
    }

    // Only the newest load may update the page
    async function load(url, options, label) {
        if (loadController) {
            loadController.abort();
        }
        loadController = new AbortController();
        datasetLabel.textContent = label ? label + ' — loading…' : 'Loading dataset…';
        exportButton.disabled = true;
        closeEditor();
        try {
            applyUpdate(await send(url, Object.assign({ signal: loadController.signal }, options)));
            searchInput.value = '';
        } catch (error) {
            if (error.name === 'AbortError') return;
            console.error('Failed to load dataset:', error);
            showLocalError('Unable to load the dataset.');
        }
    }

    datasetSelect.addEventListener('change', (event) => {
        const id = event.target.value;
        if (!id) return;
        const label = event.target.selectedOptions[0].textContent;
        load('/api/datasets/' + encodeURIComponent(id) + '/load', { method: 'POST' }, label);
    });

    fileInput.addEventListener('change', (event) => {
        const file = event.target.files && event.target.files[0];
        if (!file) return;
        const form = new FormData();
        form.append('file', file, file.name);
        load('/api/upload', { method: 'POST', body: form }, file.name);
    });

    searchInput.addEventListener('input', async () => {
        const data = await send('/api/search?q=' + encodeURIComponent(searchInput.value), {});
        const hidden = new Set(data.hidden);
        entriesContainer.querySelectorAll('.entry').forEach((element) => {
            element.classList.toggle('hidden', hidden.has(Number(element.dataset.position)));
        });
    });

    exportButton.addEventListener('click', () => {
        window.location.href = '/api/export';
    });

    resetButton.addEventListener('click', async () => {
        closeEditor();
        applyUpdate(await send('/api/reset', { method: 'POST' }));
        searchInput.value = '';
    });

    // ---- Selection and editor ----

    function codePointOffset(container, node, offset) {
        const range = document.createRange();
        range.selectNodeContents(container);
        range.setEnd(node, offset);
        return Array.from(range.toString()).length;
    }

    function openEditor(target, rect) {
        pending = target;
        document.getElementById('editor-quote').textContent = target.quote;
        const tags = target.tags || [];
        const vocabulary = [];
        editor.querySelectorAll('input[name="editor-tag"]').forEach((box) => {
            box.checked = tags.some((t) => t.toLowerCase() === box.value.toLowerCase());
            vocabulary.push(box.value.toLowerCase());
        });
        document.getElementById('editor-custom-tags').value =
            tags.filter((t) => !vocabulary.includes(t.toLowerCase())).join(', ');
        document.getElementById('editor-comment').value = target.comment || '';
        document.getElementById('editor-delete').style.display = target.id ? '' : 'none';
        editor.style.top = (window.scrollY + rect.bottom + 6) + 'px';
        editor.style.left = (window.scrollX + rect.left) + 'px';
        editor.classList.add('active');
    }

    function closeEditor() {
        pending = null;
        editor.classList.remove('active');
    }

    function editorPayload() {
        const tags = [];
        editor.querySelectorAll('input[name="editor-tag"]:checked').forEach((box) => tags.push(box.value));
        document.getElementById('editor-custom-tags').value.split(',')
            .map((t) => t.trim()).filter(Boolean).forEach((t) => tags.push(t));
        const comment = document.getElementById('editor-comment').value.trim();
        return { tags, comment: comment || null };
    }

    entriesContainer.addEventListener('mouseup', () => {
        const selection = window.getSelection();
        if (!selection || selection.isCollapsed) return;
        const range = selection.getRangeAt(0);
        const container = range.commonAncestorContainer.nodeType === Node.ELEMENT_NODE
            ? range.commonAncestorContainer.closest('.entry-text')
            : range.commonAncestorContainer.parentElement.closest('.entry-text');
        if (!container) return;
        const start = codePointOffset(container, range.startContainer, range.startOffset);
        const end = codePointOffset(container, range.endContainer, range.endOffset);
        if (start >= end) return;
        openEditor({
            position: Number(container.dataset.position),
            start, end,
            quote: range.toString()
        }, range.getBoundingClientRect());
    });

    entriesContainer.addEventListener('click', (event) => {
        const mark = event.target.closest('mark.annotation');
        if (!mark || !window.getSelection().isCollapsed) return;
        const container = mark.closest('.entry-text');
        openEditor({
            position: Number(container.dataset.position),
            id: mark.dataset.annotationId,
            quote: mark.textContent,
            tags: mark.dataset.tags ? mark.dataset.tags.split(',') : [],
            comment: mark.dataset.comment
        }, mark.getBoundingClientRect());
    });

    function annotationUrl(target) {
        const base = '/api/entries/' + target.position + '/annotations';
        return target.id ? base + '/' + encodeURIComponent(target.id) : base;
    }

    document.getElementById('editor-save').addEventListener('click', async () => {
        if (!pending) return;
        const target = pending;
        const body = editorPayload();
        if (!target.id) {
            body.start = target.start;
            body.end = target.end;
        }
        try {
            applyUpdate(await send(annotationUrl(target), {
                method: target.id ? 'PUT' : 'POST',
                headers: { 'Content-Type': 'application/json' },
                body: JSON.stringify(body)
            }));
        } catch (error) {
            console.error('Failed to save annotation:', error);
        }
        closeEditor();
        window.getSelection().removeAllRanges();
    });

    document.getElementById('editor-delete').addEventListener('click', async () => {
        if (!pending || !pending.id) return;
        try {
            applyUpdate(await send(annotationUrl(pending), { method: 'DELETE' }));
        } catch (error) {
            console.error('Failed to delete annotation:', error);
        }
        closeEditor();
    });

    document.getElementById('editor-cancel').addEventListener('click', closeEditor);
})();
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn positioned(start: usize, end: usize, tag: Option<&str>) -> Annotation {
        let body: Vec<Value> = tag
            .map(|t| vec![json!({ "purpose": "tagging", "value": t })])
            .unwrap_or_default();
        Annotation(json!({
            "id": format!("#a{}", start),
            "body": body,
            "target": { "selector": [
                { "type": "TextQuoteSelector", "exact": "" },
                { "type": "TextPositionSelector", "start": start, "end": end }
            ] }
        }))
    }

    #[test]
    fn test_highlight_wraps_ranges_and_escapes() {
        let html = highlight_text("Áed & Cathal", &[positioned(0, 3, Some("Person"))]);
        assert!(html.starts_with(r##"<mark class="annotation tag-person" data-annotation-id="#a0""##));
        assert!(html.contains(">Áed</mark>"));
        assert!(html.ends_with(" &amp; Cathal"));
    }

    #[test]
    fn test_highlight_skips_overlaps_and_out_of_range() {
        let annotations = vec![
            positioned(0, 5, None),
            positioned(3, 8, Some("Place")),
            positioned(6, 40, Some("Event")),
        ];
        let html = highlight_text("abcdefghij", &annotations);
        assert_eq!(html.matches("<mark").count(), 1);
        assert!(html.contains(r#"class="annotation untagged""#));
        assert!(html.ends_with("fghij"));
    }

    #[test]
    fn test_render_entries_message() {
        let message = StatusMessage { text: "Bad <file>".to_string(), is_error: true };
        let html = render_entries(Some(&message), &[], &[]);
        assert_eq!(html, r#"<p class="placeholder error">Bad &lt;file&gt;</p>"#);
    }

    #[test]
    fn test_render_summary_placeholder_and_details() {
        let html = render_summary(&SummaryView::Placeholder { message: "No annotations yet.".to_string() });
        assert_eq!(html, r#"<p class="placeholder">No annotations yet.</p>"#);

        let details = AnnotationDetails {
            title: "Annotations (301)".to_string(),
            open: false,
            rows: vec![],
            remainder: Some("…and 1 more annotations.".to_string()),
        };
        let html = render_summary(&SummaryView::Counts { cards: vec![], details });
        assert!(html.contains(r#"<details class="annotation-details"><summary>Annotations (301)</summary>"#));
        assert!(html.contains("…and 1 more annotations."));
    }
}
