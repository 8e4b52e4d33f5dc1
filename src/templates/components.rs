//! Shared HTML components for the annotation workbench.
//!
//! Contains the toolbar, the annotation editor popup and the base HTML
//! template.

use crate::models::DatasetDescriptor;

use super::styles::STYLE;

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

// ============================================================================
// Toolbar
// ============================================================================

pub fn toolbar(datasets: &[DatasetDescriptor], selected: Option<&str>, status_label: &str, export_enabled: bool) -> String {
    let mut options = String::new();
    for dataset in datasets {
        let selected_attr = if selected == Some(dataset.id.as_str()) { " selected" } else { "" };
        options.push_str(&format!(
            r#"<option value="{id}"{selected}>{label}</option>"#,
            id = html_escape(&dataset.id),
            selected = selected_attr,
            label = html_escape(&dataset.label),
        ));
    }

    format!(
        r#"<header class="toolbar">
            <label for="dataset-select">Dataset</label>
            <select id="dataset-select">{options}</select>
            <label for="file-input">or open</label>
            <input type="file" id="file-input" accept=".json,.jsonld,application/ld+json,application/json">
            <input type="search" id="search-input" placeholder="Filter entries...">
            <span class="dataset-label" id="dataset-label">{label}</span>
            <span class="spacer"></span>
            <button class="btn secondary" id="reset-btn">Reset</button>
            <button class="btn" id="export-btn"{disabled}>Export</button>
        </header>"#,
        options = options,
        label = html_escape(status_label),
        disabled = if export_enabled { "" } else { " disabled" },
    )
}

// ============================================================================
// Annotation Editor
// ============================================================================

pub fn annotation_editor_html(vocabulary: &[&str]) -> String {
    let choices: String = vocabulary
        .iter()
        .map(|tag| {
            format!(
                r#"<label><input type="checkbox" name="editor-tag" value="{tag}"> {tag}</label>"#,
                tag = html_escape(tag)
            )
        })
        .collect();

    format!(
        r#"<div class="annotation-editor" id="annotation-editor">
            <div class="quote" id="editor-quote"></div>
            <div class="tag-choices">{choices}</div>
            <input type="text" id="editor-custom-tags" placeholder="Other tags, comma separated">
            <textarea id="editor-comment" rows="2" placeholder="Comment"></textarea>
            <div class="actions">
                <button class="btn danger" id="editor-delete">Delete</button>
                <button class="btn secondary" id="editor-cancel">Cancel</button>
                <button class="btn" id="editor-save">Save</button>
            </div>
        </div>"#,
        choices = choices
    )
}

// ============================================================================
// Base Template
// ============================================================================

pub fn base_html(title: &str, header: &str, content: &str, script: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{STYLE}</style>
</head>
<body>
    {header}
    {content}
    <script>{script}</script>
</body>
</html>"#,
        title = html_escape(title),
    )
}
