//! CSS styles for the annotation workbench.
//!
//! Contains the main STYLE constant with all CSS for the web interface.

// ============================================================================
// CSS Styles
// ============================================================================

pub const STYLE: &str = r#"
/* Solarized Light Theme */
:root {
    --base03: #002b36;
    --base02: #073642;
    --base01: #586e75;
    --base00: #657b83;
    --base1: #93a1a1;
    --base2: #eee8d5;
    --base3: #fdf6e3;

    --yellow: #b58900;
    --orange: #cb4b16;
    --red: #dc322f;
    --magenta: #d33682;
    --blue: #268bd2;
    --cyan: #2aa198;
    --green: #859900;

    --bg: var(--base3);
    --fg: var(--base00);
    --muted: var(--base1);
    --border: var(--base2);
    --accent: var(--base2);
    --person: rgba(38, 139, 210, 0.25);
    --place: rgba(133, 153, 0, 0.25);
    --event: rgba(203, 75, 22, 0.25);
    --other: rgba(181, 137, 0, 0.25);
}

* { box-sizing: border-box; margin: 0; padding: 0; }

body {
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
    line-height: 1.6;
    color: var(--fg);
    background: var(--bg);
}

.toolbar {
    position: sticky;
    top: 0;
    background: var(--bg);
    border-bottom: 1px solid var(--border);
    padding: 0.5rem 1rem;
    display: flex;
    gap: 1rem;
    align-items: center;
    flex-wrap: wrap;
    z-index: 100;
}

.toolbar .spacer { flex: 1; }
.toolbar label { font-size: 0.85rem; color: var(--base01); }

.toolbar select, .toolbar input[type="search"] {
    padding: 0.4rem 0.75rem;
    border: 1px solid var(--border);
    border-radius: 4px;
    background: var(--bg);
    color: var(--fg);
    font-size: 0.9rem;
}

.dataset-label { font-size: 0.85rem; color: var(--muted); }

.btn {
    padding: 0.4rem 0.9rem;
    border: 1px solid var(--blue);
    border-radius: 4px;
    background: var(--blue);
    color: var(--base3);
    cursor: pointer;
    font-size: 0.9rem;
}
.btn:hover { background: var(--cyan); border-color: var(--cyan); }
.btn:disabled { opacity: 0.5; cursor: not-allowed; }
.btn.secondary { background: var(--base2); color: var(--base00); border-color: var(--base1); }
.btn.danger { background: var(--red); border-color: var(--red); }

.layout {
    display: grid;
    grid-template-columns: minmax(0, 2fr) minmax(260px, 1fr);
    gap: 1.5rem;
    max-width: 1300px;
    margin: 0 auto;
    padding: 1rem;
}

@media (max-width: 900px) {
    .layout { grid-template-columns: 1fr; }
}

.placeholder { color: var(--muted); font-style: italic; padding: 1rem 0; }
.placeholder.error { color: var(--red); font-style: normal; }

.entry {
    border-bottom: 1px solid var(--border);
    padding: 1rem 0;
}
.entry.hidden { display: none; }

.entry-header {
    display: flex;
    gap: 1rem;
    font-size: 0.8rem;
    color: var(--muted);
    margin-bottom: 0.4rem;
}
.entry-date { color: var(--yellow); font-weight: 600; }
.entry-number { margin-left: auto; font-family: "SF Mono", "Consolas", "Liberation Mono", monospace; }

.entry-text { white-space: pre-wrap; cursor: text; }

mark.annotation {
    background: var(--other);
    border-bottom: 2px solid var(--yellow);
    cursor: pointer;
    color: inherit;
}
mark.annotation.tag-person { background: var(--person); border-color: var(--blue); }
mark.annotation.tag-place { background: var(--place); border-color: var(--green); }
mark.annotation.tag-event { background: var(--event); border-color: var(--orange); }
mark.annotation.untagged { background: var(--accent); border-color: var(--base1); }

.summary h2 { margin-top: 0; font-size: 1.1rem; }

.summary-content {
    display: flex;
    flex-wrap: wrap;
    gap: 0.5rem;
}

.tag-count {
    display: flex;
    flex-direction: column;
    border: 1px solid var(--border);
    border-radius: 4px;
    padding: 0.5rem 0.75rem;
    min-width: 110px;
}
.tag-count strong { font-size: 1.4rem; color: var(--base01); }
.tag-count small { color: var(--muted); font-size: 0.7rem; }

.annotation-details { width: 100%; margin-top: 0.75rem; }
.annotation-details summary { cursor: pointer; font-weight: 600; }

.annotation-list { list-style: none; font-size: 0.85rem; }
.annotation-list li {
    display: flex;
    flex-direction: column;
    padding: 0.4rem 0;
    border-bottom: 1px solid var(--border);
}
.annotation-tag { font-weight: 600; color: var(--magenta); }
.annotation-quote { font-style: italic; }
.annotation-meta { color: var(--muted); font-size: 0.75rem; }
.annotation-note { color: var(--muted); font-style: italic; }

.annotation-editor {
    position: absolute;
    display: none;
    background: var(--bg);
    border: 1px solid var(--base1);
    border-radius: 4px;
    box-shadow: 0 4px 16px rgba(0, 0, 0, 0.15);
    padding: 0.75rem;
    width: 300px;
    z-index: 200;
}
.annotation-editor.active { display: block; }
.annotation-editor .quote { font-style: italic; font-size: 0.85rem; margin-bottom: 0.5rem; }
.annotation-editor .tag-choices { display: flex; gap: 0.4rem; flex-wrap: wrap; margin-bottom: 0.5rem; }
.annotation-editor input[type="text"], .annotation-editor textarea {
    width: 100%;
    padding: 0.3rem 0.5rem;
    border: 1px solid var(--border);
    border-radius: 4px;
    font-family: inherit;
    margin-bottom: 0.5rem;
}
.annotation-editor .actions { display: flex; gap: 0.4rem; justify-content: flex-end; }
"#;
