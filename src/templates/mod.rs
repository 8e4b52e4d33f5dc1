//! HTML templates and styling for the annotation workbench.
//!
//! ## Module Structure
//!
//! - `styles` - CSS constants and theme definitions
//! - `components` - Toolbar, annotation editor popup, base template
//! - `workbench` - Entries panel, summary panel and the page script

mod components;
mod styles;
mod workbench;

pub use components::{annotation_editor_html, base_html, html_escape, toolbar};
pub use styles::STYLE;
pub use workbench::{highlight_text, render_entries, render_summary, render_workbench};
