//! Substring filtering over rendered entry panels.
//!
//! Filtering only toggles visibility; hidden panels keep their widget
//! bindings and still count towards the summary.

use crate::models::{Entry, EntryPanel};

/// Lowercased `date source description`, computed once per render.
pub fn search_haystack(entry: &Entry) -> String {
    [entry.date.as_str(), entry.source.as_str(), entry.description.as_str()]
        .join(" ")
        .to_lowercase()
}

pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Hide every panel whose haystack does not contain `query`.
///
/// Returns the number of panels left visible.
pub fn apply_filter(panels: &mut [EntryPanel], query: &str) -> usize {
    let query = normalize_query(query);
    let mut visible = 0;

    for panel in panels.iter_mut() {
        panel.hidden = !query.is_empty() && !panel.search.contains(&query);
        if !panel.hidden {
            visible += 1;
        }
    }

    visible
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn panel(search: &str) -> EntryPanel {
        EntryPanel {
            position: 1,
            entry_id: "entry-1".to_string(),
            text_id: "entry-text-1".to_string(),
            date_label: String::new(),
            source_label: String::new(),
            number_label: String::new(),
            description: String::new(),
            search: search.to_string(),
            hidden: false,
        }
    }

    #[test]
    fn test_haystack_joins_fields_lowercased() {
        let entry = Entry {
            index: 0,
            id: String::new(),
            date: "1224".to_string(),
            source: "Annals of Connacht".to_string(),
            description: "Cathal Crobderg DIED".to_string(),
            raw: Value::Null,
        };
        assert_eq!(search_haystack(&entry), "1224 annals of connacht cathal crobderg died");
    }

    #[test]
    fn test_filter_is_case_insensitive_substring() {
        let mut panels = vec![panel("1224 cathal died"), panel("1225 a great war"), panel("1226 cathal again")];

        assert_eq!(apply_filter(&mut panels, "  CATHAL "), 2);
        assert!(!panels[0].hidden);
        assert!(panels[1].hidden);
        assert!(!panels[2].hidden);

        assert_eq!(apply_filter(&mut panels, ""), 3);
        assert!(panels.iter().all(|p| !p.hidden));

        assert_eq!(apply_filter(&mut panels, "zzz"), 0);
    }
}
