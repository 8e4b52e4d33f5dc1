//! JSON-LD normalization.
//!
//! Turns a loosely structured JSON-LD document (a bare array of nodes, or an
//! object carrying a `@graph` array) into an ordered list of flat entries.
//! Nodes that do not yield a usable description are dropped silently.

use serde_json::{Map, Value};

use crate::models::Entry;

pub const DESCRIPTION_KEYS: &[&str] = &["dc:description", "description", "text", "value"];
pub const DATE_KEYS: &[&str] = &["dc:date", "date", "when", "time"];
pub const SOURCE_KEYS: &[&str] = &["dc:source", "source", "collection"];
const ID_KEYS: &[&str] = &["@id", "id"];

/// Returns the string if it is non-empty.
pub(crate) fn truthy_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}

/// JavaScript-style truthiness, used to decide whether a probed key counts.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Render a number the way a dataset author would write it (`1224`, not `1224.0`).
fn number_to_string(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// Probe `keys` in priority order and return the first usable value.
///
/// Strings are returned as is and numbers are stringified. For arrays the
/// first element that is a non-blank string wins, falling back to the first
/// numeric element. Returns an empty string when nothing matches.
pub fn probe_first(node: &Map<String, Value>, keys: &[&str]) -> String {
    for key in keys {
        let Some(value) = node.get(*key).filter(|v| is_truthy(v)) else {
            continue;
        };

        match value {
            Value::Array(items) => {
                let first = items
                    .iter()
                    .filter_map(Value::as_str)
                    .find(|s| !s.trim().is_empty());
                if let Some(s) = first {
                    return s.to_string();
                }
                if let Some(n) = items.iter().find_map(|item| match item {
                    Value::Number(n) => Some(n),
                    _ => None,
                }) {
                    return number_to_string(n);
                }
            }
            Value::String(s) => return s.clone(),
            Value::Number(n) => return number_to_string(n),
            _ => {}
        }
    }
    String::new()
}

fn node_id(node: &Map<String, Value>) -> String {
    ID_KEYS
        .iter()
        .filter_map(|key| node.get(*key))
        .find_map(|value| match value {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) if is_truthy(value) => Some(number_to_string(n)),
            _ => None,
        })
        .unwrap_or_default()
}

/// The node sequence of a document: the document itself if it is an array,
/// otherwise its `@graph` array.
fn graph_nodes(payload: &Value) -> Option<&Vec<Value>> {
    match payload {
        Value::Array(nodes) => Some(nodes),
        Value::Object(map) => map.get("@graph").and_then(Value::as_array),
        _ => None,
    }
}

/// Normalize a JSON-LD document into entries, preserving graph order.
///
/// `index` on each entry is the node's position in the original graph.
pub fn parse_jsonld(payload: &Value) -> Vec<Entry> {
    let Some(nodes) = graph_nodes(payload) else {
        return Vec::new();
    };

    nodes
        .iter()
        .enumerate()
        .filter_map(|(index, node)| {
            let map = node.as_object()?;

            let description = probe_first(map, DESCRIPTION_KEYS);
            if description.is_empty() {
                return None;
            }

            Some(Entry {
                index,
                id: node_id(map),
                date: probe_first(map, DATE_KEYS),
                source: probe_first(map, SOURCE_KEYS),
                description: description.trim().to_string(),
                raw: node.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_graph_object_and_bare_array() {
        let graph = json!({
            "@context": { "dc": "http://purl.org/dc/elements/1.1/" },
            "@graph": [
                { "@id": "ac:1224.1", "dc:date": "1224", "dc:description": "A great storm." }
            ]
        });
        let entries = parse_jsonld(&graph);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "ac:1224.1");
        assert_eq!(entries[0].date, "1224");
        assert_eq!(entries[0].description, "A great storm.");

        let bare = json!([{ "text": "Plain node" }]);
        let entries = parse_jsonld(&bare);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "");
        assert_eq!(entries[0].date, "");
    }

    #[test]
    fn test_non_graph_payloads_yield_nothing() {
        assert!(parse_jsonld(&json!({ "title": "no graph" })).is_empty());
        assert!(parse_jsonld(&json!({ "@graph": "oops" })).is_empty());
        assert!(parse_jsonld(&json!("string")).is_empty());
        assert!(parse_jsonld(&Value::Null).is_empty());
    }

    #[test]
    fn test_index_is_original_graph_position() {
        let graph = json!([
            { "description": "first" },
            { "title": "no description" },
            "not an object",
            { "value": "fourth" },
            null,
            { "text": "   " },
            { "dc:description": "seventh" }
        ]);
        let entries = parse_jsonld(&graph);
        let indices: Vec<usize> = entries.iter().map(|e| e.index).collect();
        let descriptions: Vec<&str> = entries.iter().map(|e| e.description.as_str()).collect();

        assert_eq!(indices, vec![0, 3, 5, 6]);
        assert_eq!(descriptions, vec!["first", "fourth", "", "seventh"]);
    }

    #[test]
    fn test_nodes_without_description_are_dropped_for_every_key_order() {
        let keys = ["dc:date", "date", "source", "collection", "title", "@id"];
        for rotation in 0..keys.len() {
            let mut node = Map::new();
            for (i, key) in keys.iter().cycle().skip(rotation).take(keys.len()).enumerate() {
                node.insert(key.to_string(), json!(format!("v{}", i)));
            }
            for key in DESCRIPTION_KEYS {
                node.insert(key.to_string(), json!(""));
            }
            assert!(parse_jsonld(&Value::Array(vec![Value::Object(node)])).is_empty());
        }
    }

    #[test]
    fn test_description_priority_order() {
        let node = as_map(json!({
            "value": "from value",
            "text": "from text",
            "description": "from description"
        }));
        assert_eq!(probe_first(&node, DESCRIPTION_KEYS), "from description");

        let node = as_map(json!({ "dc:description": "", "text": "from text" }));
        assert_eq!(probe_first(&node, DESCRIPTION_KEYS), "from text");
    }

    #[test]
    fn test_probe_array_skips_empty_strings() {
        let node = as_map(json!({ "date": ["", "1224"] }));
        assert_eq!(probe_first(&node, DATE_KEYS), "1224");

        let node = as_map(json!({ "date": ["  ", { "@value": "x" }, 1315] }));
        assert_eq!(probe_first(&node, DATE_KEYS), "1315");

        let node = as_map(json!({ "date": [], "when": "1316" }));
        assert_eq!(probe_first(&node, DATE_KEYS), "1316");
    }

    #[test]
    fn test_probe_numbers_and_objects() {
        let node = as_map(json!({ "dc:date": 1224, "source": { "@id": "x" }, "collection": "RIA" }));
        assert_eq!(probe_first(&node, DATE_KEYS), "1224");
        assert_eq!(probe_first(&node, SOURCE_KEYS), "RIA");

        let node = as_map(json!({ "date": 0, "when": 12.5 }));
        assert_eq!(probe_first(&node, DATE_KEYS), "12.5");

        let node = as_map(json!({ "time": 1400.0 }));
        assert_eq!(probe_first(&node, DATE_KEYS), "1400");
    }

    #[test]
    fn test_description_is_trimmed_and_raw_kept() {
        let graph = json!([{ "id": 17, "description": "  The king died.\n", "source": ["", "AC"] }]);
        let entries = parse_jsonld(&graph);
        assert_eq!(entries[0].description, "The king died.");
        assert_eq!(entries[0].id, "17");
        assert_eq!(entries[0].source, "AC");
        assert_eq!(entries[0].raw["description"], "  The king died.\n");
    }

    #[test]
    fn test_whitespace_only_description_is_kept_as_empty_entry() {
        let entries = parse_jsonld(&json!([{ "description": "   " }, { "text": "real" }]));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].index, 0);
        assert_eq!(entries[0].description, "");
        assert_eq!(entries[1].index, 1);
        assert_eq!(entries[1].description, "real");
    }
}
