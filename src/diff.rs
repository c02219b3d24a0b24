//! Field-level diff of two JSON objects, stored as the value of `update`
//! activity entries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// One changed field. A missing side means the field was absent there.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Value>,
}

pub type ObjectDiff = BTreeMap<String, FieldChange>;

/// Diff `current` against `previous`: every key present in either object
/// whose values are not deeply equal, `from` read from `previous` and `to`
/// from `current`. Non-object inputs count as empty objects.
pub fn object_diff(current: &Value, previous: &Value) -> ObjectDiff {
    let empty = Map::new();
    let current = current.as_object().unwrap_or(&empty);
    let previous = previous.as_object().unwrap_or(&empty);

    let mut diff = ObjectDiff::new();
    for key in current.keys().chain(previous.keys()) {
        if diff.contains_key(key) {
            continue;
        }
        let to = current.get(key);
        let from = previous.get(key);
        if to != from {
            diff.insert(
                key.clone(),
                FieldChange {
                    from: from.cloned(),
                    to: to.cloned(),
                },
            );
        }
    }
    diff
}

/// Diff two serializable values through their JSON form.
pub fn diff_of<T: Serialize>(current: &T, previous: &T) -> Result<ObjectDiff> {
    let current = serde_json::to_value(current)?;
    let previous = serde_json::to_value(previous)?;
    Ok(object_diff(&current, &previous))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reports_changes_additions_and_removals() {
        let diff = object_diff(&json!({"a": 1, "b": 2}), &json!({"a": 1, "b": 3, "c": 4}));
        assert_eq!(diff.len(), 2);
        assert_eq!(
            diff["b"],
            FieldChange {
                from: Some(json!(3)),
                to: Some(json!(2)),
            }
        );
        assert_eq!(
            diff["c"],
            FieldChange {
                from: Some(json!(4)),
                to: None,
            }
        );
        assert!(!diff.contains_key("a"));
    }

    #[test]
    fn nested_values_compare_deeply() {
        let diff = object_diff(
            &json!({"subTasks": [1, 2], "meta": {"x": 1}}),
            &json!({"subTasks": [1, 2], "meta": {"x": 2}}),
        );
        assert_eq!(diff.keys().collect::<Vec<_>>(), vec!["meta"]);
    }

    #[test]
    fn added_field_has_no_from() {
        let diff = object_diff(&json!({"url": "https://example.org"}), &json!({}));
        let change = &diff["url"];
        assert!(change.from.is_none());
        assert_eq!(change.to, Some(json!("https://example.org")));
        let encoded = serde_json::to_value(change).expect("encode");
        assert_eq!(encoded, json!({"to": "https://example.org"}));
    }
}
