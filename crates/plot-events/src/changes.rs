//! Change Types
//!
//! Deltas carried by events: state maps and add/remove change sets.
//!
//! Extraction output is loosely typed, so `add`/`remove` are normalized here,
//! once, at deserialization time. A bare scalar becomes a single-element list
//! and `null` becomes an empty list. Everything downstream sees `Vec<String>`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Open string-keyed map of scalar values (character state, state deltas).
pub type StateMap = serde_json::Map<String, Value>;

/// Set-like delta applied to an inventory or knowledge list.
///
/// Within one event `add` is applied first, then `remove`. Removal drops
/// every matching occurrence, so an item both added and removed by the same
/// event ends up absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub add: Vec<String>,
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub remove: Vec<String>,
}

impl ChangeSet {
    /// Creates a change set from add and remove lists.
    pub fn new<A, R>(add: A, remove: R) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            add: add.into_iter().map(Into::into).collect(),
            remove: remove.into_iter().map(Into::into).collect(),
        }
    }

    /// Change set that only adds.
    pub fn adding<A>(add: A) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
    {
        Self::new(add, Vec::<String>::new())
    }

    /// Change set that only removes.
    pub fn removing<R>(remove: R) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self::new(Vec::<String>::new(), remove)
    }

    /// Returns true if the change set touches nothing.
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }

    /// Applies this change set to `items`: append `add`, then drop every
    /// occurrence of anything in `remove`.
    pub fn apply_to(&self, items: &mut Vec<String>) {
        items.extend(self.add.iter().cloned());
        if !self.remove.is_empty() {
            items.retain(|item| !self.remove.contains(item));
        }
    }
}

/// Builds a change set from an arbitrary JSON value, tolerating malformed
/// shapes. Non-object values produce an empty change set.
impl From<&Value> for ChangeSet {
    fn from(value: &Value) -> Self {
        match value {
            Value::Object(map) => Self {
                add: map.get("add").map(scalar_list).unwrap_or_default(),
                remove: map.get("remove").map(scalar_list).unwrap_or_default(),
            },
            _ => Self::default(),
        }
    }
}

/// Coerces a JSON value into a list of strings.
///
/// Strings are kept verbatim, numbers and booleans are rendered, `null`,
/// nested arrays and objects are dropped.
pub fn scalar_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(scalar_to_string).collect(),
        other => scalar_to_string(other).into_iter().collect(),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_list(&value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_apply_add_then_remove() {
        let mut items = vec!["map".to_string()];
        ChangeSet::new(["sword"], ["sword"]).apply_to(&mut items);
        assert_eq!(items, vec!["map"]);
    }

    #[test]
    fn test_remove_drops_all_occurrences() {
        let mut items = vec!["coin".to_string(), "key".to_string(), "coin".to_string()];
        ChangeSet::removing(["coin"]).apply_to(&mut items);
        assert_eq!(items, vec!["key"]);
    }

    #[test]
    fn test_add_keeps_duplicates() {
        let mut items = vec!["coin".to_string()];
        ChangeSet::adding(["coin"]).apply_to(&mut items);
        assert_eq!(items, vec!["coin", "coin"]);
    }

    #[test]
    fn test_bare_scalar_is_coerced() {
        let changes: ChangeSet = serde_json::from_str(r#"{"add": "lantern", "remove": null}"#).unwrap();
        assert_eq!(changes.add, vec!["lantern"]);
        assert!(changes.remove.is_empty());
    }

    #[test]
    fn test_numbers_are_rendered() {
        let changes: ChangeSet = serde_json::from_value(json!({"add": [3, "rope", {"x": 1}]})).unwrap();
        assert_eq!(changes.add, vec!["3", "rope"]);
    }

    #[test]
    fn test_from_malformed_value() {
        assert!(ChangeSet::from(&json!("nonsense")).is_empty());
        let changes = ChangeSet::from(&json!({"remove": "map"}));
        assert_eq!(changes.remove, vec!["map"]);
    }

    #[test]
    fn test_empty_lists_are_omitted() {
        let json = serde_json::to_string(&ChangeSet::adding(["rope"])).unwrap();
        assert_eq!(json, r#"{"add":["rope"]}"#);
    }
}
