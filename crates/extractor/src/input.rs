//! Extraction input types.
//!
//! The shape a generative model is asked to produce. Nothing here is
//! trusted: every field is read defensively from a [`serde_json::Value`],
//! and anything absent or of the wrong type degrades to an empty default.

use serde_json::Value;

use plot_events::changes::scalar_list;
use plot_events::{ChangeSet, StateMap, TimeType};

/// A character as described by the extraction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedCharacter {
    pub name: String,
    pub initial_location: String,
    pub initial_state: StateMap,
    pub inventory: Vec<String>,
}

/// An event as described by the extraction. Array order is chronological.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedEvent {
    /// Actor name
    pub who: String,
    /// Action text
    pub what: String,
    pub location: Option<String>,
    pub dialogue: Option<String>,
    pub state_change: Option<StateMap>,
    pub item_changes: Option<ChangeSet>,
    pub knowledge_changes: Option<ChangeSet>,
    pub time_type: Option<TimeType>,
    /// 1-based telling order
    pub narrative_position: Option<i64>,
    pub estimated_time: Option<String>,
    /// Verbatim excerpt of the narrative this event came from
    pub source_text: Option<String>,
}

/// A causal link between two events, by narrative position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedConnection {
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub connection_type: Option<String>,
    pub description: Option<String>,
}

/// The complete extraction result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedData {
    pub characters: Vec<ExtractedCharacter>,
    pub events: Vec<ExtractedEvent>,
    pub connections: Vec<ExtractedConnection>,
}

impl ExtractedData {
    /// Reads an extraction result. Missing top-level arrays are empty.
    pub fn from_value(value: &Value) -> Self {
        Self {
            characters: items(value, "characters")
                .map(ExtractedCharacter::from_value)
                .collect(),
            events: items(value, "events").map(ExtractedEvent::from_value).collect(),
            connections: items(value, "connections")
                .map(ExtractedConnection::from_value)
                .collect(),
        }
    }
}

impl ExtractedCharacter {
    pub fn from_value(value: &Value) -> Self {
        Self {
            name: string(value, "name").unwrap_or_default(),
            initial_location: string(value, "initial_location").unwrap_or_default(),
            initial_state: map(value, "initial_state").unwrap_or_default(),
            inventory: value.get("inventory").map(scalar_list).unwrap_or_default(),
        }
    }
}

impl ExtractedEvent {
    pub fn from_value(value: &Value) -> Self {
        Self {
            who: string(value, "who").unwrap_or_default(),
            what: string(value, "what").unwrap_or_default(),
            location: string(value, "where"),
            dialogue: string(value, "dialogue"),
            state_change: map(value, "state_change"),
            item_changes: value.get("item_changes").map(ChangeSet::from),
            knowledge_changes: value.get("knowledge_changes").map(ChangeSet::from),
            time_type: value
                .get("time_type")
                .and_then(|v| serde_json::from_value(v.clone()).ok()),
            narrative_position: integer(value, "narrative_position"),
            estimated_time: string(value, "estimated_time"),
            source_text: string(value, "source_text"),
        }
    }
}

impl ExtractedConnection {
    /// Accepts both `from_event`/`to_event` and the shorter `from`/`to`.
    pub fn from_value(value: &Value) -> Self {
        Self {
            from: integer(value, "from_event").or_else(|| integer(value, "from")),
            to: integer(value, "to_event").or_else(|| integer(value, "to")),
            connection_type: string(value, "type"),
            description: string(value, "description"),
        }
    }
}

fn items<'a>(value: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> + 'a {
    value
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn string(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn map(value: &Value, key: &str) -> Option<StateMap> {
    value.get(key)?.as_object().cloned()
}

/// Reads an integer, accepting whole floats and numeric strings.
fn integer(value: &Value, key: &str) -> Option<i64> {
    match value.get(key)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_event() {
        let event = ExtractedEvent::from_value(&json!({
            "who": "Ada",
            "what": "burns the map",
            "where": "harbor",
            "state_change": {"mood": "grim"},
            "item_changes": {"remove": "map"},
            "narrative_position": 2,
            "estimated_time": "dusk",
            "time_type": "flashback",
            "source_text": "The map burned."
        }));
        assert_eq!(event.who, "Ada");
        assert_eq!(event.location.as_deref(), Some("harbor"));
        assert_eq!(event.item_changes.unwrap().remove, vec!["map"]);
        assert_eq!(event.narrative_position, Some(2));
        assert_eq!(event.time_type, Some(TimeType::Flashback));
    }

    #[test]
    fn test_malformed_fields_degrade() {
        let event = ExtractedEvent::from_value(&json!({
            "who": null,
            "state_change": "angry",
            "narrative_position": "three",
            "time_type": "sometime"
        }));
        assert_eq!(event.who, "");
        assert!(event.state_change.is_none());
        assert!(event.narrative_position.is_none());
        assert!(event.time_type.is_none());
    }

    #[test]
    fn test_connection_key_aliases() {
        let long = ExtractedConnection::from_value(&json!({"from_event": 1, "to_event": "2", "type": "enables"}));
        assert_eq!((long.from, long.to), (Some(1), Some(2)));
        let short = ExtractedConnection::from_value(&json!({"from": 3.0, "to": 4}));
        assert_eq!((short.from, short.to), (Some(3), Some(4)));
        assert!(short.connection_type.is_none());
    }

    #[test]
    fn test_missing_arrays_are_empty() {
        let data = ExtractedData::from_value(&json!({"characters": [{"name": "Ada"}]}));
        assert_eq!(data.characters.len(), 1);
        assert!(data.events.is_empty());
        assert!(data.connections.is_empty());

        assert_eq!(ExtractedData::from_value(&json!([1, 2])), ExtractedData::default());
    }

    #[test]
    fn test_non_object_entries_keep_their_slot() {
        let data = ExtractedData::from_value(&json!({"events": [null, {"what": "x"}]}));
        assert_eq!(data.events.len(), 2);
        assert_eq!(data.events[1].what, "x");
    }
}
