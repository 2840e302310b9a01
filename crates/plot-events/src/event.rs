//! Event Types
//!
//! Events on a character's track, the causal connections between them, and
//! the draft/patch shapes used to create and edit them.

use serde::{Deserialize, Deserializer, Serialize};

use crate::{ChangeSet, StateMap};

/// Event type tag assigned when none is given.
pub const DEFAULT_EVENT_TYPE: &str = "action";

/// Common connection type tags.
pub mod connection_types {
    /// Source event directly causes the target
    pub const CAUSES: &str = "causes";
    /// Source event makes the target possible
    pub const ENABLES: &str = "enables";
    /// Source event sets off the target
    pub const TRIGGERS: &str = "triggers";
    /// Source event leads to the target
    pub const LEADS_TO: &str = "leads_to";
    /// Manually drawn link created alongside a new event
    pub const INFLUENCE: &str = "influence";
}

/// Display hint for how an event sits relative to the narration.
///
/// Has no effect on ordering; `time_step` alone decides that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeType {
    Present,
    Flashback,
    FlashForward,
    Memory,
}

/// Link from an event into a section of the narrative text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeRef {
    pub section_id: String,
    pub confidence: f64,
    #[serde(default)]
    pub extracted_text: String,
}

/// An event on one character's track.
///
/// The `cumulative_*` fields are derived. They are overwritten on every
/// recompute and must never be edited by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub character_id: String,
    /// Chronological position in story-time (not narration order)
    pub time_step: i64,
    #[serde(rename = "type", default = "default_event_type")]
    pub event_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_change: Option<StateMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_changes: Option<ChangeSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_changes: Option<ChangeSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialogue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_type: Option<TimeType>,
    /// 1-based order in which the event was told
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative_position: Option<i64>,
    /// Free-text time label ("5 years ago", "that night")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative_refs: Option<Vec<NarrativeRef>>,
    #[serde(default)]
    pub cumulative_state: StateMap,
    #[serde(default)]
    pub cumulative_inventory: Vec<String>,
    #[serde(default)]
    pub cumulative_knowledge: Vec<String>,
}

fn default_event_type() -> String {
    DEFAULT_EVENT_TYPE.to_string()
}

impl Event {
    /// Creates a bare event with no deltas.
    pub fn new(
        id: impl Into<String>,
        character_id: impl Into<String>,
        time_step: i64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            character_id: character_id.into(),
            time_step,
            event_type: default_event_type(),
            description: description.into(),
            state_change: None,
            location: None,
            item_changes: None,
            knowledge_changes: None,
            dialogue: None,
            time_type: None,
            narrative_position: None,
            estimated_time: None,
            narrative_refs: None,
            cumulative_state: StateMap::new(),
            cumulative_inventory: Vec::new(),
            cumulative_knowledge: Vec::new(),
        }
    }

    /// Sets one state delta key.
    pub fn with_state_change(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.state_change
            .get_or_insert_with(StateMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Sets the inventory delta.
    pub fn with_item_changes(mut self, changes: ChangeSet) -> Self {
        self.item_changes = Some(changes);
        self
    }

    /// Sets the knowledge delta.
    pub fn with_knowledge_changes(mut self, changes: ChangeSet) -> Self {
        self.knowledge_changes = Some(changes);
        self
    }

    /// Sets the narrative position.
    pub fn with_narrative_position(mut self, position: i64) -> Self {
        self.narrative_position = Some(position);
        self
    }

    /// Returns the first narrative ref, if any.
    pub fn primary_ref(&self) -> Option<&NarrativeRef> {
        self.narrative_refs.as_ref().and_then(|refs| refs.first())
    }

    /// Returns true if this event has a location change.
    pub fn moves(&self) -> bool {
        self.location.as_deref().is_some_and(|l| !l.is_empty())
    }
}

/// A directed edge between two events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: String,
    pub source_event_id: String,
    pub target_event_id: String,
    #[serde(rename = "type")]
    pub connection_type: String,
}

impl Connection {
    /// Creates a connection.
    pub fn new(
        id: impl Into<String>,
        source_event_id: impl Into<String>,
        target_event_id: impl Into<String>,
        connection_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_event_id: source_event_id.into(),
            target_event_id: target_event_id.into(),
            connection_type: connection_type.into(),
        }
    }

    /// Returns true if either endpoint is `event_id`.
    pub fn touches(&self, event_id: &str) -> bool {
        self.source_event_id == event_id || self.target_event_id == event_id
    }
}

/// Everything needed to create an event except its id and derived fields.
///
/// If `source_event_id` is set, the store also links the source event to the
/// new one with an `influence` connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    pub character_id: String,
    pub time_step: i64,
    #[serde(rename = "type", default = "default_event_type")]
    pub event_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub state_change: Option<StateMap>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub item_changes: Option<ChangeSet>,
    #[serde(default)]
    pub knowledge_changes: Option<ChangeSet>,
    #[serde(default)]
    pub dialogue: Option<String>,
    #[serde(default)]
    pub time_type: Option<TimeType>,
    #[serde(default)]
    pub narrative_position: Option<i64>,
    #[serde(default)]
    pub estimated_time: Option<String>,
    #[serde(default)]
    pub narrative_refs: Option<Vec<NarrativeRef>>,
    #[serde(default)]
    pub source_event_id: Option<String>,
}

impl EventDraft {
    /// Creates a draft with the required fields.
    pub fn new(character_id: impl Into<String>, time_step: i64, description: impl Into<String>) -> Self {
        Self {
            character_id: character_id.into(),
            time_step,
            event_type: default_event_type(),
            description: description.into(),
            state_change: None,
            location: None,
            item_changes: None,
            knowledge_changes: None,
            dialogue: None,
            time_type: None,
            narrative_position: None,
            estimated_time: None,
            narrative_refs: None,
            source_event_id: None,
        }
    }

    /// Links the new event to an existing source event.
    pub fn caused_by(mut self, source_event_id: impl Into<String>) -> Self {
        self.source_event_id = Some(source_event_id.into());
        self
    }

    /// Sets one state delta key.
    pub fn with_state_change(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.state_change
            .get_or_insert_with(StateMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Sets the inventory delta.
    pub fn with_item_changes(mut self, changes: ChangeSet) -> Self {
        self.item_changes = Some(changes);
        self
    }

    /// Sets the knowledge delta.
    pub fn with_knowledge_changes(mut self, changes: ChangeSet) -> Self {
        self.knowledge_changes = Some(changes);
        self
    }

    /// Turns the draft into an event with the given id, returning the source
    /// event id separately.
    pub fn into_event(self, id: impl Into<String>) -> (Event, Option<String>) {
        let event = Event {
            id: id.into(),
            character_id: self.character_id,
            time_step: self.time_step,
            event_type: self.event_type,
            description: self.description,
            state_change: self.state_change,
            location: self.location,
            item_changes: self.item_changes,
            knowledge_changes: self.knowledge_changes,
            dialogue: self.dialogue,
            time_type: self.time_type,
            narrative_position: self.narrative_position,
            estimated_time: self.estimated_time,
            narrative_refs: self.narrative_refs,
            cumulative_state: StateMap::new(),
            cumulative_inventory: Vec::new(),
            cumulative_knowledge: Vec::new(),
        };
        (event, self.source_event_id)
    }
}

/// Partial update for an event.
///
/// Outer `None` leaves a field untouched. For optional fields, `Some(None)`
/// clears the field and `Some(Some(v))` sets it. Derived fields and the id
/// cannot be patched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventPatch {
    pub character_id: Option<String>,
    pub time_step: Option<i64>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub description: Option<String>,
    #[serde(deserialize_with = "double_option")]
    pub state_change: Option<Option<StateMap>>,
    #[serde(deserialize_with = "double_option")]
    pub location: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub item_changes: Option<Option<ChangeSet>>,
    #[serde(deserialize_with = "double_option")]
    pub knowledge_changes: Option<Option<ChangeSet>>,
    #[serde(deserialize_with = "double_option")]
    pub dialogue: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub time_type: Option<Option<TimeType>>,
    #[serde(deserialize_with = "double_option")]
    pub narrative_position: Option<Option<i64>>,
    #[serde(deserialize_with = "double_option")]
    pub estimated_time: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub narrative_refs: Option<Option<Vec<NarrativeRef>>>,
}

impl EventPatch {
    /// Shallow-merges this patch into `event`.
    pub fn apply(&self, event: &mut Event) {
        if let Some(character_id) = &self.character_id {
            event.character_id = character_id.clone();
        }
        if let Some(time_step) = self.time_step {
            event.time_step = time_step;
        }
        if let Some(event_type) = &self.event_type {
            event.event_type = event_type.clone();
        }
        if let Some(description) = &self.description {
            event.description = description.clone();
        }
        merge(&mut event.state_change, &self.state_change);
        merge(&mut event.location, &self.location);
        merge(&mut event.item_changes, &self.item_changes);
        merge(&mut event.knowledge_changes, &self.knowledge_changes);
        merge(&mut event.dialogue, &self.dialogue);
        merge(&mut event.time_type, &self.time_type);
        merge(&mut event.narrative_position, &self.narrative_position);
        merge(&mut event.estimated_time, &self.estimated_time);
        merge(&mut event.narrative_refs, &self.narrative_refs);
    }
}

fn merge<T: Clone>(slot: &mut Option<T>, update: &Option<Option<T>>) {
    if let Some(value) = update {
        *slot = value.clone();
    }
}

/// Distinguishes an explicit `null` (clear) from a missing key (keep).
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
