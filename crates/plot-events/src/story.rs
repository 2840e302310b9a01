//! Story Types
//!
//! The Story aggregate: characters, their events, connections, the timeline
//! header and the source narrative. This is also the import/export format.

use serde::{Deserialize, Serialize};

use crate::{Character, Connection, Event, Narrative, NarrativeSection};

/// Id of a freshly created, empty story.
pub const DEFAULT_STORY_ID: &str = "new-story";

/// Title of a freshly created, empty story.
pub const DEFAULT_STORY_TITLE: &str = "Untitled Story";

/// Number of timeline slots in a fresh story.
pub const DEFAULT_TIMELINE_LENGTH: usize = 20;

/// One slot on the timeline header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeStep {
    pub step: i64,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl TimeStep {
    /// Creates a time step without a timestamp.
    pub fn new(step: i64, label: impl Into<String>) -> Self {
        Self {
            step,
            label: label.into(),
            timestamp: None,
        }
    }
}

/// Builds the default timeline: a `Day N` label every fifth slot, hourly
/// labels (`10:00`..`14:00`) in between.
pub fn default_timeline(length: usize) -> Vec<TimeStep> {
    (0..length)
        .map(|i| {
            let label = if i % 5 == 0 {
                format!("Day {}", i / 5 + 1)
            } else {
                format!("{}:00", 10 + i % 5)
            };
            TimeStep::new(i as i64, label)
        })
        .collect()
}

/// The whole story aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub characters: Vec<Character>,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub timeline: Vec<TimeStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<Narrative>,
}

impl Default for Story {
    fn default() -> Self {
        Self::empty(DEFAULT_TIMELINE_LENGTH)
    }
}

impl Story {
    /// Creates an empty story with a default timeline of `timeline_length`
    /// slots.
    pub fn empty(timeline_length: usize) -> Self {
        Self {
            id: DEFAULT_STORY_ID.to_string(),
            title: DEFAULT_STORY_TITLE.to_string(),
            characters: Vec::new(),
            events: Vec::new(),
            connections: Vec::new(),
            timeline: default_timeline(timeline_length),
            narrative: None,
        }
    }

    /// Looks up a character by id.
    pub fn character(&self, id: &str) -> Option<&Character> {
        self.characters.iter().find(|c| c.id == id)
    }

    /// Looks up an event by id.
    pub fn event(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Returns a character's events in array order.
    pub fn events_for_character<'a>(&'a self, character_id: &'a str) -> impl Iterator<Item = &'a Event> + 'a {
        self.events.iter().filter(move |e| e.character_id == character_id)
    }

    /// Returns every connection with `event_id` at either end.
    pub fn connections_for_event<'a>(&'a self, event_id: &'a str) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections.iter().filter(move |c| c.touches(event_id))
    }

    /// Resolves a narrative section id. Missing narrative or unknown id
    /// resolves to nothing.
    pub fn section(&self, section_id: &str) -> Option<&NarrativeSection> {
        self.narrative.as_ref().and_then(|n| n.section(section_id))
    }

    /// Highest `time_step` among events, if any.
    pub fn max_time_step(&self) -> Option<i64> {
        self.events.iter().map(|e| e.time_step).max()
    }

    /// Connections whose endpoints do not both name an existing event.
    pub fn dangling_connections(&self) -> Vec<&Connection> {
        self.connections
            .iter()
            .filter(|c| self.event(&c.source_event_id).is_none() || self.event(&c.target_event_id).is_none())
            .collect()
    }

    /// Serializes to pretty-printed JSON (the export format).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parses a story from JSON (the import format).
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChangeSet, Narrative, NarrativeRef, TimeType};

    fn sample() -> Story {
        let mut story = Story::empty(3);
        story.characters.push(
            Character::new("c1", "Mira", "#ef4444")
                .with_state("mood", "calm")
                .with_state("hp", 12)
                .with_inventory(["map"]),
        );
        let mut event = Event::new("e1", "c1", 0, "burns the map")
            .with_item_changes(ChangeSet::removing(["map"]))
            .with_state_change("hp", 10.5)
            .with_narrative_position(2);
        event.time_type = Some(TimeType::Flashback);
        event.narrative_refs = Some(vec![NarrativeRef {
            section_id: "s0".to_string(),
            confidence: 0.8,
            extracted_text: "The map curled in the fire.".to_string(),
        }]);
        story.events.push(event);
        story.connections.push(Connection::new("k1", "e1", "e1", "causes"));
        story.narrative = Some(Narrative::new("The map curled in the fire."));
        story
    }

    #[test]
    fn test_default_timeline_labels() {
        let timeline = default_timeline(7);
        let labels: Vec<&str> = timeline.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["Day 1", "11:00", "12:00", "13:00", "14:00", "Day 2", "11:00"]);
    }

    #[test]
    fn test_empty_story() {
        let story = Story::default();
        assert_eq!(story.id, "new-story");
        assert_eq!(story.title, "Untitled Story");
        assert_eq!(story.timeline.len(), 20);
        assert!(story.max_time_step().is_none());
    }

    #[test]
    fn test_json_roundtrip() {
        let story = sample();
        let json = story.to_json().unwrap();
        let parsed = Story::from_json(&json).unwrap();
        assert_eq!(parsed, story);
    }

    #[test]
    fn test_lookups() {
        let story = sample();
        assert_eq!(story.character("c1").unwrap().name, "Mira");
        assert_eq!(story.events_for_character("c1").count(), 1);
        assert_eq!(story.connections_for_event("e1").count(), 1);
        assert!(story.section("s0").is_none());
        assert!(story.dangling_connections().is_empty());
    }

    #[test]
    fn test_missing_collections_default() {
        let story = Story::from_json(r#"{"id": "x", "title": "Y"}"#).unwrap();
        assert!(story.events.is_empty());
        assert!(story.narrative.is_none());
    }
}
