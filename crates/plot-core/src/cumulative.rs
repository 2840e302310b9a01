//! Cumulative state derivation.
//!
//! Folds each character's initial state, inventory and knowledge through
//! their events in story-time order and stamps the running result onto every
//! event. The fold is a pure transform: inputs are never modified and every
//! stamped snapshot is an independent copy.

use std::collections::HashMap;

use plot_events::{Character, Event, StateMap, Story};

/// A character's full derived state at some point in story-time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CharacterSnapshot {
    pub state: StateMap,
    pub inventory: Vec<String>,
    pub knowledge: Vec<String>,
}

impl CharacterSnapshot {
    fn from_character(character: &Character) -> Self {
        Self {
            state: character.initial_state.clone(),
            inventory: character.inventory.clone(),
            knowledge: character.knowledge.clone(),
        }
    }

    /// Applies one event's deltas: state merge, then inventory add/remove,
    /// then knowledge add/remove.
    fn apply(&mut self, event: &Event) {
        if let Some(change) = &event.state_change {
            for (key, value) in change {
                self.state.insert(key.clone(), value.clone());
            }
        }
        if let Some(items) = &event.item_changes {
            items.apply_to(&mut self.inventory);
        }
        if let Some(knowledge) = &event.knowledge_changes {
            knowledge.apply_to(&mut self.knowledge);
        }
    }

    fn stamp(&self, event: &mut Event) {
        event.cumulative_state = self.state.clone();
        event.cumulative_inventory = self.inventory.clone();
        event.cumulative_knowledge = self.knowledge.clone();
    }
}

fn initial_tracks(characters: &[Character]) -> HashMap<String, CharacterSnapshot> {
    characters
        .iter()
        .map(|c| (c.id.clone(), CharacterSnapshot::from_character(c)))
        .collect()
}

/// Sorts events by `time_step`, keeping array order for ties.
fn chronological(events: &[Event]) -> Vec<Event> {
    let mut ordered = events.to_vec();
    ordered.sort_by_key(|e| e.time_step);
    ordered
}

/// Returns a new event list, in fold order, with every `cumulative_*` field
/// re-derived.
///
/// Events whose character is unknown fold from an empty starting state.
pub fn recompute(characters: &[Character], events: &[Event]) -> Vec<Event> {
    let mut tracks = initial_tracks(characters);
    let mut ordered = chronological(events);

    for event in &mut ordered {
        let track = tracks.entry(event.character_id.clone()).or_insert_with(|| {
            tracing::trace!(character_id = %event.character_id, "folding event for unknown character");
            CharacterSnapshot::default()
        });
        track.apply(event);
        track.stamp(event);
    }

    ordered
}

/// Returns `story` with its events re-derived.
pub fn derive_story(story: Story) -> Story {
    let events = recompute(&story.characters, &story.events);
    Story { events, ..story }
}

/// Computes a character's state as of `time_step`, including every event at
/// that step. Works for steps with no event of that character.
pub fn snapshot_at(
    characters: &[Character],
    events: &[Event],
    character_id: &str,
    time_step: i64,
) -> CharacterSnapshot {
    let mut snapshot = characters
        .iter()
        .rev()
        .find(|c| c.id == character_id)
        .map(CharacterSnapshot::from_character)
        .unwrap_or_default();

    for event in chronological(events)
        .iter()
        .filter(|e| e.character_id == character_id && e.time_step <= time_step)
    {
        snapshot.apply(event);
    }
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use plot_events::ChangeSet;
    use serde_json::json;

    fn ada() -> Character {
        Character::new("a", "Ada", "#ef4444")
            .with_state("mood", "calm")
            .with_inventory(["map"])
    }

    #[test]
    fn test_scenario_remove_then_mood() {
        let events = vec![
            Event::new("e0", "a", 0, "burns map").with_item_changes(ChangeSet::removing(["map"])),
            Event::new("e1", "a", 1, "hears steps").with_state_change("mood", "tense"),
        ];
        let derived = recompute(&[ada()], &events);

        assert!(derived[0].cumulative_inventory.is_empty());
        assert_eq!(derived[0].cumulative_state["mood"], json!("calm"));
        assert_eq!(derived[1].cumulative_state["mood"], json!("tense"));
        assert!(derived[1].cumulative_inventory.is_empty());
    }

    #[test]
    fn test_out_of_order_input_folds_chronologically() {
        let events = vec![
            Event::new("e2", "a", 2, "third").with_item_changes(ChangeSet::adding(["c"])),
            Event::new("e0", "a", 0, "first").with_item_changes(ChangeSet::adding(["a"])),
            Event::new("e1", "a", 1, "second").with_item_changes(ChangeSet::adding(["b"])),
        ];
        let derived = recompute(&[Character::new("a", "Ada", "")], &events);

        let ids: Vec<&str> = derived.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e0", "e1", "e2"]);
        assert_eq!(derived[2].cumulative_inventory, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_ties_keep_array_order() {
        let events = vec![
            Event::new("first", "a", 1, "").with_state_change("mood", "angry"),
            Event::new("second", "a", 1, "").with_state_change("mood", "sad"),
        ];
        let derived = recompute(&[ada()], &events);
        assert_eq!(derived[0].id, "first");
        assert_eq!(derived[1].cumulative_state["mood"], json!("sad"));
    }

    #[test]
    fn test_remove_wins_within_one_event() {
        let events = vec![Event::new("e0", "a", 0, "")
            .with_item_changes(ChangeSet::new(["sword"], ["sword"]))];
        let derived = recompute(&[ada()], &events);
        assert_eq!(derived[0].cumulative_inventory, vec!["map"]);
    }

    #[test]
    fn test_unknown_character_starts_empty() {
        let events = vec![Event::new("e0", "ghost", 0, "").with_knowledge_changes(ChangeSet::adding(["boo"]))];
        let derived = recompute(&[], &events);
        assert_eq!(derived[0].cumulative_knowledge, vec!["boo"]);
        assert!(derived[0].cumulative_state.is_empty());
    }

    #[test]
    fn test_inputs_are_untouched() {
        let characters = vec![ada()];
        let events = vec![Event::new("e0", "a", 0, "").with_state_change("mood", "tense")];
        let _ = recompute(&characters, &events);
        assert!(events[0].cumulative_state.is_empty());
        assert_eq!(characters[0].initial_state["mood"], json!("calm"));
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let events = vec![
            Event::new("e1", "a", 1, "").with_state_change("mood", "tense"),
            Event::new("e0", "a", 0, "").with_item_changes(ChangeSet::adding(["coin"])),
        ];
        let once = recompute(&[ada()], &events);
        let twice = recompute(&[ada()], &once);
        assert_eq!(
            serde_json::to_string(&once).unwrap(),
            serde_json::to_string(&twice).unwrap()
        );
    }

    #[test]
    fn test_stamped_snapshots_are_independent() {
        let events = vec![
            Event::new("e0", "a", 0, "").with_item_changes(ChangeSet::adding(["coin"])),
            Event::new("e1", "a", 1, "").with_item_changes(ChangeSet::removing(["coin"])),
        ];
        let derived = recompute(&[ada()], &events);
        assert_eq!(derived[0].cumulative_inventory, vec!["map", "coin"]);
        assert_eq!(derived[1].cumulative_inventory, vec!["map"]);
    }

    #[test]
    fn test_snapshot_at_between_events() {
        let events = vec![
            Event::new("e0", "a", 0, "").with_state_change("mood", "wary"),
            Event::new("e5", "a", 5, "").with_state_change("mood", "tense"),
        ];
        let characters = [ada()];
        assert_eq!(snapshot_at(&characters, &events, "a", -1).state["mood"], json!("calm"));
        assert_eq!(snapshot_at(&characters, &events, "a", 3).state["mood"], json!("wary"));
        assert_eq!(snapshot_at(&characters, &events, "a", 5).state["mood"], json!("tense"));
        assert!(snapshot_at(&characters, &events, "nobody", 5).inventory.is_empty());
    }
}
