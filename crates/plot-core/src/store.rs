//! Timeline store.
//!
//! Owns the canonical [`Story`] and is its only writer. Every mutation
//! follows the same pattern:
//!
//! 1. clone the affected lists
//! 2. apply the structural change
//! 3. re-derive cumulative state over the full character/event set
//! 4. swap the new story in and record the old one as an undo point
//!
//! Readers only ever see a story whose cumulative fields match its
//! structure.

use plot_events::{
    connection_types, generate_id, Character, CharacterPatch, Connection, Event, EventDraft,
    EventPatch, Narrative, Palette, PaletteCursor, Story,
};

use crate::config::StoreConfig;
use crate::cumulative::{derive_story, recompute};
use crate::history::History;
use crate::storage::{StorageError, StoryStorage};

/// Errors from import, export and persistence.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid story payload: {0}")]
    Import(#[source] serde_json::Error),
    #[error("failed to serialize story: {0}")]
    Export(#[source] serde_json::Error),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// An undo point: the story plus the color cycle position it was built
/// with.
#[derive(Debug, Clone, Default)]
struct Checkpoint {
    story: Story,
    palette_cursor: PaletteCursor,
}

/// The single writer of the story aggregate.
#[derive(Debug)]
pub struct TimelineStore {
    story: Story,
    /// UI cursor; not persisted, not part of history
    selected_event_id: Option<String>,
    history: History<Checkpoint>,
    palette: Palette,
    palette_cursor: PaletteCursor,
    timeline_length: usize,
}

impl Default for TimelineStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl TimelineStore {
    /// Creates a store holding an empty story.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            story: Story::empty(config.default_timeline_length),
            selected_event_id: None,
            history: History::new(config.history_limit),
            palette: config.palette,
            palette_cursor: PaletteCursor::default(),
            timeline_length: config.default_timeline_length,
        }
    }

    /// Creates a store around an existing story, deriving its cumulative
    /// state first. The initial story is not an undo point.
    pub fn with_story(config: StoreConfig, story: Story) -> Self {
        let mut store = Self::new(config);
        store.story = derive_story(story);
        store
    }

    /// Restores the story saved in `storage`, or starts empty if none was
    /// saved.
    pub fn restore(storage: &impl StoryStorage, config: StoreConfig) -> Result<Self, StoreError> {
        match storage.load_story()? {
            Some(story) => {
                tracing::info!(
                    "Restored story {:?} ({} characters, {} events)",
                    story.id,
                    story.characters.len(),
                    story.events.len()
                );
                Ok(Self::with_story(config, story))
            }
            None => Ok(Self::new(config)),
        }
    }

    /// Writes the current story to `storage`.
    pub fn persist(&self, storage: &mut impl StoryStorage) -> Result<(), StoreError> {
        storage.save_story(&self.story)?;
        Ok(())
    }

    /// The current story.
    pub fn story(&self) -> &Story {
        &self.story
    }

    /// Id of the selected event, if any.
    pub fn selected_event_id(&self) -> Option<&str> {
        self.selected_event_id.as_deref()
    }

    /// The selected event, if it still exists.
    pub fn selected_event(&self) -> Option<&Event> {
        self.selected_event_id
            .as_deref()
            .and_then(|id| self.story.event(id))
    }

    /// Moves the selection cursor. Does not create an undo point.
    pub fn select_event(&mut self, event_id: Option<String>) {
        self.selected_event_id = event_id;
    }

    /// Current palette cursor position.
    pub fn palette_position(&self) -> usize {
        self.palette_cursor.position()
    }

    /// Restarts the character color cycle.
    pub fn reset_palette(&mut self) {
        self.palette_cursor.reset();
    }

    fn commit(&mut self, next: Story) {
        let previous = std::mem::replace(&mut self.story, next);
        self.history.record(Checkpoint {
            story: previous,
            palette_cursor: self.palette_cursor,
        });
    }

    fn restore_checkpoint(&mut self, checkpoint: Checkpoint) {
        self.story = checkpoint.story;
        self.palette_cursor = checkpoint.palette_cursor;
        self.prune_selection();
    }

    fn current_checkpoint(&mut self) -> Checkpoint {
        Checkpoint {
            story: std::mem::take(&mut self.story),
            palette_cursor: self.palette_cursor,
        }
    }

    fn commit_derived(&mut self, next: Story) {
        self.commit(derive_story(next));
    }

    fn prune_selection(&mut self) {
        if let Some(id) = &self.selected_event_id {
            if self.story.event(id).is_none() {
                self.selected_event_id = None;
            }
        }
    }

    /// Replaces the whole story (import, regeneration). Clears the
    /// selection.
    pub fn set_story(&mut self, story: Story) {
        tracing::debug!(
            "Replacing story with {:?} ({} characters, {} events)",
            story.id,
            story.characters.len(),
            story.events.len()
        );
        self.commit_derived(story);
        self.selected_event_id = None;
    }

    /// Replaces the whole story with an empty one and restarts the color
    /// cycle.
    pub fn reset(&mut self) {
        self.commit(Story::empty(self.timeline_length));
        self.selected_event_id = None;
        self.palette_cursor.reset();
    }

    /// Replaces the narrative text, keeping any existing sections.
    pub fn update_narrative(&mut self, text: impl Into<String>) {
        let sections = self
            .story
            .narrative
            .as_ref()
            .map(|n| n.sections.clone())
            .unwrap_or_default();
        let next = Story {
            narrative: Some(Narrative {
                text: text.into(),
                sections,
            }),
            ..self.story.clone()
        };
        self.commit(next);
    }

    /// Appends a character with the next palette color and empty state.
    /// Returns the new character's id.
    pub fn add_character(&mut self, name: impl Into<String>) -> String {
        let id = generate_id();
        let mut cursor = self.palette_cursor;
        let color = cursor.next_color(&self.palette);
        let mut characters = self.story.characters.clone();
        characters.push(Character::new(id.clone(), name, color));

        let events = recompute(&characters, &self.story.events);
        self.commit(Story {
            characters,
            events,
            ..self.story.clone()
        });
        self.palette_cursor = cursor;
        id
    }

    /// Shallow-merges `patch` into the character with `id`. Unknown ids
    /// change nothing and record no undo point.
    pub fn update_character(&mut self, id: &str, patch: &CharacterPatch) {
        if self.story.character(id).is_none() {
            tracing::debug!("Character {} not found; nothing to update", id);
            return;
        }
        let characters: Vec<Character> = self
            .story
            .characters
            .iter()
            .map(|c| {
                let mut c = c.clone();
                if c.id == id {
                    patch.apply(&mut c);
                }
                c
            })
            .collect();

        let events = recompute(&characters, &self.story.events);
        self.commit(Story {
            characters,
            events,
            ..self.story.clone()
        });
    }

    /// Removes a character together with its events and every connection
    /// touching those events.
    pub fn delete_character(&mut self, id: &str) {
        if self.story.character(id).is_none() && self.story.events_for_character(id).next().is_none() {
            tracing::debug!("Character {} not found; nothing to delete", id);
            return;
        }
        let characters: Vec<Character> = self
            .story
            .characters
            .iter()
            .filter(|c| c.id != id)
            .cloned()
            .collect();
        let (removed, kept): (Vec<&Event>, Vec<&Event>) =
            self.story.events.iter().partition(|e| e.character_id == id);
        let removed_ids: Vec<&str> = removed.iter().map(|e| e.id.as_str()).collect();
        let connections: Vec<Connection> = self
            .story
            .connections
            .iter()
            .filter(|c| !removed_ids.iter().any(|r| c.touches(r)))
            .cloned()
            .collect();
        let kept: Vec<Event> = kept.into_iter().cloned().collect();

        tracing::debug!(
            "Deleting character {} with {} events",
            id,
            removed_ids.len()
        );
        let events = recompute(&characters, &kept);
        self.commit(Story {
            characters,
            events,
            connections,
            ..self.story.clone()
        });
        self.prune_selection();
    }

    /// Adds an event built from `draft` and returns its id.
    ///
    /// If the draft names an existing source event, an `influence`
    /// connection from that event to the new one is added too.
    pub fn add_event(&mut self, draft: EventDraft) -> String {
        let id = generate_id();
        let (event, source_event_id) = draft.into_event(id.clone());

        let mut connections = self.story.connections.clone();
        if let Some(source) = source_event_id {
            if self.story.event(&source).is_some() {
                connections.push(Connection::new(
                    generate_id(),
                    source,
                    id.clone(),
                    connection_types::INFLUENCE,
                ));
            } else {
                tracing::warn!("Source event {} not found; no connection created", source);
            }
        }

        let mut events = self.story.events.clone();
        events.push(event);
        let events = recompute(&self.story.characters, &events);
        self.commit(Story {
            events,
            connections,
            ..self.story.clone()
        });
        id
    }

    /// Shallow-merges `patch` into the event with `id`. Unknown ids change
    /// nothing and record no undo point.
    pub fn update_event(&mut self, id: &str, patch: &EventPatch) {
        if self.story.event(id).is_none() {
            tracing::debug!("Event {} not found; nothing to update", id);
            return;
        }
        let events: Vec<Event> = self
            .story
            .events
            .iter()
            .map(|e| {
                let mut e = e.clone();
                if e.id == id {
                    patch.apply(&mut e);
                }
                e
            })
            .collect();

        let events = recompute(&self.story.characters, &events);
        self.commit(Story {
            events,
            ..self.story.clone()
        });
    }

    /// Removes the event with `id` and every connection touching it.
    pub fn delete_event(&mut self, id: &str) {
        if self.story.event(id).is_none() {
            tracing::debug!("Event {} not found; nothing to delete", id);
            return;
        }
        let events: Vec<Event> = self
            .story
            .events
            .iter()
            .filter(|e| e.id != id)
            .cloned()
            .collect();
        let connections: Vec<Connection> = self
            .story
            .connections
            .iter()
            .filter(|c| !c.touches(id))
            .cloned()
            .collect();

        let events = recompute(&self.story.characters, &events);
        self.commit(Story {
            events,
            connections,
            ..self.story.clone()
        });
        self.prune_selection();
    }

    /// Steps back one mutation. Returns false if there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        let current = self.current_checkpoint();
        let (checkpoint, moved) = match self.history.undo(current) {
            Ok(previous) => (previous, true),
            Err(current) => (current, false),
        };
        self.restore_checkpoint(checkpoint);
        moved
    }

    /// Re-applies one undone mutation. Returns false if there was nothing to
    /// redo.
    pub fn redo(&mut self) -> bool {
        let current = self.current_checkpoint();
        let (checkpoint, moved) = match self.history.redo(current) {
            Ok(next) => (next, true),
            Err(current) => (current, false),
        };
        self.restore_checkpoint(checkpoint);
        moved
    }

    /// Returns true if an undo step is available.
    pub fn can_undo(&self) -> bool {
        self.history.undo_len() > 0
    }

    /// Returns true if a redo step is available.
    pub fn can_redo(&self) -> bool {
        self.history.redo_len() > 0
    }

    /// Imports a serialized story.
    ///
    /// An invalid payload is logged and leaves the current story untouched.
    pub fn load_story(&mut self, json: &str) -> Result<(), StoreError> {
        match Story::from_json(json) {
            Ok(story) => {
                self.set_story(story);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to load story: {}", e);
                Err(StoreError::Import(e))
            }
        }
    }

    /// Serializes the current story in the import format.
    pub fn export_story(&self) -> Result<String, StoreError> {
        self.story.to_json().map_err(StoreError::Export)
    }
}
