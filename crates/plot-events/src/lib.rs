//! Shared story types and serialization for the timeline engine.
//!
//! This crate contains pure data structures with no derivation logic.
//! It is a dependency for all other crates in the workspace.

pub mod changes;
pub mod character;
pub mod event;
pub mod narrative;
pub mod palette;
pub mod story;

#[cfg(feature = "test-fixtures")]
pub mod fixtures;

// Re-export change types
pub use changes::{ChangeSet, StateMap};

// Re-export character types
pub use character::{Character, CharacterPatch};

// Re-export event types
pub use event::*;

// Re-export narrative types
pub use narrative::{Narrative, NarrativeSection};

// Re-export palette types
pub use palette::{Palette, PaletteCursor, DEFAULT_CHARACTER_COLORS};

// Re-export story types
pub use story::{
    default_timeline, Story, TimeStep, DEFAULT_STORY_ID, DEFAULT_STORY_TITLE,
    DEFAULT_TIMELINE_LENGTH,
};

/// Generates a fresh random identifier for characters, events and connections.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
