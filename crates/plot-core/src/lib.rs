//! Timeline engine core: cumulative state derivation and the story store.
//!
//! # Modules
//!
//! - [`cumulative`]: folds character state through events in story-time order
//! - [`store`]: the single-writer story store with undo/redo
//! - [`history`]: bounded undo/redo ring buffer
//! - [`storage`]: key-value persistence for stories
//! - [`config`]: TOML store configuration

pub mod config;
pub mod cumulative;
pub mod history;
pub mod storage;
pub mod store;

pub use config::{ConfigError, StoreConfig};
pub use cumulative::{derive_story, recompute, snapshot_at, CharacterSnapshot};
pub use history::{History, DEFAULT_HISTORY_LIMIT};
pub use storage::{
    FileStorage, MemoryStorage, StorageError, StoryStorage, STORY_KEY, TUTORIAL_COMPLETED_KEY,
};
pub use store::{StoreError, TimelineStore};
