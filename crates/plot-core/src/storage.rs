//! Durable story storage.
//!
//! A small key-value contract: the serialized story lives under
//! [`STORY_KEY`], the onboarding flag under [`TUTORIAL_COMPLETED_KEY`].

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use plot_events::Story;

/// Key holding the serialized story.
pub const STORY_KEY: &str = "plotline-storage";

/// Key holding the onboarding-completed flag.
pub const TUTORIAL_COMPLETED_KEY: &str = "plotline_tutorial_completed";

/// Errors raised by storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Key-value persistence for stories.
pub trait StoryStorage {
    /// Reads the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;

    /// Loads the stored story, if any.
    fn load_story(&self) -> Result<Option<Story>, StorageError> {
        match self.get(STORY_KEY)? {
            Some(json) => Ok(Some(Story::from_json(&json)?)),
            None => Ok(None),
        }
    }

    /// Saves `story` under [`STORY_KEY`].
    fn save_story(&mut self, story: &Story) -> Result<(), StorageError> {
        let json = serde_json::to_string(story)?;
        self.set(STORY_KEY, &json)
    }

    /// Forgets the stored story.
    fn clear_story(&mut self) -> Result<(), StorageError> {
        self.remove(STORY_KEY)
    }

    /// Returns true once onboarding has been completed.
    fn tutorial_completed(&self) -> Result<bool, StorageError> {
        Ok(self.get(TUTORIAL_COMPLETED_KEY)?.as_deref() == Some("true"))
    }

    /// Sets or clears the onboarding flag.
    fn set_tutorial_completed(&mut self, completed: bool) -> Result<(), StorageError> {
        if completed {
            self.set(TUTORIAL_COMPLETED_KEY, "true")
        } else {
            self.remove(TUTORIAL_COMPLETED_KEY)
        }
    }
}

/// In-memory storage, useful for tests and ephemeral sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoryStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Directory-backed storage: one `<key>.json` file per key.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Opens (and creates if needed) a storage directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Storage directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.root.join(format!("{file_name}.json"))
    }
}

impl StoryStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        // Readers never observe a partially written file.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        tracing::debug!("Stored {} bytes under {:?}", value.len(), path);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_memory_storage_story() {
        let mut storage = MemoryStorage::new();
        assert!(storage.load_story().unwrap().is_none());

        let story = Story::default();
        storage.save_story(&story).unwrap();
        assert_eq!(storage.load_story().unwrap(), Some(story));
    }

    #[test]
    fn test_tutorial_flag() {
        let mut storage = MemoryStorage::new();
        assert!(!storage.tutorial_completed().unwrap());
        storage.set_tutorial_completed(true).unwrap();
        assert!(storage.tutorial_completed().unwrap());
        storage.set_tutorial_completed(false).unwrap();
        assert!(!storage.tutorial_completed().unwrap());
    }

    #[test]
    fn test_file_storage_roundtrip() {
        let dir = tempdir().unwrap();
        let mut storage = FileStorage::open(dir.path().join("data")).unwrap();

        let mut story = Story::default();
        story.title = "Saved".to_string();
        storage.save_story(&story).unwrap();

        let reopened = FileStorage::open(dir.path().join("data")).unwrap();
        assert_eq!(reopened.load_story().unwrap().unwrap().title, "Saved");
        assert!(dir.path().join("data/plotline-storage.json").exists());

        let mut reopened = reopened;
        reopened.clear_story().unwrap();
        assert!(reopened.load_story().unwrap().is_none());
        assert!(!dir.path().join("data/plotline-storage.json").exists());
    }

    #[test]
    fn test_file_storage_remove_missing_key() {
        let dir = tempdir().unwrap();
        let mut storage = FileStorage::open(dir.path()).unwrap();
        storage.remove("never-written").unwrap();
        assert!(storage.get("never-written").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_story_is_an_error() {
        let mut storage = MemoryStorage::new();
        storage.set(STORY_KEY, "{not json").unwrap();
        assert!(matches!(storage.load_story(), Err(StorageError::Json(_))));
    }
}
