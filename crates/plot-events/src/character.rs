//! Character Types

use serde::{Deserialize, Serialize};

use crate::StateMap;

/// A character owning a track of events.
///
/// The `initial_*` values are the starting point every cumulative snapshot is
/// folded from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: String,
    pub name: String,
    /// Display color, e.g. `#ef4444`
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub initial_location: String,
    #[serde(default)]
    pub initial_state: StateMap,
    /// Starting inventory (ordered, duplicates allowed)
    #[serde(default)]
    pub inventory: Vec<String>,
    /// Starting knowledge (ordered)
    #[serde(default)]
    pub knowledge: Vec<String>,
}

impl Character {
    /// Creates a character with empty state, inventory and knowledge.
    pub fn new(id: impl Into<String>, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: color.into(),
            initial_location: String::new(),
            initial_state: StateMap::new(),
            inventory: Vec::new(),
            knowledge: Vec::new(),
        }
    }

    /// Sets the starting location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.initial_location = location.into();
        self
    }

    /// Sets one starting state key.
    pub fn with_state(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.initial_state.insert(key.into(), value.into());
        self
    }

    /// Sets the starting inventory.
    pub fn with_inventory<I>(mut self, items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.inventory = items.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the starting knowledge.
    pub fn with_knowledge<I>(mut self, facts: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.knowledge = facts.into_iter().map(Into::into).collect();
        self
    }
}

/// Partial update for a character. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterPatch {
    pub name: Option<String>,
    pub color: Option<String>,
    pub initial_location: Option<String>,
    pub initial_state: Option<StateMap>,
    pub inventory: Option<Vec<String>>,
    pub knowledge: Option<Vec<String>>,
}

impl CharacterPatch {
    /// Shallow-merges this patch into `character`. Map fields are replaced
    /// whole, not merged key by key.
    pub fn apply(&self, character: &mut Character) {
        if let Some(name) = &self.name {
            character.name = name.clone();
        }
        if let Some(color) = &self.color {
            character.color = color.clone();
        }
        if let Some(location) = &self.initial_location {
            character.initial_location = location.clone();
        }
        if let Some(state) = &self.initial_state {
            character.initial_state = state.clone();
        }
        if let Some(inventory) = &self.inventory {
            character.inventory = inventory.clone();
        }
        if let Some(knowledge) = &self.knowledge {
            character.knowledge = knowledge.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_replaces_only_given_fields() {
        let mut character = Character::new("c1", "Mira", "#ef4444")
            .with_location("harbor")
            .with_inventory(["map"]);

        let patch = CharacterPatch {
            name: Some("Mira the Elder".to_string()),
            inventory: Some(vec![]),
            ..Default::default()
        };
        patch.apply(&mut character);

        assert_eq!(character.name, "Mira the Elder");
        assert_eq!(character.initial_location, "harbor");
        assert!(character.inventory.is_empty());
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let character: Character = serde_json::from_str(r#"{"id": "c1", "name": "Mira"}"#).unwrap();
        assert!(character.initial_state.is_empty());
        assert!(character.knowledge.is_empty());
        assert_eq!(character.color, "");
    }
}
