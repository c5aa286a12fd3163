//! User settings persistence and editing.

use crate::store::{LocalStore, SETTINGS_KEY};
use crate::{Config, Difficulty, Error, Result, UserSettings};

impl UserSettings {
    /// First-run settings taken from the config defaults
    pub fn from_defaults(config: &Config) -> Self {
        Self {
            difficulty: config.defaults.difficulty,
            equipment: config
                .defaults
                .equipment
                .iter()
                .map(|e| normalize_tag(e))
                .collect(),
            excluded_exercises: Default::default(),
        }
    }

    /// Load stored settings, creating and saving defaults on first use
    pub fn load_or_init(store: &LocalStore, config: &Config) -> Result<Self> {
        if let Some(settings) = store.get::<UserSettings>(SETTINGS_KEY)? {
            return Ok(settings);
        }
        let settings = Self::from_defaults(config);
        settings.save(store)?;
        tracing::info!("Created default settings");
        Ok(settings)
    }

    pub fn save(&self, store: &LocalStore) -> Result<()> {
        store.put(SETTINGS_KEY, self)
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
    }

    /// Returns false if the item was already owned
    pub fn add_equipment(&mut self, item: &str) -> Result<bool> {
        let tag = normalize_tag(item);
        if tag.is_empty() {
            return Err(Error::InvalidInput("equipment name cannot be empty".into()));
        }
        Ok(self.equipment.insert(tag))
    }

    pub fn remove_equipment(&mut self, item: &str) -> bool {
        self.equipment.remove(&normalize_tag(item))
    }

    /// Exclude an exercise by exact catalog name
    pub fn exclude(&mut self, name: &str) -> Result<bool> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("exercise name cannot be empty".into()));
        }
        Ok(self.excluded_exercises.insert(name.to_string()))
    }

    pub fn include(&mut self, name: &str) -> bool {
        self.excluded_exercises.remove(name.trim())
    }
}

/// Equipment tags are lower_snake_case
fn normalize_tag(item: &str) -> String {
    item.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}
