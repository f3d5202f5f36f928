//! Row types for patches and vocabulary.

use serde::{Deserialize, Serialize};

/// A patch row from the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchRecord {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Serialized classification result, if the patch was processed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_filtered: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filtered_hash: Option<String>,
    /// Milliseconds since the epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<i64>,
}

impl PatchRecord {
    pub fn is_processed(&self) -> bool {
        self.content_filtered.is_some()
    }
}

/// Options for adding a patch.
#[derive(Debug, Clone, Default)]
pub struct AddPatchOptions {
    /// Source URL; unique when present.
    pub link: Option<String>,
    pub title: Option<String>,
    pub timestamp: Option<String>,
}

/// A hero row. Also the snapshot interchange form (`ability1..ability4`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroRecord {
    #[serde(default, skip_serializing_if = "is_unset")]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub ability1: Option<String>,
    #[serde(default)]
    pub ability2: Option<String>,
    #[serde(default)]
    pub ability3: Option<String>,
    #[serde(default)]
    pub ability4: Option<String>,
}

impl HeroRecord {
    /// Build a record from up to four ability names; extras are ignored.
    pub fn new<S: AsRef<str>>(name: impl Into<String>, abilities: &[S]) -> Self {
        let mut slots = abilities.iter().map(|a| Some(a.as_ref().to_string()));
        Self {
            id: 0,
            name: name.into(),
            ability1: slots.next().flatten(),
            ability2: slots.next().flatten(),
            ability3: slots.next().flatten(),
            ability4: slots.next().flatten(),
        }
    }

    /// Non-empty ability names in slot order.
    pub fn abilities(&self) -> Vec<&str> {
        [&self.ability1, &self.ability2, &self.ability3, &self.ability4]
            .into_iter()
            .filter_map(|a| a.as_deref())
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .collect()
    }
}

/// An item row. `category` is validated when the vocabulary is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    #[serde(default, skip_serializing_if = "is_unset")]
    pub id: i64,
    pub name: String,
    pub category: String,
}

impl ItemRecord {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            category: category.into(),
        }
    }
}

fn is_unset(id: &i64) -> bool {
    *id == 0
}

/// Ordered hero and item lists, as imported from or exported to JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabularySnapshot {
    pub heroes: Vec<HeroRecord>,
    pub items: Vec<ItemRecord>,
}

/// Store-level statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_patches: i64,
    pub processed_patches: i64,
    pub heroes: i64,
    pub items: i64,
    pub db_path: String,
    pub db_size_mb: f64,
}
