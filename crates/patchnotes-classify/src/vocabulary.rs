//! Vocabulary index: the known heroes and items a patch line can be about.
//!
//! Built once per run from externally supplied records and read-only
//! afterwards, so one index can be shared by concurrent classifications.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::types::ItemCategory;

/// Heroes carry at most this many ability names.
pub const MAX_ABILITIES: usize = 4;

/// A playable hero and its ability names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hero {
    pub name: String,
    #[serde(default)]
    pub abilities: Vec<String>,
}

impl Hero {
    pub fn new<I, S>(name: impl Into<String>, abilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            abilities: abilities.into_iter().map(Into::into).collect(),
        }
    }
}

/// A shop item and its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub category: ItemCategory,
}

impl Item {
    pub fn new(name: impl Into<String>, category: ItemCategory) -> Self {
        Self {
            name: name.into(),
            category,
        }
    }
}

#[derive(Debug, Clone)]
struct HeroEntry {
    hero: Hero,
    key: String,
    ability_keys: Vec<String>,
}

#[derive(Debug, Clone)]
struct ItemEntry {
    item: Item,
    key: String,
}

/// Lower-cased lookup index over heroes and items, in vocabulary order.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    heroes: Vec<HeroEntry>,
    items: Vec<ItemEntry>,
}

impl Vocabulary {
    /// Build the index. Blank names are skipped, duplicate names keep the
    /// first occurrence, and abilities beyond [`MAX_ABILITIES`] are dropped.
    pub fn new(heroes: Vec<Hero>, items: Vec<Item>) -> Self {
        let mut vocab = Self::default();
        let mut seen_heroes: HashSet<String> = HashSet::new();
        let mut seen_items: HashSet<String> = HashSet::new();

        for hero in heroes {
            let name = hero.name.trim().to_string();
            if name.is_empty() {
                warn!("Skipping hero with empty name");
                continue;
            }
            let key = name.to_lowercase();
            if !seen_heroes.insert(key.clone()) {
                debug!("Duplicate hero '{}' ignored", name);
                continue;
            }

            let mut abilities: Vec<String> = hero
                .abilities
                .iter()
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .collect();
            if abilities.len() > MAX_ABILITIES {
                warn!(
                    "Hero '{}' has {} abilities, keeping the first {}",
                    name,
                    abilities.len(),
                    MAX_ABILITIES
                );
                abilities.truncate(MAX_ABILITIES);
            }
            let ability_keys: Vec<String> = abilities.iter().map(|a| a.to_lowercase()).collect();

            vocab.heroes.push(HeroEntry {
                hero: Hero { name, abilities },
                key,
                ability_keys,
            });
        }

        for item in items {
            let name = item.name.trim().to_string();
            if name.is_empty() {
                warn!("Skipping item with empty name");
                continue;
            }
            let key = name.to_lowercase();
            if !seen_items.insert(key.clone()) {
                debug!("Duplicate item '{}' ignored", name);
                continue;
            }
            vocab.items.push(ItemEntry {
                item: Item {
                    name,
                    category: item.category,
                },
                key,
            });
        }

        vocab
    }

    pub fn is_empty(&self) -> bool {
        self.heroes.is_empty() && self.items.is_empty()
    }

    pub fn hero_count(&self) -> usize {
        self.heroes.len()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn heroes(&self) -> impl Iterator<Item = &Hero> {
        self.heroes.iter().map(|e| &e.hero)
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().map(|e| &e.item)
    }

    /// Heroes paired with their lower-cased matching key.
    pub fn hero_keys(&self) -> impl Iterator<Item = (&Hero, &str)> {
        self.heroes.iter().map(|e| (&e.hero, e.key.as_str()))
    }

    /// Items paired with their lower-cased matching key.
    pub fn item_keys(&self) -> impl Iterator<Item = (&Item, &str)> {
        self.items.iter().map(|e| (&e.item, e.key.as_str()))
    }

    /// First hero, in vocabulary order, owning an ability named in `text_lower`.
    pub fn hero_with_ability_in(&self, text_lower: &str) -> Option<&Hero> {
        self.heroes
            .iter()
            .find(|e| e.ability_keys.iter().any(|a| text_lower.contains(a.as_str())))
            .map(|e| &e.hero)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vocabulary {
        Vocabulary::new(
            vec![
                Hero::new("Abrams", ["Siphon Life", "Shoulder Charge", "Infernal Resilience", "Seismic Impact"]),
                Hero::new("Haze", ["Sleep Dagger", "Smoke Bomb", "Fixation", "Bullet Dance"]),
            ],
            vec![
                Item::new("Long Range", ItemCategory::Weapon),
                Item::new("Extra Health", ItemCategory::Vitality),
            ],
        )
    }

    #[test]
    fn test_counts_and_order() {
        let vocab = sample();
        assert_eq!(vocab.hero_count(), 2);
        assert_eq!(vocab.item_count(), 2);
        let names: Vec<&str> = vocab.heroes().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Abrams", "Haze"]);
    }

    #[test]
    fn test_ability_lookup() {
        let vocab = sample();
        assert_eq!(vocab.hero_with_ability_in("smoke bomb duration up").unwrap().name, "Haze");
        assert_eq!(
            vocab.hero_with_ability_in("seismic impact radius increased").unwrap().name,
            "Abrams"
        );
        assert!(vocab.hero_with_ability_in("flog damage").is_none());
    }

    #[test]
    fn test_lower_cased_keys() {
        let vocab = sample();
        let keys: Vec<&str> = vocab.item_keys().map(|(_, key)| key).collect();
        assert_eq!(keys, vec!["long range", "extra health"]);
        let (hero, key) = vocab.hero_keys().nth(1).unwrap();
        assert_eq!((hero.name.as_str(), key), ("Haze", "haze"));
    }

    #[test]
    fn test_dedup_and_ability_cap() {
        let vocab = Vocabulary::new(
            vec![
                Hero::new("Lash", ["a", "b", "c", "d", "e"]),
                Hero::new("lash", Vec::<String>::new()),
                Hero::new("  ", Vec::<String>::new()),
            ],
            vec![],
        );
        assert_eq!(vocab.hero_count(), 1);
        let lash = vocab.heroes().next().unwrap();
        assert_eq!(lash.name, "Lash");
        assert_eq!(lash.abilities.len(), MAX_ABILITIES);
    }

    #[test]
    fn test_empty() {
        assert!(Vocabulary::default().is_empty());
        assert!(!sample().is_empty());
    }
}
