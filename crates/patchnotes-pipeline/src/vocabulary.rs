//! Vocabulary loading from the store.

use patchnotes_classify::{Hero, Item, ItemCategory, Vocabulary};
use patchnotes_core::Result;
use patchnotes_store::SqliteStore;
use tracing::{info, warn};

/// Build an immutable vocabulary snapshot from the hero and item tables.
///
/// Rows with an unknown item category are skipped with a warning.
pub fn load_vocabulary(store: &SqliteStore) -> Result<Vocabulary> {
    let heroes: Vec<Hero> = store
        .list_heroes()?
        .iter()
        .map(|row| Hero::new(row.name.clone(), row.abilities()))
        .collect();

    let mut items = Vec::new();
    for row in store.list_items()? {
        match row.category.parse::<ItemCategory>() {
            Ok(category) => items.push(Item::new(row.name, category)),
            Err(e) => warn!("Skipping item '{}': {}", row.name, e),
        }
    }

    let vocabulary = Vocabulary::new(heroes, items);
    info!(
        "Loaded vocabulary: {} heroes, {} items",
        vocabulary.hero_count(),
        vocabulary.item_count()
    );
    Ok(vocabulary)
}
