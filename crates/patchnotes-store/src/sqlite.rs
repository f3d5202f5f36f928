//! SQLite store for raw patches, stored classifications and the hero/item vocabulary.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::schema::{PATCHES_SQL, VOCABULARY_SQL};
use crate::types::*;
use patchnotes_core::{Error, Result};

/// SQLite store shared by the pipeline and the CLI.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteStore {
    /// Open or create the SQLite store.
    ///
    /// `db_dir` is the data directory (e.g., `data/`). The file will be `db_dir/patchnotes.db`.
    pub fn open(db_dir: impl AsRef<Path>) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir).map_err(|e| Error::Storage(e.to_string()))?;
        let db_path = db_dir.join("patchnotes.db");

        let conn = Self::create_connection(&db_path)?;
        Self::init_schema(&conn)?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
        };

        let stats = store.get_stats()?;
        info!(
            "SqliteStore initialized: {} patches ({} processed), {} heroes, {} items, path={}",
            stats.total_patches,
            stats.processed_patches,
            stats.heroes,
            stats.items,
            store.db_path.display()
        );

        Ok(store)
    }

    fn create_connection(db_path: &Path) -> Result<Connection> {
        let conn = Connection::open(db_path).map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(conn)
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        let full_schema = format!("{}\n{}", PATCHES_SQL, VOCABULARY_SQL);
        conn.execute_batch(&full_schema)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;
        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    // ---------------------------------------------------------------
    // Patches
    // ---------------------------------------------------------------

    /// Insert a raw patch. Returns the new patch ID.
    pub fn add_patch(&self, content: &str, opts: AddPatchOptions) -> Result<i64> {
        let conn = self.conn.lock();
        let id = conn
            .prepare_cached(
                "INSERT INTO patches (link, title, content, timestamp) VALUES (?1, ?2, ?3, ?4)",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .insert(params![opts.link, opts.title, content, opts.timestamp])
            .map_err(|e| {
                if e.to_string().contains("UNIQUE constraint") {
                    Error::DuplicatePatch(opts.link.clone().unwrap_or_default())
                } else {
                    Error::Database(e.to_string())
                }
            })?;
        debug!("Added patch {} ({} bytes)", id, content.len());
        Ok(id)
    }

    /// Get a patch by ID.
    pub fn get_patch(&self, patch_id: i64) -> Result<Option<PatchRecord>> {
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached("SELECT * FROM patches WHERE id = ?1")
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![patch_id], |row| Ok(Self::row_to_patch(row)))
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(row)
    }

    /// Find a patch by its source link.
    pub fn find_patch_by_link(&self, link: &str) -> Result<Option<PatchRecord>> {
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached("SELECT * FROM patches WHERE link = ?1")
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![link], |row| Ok(Self::row_to_patch(row)))
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(row)
    }

    /// Every patch ID in ascending order.
    pub fn list_patch_ids(&self) -> Result<Vec<i64>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached("SELECT id FROM patches ORDER BY id ASC")
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))?;
        let ids = rows
            .collect::<rusqlite::Result<Vec<i64>>>()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(ids)
    }

    /// Count patches, optionally only those with a stored classification.
    pub fn count_patches(&self, processed_only: bool) -> Result<i64> {
        let sql = if processed_only {
            "SELECT COUNT(*) FROM patches WHERE content_filtered IS NOT NULL"
        } else {
            "SELECT COUNT(*) FROM patches"
        };
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row(sql, [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(count)
    }

    // ---------------------------------------------------------------
    // Classifications
    // ---------------------------------------------------------------

    /// Overwrite the stored classification for one patch.
    ///
    /// Result, hash and timestamp change in a single statement, so a failed
    /// write leaves the previous classification intact.
    pub fn save_classification(&self, patch_id: i64, result_json: &str, hash: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();
        let conn = self.conn.lock();
        let count = conn
            .prepare_cached(
                "UPDATE patches SET content_filtered = ?1, filtered_hash = ?2, processed_at = ?3
                 WHERE id = ?4",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .execute(params![result_json, hash, now, patch_id])
            .map_err(|e| Error::Database(e.to_string()))?;
        if count == 0 {
            return Err(Error::NotFound(format!("patch {}", patch_id)));
        }
        Ok(())
    }

    /// The stored classification JSON, if the patch has been processed.
    pub fn get_classification(&self, patch_id: i64) -> Result<Option<String>> {
        let conn = self.conn.lock();
        let json = conn
            .prepare_cached("SELECT content_filtered FROM patches WHERE id = ?1")
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![patch_id], |row| row.get::<_, Option<String>>(0))
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?
            .flatten();
        Ok(json)
    }

    // ---------------------------------------------------------------
    // Vocabulary
    // ---------------------------------------------------------------

    /// Insert a hero or replace its abilities. Returns the row ID.
    pub fn upsert_hero(&self, hero: &HeroRecord) -> Result<i64> {
        let conn = self.conn.lock();
        upsert_hero_on(&conn, hero)
    }

    /// Insert an item or replace its category. Returns the row ID.
    pub fn upsert_item(&self, item: &ItemRecord) -> Result<i64> {
        let conn = self.conn.lock();
        upsert_item_on(&conn, item)
    }

    /// Upsert a whole snapshot in one transaction. Returns (heroes, items) written.
    pub fn import_vocabulary(&self, snapshot: &VocabularySnapshot) -> Result<(usize, usize)> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::Database(e.to_string()))?;

        for hero in &snapshot.heroes {
            upsert_hero_on(&tx, hero)?;
        }
        for item in &snapshot.items {
            upsert_item_on(&tx, item)?;
        }

        tx.commit().map_err(|e| Error::Database(e.to_string()))?;
        info!(
            "Imported vocabulary: {} heroes, {} items",
            snapshot.heroes.len(),
            snapshot.items.len()
        );
        Ok((snapshot.heroes.len(), snapshot.items.len()))
    }

    /// All heroes in insertion order.
    pub fn list_heroes(&self) -> Result<Vec<HeroRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached("SELECT * FROM heroes ORDER BY id ASC")
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| Ok(Self::row_to_hero(row)))
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// All items in insertion order.
    pub fn list_items(&self) -> Result<Vec<ItemRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached("SELECT * FROM items ORDER BY id ASC")
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| Ok(Self::row_to_item(row)))
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Export the current vocabulary in interchange form.
    pub fn vocabulary_snapshot(&self) -> Result<VocabularySnapshot> {
        Ok(VocabularySnapshot {
            heroes: self.list_heroes()?,
            items: self.list_items()?,
        })
    }

    // ---------------------------------------------------------------
    // Stats
    // ---------------------------------------------------------------

    /// Get store statistics.
    pub fn get_stats(&self) -> Result<StoreStats> {
        let total_patches = self.count_patches(false)?;
        let processed_patches = self.count_patches(true)?;

        let conn = self.conn.lock();
        let heroes: i64 = conn
            .query_row("SELECT COUNT(*) FROM heroes", [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))?;
        let items: i64 = conn
            .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))?;
        drop(conn);

        let db_size = std::fs::metadata(&self.db_path)
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(StoreStats {
            total_patches,
            processed_patches,
            heroes,
            items,
            db_path: self.db_path.to_string_lossy().to_string(),
            db_size_mb: db_size as f64 / (1024.0 * 1024.0),
        })
    }

    // ---------------------------------------------------------------
    // Row Mapping Helpers
    // ---------------------------------------------------------------

    fn row_to_patch(row: &rusqlite::Row<'_>) -> PatchRecord {
        PatchRecord {
            id: row.get("id").unwrap_or(0),
            link: row.get("link").ok().flatten(),
            title: row.get("title").ok().flatten(),
            content: row.get("content").unwrap_or_default(),
            timestamp: row.get("timestamp").ok().flatten(),
            content_filtered: row.get("content_filtered").ok().flatten(),
            filtered_hash: row.get("filtered_hash").ok().flatten(),
            processed_at: row.get("processed_at").ok().flatten(),
        }
    }

    fn row_to_hero(row: &rusqlite::Row<'_>) -> HeroRecord {
        HeroRecord {
            id: row.get("id").unwrap_or(0),
            name: row.get("name").unwrap_or_default(),
            ability1: row.get("ability1").ok().flatten(),
            ability2: row.get("ability2").ok().flatten(),
            ability3: row.get("ability3").ok().flatten(),
            ability4: row.get("ability4").ok().flatten(),
        }
    }

    fn row_to_item(row: &rusqlite::Row<'_>) -> ItemRecord {
        ItemRecord {
            id: row.get("id").unwrap_or(0),
            name: row.get("name").unwrap_or_default(),
            category: row.get("category").unwrap_or_default(),
        }
    }
}

fn upsert_hero_on(conn: &Connection, hero: &HeroRecord) -> Result<i64> {
    let name = hero.name.trim();
    if name.is_empty() {
        return Err(Error::Vocabulary("hero with empty name".into()));
    }
    conn.prepare_cached(
        "INSERT INTO heroes (name, ability1, ability2, ability3, ability4)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(name) DO UPDATE SET
             ability1 = excluded.ability1,
             ability2 = excluded.ability2,
             ability3 = excluded.ability3,
             ability4 = excluded.ability4
         RETURNING id",
    )
    .map_err(|e| Error::Database(e.to_string()))?
    .query_row(
        params![name, hero.ability1, hero.ability2, hero.ability3, hero.ability4],
        |row| row.get(0),
    )
    .map_err(|e| Error::Database(e.to_string()))
}

fn upsert_item_on(conn: &Connection, item: &ItemRecord) -> Result<i64> {
    let name = item.name.trim();
    if name.is_empty() {
        return Err(Error::Vocabulary("item with empty name".into()));
    }
    conn.prepare_cached(
        "INSERT INTO items (name, category) VALUES (?1, ?2)
         ON CONFLICT(name) DO UPDATE SET category = excluded.category
         RETURNING id",
    )
    .map_err(|e| Error::Database(e.to_string()))?
    .query_row(params![name, item.category.trim()], |row| row.get(0))
    .map_err(|e| Error::Database(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (SqliteStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(dir.path()).unwrap();
        (store, dir)
    }

    fn add(store: &SqliteStore, content: &str, link: &str) -> i64 {
        store
            .add_patch(
                content,
                AddPatchOptions {
                    link: Some(link.into()),
                    title: Some("Gameplay Update".into()),
                    timestamp: Some("2024-08-29T23:01:00Z".into()),
                },
            )
            .unwrap()
    }

    #[test]
    fn test_add_and_get_patch() {
        let (store, _dir) = test_store();
        let id = add(&store, "- Abrams: Increased health", "https://forums.example.com/t/1");

        let patch = store.get_patch(id).unwrap().unwrap();
        assert_eq!(patch.content, "- Abrams: Increased health");
        assert_eq!(patch.title.as_deref(), Some("Gameplay Update"));
        assert!(!patch.is_processed());
        assert!(store.get_patch(id + 100).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_link() {
        let (store, _dir) = test_store();
        add(&store, "first", "https://forums.example.com/t/1");
        let result = store.add_patch(
            "second",
            AddPatchOptions {
                link: Some("https://forums.example.com/t/1".into()),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(Error::DuplicatePatch(_))));
    }

    #[test]
    fn test_patches_without_link_are_not_duplicates() {
        let (store, _dir) = test_store();
        store.add_patch("a", AddPatchOptions::default()).unwrap();
        store.add_patch("b", AddPatchOptions::default()).unwrap();
        assert_eq!(store.count_patches(false).unwrap(), 2);
    }

    #[test]
    fn test_find_by_link_and_list_ids() {
        let (store, _dir) = test_store();
        let a = add(&store, "a", "https://forums.example.com/t/1");
        let b = add(&store, "b", "https://forums.example.com/t/2");

        let found = store
            .find_patch_by_link("https://forums.example.com/t/2")
            .unwrap()
            .unwrap();
        assert_eq!(found.id, b);
        assert_eq!(store.list_patch_ids().unwrap(), vec![a, b]);
    }

    #[test]
    fn test_save_classification_overwrites() {
        let (store, _dir) = test_store();
        let id = add(&store, "- Fixed a crash", "https://forums.example.com/t/1");
        assert!(store.get_classification(id).unwrap().is_none());

        store.save_classification(id, r#"{"fixes":["a"]}"#, "h1").unwrap();
        store.save_classification(id, r#"{"fixes":["b"]}"#, "h2").unwrap();

        assert_eq!(
            store.get_classification(id).unwrap().as_deref(),
            Some(r#"{"fixes":["b"]}"#)
        );
        let patch = store.get_patch(id).unwrap().unwrap();
        assert_eq!(patch.filtered_hash.as_deref(), Some("h2"));
        assert!(patch.processed_at.is_some());
        assert_eq!(store.count_patches(true).unwrap(), 1);
    }

    #[test]
    fn test_save_classification_unknown_patch() {
        let (store, _dir) = test_store();
        let result = store.save_classification(42, "{}", "h");
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_upsert_hero_replaces_abilities() {
        let (store, _dir) = test_store();
        let id = store
            .upsert_hero(&HeroRecord::new("Haze", &["Sleep Dagger", "Smoke Bomb"]))
            .unwrap();
        let again = store
            .upsert_hero(&HeroRecord::new("Haze", &["Sleep Dagger", "Smoke Bomb", "Fixation", "Bullet Dance"]))
            .unwrap();
        assert_eq!(id, again);

        let heroes = store.list_heroes().unwrap();
        assert_eq!(heroes.len(), 1);
        assert_eq!(heroes[0].abilities(), vec!["Sleep Dagger", "Smoke Bomb", "Fixation", "Bullet Dance"]);
    }

    #[test]
    fn test_upsert_rejects_blank_names() {
        let (store, _dir) = test_store();
        assert!(matches!(
            store.upsert_item(&ItemRecord::new("  ", "Weapon")),
            Err(Error::Vocabulary(_))
        ));
        assert!(matches!(
            store.upsert_hero(&HeroRecord::new("", &[] as &[&str])),
            Err(Error::Vocabulary(_))
        ));
    }

    #[test]
    fn test_import_vocabulary_keeps_order() {
        let (store, _dir) = test_store();
        let snapshot: VocabularySnapshot = serde_json::from_str(
            r#"{
                "heroes": [
                    {"name": "Abrams", "ability1": "Siphon Life", "ability2": "Shoulder Charge"},
                    {"name": "Bebop", "ability1": "Hook", "ability4": null}
                ],
                "items": [
                    {"name": "Long Range", "category": "Weapon"},
                    {"name": "Extra Health", "category": "Vitality"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(store.import_vocabulary(&snapshot).unwrap(), (2, 2));

        let exported = store.vocabulary_snapshot().unwrap();
        let names: Vec<&str> = exported.heroes.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Abrams", "Bebop"]);
        assert_eq!(exported.items[1].category, "Vitality");
    }

    #[test]
    fn test_import_vocabulary_is_atomic() {
        let (store, _dir) = test_store();
        let snapshot = VocabularySnapshot {
            heroes: vec![HeroRecord::new("Abrams", &["Siphon Life"])],
            items: vec![ItemRecord::new("", "Weapon")],
        };
        assert!(store.import_vocabulary(&snapshot).is_err());
        assert!(store.list_heroes().unwrap().is_empty());
    }

    #[test]
    fn test_stats() {
        let (store, _dir) = test_store();
        let id = add(&store, "content", "https://forums.example.com/t/1");
        add(&store, "content", "https://forums.example.com/t/2");
        store.save_classification(id, "{}", "h").unwrap();
        store.upsert_item(&ItemRecord::new("Knockdown", "Spirit")).unwrap();

        let stats = store.get_stats().unwrap();
        assert_eq!(stats.total_patches, 2);
        assert_eq!(stats.processed_patches, 1);
        assert_eq!(stats.heroes, 0);
        assert_eq!(stats.items, 1);
    }
}
