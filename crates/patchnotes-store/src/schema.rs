//! Database schema SQL.

/// Raw patch posts and their stored classification.
pub const PATCHES_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS patches (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    link TEXT UNIQUE,
    title TEXT,
    content TEXT NOT NULL,
    timestamp TEXT,
    content_filtered TEXT,
    filtered_hash TEXT,
    processed_at INTEGER
);

CREATE INDEX IF NOT EXISTS idx_patches_processed ON patches(processed_at);
"#;

/// Vocabulary tables. Row order (by id) is the matching order.
pub const VOCABULARY_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS heroes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    ability1 TEXT,
    ability2 TEXT,
    ability3 TEXT,
    ability4 TEXT
);

CREATE TABLE IF NOT EXISTS items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    category TEXT NOT NULL
);
"#;
