//! Patch Notes Store: SQLite persistence for patches, heroes and items.

pub mod schema;
pub mod sqlite;
pub mod types;

pub use sqlite::SqliteStore;
pub use types::*;
