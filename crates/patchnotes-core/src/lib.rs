//! Patch Notes Core: error type, configuration, data directory management.

pub mod config;
pub mod error;

pub use config::{DataPaths, PatchNotesConfig};
pub use error::{Error, Result};
