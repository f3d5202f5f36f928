//! Batch run types.

use serde::Serialize;

/// What happened to one patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchOutcome {
    /// A new or different classification was written.
    Updated,
    /// The fresh result hashed the same as the stored one; nothing written.
    Unchanged,
}

/// A patch that could not be processed.
#[derive(Debug, Clone, Serialize)]
pub struct PatchFailure {
    pub id: i64,
    pub error: String,
}

/// Result of running the pipeline over a set of patches.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub updated: usize,
    pub unchanged: usize,
    pub failures: Vec<PatchFailure>,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
}

impl BatchReport {
    pub fn processed(&self) -> usize {
        self.updated + self.unchanged
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
