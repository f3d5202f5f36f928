//! Classify-and-persist pipeline execution.

use patchnotes_classify::{Classifier, CompiledRules, Vocabulary};
use patchnotes_core::{Error, Result};
use patchnotes_store::SqliteStore;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::types::*;

/// Hex SHA-256 of a serialized classification result.
pub fn result_hash(result_json: &str) -> String {
    hex::encode(Sha256::digest(result_json.as_bytes()))
}

/// Runs the classifier over stored patches with one vocabulary snapshot.
pub struct PatchPipeline<'a> {
    store: &'a SqliteStore,
    classifier: Classifier<'a>,
}

impl<'a> PatchPipeline<'a> {
    pub fn new(store: &'a SqliteStore, vocabulary: &'a Vocabulary, rules: &'a CompiledRules) -> Self {
        Self {
            store,
            classifier: Classifier::new(vocabulary, rules),
        }
    }

    /// Classify one patch and store the result unless it is unchanged.
    pub fn process_patch(&self, patch_id: i64) -> Result<PatchOutcome> {
        let patch = self
            .store
            .get_patch(patch_id)?
            .ok_or_else(|| Error::NotFound(format!("patch {}", patch_id)))?;

        let result = self.classifier.classify(&patch.content);
        let json = result.to_json()?;
        let hash = result_hash(&json);

        if patch.content_filtered.is_some() && patch.filtered_hash.as_deref() == Some(hash.as_str()) {
            debug!("Patch {} unchanged ({})", patch_id, &hash[..12]);
            return Ok(PatchOutcome::Unchanged);
        }

        self.store.save_classification(patch_id, &json, &hash)?;
        info!("Patch {} classified ({} lines)", patch_id, result.lines().len());
        Ok(PatchOutcome::Updated)
    }

    /// Process `ids` in order. A failing patch is recorded and skipped.
    pub fn run(&self, ids: &[i64]) -> BatchReport {
        let start = std::time::Instant::now();
        let mut report = BatchReport::default();

        info!("Starting classification of {} patches", ids.len());

        for &id in ids {
            match self.process_patch(id) {
                Ok(PatchOutcome::Updated) => report.updated += 1,
                Ok(PatchOutcome::Unchanged) => report.unchanged += 1,
                Err(e) => {
                    tracing::warn!("Failed to classify patch {}: {}", id, e);
                    report.failures.push(PatchFailure {
                        id,
                        error: e.to_string(),
                    });
                }
            }
        }

        report.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Classification complete: updated={}, unchanged={}, failed={}, duration={}ms",
            report.updated,
            report.unchanged,
            report.failures.len(),
            report.duration_ms
        );

        report
    }

    /// Process every stored patch in ascending ID order.
    pub fn run_all(&self) -> Result<BatchReport> {
        let ids = self.store.list_patch_ids()?;
        Ok(self.run(&ids))
    }
}
