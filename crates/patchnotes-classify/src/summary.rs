//! Per-patch change counts for presentation consumers.

use serde::{Deserialize, Serialize};

use crate::aggregate::ClassificationResult;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchSummary {
    /// Entity changes plus general (non-media) lines.
    pub total_changes: usize,
    pub buffs: usize,
    pub nerfs: usize,
    pub other_changes: usize,
    pub heroes_affected: usize,
    pub items_affected: usize,
    /// new + gameplay + fixes + uncategorized.
    pub general_changes: usize,
    /// gallery + hidden.
    pub media_count: usize,
}

impl PatchSummary {
    pub fn from_result(result: &ClassificationResult) -> Self {
        let mut summary = Self::default();

        let item_sets = result.items.values().flat_map(|m| m.values());
        for set in result.heroes.values().chain(item_sets) {
            summary.buffs += set.buff.len();
            summary.nerfs += set.nerf.len();
            summary.other_changes += set.other.len();
        }

        summary.heroes_affected = result.heroes.len();
        summary.items_affected = result.items.values().map(|m| m.len()).sum();
        summary.general_changes = result.new.len()
            + result.gameplay.len()
            + result.fixes.len()
            + result.uncategorized.len();
        summary.media_count = result.gallery.len() + result.hidden.len();
        summary.total_changes =
            summary.buffs + summary.nerfs + summary.other_changes + summary.general_changes;
        summary
    }
}
