//! Patch Notes Classify: turns raw patch-note bodies into per-hero,
//! per-item and general change buckets.
//!
//! The pipeline is line oriented: [`normalize`] splits the body into
//! logical lines, [`resolve`] attaches each line to at most one hero or
//! item, [`polarity`] decides buff/nerf/other, and [`aggregate`] collects
//! the placements into a sorted, pruned [`ClassificationResult`].

pub mod aggregate;
pub mod engine;
pub mod normalize;
pub mod polarity;
pub mod resolve;
pub mod rules;
pub mod summary;
pub mod types;
pub mod vocabulary;

pub use aggregate::{ChangeSet, ClassificationResult};
pub use engine::{classify, Classifier};
pub use rules::{CompiledRules, RuleSet};
pub use summary::PatchSummary;
pub use types::{Bucket, GeneralBucket, ItemCategory, LogicalLine, Placement, Polarity};
pub use vocabulary::{Hero, Item, Vocabulary};
