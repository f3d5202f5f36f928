//! Batch pipeline: load the vocabulary, classify stored patches, persist results.
//!
//! Each patch is an independent unit of work: a failure is logged and
//! reported for that patch, and the batch carries on with the next one.

pub mod pipeline;
pub mod types;
pub mod vocabulary;

pub use pipeline::{result_hash, PatchPipeline};
pub use types::*;
pub use vocabulary::load_vocabulary;
