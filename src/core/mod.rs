pub mod dedup;
pub mod etl;
pub mod freshness;
pub mod pipeline;

#[cfg(test)]
pub mod test_support;

pub use dedup::{merge_batch, DedupDecision, DedupStats, Deduplicator, MatchReason};
pub use etl::IngestionEngine;
pub use freshness::{apply_freshness, freshness_score, run_freshness, FreshnessReport};
pub use pipeline::IngestionPipeline;
