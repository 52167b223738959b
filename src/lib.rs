pub mod config;
pub mod core;
pub mod domain;
pub mod normalize;
pub mod server;
pub mod sources;
pub mod store;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::IngestConfig;

pub use crate::core::{IngestionEngine, IngestionPipeline};
pub use domain::model::{JobRecord, RunSummary, SourceName};
pub use store::{JobRepository, LocalStorage};
pub use utils::error::{IngestError, Result};
