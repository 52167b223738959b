pub mod toml_config;

pub use toml_config::IngestConfig;

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "pmhnp-ingest")]
#[command(about = "Fetch, normalize and deduplicate PMHNP job postings from third-party job boards")]
pub struct CliConfig {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "ingest.toml")]
    pub config: String,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log process resource usage after each phase")]
    pub monitor: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run one ingestion pass over the enabled sources
    Ingest {
        /// Only run these sources (comma separated)
        #[arg(long = "source", value_delimiter = ',')]
        sources: Vec<String>,

        /// Extract and transform only; nothing is written
        #[arg(long)]
        dry_run: bool,
    },
    /// Recompute freshness scores and expire stale jobs
    Freshness,
    /// Export published jobs as CSV
    Export {
        #[arg(default_value = "jobs.csv")]
        output: String,
    },
    /// Start the cron-triggered HTTP server
    Serve {
        #[arg(long)]
        bind: Option<String>,
    },
}
