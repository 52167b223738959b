use clap::Parser;
use pmhnp_ingest::config::Command;
use pmhnp_ingest::core::run_freshness;
use pmhnp_ingest::server::{self, AppState};
use pmhnp_ingest::sources::build_sources;
use pmhnp_ingest::store::export_csv;
use pmhnp_ingest::utils::error::ErrorSeverity;
use pmhnp_ingest::utils::{logger, validation::Validate};
use pmhnp_ingest::{
    CliConfig, IngestConfig, IngestError, IngestionEngine, IngestionPipeline, JobRepository,
    LocalStorage, RunSummary, SourceName,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 伺服器輸出 JSON 日誌，其餘指令用精簡格式
    if matches!(cli.command, Command::Serve { .. }) {
        logger::init_server_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting pmhnp-ingest");
    tracing::info!("📁 Loading configuration from: {}", cli.config);

    let mut config = match IngestConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    if let Command::Ingest { sources, .. } = &cli.command {
        let only = sources
            .iter()
            .map(|s| s.parse::<SourceName>())
            .collect::<Result<Vec<_>, _>>();
        match only {
            Ok(only) => config.restrict_sources(&only),
            Err(e) => exit_with(e),
        }
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        exit_with(e);
    }
    tracing::info!("✅ Configuration loaded and validated successfully");

    let result = match cli.command.clone() {
        Command::Ingest { dry_run, .. } => ingest(config, dry_run, cli.monitor).await,
        Command::Freshness => freshness(config).await,
        Command::Export { output } => export(config, &output).await,
        Command::Serve { bind } => serve(config, bind).await,
    };

    if let Err(e) = result {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        exit_with(e);
    }

    Ok(())
}

fn exit_with(e: IngestError) -> ! {
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code)
}

async fn ingest(config: IngestConfig, dry_run: bool, monitor: bool) -> pmhnp_ingest::Result<()> {
    let enabled = config.enabled_sources();
    if enabled.is_empty() {
        return Err(IngestError::ConfigError {
            message: "No job sources are enabled".to_string(),
        });
    }
    tracing::info!(
        "🔌 Enabled sources: {}",
        enabled.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
    );
    if dry_run {
        tracing::info!("🔍 DRY RUN MODE - the store will not be modified");
    }
    if monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let sources = build_sources(&config)?;
    let storage = LocalStorage::new(&config.store.path);
    let pipeline = IngestionPipeline::new(config, sources, storage).with_dry_run(dry_run);
    let engine = IngestionEngine::new_with_monitoring(pipeline, monitor);

    let summary = engine.run().await?;
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("✅ Ingestion finished");
    for report in &summary.sources {
        match &report.error {
            Some(error) => println!("   {:<11} failed: {}", report.source.as_str(), error),
            None => println!(
                "   {:<11} {} postings in {} ms",
                report.source.as_str(),
                report.fetched,
                report.duration_ms
            ),
        }
    }
    println!(
        "   fetched {} / normalized {} / rejected {}",
        summary.fetched, summary.normalized, summary.rejected
    );
    println!(
        "   new {} / updated {} / duplicates {}",
        summary.new, summary.updated, summary.duplicates
    );
    if let Some(path) = &summary.report_path {
        println!("📁 Report saved to: {}", path);
    }
}

async fn freshness(config: IngestConfig) -> pmhnp_ingest::Result<()> {
    let repository = JobRepository::new(LocalStorage::new(&config.store.path));
    let report = run_freshness(&repository, &config.freshness, chrono::Utc::now()).await?;
    println!(
        "✅ Freshness pass: {} expired by age, {} expired unseen, {} published",
        report.expired_by_age, report.expired_unseen, report.published
    );
    Ok(())
}

async fn export(config: IngestConfig, output: &str) -> pmhnp_ingest::Result<()> {
    let repository = JobRepository::new(LocalStorage::new(&config.store.path));
    let records = repository.load().await?;
    let file = std::fs::File::create(output)?;
    let count = export_csv(&records, file)?;
    println!("✅ Exported {} published jobs to {}", count, output);
    Ok(())
}

async fn serve(config: IngestConfig, bind: Option<String>) -> pmhnp_ingest::Result<()> {
    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    let state = AppState::new(config)?;
    server::serve(state, &bind).await
}
