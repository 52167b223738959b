use crate::domain::model::RunSummary;
use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::RunMonitor;

/// Runs extract, transform and load in order and reports what each phase did.
pub struct IngestionEngine<P: Pipeline> {
    pipeline: P,
    monitor: RunMonitor,
}

impl<P: Pipeline> IngestionEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: RunMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<RunSummary> {
        tracing::info!("🚀 Starting ingestion run");

        // Extract
        let extracted = self.pipeline.extract().await?;
        tracing::info!(
            "📥 Extracted {} raw postings from {} sources",
            extracted.jobs.len(),
            extracted.reports.len()
        );
        for report in extracted.reports.iter().filter(|r| r.is_failed()) {
            tracing::warn!(
                "⚠️ Source {} failed: {}",
                report.source,
                report.error.as_deref().unwrap_or_default()
            );
        }
        self.monitor.log_phase("extract");

        // Transform
        let transformed = self.pipeline.transform(extracted).await?;
        tracing::info!(
            "🔄 Normalized {} postings, rejected {}",
            transformed.jobs.len(),
            transformed.rejected()
        );
        for (reason, count) in &transformed.rejections {
            tracing::debug!("   rejected {}: {}", reason, count);
        }
        self.monitor.log_phase("transform");

        // Load
        let summary = self.pipeline.load(transformed).await?;
        tracing::info!(
            "💾 {} new, {} updated, {} duplicates{}",
            summary.new,
            summary.updated,
            summary.duplicates,
            if summary.dry_run { " (dry run, nothing written)" } else { "" }
        );
        if let Some(path) = &summary.report_path {
            tracing::info!("📁 Run report saved to: {}", path);
        }
        self.monitor.log_phase("load");

        if self.monitor.is_enabled() {
            tracing::info!("⏱️ Total run time: {:?}", self.monitor.elapsed());
        }

        Ok(summary)
    }
}
