use crate::config::IngestConfig;
use crate::core::dedup::merge_batch;
use crate::domain::model::{
    ExtractResult, JobRecord, RunSummary, SourceReport, TransformResult,
};
use crate::domain::ports::{JobSource, Pipeline, Storage};
use crate::normalize::Normalizer;
use crate::store::{export_csv, JobRepository};
use crate::utils::error::{IngestError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use zip::write::{FileOptions, ZipWriter};

pub struct IngestionPipeline<S: Storage> {
    config: IngestConfig,
    sources: Vec<Arc<dyn JobSource>>,
    repository: JobRepository<S>,
    normalizer: Normalizer,
    dry_run: bool,
}

impl<S: Storage> IngestionPipeline<S> {
    pub fn new(config: IngestConfig, sources: Vec<Arc<dyn JobSource>>, storage: S) -> Self {
        let normalizer = Normalizer::new(&config.filter);
        Self {
            config,
            sources,
            repository: JobRepository::new(storage),
            normalizer,
            dry_run: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn repository(&self) -> &JobRepository<S> {
        &self.repository
    }

    fn build_report(new_records: &[JobRecord], summary: &RunSummary) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

        zip.start_file::<_, ()>("new_jobs.csv", FileOptions::default())?;
        export_csv(new_records, &mut zip)?;

        zip.start_file::<_, ()>("summary.json", FileOptions::default())?;
        let json = serde_json::to_string_pretty(summary)?;
        zip.write_all(json.as_bytes())?;

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }
}

#[async_trait]
impl<S: Storage> Pipeline for IngestionPipeline<S> {
    /// 各來源並行抓取，同時進行的數量受 `http.concurrent_requests` 限制
    async fn extract(&self) -> Result<ExtractResult> {
        let started_at = Utc::now();
        let semaphore = Arc::new(Semaphore::new(self.config.http.concurrent_requests.max(1)));
        let mut tasks = JoinSet::new();

        for source in &self.sources {
            let source = Arc::clone(source);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let started = Instant::now();
                tracing::debug!("Fetching from {}", source.name());
                let result = source.fetch().await;
                (source.name(), result, started.elapsed())
            });
        }

        let mut output = ExtractResult {
            started_at,
            ..ExtractResult::default()
        };

        while let Some(joined) = tasks.join_next().await {
            let (source, result, elapsed) = joined.map_err(|e| IngestError::ProcessingError {
                message: format!("Source task aborted: {}", e),
            })?;

            let report = match result {
                Ok(jobs) => {
                    let fetched = jobs.len();
                    output.jobs.extend(jobs);
                    SourceReport {
                        source,
                        fetched,
                        error: None,
                        duration_ms: elapsed.as_millis() as u64,
                    }
                }
                Err(e) => {
                    tracing::error!("❌ {} failed: {} ({})", source, e, e.recovery_suggestion());
                    SourceReport {
                        source,
                        fetched: 0,
                        error: Some(e.to_string()),
                        duration_ms: elapsed.as_millis() as u64,
                    }
                }
            };
            output.reports.push(report);
        }

        output.reports.sort_by_key(|r| r.source);
        Ok(output)
    }

    async fn transform(&self, data: ExtractResult) -> Result<TransformResult> {
        let now = Utc::now();
        let mut result = TransformResult {
            started_at: data.started_at,
            fetched: data.jobs.len(),
            reports: data.reports,
            ..TransformResult::default()
        };

        for raw in data.jobs {
            let label = format!("{} {}", raw.source, raw.external_id);
            match self.normalizer.normalize(raw, now) {
                Ok(job) => result.jobs.push(job),
                Err(IngestError::ValidationError { reason }) => {
                    tracing::debug!("Rejected {}: {}", label, reason);
                    *result.rejections.entry(reason).or_insert(0) += 1;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(result)
    }

    async fn load(&self, result: TransformResult) -> Result<RunSummary> {
        let now = Utc::now();
        let normalized = result.jobs.len();
        let rejected = result.rejected();

        let mut records = self.repository.load().await?;
        let existing = records.len();
        let (stats, inserted) = merge_batch(
            &mut records,
            result.jobs,
            self.config.dedup.fuzzy_threshold,
            self.config.freshness.expire_after_days,
            now,
        );
        tracing::debug!("Store grew from {} to {} records", existing, records.len());

        let mut summary = RunSummary {
            started_at: result.started_at,
            finished_at: now,
            dry_run: self.dry_run,
            sources: result.reports,
            fetched: result.fetched,
            normalized,
            rejected,
            rejections: result.rejections,
            new: stats.new,
            updated: stats.updated,
            duplicates: stats.duplicates,
            report_path: None,
        };

        if self.dry_run {
            return Ok(summary);
        }

        self.repository.save(&records).await?;

        if self.config.store.write_reports {
            let path = format!("reports/ingest-{}.zip", now.format("%Y%m%dT%H%M%SZ"));
            summary.report_path = Some(path.clone());

            let new_records: Vec<JobRecord> =
                inserted.iter().map(|&index| records[index].clone()).collect();
            let archive = Self::build_report(&new_records, &summary)?;
            tracing::debug!("Writing run report ({} bytes) to {}", archive.len(), path);
            self.repository.write_report(&path, &archive).await?;
        }

        summary.finished_at = Utc::now();
        self.repository.save_last_run(&summary).await?;
        Ok(summary)
    }
}
