use crate::config::toml_config::{GreenhouseBoard, GreenhouseConfig};
use crate::domain::model::{RawJob, SourceName};
use crate::domain::ports::JobSource;
use crate::sources::{parse_timestamp, HttpFetcher};
use crate::utils::error::{IngestError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct BoardResponse {
    #[serde(default)]
    jobs: Vec<GreenhouseJob>,
}

#[derive(Debug, Deserialize)]
struct GreenhouseJob {
    id: u64,
    title: String,
    absolute_url: Option<String>,
    location: Option<GreenhouseLocation>,
    updated_at: Option<String>,
    first_published: Option<String>,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GreenhouseLocation {
    name: Option<String>,
}

pub struct GreenhouseSource {
    config: GreenhouseConfig,
    http: Arc<HttpFetcher>,
}

impl GreenhouseSource {
    pub fn new(config: GreenhouseConfig, http: Arc<HttpFetcher>) -> Self {
        Self { config, http }
    }

    async fn fetch_board(&self, board: &GreenhouseBoard) -> Result<Vec<RawJob>> {
        let url = format!(
            "{}/v1/boards/{}/jobs",
            self.config.base_url.trim_end_matches('/'),
            board.token
        );

        let response: BoardResponse = self
            .http
            .fetch_json(SourceName::Greenhouse, |client| {
                client.get(&url).query(&[("content", "true")])
            })
            .await?;

        Ok(response
            .jobs
            .into_iter()
            .map(|job| {
                let mut raw = RawJob::new(SourceName::Greenhouse, job.id.to_string(), job.title);
                raw.company = Some(board.company.clone());
                raw.location = job.location.and_then(|l| l.name);
                raw.apply_url = job.absolute_url;
                raw.description = job.content;
                raw.posted_at = job
                    .first_published
                    .as_deref()
                    .or(job.updated_at.as_deref())
                    .and_then(parse_timestamp);
                raw
            })
            .collect())
    }
}

#[async_trait]
impl JobSource for GreenhouseSource {
    fn name(&self) -> SourceName {
        SourceName::Greenhouse
    }

    /// 單一 board 失敗只記警告；全部失敗才視為來源失敗
    async fn fetch(&self) -> Result<Vec<RawJob>> {
        let mut jobs = Vec::new();
        let mut failures: Vec<IngestError> = Vec::new();

        for board in &self.config.boards {
            match self.fetch_board(board).await {
                Ok(board_jobs) => {
                    tracing::debug!("Greenhouse board {}: {} postings", board.token, board_jobs.len());
                    jobs.extend(board_jobs);
                }
                Err(e) => {
                    tracing::warn!("⚠️ Greenhouse board {} failed: {}", board.token, e);
                    failures.push(e);
                }
            }
        }

        if !failures.is_empty() && failures.len() == self.config.boards.len() {
            return Err(failures.remove(0));
        }

        tracing::info!(
            "📥 Greenhouse returned {} postings from {} boards",
            jobs.len(),
            self.config.boards.len() - failures.len()
        );
        Ok(jobs)
    }
}
