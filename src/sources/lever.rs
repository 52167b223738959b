use crate::config::toml_config::{LeverCompany, LeverConfig};
use crate::domain::model::{RawJob, SalaryPeriod, SourceName};
use crate::domain::ports::JobSource;
use crate::sources::HttpFetcher;
use crate::utils::error::{IngestError, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeverPosting {
    id: String,
    text: String,
    hosted_url: Option<String>,
    apply_url: Option<String>,
    categories: Option<Categories>,
    created_at: Option<i64>,
    description_plain: Option<String>,
    description: Option<String>,
    salary_range: Option<SalaryRange>,
    workplace_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Categories {
    location: Option<String>,
    commitment: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SalaryRange {
    min: Option<f64>,
    max: Option<f64>,
    interval: Option<String>,
}

fn salary_interval(interval: &str) -> Option<SalaryPeriod> {
    match interval {
        "per-hour-wage" => Some(SalaryPeriod::Hourly),
        "per-week-wage" => Some(SalaryPeriod::Weekly),
        "per-month-salary" => Some(SalaryPeriod::Monthly),
        "per-year-salary" => Some(SalaryPeriod::Annual),
        _ => None,
    }
}

pub struct LeverSource {
    config: LeverConfig,
    http: Arc<HttpFetcher>,
}

impl LeverSource {
    pub fn new(config: LeverConfig, http: Arc<HttpFetcher>) -> Self {
        Self { config, http }
    }

    fn to_raw(company: &LeverCompany, posting: LeverPosting) -> RawJob {
        let mut raw = RawJob::new(SourceName::Lever, posting.id, posting.text);
        raw.company = Some(company.company.clone().unwrap_or_else(|| company.slug.clone()));
        raw.apply_url = posting.hosted_url.or(posting.apply_url);
        raw.description = posting.description_plain.or(posting.description);
        raw.posted_at = posting
            .created_at
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single());

        let location = posting.categories.as_ref().and_then(|c| c.location.clone());
        raw.location = match (posting.workplace_type.as_deref(), location) {
            (Some("remote"), Some(loc)) if !loc.to_lowercase().contains("remote") => {
                Some(format!("Remote - {}", loc))
            }
            (Some("remote"), None) => Some("Remote".to_string()),
            (_, loc) => loc,
        };
        raw.employment_type = posting.categories.and_then(|c| c.commitment);

        if let Some(range) = posting.salary_range {
            raw.salary_min = range.min;
            raw.salary_max = range.max;
            raw.salary_period = range.interval.as_deref().and_then(salary_interval);
        }
        raw
    }
}

#[async_trait]
impl JobSource for LeverSource {
    fn name(&self) -> SourceName {
        SourceName::Lever
    }

    async fn fetch(&self) -> Result<Vec<RawJob>> {
        let mut jobs = Vec::new();
        let mut failures: Vec<IngestError> = Vec::new();

        for company in &self.config.companies {
            let url = format!(
                "{}/v0/postings/{}",
                self.config.base_url.trim_end_matches('/'),
                company.slug
            );
            let result: Result<Vec<LeverPosting>> = self
                .http
                .fetch_json(SourceName::Lever, |client| {
                    client.get(&url).query(&[("mode", "json")])
                })
                .await;

            match result {
                Ok(postings) => {
                    tracing::debug!("Lever {}: {} postings", company.slug, postings.len());
                    jobs.extend(postings.into_iter().map(|p| Self::to_raw(company, p)));
                }
                Err(e) => {
                    tracing::warn!("⚠️ Lever company {} failed: {}", company.slug, e);
                    failures.push(e);
                }
            }
        }

        if !failures.is_empty() && failures.len() == self.config.companies.len() {
            return Err(failures.remove(0));
        }

        tracing::info!("📥 Lever returned {} postings", jobs.len());
        Ok(jobs)
    }
}
