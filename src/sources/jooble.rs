use crate::config::toml_config::JoobleConfig;
use crate::domain::model::{RawJob, SourceName};
use crate::domain::ports::JobSource;
use crate::sources::{id_to_string, parse_timestamp, HttpFetcher};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    keywords: &'a str,
    location: &'a str,
    page: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    total_count: u64,
    #[serde(default)]
    jobs: Vec<JoobleJob>,
}

#[derive(Debug, Deserialize)]
struct JoobleJob {
    id: serde_json::Value,
    title: String,
    location: Option<String>,
    snippet: Option<String>,
    salary: Option<String>,
    #[serde(rename = "type")]
    job_type: Option<String>,
    link: Option<String>,
    company: Option<String>,
    updated: Option<String>,
}

pub struct JoobleSource {
    config: JoobleConfig,
    http: Arc<HttpFetcher>,
}

impl JoobleSource {
    pub fn new(config: JoobleConfig, http: Arc<HttpFetcher>) -> Self {
        Self { config, http }
    }

    fn to_raw(job: JoobleJob) -> RawJob {
        let mut raw = RawJob::new(SourceName::Jooble, id_to_string(&job.id), job.title);
        raw.company = job.company;
        raw.location = job.location;
        raw.description = job.snippet;
        raw.apply_url = job.link;
        raw.salary_text = job.salary.filter(|s| !s.trim().is_empty());
        raw.employment_type = job.job_type.filter(|t| !t.trim().is_empty());
        raw.posted_at = job.updated.as_deref().and_then(parse_timestamp);
        raw
    }
}

#[async_trait]
impl JobSource for JoobleSource {
    fn name(&self) -> SourceName {
        SourceName::Jooble
    }

    async fn fetch(&self) -> Result<Vec<RawJob>> {
        let url = format!(
            "{}/api/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.api_key.as_deref().unwrap_or_default()
        );
        let mut jobs = Vec::new();

        for page in 1..=self.config.max_pages {
            let body = SearchRequest {
                keywords: &self.config.keywords,
                location: &self.config.location,
                page: page.to_string(),
            };
            let response: SearchResponse = self
                .http
                .fetch_json(SourceName::Jooble, |client| client.post(&url).json(&body))
                .await?;

            if response.jobs.is_empty() {
                break;
            }
            tracing::debug!(
                "Jooble page {}: {} of {} postings",
                page,
                response.jobs.len(),
                response.total_count
            );
            jobs.extend(response.jobs.into_iter().map(Self::to_raw));

            if jobs.len() as u64 >= response.total_count {
                break;
            }
        }

        tracing::info!("📥 Jooble returned {} postings", jobs.len());
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::toml_config::HttpConfig;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_posts_search_and_stops_at_total() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/jooble-key")
                .json_body(serde_json::json!({"keywords": "pmhnp", "location": "", "page": "1"}));
            then.status(200).json_body(serde_json::json!({
                "totalCount": 1,
                "jobs": [{
                    "id": -5512938471234i64,
                    "title": "Psychiatric Nurse Practitioner",
                    "location": "Phoenix, AZ",
                    "snippet": "&nbsp;Outpatient <b>PMHNP</b> role",
                    "salary": "$65 - $80 per hour",
                    "source": "careerbuilder.com",
                    "type": "Full-time",
                    "link": "https://jooble.org/desc/-5512938471234",
                    "company": "Valleywise Health",
                    "updated": "2025-04-28T00:00:00.0000000"
                }]
            }));
        });

        let source = JoobleSource::new(
            JoobleConfig {
                enabled: true,
                base_url: server.base_url(),
                api_key: Some("jooble-key".to_string()),
                keywords: "pmhnp".to_string(),
                location: String::new(),
                max_pages: 3,
            },
            Arc::new(HttpFetcher::new(&HttpConfig::default()).unwrap()),
        );

        let jobs = source.fetch().await.unwrap();

        mock.assert_hits(1);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].external_id, "-5512938471234");
        assert_eq!(jobs[0].salary_text.as_deref(), Some("$65 - $80 per hour"));
        assert!(jobs[0].posted_at.is_some());
    }
}
