use crate::config::toml_config::AdzunaConfig;
use crate::domain::model::{RawJob, SalaryPeriod, SourceName};
use crate::domain::ports::JobSource;
use crate::sources::{id_to_string, parse_timestamp, HttpFetcher};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<AdzunaJob>,
}

#[derive(Debug, Deserialize)]
struct AdzunaJob {
    id: serde_json::Value,
    title: String,
    description: Option<String>,
    created: Option<String>,
    redirect_url: Option<String>,
    company: Option<DisplayName>,
    location: Option<AdzunaLocation>,
    salary_min: Option<f64>,
    salary_max: Option<f64>,
    salary_is_predicted: Option<serde_json::Value>,
    contract_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DisplayName {
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AdzunaLocation {
    display_name: Option<String>,
    #[serde(default)]
    area: Vec<String>,
}

impl AdzunaLocation {
    /// area 的格式是 ["US", "Texas", "Travis County", "Austin"]
    fn to_text(&self) -> Option<String> {
        match self.area.as_slice() {
            [_, state, .., city] => Some(format!("{}, {}", city, state)),
            [_, state] => Some(state.clone()),
            _ => self.display_name.clone(),
        }
    }
}

fn is_predicted(value: &Option<serde_json::Value>) -> bool {
    match value {
        Some(serde_json::Value::String(s)) => s == "1",
        Some(serde_json::Value::Number(n)) => n.as_i64() == Some(1),
        Some(serde_json::Value::Bool(b)) => *b,
        _ => false,
    }
}

pub struct AdzunaSource {
    config: AdzunaConfig,
    http: Arc<HttpFetcher>,
}

impl AdzunaSource {
    pub fn new(config: AdzunaConfig, http: Arc<HttpFetcher>) -> Self {
        Self { config, http }
    }

    fn to_raw(&self, job: AdzunaJob) -> RawJob {
        let mut raw = RawJob::new(SourceName::Adzuna, id_to_string(&job.id), job.title);
        raw.company = job.company.and_then(|c| c.display_name);
        raw.location = job.location.as_ref().and_then(AdzunaLocation::to_text);
        raw.description = job.description;
        raw.apply_url = job.redirect_url;
        raw.posted_at = job.created.as_deref().and_then(parse_timestamp);
        raw.employment_type = job.contract_time;

        // Adzuna 估算的薪資不可信，直接丟掉
        if !is_predicted(&job.salary_is_predicted) {
            raw.salary_min = job.salary_min;
            raw.salary_max = job.salary_max;
            raw.salary_period = Some(SalaryPeriod::Annual);
        }
        raw
    }
}

#[async_trait]
impl JobSource for AdzunaSource {
    fn name(&self) -> SourceName {
        SourceName::Adzuna
    }

    async fn fetch(&self) -> Result<Vec<RawJob>> {
        let app_id = self.config.app_id.clone().unwrap_or_default();
        let app_key = self.config.app_key.clone().unwrap_or_default();
        let per_page = self.config.results_per_page.to_string();
        let mut jobs = Vec::new();

        for page in 1..=self.config.max_pages {
            let url = format!(
                "{}/v1/api/jobs/{}/search/{}",
                self.config.base_url.trim_end_matches('/'),
                self.config.country,
                page
            );
            tracing::debug!("Adzuna page {}: {}", page, url);

            let response: SearchResponse = self
                .http
                .fetch_json(SourceName::Adzuna, |client| {
                    client.get(&url).query(&[
                        ("app_id", app_id.as_str()),
                        ("app_key", app_key.as_str()),
                        ("what", self.config.keywords.as_str()),
                        ("results_per_page", per_page.as_str()),
                        ("content-type", "application/json"),
                    ])
                })
                .await?;

            let count = response.results.len();
            jobs.extend(response.results.into_iter().map(|job| self.to_raw(job)));

            if count < self.config.results_per_page {
                break;
            }
        }

        tracing::info!("📥 Adzuna returned {} postings", jobs.len());
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::toml_config::HttpConfig;
    use httpmock::prelude::*;

    fn source(base_url: String) -> AdzunaSource {
        AdzunaSource::new(
            AdzunaConfig {
                enabled: true,
                base_url,
                country: "us".to_string(),
                app_id: Some("id".to_string()),
                app_key: Some("key".to_string()),
                keywords: "pmhnp".to_string(),
                results_per_page: 2,
                max_pages: 3,
            },
            Arc::new(HttpFetcher::new(&HttpConfig::default()).unwrap()),
        )
    }

    #[tokio::test]
    async fn test_pages_until_short_page() {
        let server = MockServer::start();
        let page1 = server.mock(|when, then| {
            when.method(GET)
                .path("/v1/api/jobs/us/search/1")
                .query_param("app_id", "id")
                .query_param("what", "pmhnp");
            then.status(200).json_body(serde_json::json!({
                "results": [
                    {
                        "id": "101",
                        "title": "PMHNP",
                        "created": "2025-05-01T10:00:00Z",
                        "redirect_url": "https://www.adzuna.com/land/ad/101",
                        "company": {"display_name": "Talkiatry"},
                        "location": {"display_name": "Austin, Travis County", "area": ["US", "Texas", "Travis County", "Austin"]},
                        "salary_min": 130000.0,
                        "salary_max": 150000.0,
                        "salary_is_predicted": "0"
                    },
                    {
                        "id": 102,
                        "title": "Psychiatric Nurse Practitioner",
                        "redirect_url": "https://www.adzuna.com/land/ad/102",
                        "salary_min": 90000.0,
                        "salary_is_predicted": "1"
                    }
                ]
            }));
        });
        let page2 = server.mock(|when, then| {
            when.method(GET).path("/v1/api/jobs/us/search/2");
            then.status(200).json_body(serde_json::json!({
                "results": [
                    {"id": "103", "title": "PMHNP Telehealth", "redirect_url": "https://www.adzuna.com/land/ad/103"}
                ]
            }));
        });
        let page3 = server.mock(|when, then| {
            when.method(GET).path("/v1/api/jobs/us/search/3");
            then.status(200).json_body(serde_json::json!({"results": []}));
        });

        let jobs = source(server.base_url()).fetch().await.unwrap();

        page1.assert();
        page2.assert();
        page3.assert_hits(0);
        assert_eq!(jobs.len(), 3);
        assert_eq!(jobs[0].location.as_deref(), Some("Austin, Texas"));
        assert_eq!(jobs[0].salary_min, Some(130000.0));
        assert_eq!(jobs[1].external_id, "102");
        assert!(jobs[1].salary_min.is_none());
        assert!(jobs[0].posted_at.is_some());
    }
}
