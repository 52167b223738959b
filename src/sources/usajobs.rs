use crate::config::toml_config::UsaJobsConfig;
use crate::domain::model::{RawJob, SalaryPeriod, SourceName};
use crate::domain::ports::JobSource;
use crate::sources::{parse_timestamp, HttpFetcher};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SearchResponse {
    search_result: SearchResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SearchResult {
    #[serde(default)]
    search_result_items: Vec<SearchResultItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SearchResultItem {
    matched_object_id: String,
    matched_object_descriptor: Descriptor,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Descriptor {
    position_title: String,
    #[serde(rename = "PositionURI")]
    position_uri: Option<String>,
    #[serde(rename = "ApplyURI", default)]
    apply_uri: Vec<String>,
    organization_name: Option<String>,
    position_location_display: Option<String>,
    #[serde(default)]
    position_remuneration: Vec<Remuneration>,
    #[serde(default)]
    position_schedule: Vec<Named>,
    publication_start_date: Option<String>,
    user_area: Option<UserArea>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Remuneration {
    minimum_range: Option<String>,
    maximum_range: Option<String>,
    rate_interval_code: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Named {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UserArea {
    details: Option<Details>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Details {
    job_summary: Option<String>,
}

fn rate_interval(code: &str) -> Option<SalaryPeriod> {
    match code {
        "PH" => Some(SalaryPeriod::Hourly),
        "PA" => Some(SalaryPeriod::Annual),
        "PM" => Some(SalaryPeriod::Monthly),
        "PW" | "BW" => Some(SalaryPeriod::Weekly),
        _ => None,
    }
}

pub struct UsaJobsSource {
    config: UsaJobsConfig,
    http: Arc<HttpFetcher>,
}

impl UsaJobsSource {
    pub fn new(config: UsaJobsConfig, http: Arc<HttpFetcher>) -> Self {
        Self { config, http }
    }

    fn to_raw(item: SearchResultItem) -> RawJob {
        let d = item.matched_object_descriptor;
        let mut raw = RawJob::new(SourceName::UsaJobs, item.matched_object_id, d.position_title);
        raw.company = d.organization_name;
        raw.location = d.position_location_display;
        raw.apply_url = d.position_uri.or_else(|| d.apply_uri.into_iter().next());
        raw.posted_at = d.publication_start_date.as_deref().and_then(parse_timestamp);
        raw.description = d.user_area.and_then(|u| u.details).and_then(|x| x.job_summary);
        raw.employment_type = d.position_schedule.into_iter().find_map(|s| s.name);

        if let Some(pay) = d.position_remuneration.into_iter().next() {
            raw.salary_min = pay.minimum_range.and_then(|v| v.trim().parse().ok());
            raw.salary_max = pay.maximum_range.and_then(|v| v.trim().parse().ok());
            let code = pay
                .rate_interval_code
                .map(|c| c.trim().to_ascii_uppercase())
                .unwrap_or_default();
            // 雙週薪 (BW) 除以 2 換成週薪
            if code == "BW" {
                raw.salary_min = raw.salary_min.map(|v| v / 2.0);
                raw.salary_max = raw.salary_max.map(|v| v / 2.0);
            }
            raw.salary_period = rate_interval(&code);
        }
        raw
    }
}

#[async_trait]
impl JobSource for UsaJobsSource {
    fn name(&self) -> SourceName {
        SourceName::UsaJobs
    }

    async fn fetch(&self) -> Result<Vec<RawJob>> {
        let url = format!("{}/api/search", self.config.base_url.trim_end_matches('/'));
        let host = reqwest::Url::parse(&url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| "data.usajobs.gov".to_string());
        let api_key = self.config.api_key.clone().unwrap_or_default();
        let email = self.config.user_agent_email.clone().unwrap_or_default();
        let per_page = self.config.results_per_page.to_string();
        let mut jobs = Vec::new();

        for page in 1..=self.config.max_pages {
            let page_str = page.to_string();
            let response: SearchResponse = self
                .http
                .fetch_json(SourceName::UsaJobs, |client| {
                    client
                        .get(&url)
                        .header("Host", host.as_str())
                        .header("User-Agent", email.as_str())
                        .header("Authorization-Key", api_key.as_str())
                        .query(&[
                            ("Keyword", self.config.keywords.as_str()),
                            ("ResultsPerPage", per_page.as_str()),
                            ("Page", page_str.as_str()),
                        ])
                })
                .await?;

            let items = response.search_result.search_result_items;
            let count = items.len();
            jobs.extend(items.into_iter().map(Self::to_raw));

            if count < self.config.results_per_page {
                break;
            }
        }

        tracing::info!("📥 USAJobs returned {} postings", jobs.len());
        Ok(jobs)
    }
}
