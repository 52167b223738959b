use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::utils::error::IngestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceName {
    Adzuna,
    UsaJobs,
    Greenhouse,
    Lever,
    Jooble,
}

impl SourceName {
    pub const ALL: [SourceName; 5] = [
        SourceName::Adzuna,
        SourceName::UsaJobs,
        SourceName::Greenhouse,
        SourceName::Lever,
        SourceName::Jooble,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceName::Adzuna => "adzuna",
            SourceName::UsaJobs => "usajobs",
            SourceName::Greenhouse => "greenhouse",
            SourceName::Lever => "lever",
            SourceName::Jooble => "jooble",
        }
    }
}

impl fmt::Display for SourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceName {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceName::ALL
            .into_iter()
            .find(|name| name.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| IngestError::InvalidConfigValueError {
                field: "source".to_string(),
                value: s.to_string(),
                reason: "Unknown job source".to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SalaryPeriod {
    Hourly,
    Weekly,
    Monthly,
    Annual,
}

impl SalaryPeriod {
    /// 換算成年薪的倍數 (全職 2080 小時)
    pub fn annual_multiplier(&self) -> f64 {
        match self {
            SalaryPeriod::Hourly => 2080.0,
            SalaryPeriod::Weekly => 52.0,
            SalaryPeriod::Monthly => 12.0,
            SalaryPeriod::Annual => 1.0,
        }
    }
}

/// A posting as returned by one job board, before any cleanup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawJob {
    pub source: SourceName,
    pub external_id: String,
    pub title: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub apply_url: Option<String>,
    pub salary_text: Option<String>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub salary_period: Option<SalaryPeriod>,
    pub posted_at: Option<DateTime<Utc>>,
    pub employment_type: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
}

impl RawJob {
    pub fn new(source: SourceName, external_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            source,
            external_id: external_id.into(),
            title: title.into(),
            company: None,
            location: None,
            description: None,
            apply_url: None,
            salary_text: None,
            salary_min: None,
            salary_max: None,
            salary_period: None,
            posted_at: None,
            employment_type: None,
            payload: serde_json::Value::Null,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedLocation {
    pub city: Option<String>,
    pub state_code: Option<String>,
    pub is_remote: bool,
    pub is_hybrid: bool,
    pub is_multiple: bool,
    pub display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedSalary {
    pub min: f64,
    pub max: f64,
    pub period: SalaryPeriod,
    pub annual_min: i64,
    pub annual_max: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedJob {
    pub source: SourceName,
    pub external_id: String,
    pub title: String,
    pub normalized_title: String,
    pub company: String,
    pub company_key: String,
    pub location: ParsedLocation,
    pub salary: Option<ParsedSalary>,
    pub description: String,
    pub apply_url: String,
    pub fingerprint: String,
    pub posted_at: DateTime<Utc>,
    pub employment_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRef {
    pub source: SourceName,
    pub external_id: String,
}

/// A job as persisted in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: Uuid,
    pub title: String,
    pub normalized_title: String,
    pub company: String,
    pub company_key: String,
    pub location: ParsedLocation,
    pub salary: Option<ParsedSalary>,
    pub description: String,
    pub apply_url: String,
    pub fingerprint: String,
    pub employment_type: Option<String>,
    pub sources: Vec<SourceRef>,
    pub posted_at: DateTime<Utc>,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub freshness_score: f64,
    pub is_published: bool,
    pub expired_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    pub fn from_normalized(job: NormalizedJob, now: DateTime<Utc>, expire_after_days: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            sources: vec![SourceRef {
                source: job.source,
                external_id: job.external_id,
            }],
            title: job.title,
            normalized_title: job.normalized_title,
            company: job.company,
            company_key: job.company_key,
            location: job.location,
            salary: job.salary,
            description: job.description,
            apply_url: job.apply_url,
            fingerprint: job.fingerprint,
            employment_type: job.employment_type,
            posted_at: job.posted_at,
            first_seen_at: now,
            last_seen_at: now,
            freshness_score: crate::core::freshness::freshness_score(
                job.posted_at,
                now,
                expire_after_days,
            ),
            is_published: true,
            expired_at: None,
        }
    }

    pub fn has_source(&self, source: SourceName, external_id: &str) -> bool {
        self.sources
            .iter()
            .any(|s| s.source == source && s.external_id == external_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceReport {
    pub source: SourceName,
    pub fetched: usize,
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl SourceReport {
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExtractResult {
    pub started_at: DateTime<Utc>,
    pub jobs: Vec<RawJob>,
    pub reports: Vec<SourceReport>,
}

#[derive(Debug, Clone, Default)]
pub struct TransformResult {
    pub started_at: DateTime<Utc>,
    pub jobs: Vec<NormalizedJob>,
    pub reports: Vec<SourceReport>,
    pub fetched: usize,
    pub rejections: BTreeMap<String, usize>,
}

impl TransformResult {
    pub fn rejected(&self) -> usize {
        self.rejections.values().sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dry_run: bool,
    pub sources: Vec<SourceReport>,
    pub fetched: usize,
    pub normalized: usize,
    pub rejected: usize,
    pub rejections: BTreeMap<String, usize>,
    pub new: usize,
    pub updated: usize,
    pub duplicates: usize,
    pub report_path: Option<String>,
}

impl RunSummary {
    pub fn failed_sources(&self) -> Vec<SourceName> {
        self.sources
            .iter()
            .filter(|r| r.is_failed())
            .map(|r| r.source)
            .collect()
    }
}
