use crate::domain::model::SourceName;
use crate::utils::error::{IngestError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub dedup: DedupConfig,
    #[serde(default)]
    pub freshness: FreshnessConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            concurrent_requests: default_concurrent_requests(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcesConfig {
    pub adzuna: Option<AdzunaConfig>,
    pub usajobs: Option<UsaJobsConfig>,
    pub greenhouse: Option<GreenhouseConfig>,
    pub lever: Option<LeverConfig>,
    pub jooble: Option<JoobleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdzunaConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_adzuna_base_url")]
    pub base_url: String,
    #[serde(default = "default_country")]
    pub country: String,
    pub app_id: Option<String>,
    pub app_key: Option<String>,
    #[serde(default = "default_search_keywords")]
    pub keywords: String,
    #[serde(default = "default_results_per_page")]
    pub results_per_page: usize,
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsaJobsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_usajobs_base_url")]
    pub base_url: String,
    pub api_key: Option<String>,
    pub user_agent_email: Option<String>,
    #[serde(default = "default_search_keywords")]
    pub keywords: String,
    #[serde(default = "default_usajobs_page_size")]
    pub results_per_page: usize,
    #[serde(default = "default_usajobs_max_pages")]
    pub max_pages: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GreenhouseConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_greenhouse_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub boards: Vec<GreenhouseBoard>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GreenhouseBoard {
    pub token: String,
    pub company: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeverConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_lever_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub companies: Vec<LeverCompany>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeverCompany {
    pub slug: String,
    pub company: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoobleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_jooble_base_url")]
    pub base_url: String,
    pub api_key: Option<String>,
    #[serde(default = "default_search_keywords")]
    pub keywords: String,
    #[serde(default)]
    pub location: String,
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default = "default_include_keywords")]
    pub include_keywords: Vec<String>,
    #[serde(default = "default_exclude_keywords")]
    pub exclude_keywords: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            include_keywords: default_include_keywords(),
            exclude_keywords: default_exclude_keywords(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: default_fuzzy_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreshnessConfig {
    #[serde(default = "default_expire_after_days")]
    pub expire_after_days: i64,
    #[serde(default = "default_unseen_after_days")]
    pub unseen_after_days: i64,
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        Self {
            expire_after_days: default_expire_after_days(),
            unseen_after_days: default_unseen_after_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub path: String,
    #[serde(default = "default_true")]
    pub write_reports: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    pub cron_secret: Option<String>,
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,
    #[serde(default = "default_stale_after_hours")]
    pub stale_after_hours: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cron_secret: None,
            rate_limit_per_minute: default_rate_limit(),
            stale_after_hours: default_stale_after_hours(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_timeout_seconds() -> u64 {
    30
}
fn default_retry_attempts() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    500
}
fn default_concurrent_requests() -> usize {
    3
}
fn default_user_agent() -> String {
    format!("pmhnp-ingest/{}", env!("CARGO_PKG_VERSION"))
}
fn default_adzuna_base_url() -> String {
    "https://api.adzuna.com".to_string()
}
fn default_usajobs_base_url() -> String {
    "https://data.usajobs.gov".to_string()
}
fn default_greenhouse_base_url() -> String {
    "https://boards-api.greenhouse.io".to_string()
}
fn default_lever_base_url() -> String {
    "https://api.lever.co".to_string()
}
fn default_jooble_base_url() -> String {
    "https://jooble.org".to_string()
}
fn default_country() -> String {
    "us".to_string()
}
fn default_search_keywords() -> String {
    "psychiatric nurse practitioner".to_string()
}
fn default_results_per_page() -> usize {
    50
}
fn default_max_pages() -> usize {
    5
}
fn default_usajobs_page_size() -> usize {
    250
}
fn default_usajobs_max_pages() -> usize {
    2
}
fn default_include_keywords() -> Vec<String> {
    [
        "pmhnp",
        "pmh-np",
        "psychiatric nurse practitioner",
        "psychiatric mental health nurse practitioner",
        "psychiatric-mental health nurse practitioner",
        "mental health nurse practitioner",
        "psych np",
        "psychiatric np",
        "psychiatric aprn",
        "psychiatric arnp",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_exclude_keywords() -> Vec<String> {
    ["medical assistant", "lpn", "psychologist", "social worker", "pharmacist"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_fuzzy_threshold() -> f64 {
    0.85
}
fn default_expire_after_days() -> i64 {
    crate::core::freshness::DEFAULT_EXPIRE_AFTER_DAYS
}
fn default_unseen_after_days() -> i64 {
    14
}
fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}
fn default_rate_limit() -> u32 {
    60
}
fn default_stale_after_hours() -> i64 {
    26
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid regex"))
}

impl IngestConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置，先替換 `${VAR}` 環境變數
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);
        let mut config: IngestConfig = toml::from_str(&processed)?;

        // 未解析的 `${CRON_SECRET}` 等同未設定
        config.server.cron_secret = config
            .server
            .cron_secret
            .take()
            .filter(|s| !s.trim().is_empty() && !s.contains("${"))
            .or_else(|| std::env::var("CRON_SECRET").ok().filter(|s| !s.trim().is_empty()));

        Ok(config)
    }

    /// 未設定的變數保留原樣，交給 validate 報錯
    fn substitute_env_vars(content: &str) -> String {
        env_var_pattern()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn enabled_sources(&self) -> Vec<SourceName> {
        let s = &self.sources;
        let mut enabled = Vec::new();
        if s.adzuna.as_ref().is_some_and(|c| c.enabled) {
            enabled.push(SourceName::Adzuna);
        }
        if s.usajobs.as_ref().is_some_and(|c| c.enabled) {
            enabled.push(SourceName::UsaJobs);
        }
        if s.greenhouse.as_ref().is_some_and(|c| c.enabled) {
            enabled.push(SourceName::Greenhouse);
        }
        if s.lever.as_ref().is_some_and(|c| c.enabled) {
            enabled.push(SourceName::Lever);
        }
        if s.jooble.as_ref().is_some_and(|c| c.enabled) {
            enabled.push(SourceName::Jooble);
        }
        enabled
    }

    /// 只保留指定的來源，其餘停用
    pub fn restrict_sources(&mut self, only: &[SourceName]) {
        if only.is_empty() {
            return;
        }
        let keep = |name: SourceName| only.contains(&name);
        if let Some(c) = self.sources.adzuna.as_mut() {
            c.enabled &= keep(SourceName::Adzuna);
        }
        if let Some(c) = self.sources.usajobs.as_mut() {
            c.enabled &= keep(SourceName::UsaJobs);
        }
        if let Some(c) = self.sources.greenhouse.as_mut() {
            c.enabled &= keep(SourceName::Greenhouse);
        }
        if let Some(c) = self.sources.lever.as_mut() {
            c.enabled &= keep(SourceName::Lever);
        }
        if let Some(c) = self.sources.jooble.as_mut() {
            c.enabled &= keep(SourceName::Jooble);
        }
    }
}

impl Validate for IngestConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("store.path", &self.store.path)?;
        validation::validate_positive_number(
            "http.concurrent_requests",
            self.http.concurrent_requests,
            1,
        )?;
        validation::validate_range("http.timeout_seconds", self.http.timeout_seconds, 1, 300)?;
        validation::validate_range("dedup.fuzzy_threshold", self.dedup.fuzzy_threshold, 0.5, 1.0)?;
        validation::validate_non_empty_list(
            "filter.include_keywords",
            &self.filter.include_keywords,
        )?;

        if self.freshness.expire_after_days < 15 {
            return Err(IngestError::InvalidConfigValueError {
                field: "freshness.expire_after_days".to_string(),
                value: self.freshness.expire_after_days.to_string(),
                reason: "Must be at least 15 days".to_string(),
            });
        }
        validation::validate_positive_number(
            "freshness.unseen_after_days",
            self.freshness.unseen_after_days.max(0) as usize,
            1,
        )?;
        validation::validate_positive_number(
            "server.rate_limit_per_minute",
            self.server.rate_limit_per_minute as usize,
            1,
        )?;

        let sources = &self.sources;
        if let Some(c) = sources.adzuna.as_ref().filter(|c| c.enabled) {
            validation::validate_url("sources.adzuna.base_url", &c.base_url)?;
            validation::validate_required("sources.adzuna.app_id", &c.app_id)?;
            validation::validate_required("sources.adzuna.app_key", &c.app_key)?;
            validation::validate_positive_number("sources.adzuna.max_pages", c.max_pages, 1)?;
            validation::validate_positive_number(
                "sources.adzuna.results_per_page",
                c.results_per_page,
                1,
            )?;
        }
        if let Some(c) = sources.usajobs.as_ref().filter(|c| c.enabled) {
            validation::validate_url("sources.usajobs.base_url", &c.base_url)?;
            validation::validate_required("sources.usajobs.api_key", &c.api_key)?;
            validation::validate_required(
                "sources.usajobs.user_agent_email",
                &c.user_agent_email,
            )?;
            validation::validate_range(
                "sources.usajobs.results_per_page",
                c.results_per_page,
                1,
                500,
            )?;
        }
        if let Some(c) = sources.greenhouse.as_ref().filter(|c| c.enabled) {
            validation::validate_url("sources.greenhouse.base_url", &c.base_url)?;
            if c.boards.is_empty() {
                return Err(IngestError::MissingConfigError {
                    field: "sources.greenhouse.boards".to_string(),
                });
            }
        }
        if let Some(c) = sources.lever.as_ref().filter(|c| c.enabled) {
            validation::validate_url("sources.lever.base_url", &c.base_url)?;
            if c.companies.is_empty() {
                return Err(IngestError::MissingConfigError {
                    field: "sources.lever.companies".to_string(),
                });
            }
        }
        if let Some(c) = sources.jooble.as_ref().filter(|c| c.enabled) {
            validation::validate_url("sources.jooble.base_url", &c.base_url)?;
            validation::validate_required("sources.jooble.api_key", &c.api_key)?;
        }

        Ok(())
    }
}
