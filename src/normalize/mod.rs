//! Turns heterogeneous [`RawJob`]s into comparable [`NormalizedJob`]s.

pub mod company;
pub mod location;
pub mod relevance;
pub mod salary;
pub mod text;

use crate::config::toml_config::FilterConfig;
use crate::domain::model::{NormalizedJob, ParsedLocation, RawJob};
use crate::utils::error::{IngestError, Result};
use chrono::{DateTime, Utc};
use relevance::{Relevance, RelevanceFilter};
use sha2::{Digest, Sha256};
use url::Url;

pub const REJECT_EMPTY_TITLE: &str = "empty_title";
pub const REJECT_MISSING_URL: &str = "missing_apply_url";
pub const REJECT_INVALID_URL: &str = "invalid_apply_url";
pub const REJECT_NOT_RELEVANT: &str = "not_relevant";
pub const REJECT_EXCLUDED: &str = "excluded_title";

const TRACKING_PARAMS: &[&str] = &["source", "ref", "gh_src", "lever-source", "src"];

/// Canonical apply URL used for exact duplicate detection.
pub fn canonical_url(raw: &str) -> Result<String> {
    let mut url = Url::parse(raw.trim()).map_err(|_| IngestError::rejected(REJECT_INVALID_URL))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(IngestError::rejected(REJECT_INVALID_URL));
    }

    url.set_fragment(None);

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| {
            let key = key.to_lowercase();
            !key.starts_with("utm_") && !TRACKING_PARAMS.contains(&key.as_str())
        })
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }

    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }

    Ok(url.to_string())
}

/// SHA-256 over title key, company key and place.
pub fn fingerprint(normalized_title: &str, company_key: &str, location: &ParsedLocation) -> String {
    let state = match (&location.state_code, location.is_remote) {
        (Some(code), _) => code.to_lowercase(),
        (None, true) => "remote".to_string(),
        (None, false) => String::new(),
    };
    let city = location
        .city
        .as_deref()
        .map(|c| c.to_lowercase())
        .unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(format!("{}|{}|{}|{}", normalized_title, company_key, state, city).as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    relevance: RelevanceFilter,
}

impl Normalizer {
    pub fn new(filter: &FilterConfig) -> Self {
        Self {
            relevance: RelevanceFilter::new(filter),
        }
    }

    /// Rejections come back as [`IngestError::ValidationError`] carrying one of the `REJECT_*` reasons.
    pub fn normalize(&self, raw: RawJob, now: DateTime<Utc>) -> Result<NormalizedJob> {
        let title = text::clean_title(&raw.title);
        if title.is_empty() {
            return Err(IngestError::rejected(REJECT_EMPTY_TITLE));
        }

        let apply_url = match raw.apply_url.as_deref().map(str::trim) {
            Some(u) if !u.is_empty() => canonical_url(u)?,
            _ => return Err(IngestError::rejected(REJECT_MISSING_URL)),
        };

        let description = raw
            .description
            .as_deref()
            .map(text::strip_html)
            .unwrap_or_default();

        match self.relevance.check(&title, &description) {
            Relevance::Relevant => {}
            Relevance::NoKeyword => return Err(IngestError::rejected(REJECT_NOT_RELEVANT)),
            Relevance::Excluded(keyword) => {
                tracing::debug!("Excluded '{}' on keyword '{}'", title, keyword);
                return Err(IngestError::rejected(REJECT_EXCLUDED));
            }
        }

        let company = company::display_company_name(raw.company.as_deref());
        let company_key = company::normalize_company_name(&company);
        let location = location::parse_location(raw.location.as_deref());
        let salary = salary::resolve_salary(
            raw.salary_min,
            raw.salary_max,
            raw.salary_period,
            raw.salary_text.as_deref(),
        );
        let normalized_title = text::normalize_title(&title);
        let fingerprint = fingerprint(&normalized_title, &company_key, &location);

        // 沒有日期或日期在未來時以抓取時間為準
        let posted_at = raw.posted_at.filter(|p| *p <= now).unwrap_or(now);

        Ok(NormalizedJob {
            source: raw.source,
            external_id: raw.external_id,
            title,
            normalized_title,
            company,
            company_key,
            location,
            salary,
            description,
            apply_url,
            fingerprint,
            posted_at,
            employment_type: raw.employment_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{SalaryPeriod, SourceName};
    use chrono::Duration;

    fn raw(title: &str, url: Option<&str>) -> RawJob {
        let mut job = RawJob::new(SourceName::Greenhouse, "gh-1", title);
        job.company = Some("Talkiatry, Inc.".to_string());
        job.location = Some("Remote - New York".to_string());
        job.apply_url = url.map(str::to_string);
        job.salary_text = Some("$140,000 - $170,000 per year".to_string());
        job
    }

    #[test]
    fn test_canonical_url_drops_tracking() {
        assert_eq!(
            canonical_url("https://Boards.Greenhouse.io/talkiatry/jobs/123/?utm_source=x&gh_src=abc#apply")
                .unwrap(),
            "https://boards.greenhouse.io/talkiatry/jobs/123"
        );
        assert_eq!(
            canonical_url("https://jobs.lever.co/acme/abc?lever-source=LinkedIn&team=psych").unwrap(),
            "https://jobs.lever.co/acme/abc?team=psych"
        );
        assert!(canonical_url("mailto:jobs@example.com").is_err());
    }

    #[test]
    fn test_normalize_full_job() {
        let normalizer = Normalizer::new(&FilterConfig::default());
        let now = Utc::now();
        let job = normalizer
            .normalize(
                raw(
                    "Psychiatric Nurse Practitioner - Job ID 77",
                    Some("https://boards.greenhouse.io/talkiatry/jobs/77"),
                ),
                now,
            )
            .unwrap();

        assert_eq!(job.title, "Psychiatric Nurse Practitioner");
        assert_eq!(job.normalized_title, "pmhnp");
        assert_eq!(job.company, "Talkiatry, Inc.");
        assert_eq!(job.company_key, "talkiatry");
        assert!(job.location.is_remote);
        assert_eq!(job.location.state_code.as_deref(), Some("NY"));
        assert_eq!(job.salary.as_ref().unwrap().period, SalaryPeriod::Annual);
        assert_eq!(job.posted_at, now);
        assert_eq!(job.fingerprint.len(), 64);
    }

    #[test]
    fn test_rejections() {
        let normalizer = Normalizer::new(&FilterConfig::default());
        let now = Utc::now();

        let reason = |result: Result<NormalizedJob>| match result {
            Err(IngestError::ValidationError { reason }) => reason,
            other => panic!("expected rejection, got {:?}", other.map(|j| j.title)),
        };

        assert_eq!(
            reason(normalizer.normalize(raw("   ", Some("https://x.io/1")), now)),
            REJECT_EMPTY_TITLE
        );
        assert_eq!(reason(normalizer.normalize(raw("PMHNP", None), now)), REJECT_MISSING_URL);
        assert_eq!(
            reason(normalizer.normalize(raw("PMHNP", Some("not a url")), now)),
            REJECT_INVALID_URL
        );
        assert_eq!(
            reason(normalizer.normalize(raw("Family Nurse Practitioner", Some("https://x.io/2")), now)),
            REJECT_NOT_RELEVANT
        );
    }

    #[test]
    fn test_future_posted_at_clamped() {
        let normalizer = Normalizer::new(&FilterConfig::default());
        let now = Utc::now();
        let mut job = raw("PMHNP", Some("https://x.io/3"));
        job.posted_at = Some(now + Duration::days(3));

        assert_eq!(normalizer.normalize(job, now).unwrap().posted_at, now);
    }

    #[test]
    fn test_fingerprint_ignores_formatting() {
        let loc = location::parse_location(Some("Austin, TX"));
        let a = fingerprint(&text::normalize_title("PMHNP - Outpatient"), "lifestance health", &loc);
        let b = fingerprint(&text::normalize_title("pmhnp (outpatient)"), "lifestance health", &loc);
        assert_eq!(a, b);
    }
}
