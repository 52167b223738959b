//! Per-board adapters. Each one maps a third-party schema onto [`RawJob`].

pub mod adzuna;
pub mod greenhouse;
pub mod http;
pub mod jooble;
pub mod lever;
pub mod usajobs;

use crate::config::IngestConfig;
use crate::domain::ports::JobSource;
use crate::utils::error::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::sync::Arc;

pub use adzuna::AdzunaSource;
pub use greenhouse::GreenhouseSource;
pub use http::HttpFetcher;
pub use jooble::JoobleSource;
pub use lever::LeverSource;
pub use usajobs::UsaJobsSource;

/// Accepts RFC 3339, naive `YYYY-MM-DDTHH:MM:SS[.f]` (treated as UTC) and bare dates.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// 有些 API 的 id 是數字，有些是字串
pub fn id_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Instantiate every enabled source from the configuration.
pub fn build_sources(config: &IngestConfig) -> Result<Vec<Arc<dyn JobSource>>> {
    let fetcher = Arc::new(HttpFetcher::new(&config.http)?);
    let mut sources: Vec<Arc<dyn JobSource>> = Vec::new();
    let s = &config.sources;

    if let Some(c) = s.adzuna.as_ref().filter(|c| c.enabled) {
        sources.push(Arc::new(AdzunaSource::new(c.clone(), fetcher.clone())));
    }
    if let Some(c) = s.usajobs.as_ref().filter(|c| c.enabled) {
        sources.push(Arc::new(UsaJobsSource::new(c.clone(), fetcher.clone())));
    }
    if let Some(c) = s.greenhouse.as_ref().filter(|c| c.enabled) {
        sources.push(Arc::new(GreenhouseSource::new(c.clone(), fetcher.clone())));
    }
    if let Some(c) = s.lever.as_ref().filter(|c| c.enabled) {
        sources.push(Arc::new(LeverSource::new(c.clone(), fetcher.clone())));
    }
    if let Some(c) = s.jooble.as_ref().filter(|c| c.enabled) {
        sources.push(Arc::new(JoobleSource::new(c.clone(), fetcher.clone())));
    }

    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_timestamp_formats() {
        let rfc = parse_timestamp("2025-03-01T12:30:00Z").unwrap();
        assert_eq!((rfc.month(), rfc.day(), rfc.hour()), (3, 1, 12));

        let offset = parse_timestamp("2025-03-01T08:00:00-05:00").unwrap();
        assert_eq!(offset.hour(), 13);

        let naive = parse_timestamp("2025-02-14T00:00:00.0000").unwrap();
        assert_eq!(naive.day(), 14);

        let date = parse_timestamp("2025-01-31").unwrap();
        assert_eq!(date.day(), 31);

        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_id_to_string() {
        assert_eq!(id_to_string(&serde_json::json!(4123)), "4123");
        assert_eq!(id_to_string(&serde_json::json!("abc")), "abc");
    }
}
