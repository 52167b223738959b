use crate::domain::model::{
    JobRecord, NormalizedJob, ParsedLocation, ParsedSalary, SalaryPeriod, SourceName,
};
use crate::core::freshness::DEFAULT_EXPIRE_AFTER_DAYS;
use crate::normalize::{company, fingerprint, text};
use chrono::Utc;

pub fn normalized_job(
    source: SourceName,
    external_id: &str,
    title: &str,
    company_name: &str,
    state: &str,
) -> NormalizedJob {
    let normalized_title = text::normalize_title(title);
    let company_key = company::normalize_company_name(company_name);
    let location = ParsedLocation {
        city: None,
        state_code: Some(state.to_string()),
        is_remote: false,
        is_hybrid: false,
        is_multiple: false,
        display: state.to_string(),
    };
    let fingerprint = fingerprint(&normalized_title, &company_key, &location);

    NormalizedJob {
        source,
        external_id: external_id.to_string(),
        title: title.to_string(),
        normalized_title,
        company: company_name.to_string(),
        company_key,
        location,
        salary: Some(ParsedSalary {
            min: 140_000.0,
            max: 170_000.0,
            period: SalaryPeriod::Annual,
            annual_min: 140_000,
            annual_max: 170_000,
        }),
        description: "Outpatient psychiatric care".to_string(),
        apply_url: format!("https://jobs.example.com/{}/{}", source, external_id),
        fingerprint,
        posted_at: Utc::now(),
        employment_type: Some("Full-time".to_string()),
    }
}

pub fn sample_record(title: &str, company_name: &str, state: &str) -> JobRecord {
    let id = uuid::Uuid::new_v4().to_string();
    JobRecord::from_normalized(
        normalized_job(SourceName::Greenhouse, &id, title, company_name, state),
        Utc::now(),
        DEFAULT_EXPIRE_AFTER_DAYS,
    )
}
