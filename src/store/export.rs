use crate::domain::model::JobRecord;
use crate::utils::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    id: String,
    title: &'a str,
    company: &'a str,
    city: &'a str,
    state: &'a str,
    remote: bool,
    salary_min: Option<i64>,
    salary_max: Option<i64>,
    apply_url: &'a str,
    posted_at: String,
    freshness: String,
}

impl<'a> From<&'a JobRecord> for ExportRow<'a> {
    fn from(job: &'a JobRecord) -> Self {
        Self {
            id: job.id.to_string(),
            title: &job.title,
            company: &job.company,
            city: job.location.city.as_deref().unwrap_or(""),
            state: job.location.state_code.as_deref().unwrap_or(""),
            remote: job.location.is_remote,
            salary_min: job.salary.as_ref().map(|s| s.annual_min),
            salary_max: job.salary.as_ref().map(|s| s.annual_max),
            apply_url: &job.apply_url,
            posted_at: job.posted_at.format("%Y-%m-%d").to_string(),
            freshness: format!("{:.2}", job.freshness_score),
        }
    }
}

/// 只匯出已發布的職缺，回傳寫入筆數
pub fn export_csv<W: Write>(records: &[JobRecord], writer: W) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut count = 0;

    for job in records.iter().filter(|j| j.is_published) {
        csv_writer.serialize(ExportRow::from(job))?;
        count += 1;
    }

    csv_writer.flush()?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::sample_record;

    #[test]
    fn test_export_skips_unpublished() {
        let mut expired = sample_record("Psychiatric Nurse Practitioner", "Talkiatry", "NY");
        expired.is_published = false;
        let live = sample_record("PMHNP - Telehealth", "Cerebral", "TX");

        let mut buffer = Vec::new();
        let count = export_csv(&[expired, live], &mut buffer).unwrap();
        let output = String::from_utf8(buffer).unwrap();

        assert_eq!(count, 1);
        assert!(output.starts_with("id,title,company,city,state,remote"));
        assert!(output.contains("PMHNP - Telehealth,Cerebral"));
        assert!(!output.contains("Talkiatry"));
    }
}
