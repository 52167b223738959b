use crate::core::freshness::freshness_score;
use crate::domain::model::{JobRecord, NormalizedJob, ParsedLocation, SourceName, SourceRef};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

const UNKNOWN_COMPANY_KEY: &str = "unknown employer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchReason {
    Url,
    Fingerprint,
    Fuzzy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupDecision {
    New,
    /// Same source and external id: the posting itself changed.
    Update(usize),
    /// Same job seen through another listing.
    Duplicate { index: usize, reason: MatchReason },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DedupStats {
    pub new: usize,
    pub updated: usize,
    pub duplicates: usize,
}

/// Token-set Dice coefficient of two normalized titles.
pub fn title_similarity(a: &str, b: &str) -> f64 {
    let left: HashSet<&str> = a.split_whitespace().collect();
    let right: HashSet<&str> = b.split_whitespace().collect();
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    let shared = left.intersection(&right).count();
    (2 * shared) as f64 / (left.len() + right.len()) as f64
}

fn same_place(a: &ParsedLocation, b: &ParsedLocation) -> bool {
    (a.is_remote && b.is_remote) || (a.state_code.is_some() && a.state_code == b.state_code)
}

/// Indexes over the existing records, kept current as the batch is merged.
pub struct Deduplicator {
    threshold: f64,
    by_source: HashMap<(SourceName, String), usize>,
    by_url: HashMap<String, usize>,
    by_fingerprint: HashMap<String, usize>,
    by_company: HashMap<String, Vec<usize>>,
}

impl Deduplicator {
    pub fn new(records: &[JobRecord], threshold: f64) -> Self {
        let mut dedup = Self {
            threshold,
            by_source: HashMap::new(),
            by_url: HashMap::new(),
            by_fingerprint: HashMap::new(),
            by_company: HashMap::new(),
        };
        for (index, record) in records.iter().enumerate() {
            dedup.register(index, record);
        }
        dedup
    }

    pub fn register(&mut self, index: usize, record: &JobRecord) {
        for source in &record.sources {
            self.by_source
                .entry((source.source, source.external_id.clone()))
                .or_insert(index);
        }
        self.by_url.entry(record.apply_url.clone()).or_insert(index);
        self.by_fingerprint
            .entry(record.fingerprint.clone())
            .or_insert(index);

        let bucket = self.by_company.entry(record.company_key.clone()).or_default();
        if !bucket.contains(&index) {
            bucket.push(index);
        }
    }

    pub fn decide(&self, job: &NormalizedJob, records: &[JobRecord]) -> DedupDecision {
        if let Some(&index) = self.by_source.get(&(job.source, job.external_id.clone())) {
            return DedupDecision::Update(index);
        }
        if let Some(&index) = self.by_url.get(&job.apply_url) {
            return DedupDecision::Duplicate {
                index,
                reason: MatchReason::Url,
            };
        }
        if let Some(&index) = self.by_fingerprint.get(&job.fingerprint) {
            return DedupDecision::Duplicate {
                index,
                reason: MatchReason::Fingerprint,
            };
        }

        if job.company_key.is_empty() || job.company_key == UNKNOWN_COMPANY_KEY {
            return DedupDecision::New;
        }

        let best = self
            .by_company
            .get(&job.company_key)
            .into_iter()
            .flatten()
            .filter_map(|&index| records.get(index).map(|r| (index, r)))
            .filter(|(_, record)| same_place(&record.location, &job.location))
            .map(|(index, record)| {
                (
                    index,
                    title_similarity(&record.normalized_title, &job.normalized_title),
                )
            })
            .filter(|(_, score)| *score >= self.threshold)
            .max_by(|a, b| a.1.total_cmp(&b.1));

        match best {
            Some((index, _)) => DedupDecision::Duplicate {
                index,
                reason: MatchReason::Fuzzy,
            },
            None => DedupDecision::New,
        }
    }
}

fn refresh_visibility(record: &mut JobRecord, now: DateTime<Utc>, expire_after_days: i64) {
    record.last_seen_at = now;
    record.freshness_score = freshness_score(record.posted_at, now, expire_after_days);
    if !record.is_published {
        tracing::debug!("♻️ Republishing job {} seen again", record.id);
    }
    record.is_published = true;
    record.expired_at = None;
}

fn apply_update(
    record: &mut JobRecord,
    job: NormalizedJob,
    now: DateTime<Utc>,
    expire_after_days: i64,
) {
    record.title = job.title;
    record.normalized_title = job.normalized_title;
    record.company = job.company;
    record.company_key = job.company_key;
    record.location = job.location;
    if job.salary.is_some() {
        record.salary = job.salary;
    }
    record.description = job.description;
    record.apply_url = job.apply_url;
    record.fingerprint = job.fingerprint;
    record.employment_type = job.employment_type.or(record.employment_type.take());
    record.posted_at = record.posted_at.min(job.posted_at);
    refresh_visibility(record, now, expire_after_days);
}

fn attach_duplicate(
    record: &mut JobRecord,
    job: NormalizedJob,
    now: DateTime<Utc>,
    expire_after_days: i64,
) {
    if !record.has_source(job.source, &job.external_id) {
        record.sources.push(SourceRef {
            source: job.source,
            external_id: job.external_id,
        });
    }
    if record.salary.is_none() {
        record.salary = job.salary;
    }
    refresh_visibility(record, now, expire_after_days);
}

/// Merge a normalized batch into `records`. Returns the stats and the indices of newly inserted records.
pub fn merge_batch(
    records: &mut Vec<JobRecord>,
    jobs: Vec<NormalizedJob>,
    threshold: f64,
    expire_after_days: i64,
    now: DateTime<Utc>,
) -> (DedupStats, Vec<usize>) {
    let mut dedup = Deduplicator::new(records, threshold);
    let mut stats = DedupStats::default();
    let mut inserted = Vec::new();

    for job in jobs {
        match dedup.decide(&job, records) {
            DedupDecision::New => {
                let record = JobRecord::from_normalized(job, now, expire_after_days);
                let index = records.len();
                dedup.register(index, &record);
                records.push(record);
                inserted.push(index);
                stats.new += 1;
            }
            DedupDecision::Update(index) => {
                apply_update(&mut records[index], job, now, expire_after_days);
                dedup.register(index, &records[index]);
                stats.updated += 1;
            }
            DedupDecision::Duplicate { index, reason } => {
                tracing::debug!(
                    "🔁 {} {} duplicates job {} ({:?})",
                    job.source,
                    job.external_id,
                    records[index].id,
                    reason
                );
                attach_duplicate(&mut records[index], job, now, expire_after_days);
                dedup.register(index, &records[index]);
                stats.duplicates += 1;
            }
        }
    }

    (stats, inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::normalized_job;

    #[test]
    fn test_title_similarity() {
        assert_eq!(title_similarity("pmhnp outpatient", "pmhnp outpatient"), 1.0);
        assert!(title_similarity("pmhnp outpatient clinic", "pmhnp outpatient clinic remote") >= 0.85);
        assert_eq!(title_similarity("pmhnp inpatient", "pmhnp outpatient"), 0.5);
        assert_eq!(title_similarity("", "pmhnp"), 0.0);
    }

    #[test]
    fn test_new_then_update_same_source_id() {
        let now = Utc::now();
        let mut records = Vec::new();

        let first = normalized_job(SourceName::Lever, "abc", "PMHNP Outpatient", "Talkiatry", "NY");
        let (stats, inserted) = merge_batch(&mut records, vec![first], 0.85, 60, now);
        assert_eq!(stats.new, 1);
        assert_eq!(inserted, vec![0]);

        let mut changed = normalized_job(SourceName::Lever, "abc", "PMHNP Outpatient Lead", "Talkiatry", "NY");
        changed.apply_url = "https://jobs.lever.co/talkiatry/abc-v2".to_string();
        let (stats, inserted) = merge_batch(&mut records, vec![changed], 0.85, 60, now);

        assert_eq!(stats.updated, 1);
        assert!(inserted.is_empty());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "PMHNP Outpatient Lead");
    }

    #[test]
    fn test_cross_source_url_and_fingerprint_duplicates() {
        let now = Utc::now();
        let mut records = Vec::new();

        let greenhouse = normalized_job(SourceName::Greenhouse, "1", "PMHNP", "Cerebral", "TX");
        let mut same_url = normalized_job(SourceName::Adzuna, "z9", "Psych NP opening", "Cerebral", "CA");
        same_url.apply_url = greenhouse.apply_url.clone();
        let same_fingerprint = normalized_job(SourceName::Jooble, "j1", "PMHNP", "Cerebral", "TX");

        let (stats, _) = merge_batch(
            &mut records,
            vec![greenhouse, same_url, same_fingerprint],
            0.85,
            60,
            now,
        );

        assert_eq!(stats.new, 1);
        assert_eq!(stats.duplicates, 2);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sources.len(), 3);
    }

    #[test]
    fn test_fuzzy_duplicate_requires_same_company_and_place() {
        let now = Utc::now();
        let mut records = Vec::new();
        let base = normalized_job(SourceName::Lever, "l1", "PMHNP Outpatient Clinic", "LifeStance", "AZ");
        merge_batch(&mut records, vec![base], 0.85, 60, now);

        let decide = |job: &NormalizedJob, records: &[JobRecord]| {
            Deduplicator::new(records, 0.85).decide(job, records)
        };

        let near = normalized_job(SourceName::Adzuna, "a1", "PMHNP Outpatient Clinic Remote", "LifeStance", "AZ");
        assert_eq!(
            decide(&near, &records),
            DedupDecision::Duplicate {
                index: 0,
                reason: MatchReason::Fuzzy
            }
        );

        let other_state = normalized_job(SourceName::Adzuna, "a2", "PMHNP Outpatient Clinic Remote", "LifeStance", "NV");
        assert_eq!(decide(&other_state, &records), DedupDecision::New);

        let other_company = normalized_job(SourceName::Adzuna, "a3", "PMHNP Outpatient Clinic Remote", "Talkiatry", "AZ");
        assert_eq!(decide(&other_company, &records), DedupDecision::New);
    }

    #[test]
    fn test_duplicate_fills_salary_and_republishes() {
        let now = Utc::now();
        let mut records = Vec::new();
        let mut base = normalized_job(SourceName::Greenhouse, "1", "PMHNP", "Cerebral", "TX");
        base.salary = None;
        merge_batch(&mut records, vec![base], 0.85, 60, now);
        records[0].is_published = false;
        records[0].expired_at = Some(now);

        let with_salary = normalized_job(SourceName::Jooble, "j1", "PMHNP", "Cerebral", "TX");
        let (stats, _) = merge_batch(&mut records, vec![with_salary], 0.85, 60, now);

        assert_eq!(stats.duplicates, 1);
        assert!(records[0].salary.is_some());
        assert!(records[0].is_published);
        assert!(records[0].expired_at.is_none());
    }

    #[test]
    fn test_scores_follow_configured_expiry() {
        let now = Utc::now();
        let mut records = Vec::new();
        let mut month_old = normalized_job(SourceName::Lever, "l1", "PMHNP", "Talkiatry", "NY");
        month_old.posted_at = now - chrono::Duration::days(30);

        merge_batch(&mut records, vec![month_old.clone()], 0.85, 30, now);
        let configured = freshness_score(month_old.posted_at, now, 30);
        assert!((records[0].freshness_score - configured).abs() < 1e-9);
        assert!((records[0].freshness_score - 0.1).abs() < 1e-9);

        // 重新看到時以當下時間與設定重新計分
        let later = now + chrono::Duration::days(2);
        records[0].freshness_score = 1.0;
        merge_batch(&mut records, vec![month_old], 0.85, 30, later);
        assert_eq!(records[0].freshness_score, 0.0);

        let duplicate = normalized_job(SourceName::Jooble, "j1", "PMHNP", "Talkiatry", "NY");
        records[0].freshness_score = 1.0;
        let (stats, _) = merge_batch(&mut records, vec![duplicate], 0.85, 30, later);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(records[0].freshness_score, 0.0);
    }
}
