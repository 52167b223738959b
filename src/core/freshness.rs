use crate::config::toml_config::FreshnessConfig;
use crate::domain::model::JobRecord;
use crate::domain::ports::Storage;
use crate::store::JobRepository;
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_EXPIRE_AFTER_DAYS: i64 = 60;
const FULL_SCORE_DAYS: f64 = 3.0;
const HALF_SCORE_DAYS: f64 = 14.0;
const TAIL_SCORE: f64 = 0.1;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreshnessReport {
    pub scored: usize,
    pub expired_by_age: usize,
    pub expired_unseen: usize,
    pub published: usize,
}

fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t.clamp(0.0, 1.0)
}

/// 1.0 for the first three days, 0.5 at two weeks, 0.1 at the expiry age, 0.0 after.
pub fn freshness_score(posted_at: DateTime<Utc>, now: DateTime<Utc>, expire_after_days: i64) -> f64 {
    let age_days = (now - posted_at).num_seconds().max(0) as f64 / 86_400.0;
    let expire = (expire_after_days as f64).max(HALF_SCORE_DAYS + 1.0);

    if age_days <= FULL_SCORE_DAYS {
        1.0
    } else if age_days <= HALF_SCORE_DAYS {
        lerp(
            1.0,
            0.5,
            (age_days - FULL_SCORE_DAYS) / (HALF_SCORE_DAYS - FULL_SCORE_DAYS),
        )
    } else if age_days <= expire {
        lerp(0.5, TAIL_SCORE, (age_days - HALF_SCORE_DAYS) / (expire - HALF_SCORE_DAYS))
    } else {
        0.0
    }
}

/// Recompute scores and unpublish stale jobs. Running it twice with the same `now` changes nothing.
pub fn apply_freshness(
    records: &mut [JobRecord],
    now: DateTime<Utc>,
    config: &FreshnessConfig,
) -> FreshnessReport {
    let mut report = FreshnessReport::default();

    for record in records.iter_mut() {
        record.freshness_score = freshness_score(record.posted_at, now, config.expire_after_days);
        report.scored += 1;

        if !record.is_published {
            continue;
        }

        let age_days = (now - record.posted_at).num_days();
        let unseen_days = (now - record.last_seen_at).num_days();

        if age_days >= config.expire_after_days {
            record.is_published = false;
            record.expired_at = Some(now);
            report.expired_by_age += 1;
        } else if unseen_days >= config.unseen_after_days {
            record.is_published = false;
            record.expired_at = Some(now);
            report.expired_unseen += 1;
        } else {
            report.published += 1;
        }
    }

    tracing::info!(
        "🕒 Freshness pass: {} scored, {} expired by age, {} expired unseen, {} still published",
        report.scored,
        report.expired_by_age,
        report.expired_unseen,
        report.published
    );

    report
}

/// Load the store, run [`apply_freshness`] and save it back.
pub async fn run_freshness<S: Storage>(
    repository: &JobRepository<S>,
    config: &FreshnessConfig,
    now: DateTime<Utc>,
) -> Result<FreshnessReport> {
    let mut records = repository.load().await?;
    let report = apply_freshness(&mut records, now, config);
    repository.save(&records).await?;
    Ok(report)
}
