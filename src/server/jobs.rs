use crate::domain::model::JobRecord;
use crate::normalize::location::resolve_state;
use crate::server::{ApiError, AppState};
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: usize = 50;
pub const MAX_LIMIT: usize = 200;
const ANONYMOUS_CLIENT: &str = "anonymous";

#[derive(Debug, Default, Deserialize)]
pub struct JobsQuery {
    pub q: Option<String>,
    pub state: Option<String>,
    pub remote: Option<bool>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct JobsResponse {
    pub total: usize,
    pub jobs: Vec<JobRecord>,
}

/// 取 X-Forwarded-For 的第一個位址作為限流的 key
pub fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or(ANONYMOUS_CLIENT)
        .to_string()
}

fn matches(record: &JobRecord, query: &JobsQuery, state_code: Option<&str>) -> bool {
    if !record.is_published {
        return false;
    }
    if let Some(remote) = query.remote {
        if record.location.is_remote != remote {
            return false;
        }
    }
    if let Some(code) = state_code {
        if record.location.state_code.as_deref() != Some(code) {
            return false;
        }
    }
    match query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => {
            let needle = q.to_lowercase();
            record.title.to_lowercase().contains(&needle)
                || record.company.to_lowercase().contains(&needle)
                || record.description.to_lowercase().contains(&needle)
        }
        None => true,
    }
}

/// Published jobs filtered by the query, freshest first.
pub fn search(records: Vec<JobRecord>, query: &JobsQuery) -> JobsResponse {
    let state_code = query.state.as_deref().and_then(resolve_state);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let mut hits: Vec<JobRecord> = records
        .into_iter()
        .filter(|r| matches(r, query, state_code))
        .collect();
    hits.sort_by(|a, b| {
        b.freshness_score
            .total_cmp(&a.freshness_score)
            .then_with(|| b.posted_at.cmp(&a.posted_at))
    });

    let total = hits.len();
    hits.truncate(limit);
    JobsResponse { total, jobs: hits }
}

pub async fn list_jobs(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<JobsQuery>,
) -> Result<Response, ApiError> {
    let key = client_key(&headers);
    let decision = state.limiter.check(&key);

    if !decision.allowed {
        tracing::debug!("🚦 Rate limited client {}", key);
        let seconds = decision.retry_after.as_secs_f64().ceil().max(1.0) as u64;
        let mut response =
            ApiError::new(StatusCode::TOO_MANY_REQUESTS, "Too many requests").into_response();
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
        return Ok(response);
    }

    if query.state.as_deref().is_some_and(|s| resolve_state(s).is_none()) {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "Unknown state"));
    }

    let records = state.repository().load().await.map_err(|e| {
        tracing::error!("❌ Could not read the job store: {}", e);
        ApiError::new(StatusCode::SERVICE_UNAVAILABLE, e.user_friendly_message())
    })?;

    let mut response = Json(search(records, &query)).into_response();
    response
        .headers_mut()
        .insert("x-ratelimit-remaining", HeaderValue::from(decision.remaining));
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::sample_record;

    #[test]
    fn test_client_key() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_key(&headers), "anonymous");

        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.2"));
        assert_eq!(client_key(&headers), "203.0.113.7");
    }

    #[test]
    fn test_search_filters_and_sorts() {
        let mut stale = sample_record("PMHNP Outpatient", "Talkiatry", "NY");
        stale.freshness_score = 0.4;
        let mut fresh = sample_record("PMHNP Telehealth", "Cerebral", "NY");
        fresh.freshness_score = 0.9;
        let other_state = sample_record("PMHNP", "LifeStance", "AZ");
        let mut expired = sample_record("PMHNP", "Old Clinic", "NY");
        expired.is_published = false;

        let query = JobsQuery {
            state: Some("New York".to_string()),
            ..JobsQuery::default()
        };
        let result = search(vec![stale, fresh, other_state, expired], &query);

        assert_eq!(result.total, 2);
        assert_eq!(result.jobs[0].company, "Cerebral");
        assert_eq!(result.jobs[1].company, "Talkiatry");
    }

    #[test]
    fn test_search_text_and_limit() {
        let records: Vec<JobRecord> = (0..5)
            .map(|i| sample_record(&format!("PMHNP {}", i), "Talkiatry", "NY"))
            .collect();

        let query = JobsQuery {
            q: Some("talkiatry".to_string()),
            limit: Some(2),
            ..JobsQuery::default()
        };
        let result = search(records, &query);
        assert_eq!(result.total, 5);
        assert_eq!(result.jobs.len(), 2);

        let none = search(
            vec![sample_record("PMHNP", "Talkiatry", "NY")],
            &JobsQuery {
                q: Some("lifestance".to_string()),
                ..JobsQuery::default()
            },
        );
        assert_eq!(none.total, 0);
    }
}
