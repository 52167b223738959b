use crate::domain::model::{RunSummary, SourceName};
use crate::server::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours_since_last_run: Option<i64>,
    pub failed_sources: Vec<SourceName>,
    pub total_jobs: usize,
    pub published_jobs: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Healthy only when the last run finished within `stale_after_hours` with every source OK.
pub fn evaluate(last_run: Option<&RunSummary>, now: DateTime<Utc>, stale_after_hours: i64) -> HealthStatus {
    match last_run {
        None => HealthStatus::Degraded,
        Some(run) if (now - run.finished_at).num_hours() >= stale_after_hours => {
            HealthStatus::Degraded
        }
        Some(run) if !run.failed_sources().is_empty() => HealthStatus::Degraded,
        Some(_) => HealthStatus::Healthy,
    }
}

pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let repository = state.repository();
    let now = Utc::now();

    let loaded = match repository.load().await {
        Ok(records) => repository.load_last_run().await.map(|run| (records, run)),
        Err(e) => Err(e),
    };

    match loaded {
        Ok((records, last_run)) => {
            let status = evaluate(last_run.as_ref(), now, state.config.server.stale_after_hours);
            let response = HealthResponse {
                status,
                last_run_at: last_run.as_ref().map(|r| r.finished_at),
                hours_since_last_run: last_run.as_ref().map(|r| (now - r.finished_at).num_hours()),
                failed_sources: last_run.map(|r| r.failed_sources()).unwrap_or_default(),
                total_jobs: records.len(),
                published_jobs: records.iter().filter(|r| r.is_published).count(),
                error: None,
            };
            (StatusCode::OK, Json(response))
        }
        Err(e) => {
            tracing::error!("❌ Health check could not read the store: {}", e);
            let response = HealthResponse {
                status: HealthStatus::Unhealthy,
                last_run_at: None,
                hours_since_last_run: None,
                failed_sources: Vec::new(),
                total_jobs: 0,
                published_jobs: 0,
                error: Some(e.user_friendly_message()),
            };
            (StatusCode::SERVICE_UNAVAILABLE, Json(response))
        }
    }
}
