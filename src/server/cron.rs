use crate::core::{run_freshness, FreshnessReport, IngestionEngine, IngestionPipeline};
use crate::domain::model::RunSummary;
use crate::server::{ApiError, AppState};
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use sha2::{Digest, Sha256};

/// 先各自雜湊再逐位元比較，比較時間與 token 內容及長度無關
pub fn secrets_match(provided: &str, expected: &str) -> bool {
    let left = Sha256::digest(provided.as_bytes());
    let right = Sha256::digest(expected.as_bytes());
    left.iter()
        .zip(right.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let expected = state
        .config
        .server
        .cron_secret
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "Cron secret is not configured"))?;

    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "Missing bearer token"))?;

    if !secrets_match(token.trim(), expected) {
        tracing::warn!("🔒 Rejected cron request with an invalid token");
        return Err(ApiError::new(StatusCode::UNAUTHORIZED, "Invalid bearer token"));
    }
    Ok(())
}

fn busy() -> ApiError {
    ApiError::new(StatusCode::CONFLICT, "Another cron run is in progress")
}

pub async fn ingest_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RunSummary>, ApiError> {
    authorize(&state, &headers)?;
    let _guard = state.run_lock.try_lock().map_err(|_| busy())?;

    tracing::info!("⏰ Cron ingestion triggered");
    let pipeline = IngestionPipeline::new(
        state.config.as_ref().clone(),
        state.sources.clone(),
        state.storage.clone(),
    );
    let engine = IngestionEngine::new(pipeline);

    engine.run().await.map(Json).map_err(|e| {
        tracing::error!("❌ Cron ingestion failed: {} ({})", e, e.recovery_suggestion());
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.user_friendly_message())
    })
}

pub async fn freshness_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<FreshnessReport>, ApiError> {
    authorize(&state, &headers)?;
    let _guard = state.run_lock.try_lock().map_err(|_| busy())?;

    tracing::info!("⏰ Cron freshness pass triggered");
    run_freshness(&state.repository(), &state.config.freshness, Utc::now())
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("❌ Freshness pass failed: {}", e);
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.user_friendly_message())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_match() {
        assert!(secrets_match("s3cret-token", "s3cret-token"));
        assert!(!secrets_match("s3cret-tokeN", "s3cret-token"));
        assert!(!secrets_match("short", "s3cret-token"));
        assert!(!secrets_match("", "s3cret-token"));
    }
}
