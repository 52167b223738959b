//! Cron-triggered HTTP surface: health, ingestion/freshness triggers and the public job feed.

pub mod cron;
pub mod health;
pub mod jobs;

use crate::config::IngestConfig;
use crate::domain::ports::JobSource;
use crate::sources::build_sources;
use crate::store::{JobRepository, LocalStorage};
use crate::utils::error::Result;
use crate::utils::rate_limit::ClientRateLimiter;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<IngestConfig>,
    pub storage: LocalStorage,
    pub sources: Vec<Arc<dyn JobSource>>,
    pub limiter: Arc<ClientRateLimiter>,
    /// 同一時間只允許一個 cron 任務寫入 store
    pub run_lock: Arc<tokio::sync::Mutex<()>>,
}

impl AppState {
    pub fn new(config: IngestConfig) -> Result<Self> {
        let sources = build_sources(&config)?;
        Ok(Self::with_sources(config, sources))
    }

    pub fn with_sources(config: IngestConfig, sources: Vec<Arc<dyn JobSource>>) -> Self {
        let storage = LocalStorage::new(&config.store.path);
        let limiter = ClientRateLimiter::per_minute(config.server.rate_limit_per_minute);
        Self {
            config: Arc::new(config),
            storage,
            sources,
            limiter: Arc::new(limiter),
            run_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    pub fn repository(&self) -> JobRepository<LocalStorage> {
        JobRepository::new(self.storage.clone())
    }
}

/// Error body returned by every handler.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health_handler))
        .route(
            "/api/cron/ingest",
            get(cron::ingest_handler).post(cron::ingest_handler),
        )
        .route(
            "/api/cron/freshness",
            get(cron::freshness_handler).post(cron::freshness_handler),
        )
        .route("/api/jobs", get(jobs::list_jobs))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: AppState, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("🌐 Listening on {}", listener.local_addr()?);
    if state.config.server.cron_secret.is_none() {
        tracing::warn!("⚠️ CRON_SECRET is not set; cron endpoints will answer 503");
    }
    axum::serve(listener, router(state)).await?;
    Ok(())
}
