use crate::config::toml_config::HttpConfig;
use crate::domain::model::SourceName;
use crate::utils::error::{IngestError, Result};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

const ERROR_BODY_PREVIEW: usize = 200;

/// Shared HTTP client with the retry policy every job board adapter uses.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            retry_attempts: config.retry_attempts,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    /// 429、5xx 與連線錯誤會重試 `retry_attempts` 次，間隔線性遞增
    pub async fn fetch_json<T, F>(&self, source: SourceName, build: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.send_once(source, build(&self.client)).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt <= self.retry_attempts => {
                    let delay = self.retry_delay * attempt;
                    tracing::warn!(
                        "⚠️ {} request failed (attempt {}/{}): {}; retrying in {:?}",
                        source,
                        attempt,
                        self.retry_attempts + 1,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        source: SourceName,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("{} response status: {}", source, status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let preview: String = body.chars().take(ERROR_BODY_PREVIEW).collect();
            return Err(IngestError::SourceError {
                source_name: source.to_string(),
                message: format!("HTTP {}: {}", status, preview),
                status: Some(status.as_u16()),
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            IngestError::source_failure(source.as_str(), format!("unexpected response body: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn fetcher(retries: u32) -> HttpFetcher {
        HttpFetcher::new(&HttpConfig {
            retry_attempts: retries,
            retry_delay_ms: 1,
            ..HttpConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/jobs");
            then.status(503);
        });

        let url = server.url("/jobs");
        let result: Result<serde_json::Value> = fetcher(2)
            .fetch_json(SourceName::Lever, |client| client.get(&url))
            .await;

        assert!(matches!(
            result,
            Err(IngestError::SourceError { status: Some(503), .. })
        ));
        mock.assert_hits(3);
    }

    #[tokio::test]
    async fn test_client_errors_fail_fast() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/jobs");
            then.status(401).body("bad key");
        });

        let url = server.url("/jobs");
        let result: Result<serde_json::Value> = fetcher(3)
            .fetch_json(SourceName::Adzuna, |client| client.get(&url))
            .await;

        match result {
            Err(IngestError::SourceError { status, message, .. }) => {
                assert_eq!(status, Some(401));
                assert!(message.contains("bad key"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
        mock.assert_hits(1);
    }

    #[tokio::test]
    async fn test_invalid_json_is_source_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/jobs");
            then.status(200).body("<html>maintenance</html>");
        });

        let url = server.url("/jobs");
        let result: Result<serde_json::Value> = fetcher(0)
            .fetch_json(SourceName::Jooble, |client| client.get(&url))
            .await;

        assert!(matches!(result, Err(IngestError::SourceError { status: None, .. })));
    }
}
