use crate::domain::model::{JobRecord, RunSummary};
use crate::domain::ports::Storage;
use crate::utils::error::{IngestError, Result};

pub const JOBS_FILE: &str = "jobs.json";
pub const LAST_RUN_FILE: &str = "last_run.json";

/// JSON document store for job records and the last ingestion summary.
#[derive(Debug, Clone)]
pub struct JobRepository<S: Storage> {
    storage: S,
}

impl<S: Storage> JobRepository<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// 尚未建立 jobs.json 時視為空的資料庫
    pub async fn load(&self) -> Result<Vec<JobRecord>> {
        if !self.storage.exists(JOBS_FILE).await? {
            tracing::debug!("No {} yet, starting with an empty store", JOBS_FILE);
            return Ok(Vec::new());
        }

        let bytes = self.storage.read_file(JOBS_FILE).await?;
        serde_json::from_slice(&bytes).map_err(|e| IngestError::StoreError {
            message: format!("{} is corrupt: {}", JOBS_FILE, e),
        })
    }

    pub async fn save(&self, records: &[JobRecord]) -> Result<()> {
        let json = serde_json::to_vec_pretty(records)?;
        self.storage.write_file(JOBS_FILE, &json).await?;
        tracing::debug!("💾 Saved {} job records", records.len());
        Ok(())
    }

    pub async fn load_last_run(&self) -> Result<Option<RunSummary>> {
        if !self.storage.exists(LAST_RUN_FILE).await? {
            return Ok(None);
        }
        let bytes = self.storage.read_file(LAST_RUN_FILE).await?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    pub async fn save_last_run(&self, summary: &RunSummary) -> Result<()> {
        let json = serde_json::to_vec_pretty(summary)?;
        self.storage.write_file(LAST_RUN_FILE, &json).await
    }

    pub async fn write_report(&self, path: &str, data: &[u8]) -> Result<()> {
        self.storage.write_file(path, data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LocalStorage;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_store_is_empty() {
        let dir = TempDir::new().unwrap();
        let repo = JobRepository::new(LocalStorage::new(dir.path()));

        assert!(repo.load().await.unwrap().is_empty());
        assert!(repo.load_last_run().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_store_is_reported() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(JOBS_FILE), b"{not json").unwrap();
        let repo = JobRepository::new(LocalStorage::new(dir.path()));

        let err = repo.load().await.unwrap_err();
        assert!(matches!(err, IngestError::StoreError { .. }));
    }
}
