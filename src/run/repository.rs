//! Storage façade for run recording.

use async_trait::async_trait;

use super::error::RunStoreError;
use super::models::{RunId, StoredRun};

/// Transactional handle to the `algo_run` table.
///
/// Implementations wrap a connection pool supplied by the caller. Each
/// mutating call runs exactly one statement inside its own transaction, which
/// rolls back if the call fails or its future is dropped before commit.
#[async_trait]
pub trait RunStore: Send + Sync {
    /// Insert a run row and return the id generated by the store.
    ///
    /// `parameters` is the already-encoded JSON text.
    async fn insert_run(
        &self,
        name: &str,
        environment: &str,
        build: &str,
        parameters: &str,
    ) -> Result<RunId, RunStoreError>;

    /// Set `end_time` to the store's current time. Fails with
    /// [RunStoreError::NotFound] when no row carries `run_id`.
    async fn mark_run_ended(&self, run_id: RunId) -> Result<(), RunStoreError>;

    /// Read one run back by id.
    async fn load_run(&self, run_id: RunId) -> Result<Option<StoredRun>, RunStoreError>;
}
