use thiserror::Error;

use super::models::RunId;

/// Failures surfaced by [RunRecord](super::RunRecord) operations and [RunStore](super::RunStore) backends.
///
/// Nothing is retried or recovered locally; every variant reaches the caller as-is.
#[derive(Debug, Error)]
pub enum RunStoreError {
    /// `mark_ended` was called on a record that never completed `begin`.
    #[error("run has not been started")]
    NotStarted,
    /// `begin` was called on a record that already holds a store-assigned id.
    #[error("run already started with id {0}")]
    AlreadyStarted(RunId),
    /// The update matched no `algo_run` row.
    #[error("algo run not found: {0}")]
    NotFound(RunId),
    #[error("invalid run parameters json: {0}")]
    Parameters(#[from] serde_json::Error),
    #[error("invalid schema identifier: {0}")]
    InvalidSchema(String),
    #[error("{context}: {source}")]
    Driver {
        context: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

pub(crate) fn map_driver_err(context: &'static str, source: sqlx::Error) -> RunStoreError {
    RunStoreError::Driver { context, source }
}
