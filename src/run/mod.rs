//! Run records and the stores that persist them.

pub mod error;
pub mod models;
#[cfg(feature = "postgres")]
pub mod postgres_run_store;
pub mod record;
pub mod repository;
#[cfg(feature = "sqlite")]
pub mod sqlite_run_store;

pub use error::RunStoreError;
pub use models::{RunId, StoredRun};
#[cfg(feature = "postgres")]
pub use postgres_run_store::PostgresRunStore;
pub use record::RunRecord;
pub use repository::RunStore;
#[cfg(feature = "sqlite")]
pub use sqlite_run_store::SqliteRunStore;

#[cfg(test)]
pub(crate) mod contract;
