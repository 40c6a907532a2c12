//! Algorithm run recording.
//!
//! A [RunRecord] describes one execution of an algorithm. [RunRecord::begin]
//! inserts it into the `algo_run` table and captures the generated id;
//! [RunRecord::mark_ended] stamps its end time. Both go through a caller
//! supplied [RunStore]; this crate never opens or pools connections itself.
//!
//! ```no_run
//! # #[cfg(feature = "postgres")]
//! # async fn demo(pool: sqlx::PgPool) -> Result<(), algorun::RunStoreError> {
//! use algorun::{PostgresRunStore, RunRecord};
//!
//! let store = PostgresRunStore::with_pool(pool);
//! let mut params = serde_json::Map::new();
//! params.insert("threshold".into(), serde_json::json!(0.8));
//!
//! let mut run = RunRecord::new("fraud-detector", "prod", "42", params);
//! let run_id = run.begin(&store).await?;
//! // ... execute the algorithm ...
//! run.mark_ended(&store).await?;
//! # let _ = run_id;
//! # Ok(())
//! # }
//! ```

pub mod run;

#[cfg(feature = "postgres")]
pub use run::PostgresRunStore;
#[cfg(feature = "sqlite")]
pub use run::SqliteRunStore;
pub use run::{RunId, RunRecord, RunStore, RunStoreError, StoredRun};
