//! SQLite-backed run store.
//!
//! This module is feature-gated behind `sqlite`. Timestamps are kept as
//! fixed-width RFC 3339 text with millisecond precision, so a run ended within
//! the same millisecond it started gets `start_time + 1ms` as its end time.
//! The expected table is:
//!
//! ```sql
//! CREATE TABLE algo_run (
//!     algo_run_id  INTEGER PRIMARY KEY AUTOINCREMENT,
//!     algo_name    TEXT NOT NULL,
//!     algo_env     TEXT NOT NULL,
//!     build_number TEXT NOT NULL,
//!     parameters   TEXT NOT NULL,
//!     start_time   TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
//!     end_time     TEXT NULL
//! );
//! ```

#![cfg(feature = "sqlite")]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::warn;
use sqlx::{Row, SqlitePool};

use super::error::{map_driver_err, RunStoreError};
use super::models::{decode_parameters, RunId, StoredRun};
use super::repository::RunStore;

/// [RunStore] over a caller-owned `SqlitePool`.
#[derive(Clone, Debug)]
pub struct SqliteRunStore {
    pool: SqlitePool,
}

impl SqliteRunStore {
    pub fn with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RunStore for SqliteRunStore {
    async fn insert_run(
        &self,
        name: &str,
        environment: &str,
        build: &str,
        parameters: &str,
    ) -> Result<RunId, RunStoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_driver_err("begin insert algo run tx", e))?;
        let run_id: i64 = sqlx::query_scalar(
            "INSERT INTO algo_run (algo_name, algo_env, build_number, parameters)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING algo_run_id",
        )
        .bind(name)
        .bind(environment)
        .bind(build)
        .bind(parameters)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_driver_err("insert algo run", e))?;
        tx.commit()
            .await
            .map_err(|e| map_driver_err("commit insert algo run tx", e))?;
        Ok(RunId::from(run_id))
    }

    async fn mark_run_ended(&self, run_id: RunId) -> Result<(), RunStoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_driver_err("begin mark ended tx", e))?;
        let updated = sqlx::query(
            "UPDATE algo_run
             SET end_time = max(
                 strftime('%Y-%m-%dT%H:%M:%fZ', 'now'),
                 strftime('%Y-%m-%dT%H:%M:%fZ', start_time, '+0.001 seconds')
             )
             WHERE algo_run_id = ?1",
        )
        .bind(run_id.get())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_driver_err("mark algo run ended", e))?
        .rows_affected();
        if updated == 0 {
            warn!("mark ended matched no algo run: {}", run_id);
            return Err(RunStoreError::NotFound(run_id));
        }
        tx.commit()
            .await
            .map_err(|e| map_driver_err("commit mark ended tx", e))?;
        Ok(())
    }

    async fn load_run(&self, run_id: RunId) -> Result<Option<StoredRun>, RunStoreError> {
        let row = sqlx::query(
            "SELECT algo_run_id, algo_name, algo_env, build_number, parameters,
                    start_time, end_time
             FROM algo_run
             WHERE algo_run_id = ?1",
        )
        .bind(run_id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_driver_err("load algo run", e))?;
        let Some(row) = row else {
            return Ok(None);
        };

        let decode = |e| map_driver_err("decode algo run", e);
        let parameters: String = row.try_get(4).map_err(decode)?;
        Ok(Some(StoredRun {
            run_id: RunId::from(row.try_get::<i64, _>(0).map_err(decode)?),
            name: row.try_get(1).map_err(decode)?,
            environment: row.try_get(2).map_err(decode)?,
            build: row.try_get(3).map_err(decode)?,
            parameters: decode_parameters(&parameters)?,
            start_time: row.try_get::<DateTime<Utc>, _>(5).map_err(decode)?,
            end_time: row.try_get::<Option<DateTime<Utc>>, _>(6).map_err(decode)?,
        }))
    }
}
