//! Postgres-backed run store.
//!
//! This module is feature-gated behind `postgres`. The `algo_run` table is
//! expected to exist already:
//!
//! ```sql
//! CREATE TABLE algo_run (
//!     algo_run_id  BIGINT GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
//!     algo_name    TEXT NOT NULL,
//!     algo_env     TEXT NOT NULL,
//!     build_number TEXT NOT NULL,
//!     parameters   TEXT NOT NULL,
//!     start_time   TIMESTAMPTZ NOT NULL DEFAULT now(),
//!     end_time     TIMESTAMPTZ NULL
//! );
//! ```

#![cfg(feature = "postgres")]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::warn;
use sqlx::{PgPool, Row};

use super::error::{map_driver_err, RunStoreError};
use super::models::{decode_parameters, RunId, StoredRun};
use super::repository::RunStore;

fn is_valid_schema_ident(schema: &str) -> bool {
    !schema.is_empty()
        && schema
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// [RunStore] over a caller-owned `PgPool`.
#[derive(Clone, Debug)]
pub struct PostgresRunStore {
    pool: PgPool,
    schema: String,
}

impl PostgresRunStore {
    pub fn with_pool(pool: PgPool) -> Self {
        Self {
            pool,
            schema: "public".to_string(),
        }
    }

    /// Qualify `algo_run` with `schema`. Only `[A-Za-z0-9_]` is accepted;
    /// anything else fails on first use with [RunStoreError::InvalidSchema].
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    fn table(&self) -> Result<String, RunStoreError> {
        if !is_valid_schema_ident(&self.schema) {
            return Err(RunStoreError::InvalidSchema(self.schema.clone()));
        }
        Ok(format!("\"{}\".algo_run", self.schema))
    }
}

#[async_trait]
impl RunStore for PostgresRunStore {
    async fn insert_run(
        &self,
        name: &str,
        environment: &str,
        build: &str,
        parameters: &str,
    ) -> Result<RunId, RunStoreError> {
        let sql = format!(
            "INSERT INTO {} (algo_name, algo_env, build_number, parameters)
             VALUES ($1, $2, $3, $4)
             RETURNING algo_run_id::BIGINT",
            self.table()?
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_driver_err("begin insert algo run tx", e))?;
        let run_id: i64 = sqlx::query_scalar(&sql)
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
        let sql = format!(
            "UPDATE {}
             SET end_time = GREATEST(now(), start_time + interval '1 microsecond')
             WHERE algo_run_id = $1",
            self.table()?
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_driver_err("begin mark ended tx", e))?;
        let updated = sqlx::query(&sql)
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
        let sql = format!(
            "SELECT algo_run_id::BIGINT, algo_name, algo_env, build_number, parameters,
                    start_time, end_time
             FROM {}
             WHERE algo_run_id = $1",
            self.table()?
        );
        let row = sqlx::query(&sql)
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
