//! The run entity and its two lifecycle operations.

use log::debug;
use serde_json::{Map, Value};

use super::error::RunStoreError;
use super::models::{encode_parameters, RunId};
use super::repository::RunStore;

/// One algorithm execution.
///
/// Built in memory with [RunRecord::new], persisted by [RunRecord::begin] and
/// closed by [RunRecord::mark_ended]. The id is private so that only a store
/// can assign it.
#[derive(Clone, Debug, PartialEq)]
pub struct RunRecord {
    pub name: String,
    pub environment: String,
    pub build: String,
    /// Opaque to this crate; stored as JSON text.
    pub parameters: Map<String, Value>,
    run_id: Option<RunId>,
}

impl RunRecord {
    pub fn new(
        name: impl Into<String>,
        environment: impl Into<String>,
        build: impl Into<String>,
        parameters: Map<String, Value>,
    ) -> Self {
        Self {
            name: name.into(),
            environment: environment.into(),
            build: build.into(),
            parameters,
            run_id: None,
        }
    }

    pub(crate) fn started(
        name: String,
        environment: String,
        build: String,
        parameters: Map<String, Value>,
        run_id: RunId,
    ) -> Self {
        Self {
            name,
            environment,
            build,
            parameters,
            run_id: Some(run_id),
        }
    }

    /// Store-assigned id, `None` until [RunRecord::begin] succeeds.
    pub fn run_id(&self) -> Option<RunId> {
        self.run_id
    }

    /// Persist this run and capture the id generated by the store.
    ///
    /// Parameters are encoded before any I/O. On failure the record is left
    /// unstarted and the store's transaction is rolled back.
    pub async fn begin<S>(&mut self, store: &S) -> Result<RunId, RunStoreError>
    where
        S: RunStore + ?Sized,
    {
        if let Some(existing) = self.run_id {
            return Err(RunStoreError::AlreadyStarted(existing));
        }
        let parameters = encode_parameters(&self.parameters)?;
        let run_id = store
            .insert_run(&self.name, &self.environment, &self.build, &parameters)
            .await?;
        self.run_id = Some(run_id);
        debug!(
            "algo run {} started: name={} env={} build={}",
            run_id, self.name, self.environment, self.build
        );
        Ok(run_id)
    }

    /// Stamp the store's current time as this run's end time.
    ///
    /// The record itself is not modified.
    pub async fn mark_ended<S>(&self, store: &S) -> Result<(), RunStoreError>
    where
        S: RunStore + ?Sized,
    {
        let run_id = self.run_id.ok_or(RunStoreError::NotStarted)?;
        store.mark_run_ended(run_id).await?;
        debug!("algo run {} ended", run_id);
        Ok(())
    }
}
