//! Store-agnostic checks shared by every [RunStore] backend's tests.

use std::collections::HashSet;

use serde_json::{json, Map, Value};

use super::{RunId, RunRecord, RunStore, RunStoreError};

pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn params(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("parameters must be an object, got {other}"),
    }
}

pub(crate) fn fraud_detector_run() -> RunRecord {
    RunRecord::new(
        "fraud-detector",
        "prod",
        "42",
        params(json!({"threshold": 0.8})),
    )
}

pub(crate) async fn assert_run_lifecycle_contract<S: RunStore>(store: &S) {
    let mut run = fraud_detector_run();
    assert_eq!(run.run_id(), None);

    let run_id = run.begin(store).await.expect("begin run");
    assert!(run_id.get() > 0);
    assert_eq!(run.run_id(), Some(run_id));

    let started = store
        .load_run(run_id)
        .await
        .expect("load started run")
        .expect("started run row");
    assert_eq!(started.run_id, run_id);
    assert_eq!(started.name, "fraud-detector");
    assert_eq!(started.environment, "prod");
    assert_eq!(started.build, "42");
    assert_eq!(started.parameters, params(json!({"threshold": 0.8})));
    assert!(started.end_time.is_none());

    run.mark_ended(store).await.expect("mark run ended");
    assert_eq!(run.run_id(), Some(run_id));

    let ended = store
        .load_run(run_id)
        .await
        .expect("load ended run")
        .expect("ended run row");
    let end_time = ended.end_time.expect("end time set");
    assert!(end_time > ended.start_time);
    assert_eq!(ended.start_time, started.start_time);

    // A second mark simply restamps the row.
    run.mark_ended(store).await.expect("mark run ended again");
    let restamped = store
        .load_run(run_id)
        .await
        .expect("load restamped run")
        .expect("restamped run row");
    assert!(restamped.end_time.expect("end time set") > restamped.start_time);
}

pub(crate) async fn assert_nested_parameters_round_trip<S: RunStore>(store: &S) {
    let parameters = params(json!({
        "threshold": 0.8,
        "window": 30,
        "label": "q3 \"holdout\" ünïcode",
        "enabled": true,
        "fallback": null,
        "features": ["amount", "merchant", {"kind": "derived", "lags": [1, 7, 28]}],
        "model": {"depth": 6, "regularization": {"l1": 0.0, "l2": 1.5e-3}},
    }));
    let mut run = RunRecord::new("ranker", "staging", "build-7", parameters.clone());
    let run_id = run.begin(store).await.expect("begin run");

    let stored = store
        .load_run(run_id)
        .await
        .expect("load run")
        .expect("run row");
    assert_eq!(stored.parameters, parameters);

    let mut empty = RunRecord::new("ranker", "staging", "build-7", Map::new());
    let empty_id = empty.begin(store).await.expect("begin empty run");
    let stored = store
        .load_run(empty_id)
        .await
        .expect("load run")
        .expect("run row");
    assert!(stored.parameters.is_empty());
}

pub(crate) async fn assert_unknown_run_cannot_be_ended<S: RunStore>(store: &S) {
    let missing = RunId::from(i64::MAX);
    let err = store
        .mark_run_ended(missing)
        .await
        .expect_err("unknown run must not be ended");
    assert!(matches!(err, RunStoreError::NotFound(id) if id == missing));
    assert!(store.load_run(missing).await.expect("load").is_none());

    let unstarted = fraud_detector_run();
    let err = unstarted
        .mark_ended(store)
        .await
        .expect_err("unstarted run must not be ended");
    assert!(matches!(err, RunStoreError::NotStarted));
}

pub(crate) async fn assert_concurrent_begins_get_distinct_ids<S: RunStore>(store: &S) {
    let mut first = RunRecord::new("alpha", "prod", "1", params(json!({"k": 1})));
    let mut second = RunRecord::new("beta", "dev", "2", params(json!({"k": 2})));

    let (a, b) = tokio::join!(first.begin(store), second.begin(store));
    let a = a.expect("begin alpha");
    let b = b.expect("begin beta");
    assert_ne!(a, b);

    for (run_id, name, env, build) in [(a, "alpha", "prod", "1"), (b, "beta", "dev", "2")] {
        let stored = store
            .load_run(run_id)
            .await
            .expect("load run")
            .expect("run row");
        assert_eq!(stored.name, name);
        assert_eq!(stored.environment, env);
        assert_eq!(stored.build, build);
    }

    let mut seen: HashSet<RunId> = [a, b].into_iter().collect();
    for i in 0..10 {
        let mut run = RunRecord::new(format!("run-{i}"), "prod", "1", Map::new());
        let run_id = run.begin(store).await.expect("begin run");
        assert!(seen.insert(run_id), "id {run_id} handed out twice");
    }
}
