use super::*;
use chengis_core::{BuildConfig, Trigger};

fn build(id: &str, job: &str) -> Build {
    Build::new(
        BuildId::new(id),
        JobId::new(job),
        1,
        Trigger::Manual {
            triggered_by: "alice".to_string(),
        },
        BuildConfig::default(),
        0,
    )
}

#[test]
fn insert_and_get_round_trips() {
    let store = BuildStore::new();
    store.insert(build("b1", "demo"));
    let got = store.get(&BuildId::new("b1")).unwrap();
    assert_eq!(got.id, BuildId::new("b1"));
}

#[test]
fn get_missing_errors() {
    let store = BuildStore::new();
    assert_eq!(
        store.get(&BuildId::new("nope")),
        Err(BuildStoreError::NotFound(BuildId::new("nope")))
    );
}

#[test]
fn transition_applies_guarded_status_change() {
    let store = BuildStore::new();
    store.insert(build("b1", "demo"));
    store
        .transition(&BuildId::new("b1"), BuildStatus::Running, 10)
        .unwrap();
    let got = store.get(&BuildId::new("b1")).unwrap();
    assert_eq!(got.status, BuildStatus::Running);
    assert_eq!(got.started_at_ms, Some(10));
}

#[test]
fn transition_rejects_illegal_jump() {
    let store = BuildStore::new();
    store.insert(build("b1", "demo"));
    let err = store
        .transition(&BuildId::new("b1"), BuildStatus::Success, 10)
        .unwrap_err();
    assert!(matches!(err, BuildStoreError::IllegalTransition(_)));
}

#[test]
fn update_overwrites_the_stored_row() {
    let store = BuildStore::new();
    store.insert(build("b1", "demo"));

    let mut updated = build("b1", "demo");
    updated.status = BuildStatus::Running;
    updated.started_at_ms = Some(42);
    store.update(updated);

    let got = store.get(&BuildId::new("b1")).unwrap();
    assert_eq!(got.status, BuildStatus::Running);
    assert_eq!(got.started_at_ms, Some(42));
}

#[test]
fn list_for_job_returns_only_that_jobs_builds() {
    let store = BuildStore::new();
    store.insert(build("b1", "demo"));
    store.insert(build("b2", "demo"));
    store.insert(build("b3", "other"));

    let demo_builds = store.list_for_job(&JobId::new("demo"));
    assert_eq!(demo_builds.len(), 2);
}
