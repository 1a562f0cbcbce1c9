use super::*;
use chengis_core::{PipelineBuilder, Stage, Step};

fn pipeline(name: &str) -> Pipeline {
    PipelineBuilder::new(name)
        .stage(Stage {
            name: "build".to_string(),
            steps: vec![Step::shell("compile", "make")],
            ..Default::default()
        })
        .build()
        .unwrap()
}

#[test]
fn register_creates_then_is_idempotent() {
    let store = JobStore::new();
    let outcome = store.register(None, pipeline("demo"));
    assert_eq!(outcome, RegisterOutcome::Created);

    let outcome = store.register(None, pipeline("demo"));
    assert_eq!(outcome, RegisterOutcome::Unchanged);

    assert_eq!(store.list().len(), 1);
}

#[test]
fn register_replaces_when_pipeline_differs() {
    let store = JobStore::new();
    store.register(None, pipeline("demo"));

    let mut changed = pipeline("demo");
    changed.description = Some("now with a description".to_string());
    let outcome = store.register(None, changed);
    assert_eq!(outcome, RegisterOutcome::Replaced);
}

#[test]
fn register_deregister_register_round_trips() {
    let store = JobStore::new();
    store.register(None, pipeline("demo"));
    store.deregister(None, "demo");
    assert!(store.get(None, "demo").is_err());

    store.register(None, pipeline("demo"));
    assert!(store.get(None, "demo").is_ok());
}

#[test]
fn same_name_different_orgs_are_distinct_jobs() {
    let store = JobStore::new();
    store.register(Some("acme".to_string()), pipeline("demo"));
    store.register(Some("umbrella".to_string()), pipeline("demo"));
    assert!(store.get(Some("acme"), "demo").is_ok());
    assert!(store.get(Some("umbrella"), "demo").is_ok());
    assert!(store.get(None, "demo").is_err());
}

#[test]
fn next_build_number_increments_from_one() {
    let store = JobStore::new();
    store.register(None, pipeline("demo"));
    assert_eq!(store.next_build_number(None, "demo").unwrap(), 1);
    assert_eq!(store.next_build_number(None, "demo").unwrap(), 2);
    assert_eq!(store.next_build_number(None, "demo").unwrap(), 3);
}

#[test]
fn next_build_number_unknown_job_errors() {
    let store = JobStore::new();
    assert_eq!(
        store.next_build_number(None, "missing"),
        Err(JobStoreError::NotFound("missing".to_string()))
    );
}
