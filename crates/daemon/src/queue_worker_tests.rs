use super::*;
use chengis_agent::FindRequest;
use chengis_core::{BuildId, JobId, Pipeline, Stage, Step};
use chengis_dispatcher::DispatchAttempt;
use tokio::sync::mpsc;

fn pipeline() -> Pipeline {
    chengis_core::PipelineBuilder::new("demo")
        .stage(Stage {
            name: "build".to_string(),
            steps: vec![Step::shell("compile", "echo hi")],
            ..Default::default()
        })
        .build()
        .expect("valid pipeline")
}

fn state_with_queue_enabled() -> AppState {
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut config = chengis_config::Config::default();
    config.queue_enabled = true;
    config.fallback_local = false;
    AppState::new(config, tx)
}

#[tokio::test]
async fn poll_once_fails_a_build_once_retries_are_exhausted() {
    let state = state_with_queue_enabled();
    let build_id = BuildId::new("b1");
    let now = state.now_ms();

    state.builds.insert(chengis_core::Build::new(
        build_id.clone(),
        JobId::new("demo"),
        1,
        chengis_core::Trigger::Manual {
            triggered_by: "frank".to_string(),
        },
        chengis_core::BuildConfig::default(),
        now,
    ));

    let attempt = DispatchAttempt {
        build_id: build_id.clone(),
        job_id: JobId::new("demo"),
        org_id: None,
        pipeline: pipeline(),
        parameters: Default::default(),
        find_request: FindRequest::default(),
        priority: 0,
    };
    assert!(matches!(
        state.dispatcher.dispatch(&attempt, now).await,
        chengis_core::DispatchMode::Queued
    ));

    for _ in 0..chengis_dispatcher::MAX_QUEUE_ATTEMPTS {
        poll_once(&state).await;
    }

    let got = state.builds.get(&build_id).unwrap();
    assert_eq!(got.status, chengis_core::BuildStatus::Failure);
}

#[tokio::test]
async fn poll_once_on_an_empty_queue_is_a_no_op() {
    let state = state_with_queue_enabled();
    poll_once(&state).await;
}
