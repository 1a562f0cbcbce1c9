use super::*;
use axum::extract::{Path, State};
use chengis_core::{Stage, Step};
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

fn pipeline(name: &str) -> chengis_core::Pipeline {
    chengis_core::PipelineBuilder::new(name)
        .stage(Stage {
            name: "build".to_string(),
            steps: vec![Step::shell("compile", "echo hi")],
            ..Default::default()
        })
        .build()
        .expect("valid pipeline")
}

fn state_forcing_local() -> AppState {
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut config = chengis_config::Config::default();
    config.queue_enabled = false;
    config.fallback_local = true;
    let state = AppState::new(config, tx);
    state.jobs.register(None, pipeline("demo"));
    state
}

#[tokio::test]
async fn trigger_with_no_agents_falls_back_to_local_execution() {
    let state = state_forcing_local();
    let resp = trigger(
        State(state.clone()),
        Json(TriggerBuildRequest {
            job_name: "demo".to_string(),
            org_id: None,
            params: HashMap::new(),
            triggered_by: Some("carol".to_string()),
            required_labels: Default::default(),
            cpu_count: 0,
            priority: 0,
        }),
    )
    .await
    .unwrap();

    assert!(matches!(resp.0.mode, DispatchMode::Local));

    for _ in 0..50 {
        if state.builds.get_result(&resp.0.build_id).is_some() {
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }
    let result = state.builds.get_result(&resp.0.build_id).expect("build finished");
    assert_eq!(result.status, BuildStatus::Success);
}

#[tokio::test]
async fn trigger_unknown_job_is_not_found() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let state = AppState::new(chengis_config::Config::default(), tx);
    let err = trigger(
        State(state),
        Json(TriggerBuildRequest {
            job_name: "nope".to_string(),
            org_id: None,
            params: HashMap::new(),
            triggered_by: None,
            required_labels: Default::default(),
            cpu_count: 0,
            priority: 0,
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn show_returns_in_flight_build_before_completion() {
    let state = state_forcing_local();
    let now = state.now_ms();
    let build_id = BuildId::new("b-inflight");
    state.builds.insert(Build::new(
        build_id.clone(),
        chengis_core::JobId::new("demo"),
        1,
        Trigger::Manual {
            triggered_by: "dave".to_string(),
        },
        BuildConfig::default(),
        now,
    ));

    let view = show(State(state), Path(build_id.as_str().to_string())).await.unwrap();
    assert!(matches!(view.0, BuildView::InFlight(_)));
}

#[tokio::test]
async fn show_unknown_build_is_not_found() {
    let state = state_forcing_local();
    let err = show(State(state), Path("missing".to_string())).await.unwrap_err();
    assert_eq!(err, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cancel_trips_the_running_token_for_a_locally_executing_build() {
    let state = state_forcing_local();
    let build_id = BuildId::new("b-running");
    let cancel = CancelToken::new();
    state.running.lock().insert(build_id.clone(), cancel.clone());

    let status = cancel_route(state, build_id).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(cancel.is_cancelled());
}

#[tokio::test]
async fn cancel_transitions_a_queued_build_straight_to_aborted() {
    let state = state_forcing_local();
    let now = state.now_ms();
    let build_id = BuildId::new("b-queued");
    state.builds.insert(Build::new(
        build_id.clone(),
        chengis_core::JobId::new("demo"),
        1,
        Trigger::Manual {
            triggered_by: "erin".to_string(),
        },
        BuildConfig::default(),
        now,
    ));

    let status = cancel_route(state.clone(), build_id.clone()).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(state.builds.get(&build_id).unwrap().status, BuildStatus::Aborted);
}

async fn cancel_route(state: AppState, build_id: BuildId) -> StatusCode {
    cancel(State(state), Path(build_id.as_str().to_string()))
        .await
        .unwrap()
}
