use super::*;
use chengis_core::{JobId, Pipeline, Stage, Step};
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

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

fn state() -> AppState {
    let (tx, _rx) = mpsc::unbounded_channel();
    AppState::new(chengis_config::Config::default(), tx)
}

#[tokio::test]
async fn accept_queues_and_runs_the_dispatched_build_locally() {
    let state = state();
    let request = DispatchRequest {
        build_id: chengis_core::BuildId::new("b1"),
        job_id: JobId::new("demo"),
        org_id: None,
        pipeline: pipeline(),
        parameters: Default::default(),
        workspace_hint: "build-b1".to_string(),
        parent_span: None,
    };

    let response = state.accept(request).await.unwrap();
    assert_eq!(response.agent_build_id, "b1");

    for _ in 0..50 {
        if state
            .builds
            .get_result(&chengis_core::BuildId::new("b1"))
            .is_some()
        {
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }
    let result = state
        .builds
        .get_result(&chengis_core::BuildId::new("b1"))
        .expect("build finished");
    assert_eq!(result.status, chengis_core::BuildStatus::Success);
}
