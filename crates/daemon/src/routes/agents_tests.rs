use super::*;
use axum::extract::{Path, State};
use tokio::sync::mpsc;

fn state() -> AppState {
    let (tx, _rx) = mpsc::unbounded_channel();
    AppState::new(chengis_config::Config::default(), tx)
}

fn register_req(agent_id: &str) -> RegisterAgentRequest {
    RegisterAgentRequest {
        agent_id: agent_id.to_string(),
        endpoint: "http://127.0.0.1:9000".to_string(),
        labels: Default::default(),
        org_id: None,
        max_builds: 4,
        cpu_count: 8,
        heartbeat_timeout_ms: None,
    }
}

#[tokio::test]
async fn register_then_list_shows_the_agent() {
    let state = state();
    let status = register(State(state.clone()), Json(register_req("a1"))).await;
    assert_eq!(status, StatusCode::CREATED);

    let agents = list(State(state)).await;
    assert_eq!(agents.0.len(), 1);
    assert_eq!(agents.0[0].agent_id, "a1");
}

#[tokio::test]
async fn get_unknown_agent_is_not_found() {
    let state = state();
    let err = get(State(state), Path("nope".to_string())).await.unwrap_err();
    assert_eq!(err, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn heartbeat_on_unknown_agent_is_not_found() {
    let state = state();
    let status = heartbeat(State(state), Path("nope".to_string())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn heartbeat_on_known_agent_succeeds() {
    let state = state();
    register(State(state.clone()), Json(register_req("a1"))).await;
    let status = heartbeat(State(state), Path("a1".to_string())).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn deregister_removes_the_agent() {
    let state = state();
    register(State(state.clone()), Json(register_req("a1"))).await;
    deregister(State(state.clone()), Path("a1".to_string())).await;
    let agents = list(State(state)).await;
    assert!(agents.0.is_empty());
}

#[tokio::test]
async fn deregister_unknown_agent_is_a_no_op() {
    let state = state();
    let status = deregister(State(state), Path("nope".to_string())).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
