use super::*;
use chengis_core::{BuildId, BuildStatus, JobId};
use std::collections::HashMap;

fn result() -> BuildResult {
    BuildResult {
        build_id: BuildId::new("b1"),
        job_id: JobId::new("demo"),
        build_number: 1,
        status: BuildStatus::Success,
        parameters: HashMap::new(),
        git_info: None,
        stage_results: Vec::new(),
        artifacts: Vec::new(),
        started_at_ms: Some(0),
        completed_at_ms: Some(10),
    }
}

#[tokio::test]
async fn console_notifier_always_succeeds() {
    let outcome = ConsoleNotifier.send(&result(), &serde_json::Value::Null).await;
    assert_eq!(outcome, NotifierOutcome::Ok);
}
