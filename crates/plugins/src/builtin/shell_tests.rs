use super::*;
use chengis_core::{CancelToken, SystemClock};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn ctx(workspace: &TempDir) -> StepContext {
    StepContext {
        workspace: workspace.path().to_path_buf(),
        env: HashMap::new(),
        cancel: CancelToken::new(),
        output_cap_bytes: 1024,
        cancel_grace_ms: 50,
        clock: Arc::new(SystemClock),
    }
}

#[tokio::test]
async fn runs_a_successful_command() {
    let dir = TempDir::new().unwrap();
    let step = Step::shell("hello", "echo hi");
    let result = ShellExecutor.execute(&step, &ctx(&dir)).await.unwrap();
    assert_eq!(result.status, chengis_core::StepStatus::Success);
    assert_eq!(result.exit_code, Some(0));
    assert_eq!(result.stdout.trim(), "hi");
}

#[tokio::test]
async fn nonzero_exit_is_failure() {
    let dir = TempDir::new().unwrap();
    let step = Step::shell("boom", "exit 7");
    let result = ShellExecutor.execute(&step, &ctx(&dir)).await.unwrap();
    assert_eq!(result.status, chengis_core::StepStatus::Failure);
    assert_eq!(result.exit_code, Some(7));
}

#[tokio::test]
async fn timeout_kills_and_marks_sentinel_exit_code() {
    let dir = TempDir::new().unwrap();
    let mut step = Step::shell("slow", "sleep 5");
    if let StepPayload::Shell(p) = &mut step.payload {
        p.timeout_ms = Some(50);
    }
    let result = ShellExecutor.execute(&step, &ctx(&dir)).await.unwrap();
    assert_eq!(result.status, chengis_core::StepStatus::Timeout);
    assert_eq!(result.exit_code, Some(-1));
}

#[tokio::test]
async fn cancellation_aborts_the_step() {
    let dir = TempDir::new().unwrap();
    let step = Step::shell("slow", "sleep 5");
    let context = ctx(&dir);
    let cancel = context.cancel.clone();

    let handle = tokio::spawn(async move { ShellExecutor.execute(&step, &context).await });
    tokio::time::sleep(Duration::from_millis(30)).await;
    cancel.cancel();

    let result = handle.await.unwrap().unwrap();
    assert_eq!(result.status, chengis_core::StepStatus::Aborted);
}

#[tokio::test]
async fn env_vars_are_passed_through() {
    let dir = TempDir::new().unwrap();
    let mut context = ctx(&dir);
    context.env.insert("GREETING".to_string(), "howdy".to_string());
    let step = Step::shell("env", "echo $GREETING");
    let result = ShellExecutor.execute(&step, &context).await.unwrap();
    assert_eq!(result.stdout.trim(), "howdy");
}

#[tokio::test]
async fn rejects_non_shell_payload() {
    let dir = TempDir::new().unwrap();
    let mut step = Step::shell("x", "echo hi");
    step.payload = StepPayload::Opaque(serde_json::json!({}));
    let err = ShellExecutor.execute(&step, &ctx(&dir)).await.unwrap_err();
    assert!(matches!(err, ExecuteError::InvalidPayload(_)));
}
