use super::*;
use chengis_core::{
    BuildConfig, Condition, JobId, NotifierConfig, PipelineBuilder, PostHooks, Source, SystemClock,
    Trigger,
};
use chengis_plugins::PluginRegistry;

fn new_build(params: HashMap<String, String>) -> Build {
    Build::new(
        BuildId::new("build-1"),
        JobId::new("job-1"),
        1,
        Trigger::Manual {
            triggered_by: "test".to_string(),
        },
        BuildConfig {
            params,
            branch_override: None,
        },
        0,
    )
}

fn new_executor(root: &Path) -> BuildExecutor {
    let plugins = Arc::new(PluginRegistry::new());
    let workspace_manager = WorkspaceManager::new(root);
    let (tx, _rx) = mpsc::unbounded_channel();
    BuildExecutor::new(plugins, workspace_manager, Arc::new(SystemClock), 1024 * 1024, 50, None, tx)
}

fn plain_stage(name: &str, parallel: bool, steps: Vec<Step>) -> Stage {
    Stage {
        name: name.to_string(),
        parallel,
        parallelism: None,
        steps,
        condition: None,
    }
}

#[tokio::test]
async fn sequential_stage_short_circuits_on_first_failure() {
    let root = tempfile::tempdir().unwrap();
    let executor = new_executor(root.path());

    let pipeline = PipelineBuilder::new("p")
        .stage(plain_stage(
            "S",
            false,
            vec![
                Step::shell("ok", "exit 0"),
                Step::shell("fail", "exit 3"),
                Step::shell("never", "echo should-not-run"),
            ],
        ))
        .build()
        .unwrap();

    let mut build = new_build(HashMap::new());
    let result = executor.execute(&mut build, &pipeline, CancelToken::new()).await;

    assert_eq!(result.status, BuildStatus::Failure);
    let stage = &result.stage_results[0];
    assert_eq!(stage.status, StageStatus::Failure);
    assert_eq!(stage.steps[0].status, StepStatus::Success);
    assert_eq!(stage.steps[1].status, StepStatus::Failure);
    assert_eq!(stage.steps[1].exit_code, Some(3));
    assert_eq!(stage.steps[2].status, StepStatus::Skipped);
}

#[tokio::test]
async fn parallel_stage_runs_every_step_even_after_one_fails() {
    let root = tempfile::tempdir().unwrap();
    let executor = new_executor(root.path());

    let pipeline = PipelineBuilder::new("p")
        .stage(plain_stage(
            "S",
            true,
            vec![Step::shell("fail", "exit 1"), Step::shell("ok", "echo hi")],
        ))
        .build()
        .unwrap();

    let mut build = new_build(HashMap::new());
    let result = executor.execute(&mut build, &pipeline, CancelToken::new()).await;

    assert_eq!(result.status, BuildStatus::Failure);
    let stage = &result.stage_results[0];
    assert_eq!(stage.status, StageStatus::Failure);
    let fail = stage.steps.iter().find(|s| s.step_name == "fail").unwrap();
    let ok = stage.steps.iter().find(|s| s.step_name == "ok").unwrap();
    assert_eq!(fail.status, StepStatus::Failure);
    assert_eq!(ok.status, StepStatus::Success);
    assert_eq!(ok.stdout.trim(), "hi");
}

#[tokio::test]
async fn stage_condition_false_skips_the_whole_stage_without_failing_the_build() {
    let root = tempfile::tempdir().unwrap();
    let executor = new_executor(root.path());

    let mut stage = plain_stage("Gated", false, vec![Step::shell("s", "echo hi")]);
    stage.condition = Some(Condition::Param {
        key: "env".to_string(),
        value: "prod".to_string(),
    });

    let pipeline = PipelineBuilder::new("p").stage(stage).build().unwrap();

    let mut build = new_build(HashMap::new());
    let result = executor.execute(&mut build, &pipeline, CancelToken::new()).await;

    assert_eq!(result.status, BuildStatus::Success);
    assert_eq!(result.stage_results[0].status, StageStatus::Skipped);
    assert_eq!(result.stage_results[0].steps[0].status, StepStatus::Skipped);
}

#[tokio::test]
async fn step_condition_gates_just_that_step() {
    let root = tempfile::tempdir().unwrap();
    let executor = new_executor(root.path());

    let mut gated = Step::shell("gated", "echo go");
    gated.condition = Some(Condition::Param {
        key: "env".to_string(),
        value: "prod".to_string(),
    });
    let stage = plain_stage("S", false, vec![Step::shell("always", "echo hi"), gated]);
    let pipeline = PipelineBuilder::new("p").stage(stage).build().unwrap();

    let mut params = HashMap::new();
    params.insert("env".to_string(), "staging".to_string());
    let mut build = new_build(params);
    let result = executor.execute(&mut build, &pipeline, CancelToken::new()).await;

    assert_eq!(result.status, BuildStatus::Success);
    let stage = &result.stage_results[0];
    assert_eq!(stage.steps[0].status, StepStatus::Success);
    assert_eq!(stage.steps[1].status, StepStatus::Skipped);
}

#[tokio::test]
async fn post_hooks_run_always_then_on_failure_when_the_build_fails() {
    let root = tempfile::tempdir().unwrap();
    let executor = new_executor(root.path());

    let pipeline = PipelineBuilder::new("p")
        .stage(plain_stage("Main", false, vec![Step::shell("boom", "exit 1")]))
        .post(PostHooks {
            always: vec![Step::shell("cleanup", "echo cleanup")],
            on_success: vec![Step::shell("ship", "echo ship")],
            on_failure: vec![Step::shell("page", "echo page")],
        })
        .build()
        .unwrap();

    let mut build = new_build(HashMap::new());
    let result = executor.execute(&mut build, &pipeline, CancelToken::new()).await;

    assert_eq!(result.status, BuildStatus::Failure);
    let names: Vec<&str> = result
        .stage_results
        .iter()
        .map(|s| s.stage_name.as_str())
        .collect();
    assert_eq!(names, vec!["Main", "post.always", "post.on-failure"]);
}

#[tokio::test]
async fn post_hooks_run_always_then_on_success_when_the_build_succeeds() {
    let root = tempfile::tempdir().unwrap();
    let executor = new_executor(root.path());

    let pipeline = PipelineBuilder::new("p")
        .stage(plain_stage("Main", false, vec![Step::shell("ok", "exit 0")]))
        .post(PostHooks {
            always: vec![Step::shell("cleanup", "echo cleanup")],
            on_success: vec![Step::shell("ship", "echo ship")],
            on_failure: vec![Step::shell("page", "echo page")],
        })
        .build()
        .unwrap();

    let mut build = new_build(HashMap::new());
    let result = executor.execute(&mut build, &pipeline, CancelToken::new()).await;

    assert_eq!(result.status, BuildStatus::Success);
    let names: Vec<&str> = result
        .stage_results
        .iter()
        .map(|s| s.stage_name.as_str())
        .collect();
    assert_eq!(names, vec!["Main", "post.always", "post.on-success"]);
}

#[tokio::test]
async fn post_hook_failure_is_reported_but_never_changes_build_status() {
    let root = tempfile::tempdir().unwrap();
    let executor = new_executor(root.path());

    let pipeline = PipelineBuilder::new("p")
        .stage(plain_stage("Main", false, vec![Step::shell("ok", "exit 0")]))
        .post(PostHooks {
            always: vec![Step::shell("cleanup", "exit 9")],
            on_success: vec![],
            on_failure: vec![],
        })
        .build()
        .unwrap();

    let mut build = new_build(HashMap::new());
    let result = executor.execute(&mut build, &pipeline, CancelToken::new()).await;

    assert_eq!(result.status, BuildStatus::Success);
    let always = result
        .stage_results
        .iter()
        .find(|s| s.stage_name == "post.always")
        .unwrap();
    assert_eq!(always.status, StageStatus::Failure);
}

#[tokio::test]
async fn artifacts_are_collected_from_the_workspace_after_the_build() {
    let root = tempfile::tempdir().unwrap();
    let executor = new_executor(root.path());

    let pipeline = PipelineBuilder::new("p")
        .stage(plain_stage("Build", false, vec![Step::shell("write", "echo hi > out.txt")]))
        .artifacts(vec!["*.txt".to_string()])
        .build()
        .unwrap();

    let mut build = new_build(HashMap::new());
    let result = executor.execute(&mut build, &pipeline, CancelToken::new()).await;

    assert_eq!(result.status, BuildStatus::Success);
    assert_eq!(result.artifacts.len(), 1);
    assert_eq!(result.artifacts[0].path, "out.txt");
}

#[tokio::test]
async fn checkout_failure_fails_the_build_before_any_stage_runs() {
    let root = tempfile::tempdir().unwrap();
    let executor = new_executor(root.path());

    let pipeline = PipelineBuilder::new("p")
        .source(Source {
            url: "file:///nonexistent/path/to/repo.git".to_string(),
            branch: None,
            depth: None,
            credentials: None,
        })
        .stage(plain_stage("S", false, vec![Step::shell("s", "echo hi")]))
        .build()
        .unwrap();

    let mut build = new_build(HashMap::new());
    let result = executor.execute(&mut build, &pipeline, CancelToken::new()).await;

    assert_eq!(result.status, BuildStatus::Failure);
    assert!(result.stage_results.is_empty());
}

#[tokio::test]
async fn unregistered_notifier_is_reported_but_does_not_change_build_status() {
    let root = tempfile::tempdir().unwrap();
    let executor = new_executor(root.path());

    let pipeline = PipelineBuilder::new("p")
        .stage(plain_stage("S", false, vec![Step::shell("s", "echo hi")]))
        .notifier(NotifierConfig {
            tag: "missing".to_string(),
            config: serde_json::json!({}),
        })
        .build()
        .unwrap();

    let mut build = new_build(HashMap::new());
    let result = executor.execute(&mut build, &pipeline, CancelToken::new()).await;

    assert_eq!(result.status, BuildStatus::Success);
}

#[tokio::test]
async fn pre_cancelled_build_marks_every_stage_skipped_and_aborts() {
    let root = tempfile::tempdir().unwrap();
    let executor = new_executor(root.path());

    let pipeline = PipelineBuilder::new("p")
        .stage(plain_stage("A", false, vec![Step::shell("a", "echo hi")]))
        .stage(plain_stage("B", false, vec![Step::shell("b", "echo hi")]))
        .build()
        .unwrap();

    let mut build = new_build(HashMap::new());
    let cancel = CancelToken::new();
    cancel.cancel();
    let result = executor.execute(&mut build, &pipeline, cancel).await;

    assert_eq!(result.status, BuildStatus::Aborted);
    assert!(result
        .stage_results
        .iter()
        .all(|s| s.status == StageStatus::Skipped));
}

#[tokio::test]
async fn cancellation_during_a_running_step_aborts_it_and_skips_the_rest() {
    let root = tempfile::tempdir().unwrap();
    let executor = new_executor(root.path());

    let pipeline = PipelineBuilder::new("p")
        .stage(plain_stage(
            "S",
            false,
            vec![Step::shell("slow", "sleep 5"), Step::shell("never", "echo nope")],
        ))
        .build()
        .unwrap();

    let mut build = new_build(HashMap::new());
    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(30)).await;
        trigger.cancel();
    });

    let result = executor.execute(&mut build, &pipeline, cancel).await;

    assert_eq!(result.status, BuildStatus::Aborted);
    let stage = &result.stage_results[0];
    assert_eq!(stage.steps[0].status, StepStatus::Aborted);
    assert_eq!(stage.steps[1].status, StepStatus::Skipped);
}

#[tokio::test]
async fn emits_events_in_the_expected_order_for_a_simple_build() {
    let root = tempfile::tempdir().unwrap();
    let plugins = Arc::new(PluginRegistry::new());
    let workspace_manager = WorkspaceManager::new(root.path());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let executor = BuildExecutor::new(plugins, workspace_manager, Arc::new(SystemClock), 1024, 50, None, tx);

    let pipeline = PipelineBuilder::new("p")
        .stage(plain_stage("S", false, vec![Step::shell("s", "echo hi")]))
        .build()
        .unwrap();

    let mut build = new_build(HashMap::new());
    let _ = executor.execute(&mut build, &pipeline, CancelToken::new()).await;

    let mut kinds = Vec::new();
    while let Ok(event) = rx.try_recv() {
        kinds.push(event_kind(&event));
    }
    assert_eq!(
        kinds,
        vec![
            "BuildStarted",
            "StageStarted",
            "StepStarted",
            "StepCompleted",
            "StageCompleted",
            "BuildCompleted",
        ]
    );
}

fn event_kind(event: &Event) -> &'static str {
    match event {
        Event::DispatchDecided { .. } => "DispatchDecided",
        Event::BuildStarted { .. } => "BuildStarted",
        Event::BuildAborted { .. } => "BuildAborted",
        Event::StageStarted { .. } => "StageStarted",
        Event::StageSkipped { .. } => "StageSkipped",
        Event::StageCompleted { .. } => "StageCompleted",
        Event::StepStarted { .. } => "StepStarted",
        Event::StepCompleted { .. } => "StepCompleted",
        Event::LogOverflow { .. } => "LogOverflow",
        Event::NotifierFailed { .. } => "NotifierFailed",
        Event::BuildCompleted { .. } => "BuildCompleted",
    }
}
