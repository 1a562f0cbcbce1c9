use super::*;
use std::fs;

#[test]
fn prepare_without_a_source_just_creates_the_directory() {
    let root = tempfile::tempdir().unwrap();
    let manager = WorkspaceManager::new(root.path());

    let workspace = manager.prepare("build-1", "p", None).unwrap();

    assert!(workspace.path.is_dir());
    assert!(workspace.git_info.is_none());
    assert!(workspace.pipeline_override.is_none());
}

#[test]
fn two_builds_get_distinct_directories() {
    let root = tempfile::tempdir().unwrap();
    let manager = WorkspaceManager::new(root.path());

    let a = manager.prepare("build-a", "p", None).unwrap();
    let b = manager.prepare("build-b", "p", None).unwrap();

    assert_ne!(a.path, b.path);
    assert!(a.path.is_dir());
    assert!(b.path.is_dir());
}

#[test]
fn chengisfile_at_workspace_root_is_loaded_as_an_override() {
    let root = tempfile::tempdir().unwrap();
    let manager = WorkspaceManager::new(root.path());
    let workspace = manager.prepare("build-1", "original", None).unwrap();

    fs::write(
        workspace.path.join("Chengisfile"),
        r#"
        stage "X" {
          step "one" { run = "echo one" }
        }
        stage "Y" {
          step "two" { run = "echo two" }
        }
        "#,
    )
    .unwrap();

    let workspace = manager.prepare("build-1", "original", None).unwrap();
    let pipeline = workspace.pipeline_override.expect("override pipeline");
    assert_eq!(pipeline.name, "original");
    assert_eq!(pipeline.stages.len(), 2);
    assert!(pipeline.stage("X").is_some());
    assert!(pipeline.stage("Y").is_some());
}

#[test]
fn absent_chengisfile_means_no_override() {
    let root = tempfile::tempdir().unwrap();
    let manager = WorkspaceManager::new(root.path());
    let workspace = manager.prepare("build-1", "p", None).unwrap();
    assert!(workspace.pipeline_override.is_none());
}

#[test]
fn invalid_chengisfile_surfaces_as_workspace_error() {
    let root = tempfile::tempdir().unwrap();
    let manager = WorkspaceManager::new(root.path());
    let workspace = manager.prepare("build-1", "p", None).unwrap();

    fs::write(
        workspace.path.join("Chengisfile"),
        r#"
        stage "Empty" {
        }
        "#,
    )
    .unwrap();

    let err = manager.prepare("build-1", "p", None).unwrap_err();
    assert!(matches!(err, WorkspaceError::ChengisfileInvalid(_)));
}

#[test]
fn clone_of_an_unreachable_source_fails_with_checkout_failed() {
    let root = tempfile::tempdir().unwrap();
    let manager = WorkspaceManager::new(root.path());

    let source = Source {
        url: "file:///nonexistent/path/to/repo.git".to_string(),
        branch: None,
        depth: None,
        credentials: None,
    };

    let err = manager.prepare("build-1", "p", Some(&source)).unwrap_err();
    assert!(matches!(err, WorkspaceError::CheckoutFailed(_)));
}

#[test]
fn remove_deletes_the_workspace_directory() {
    let root = tempfile::tempdir().unwrap();
    let manager = WorkspaceManager::new(root.path());
    let workspace = manager.prepare("build-1", "p", None).unwrap();
    assert!(workspace.path.is_dir());

    manager.remove(&workspace);

    assert!(!workspace.path.exists());
}

#[test]
fn remove_of_an_already_missing_directory_does_not_panic() {
    let root = tempfile::tempdir().unwrap();
    let manager = WorkspaceManager::new(root.path());
    let workspace = manager.prepare("build-1", "p", None).unwrap();
    fs::remove_dir_all(&workspace.path).unwrap();

    manager.remove(&workspace);
}
