// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-build workspace acquisition: a fresh directory under a configured
//! root, optionally seeded by a shallow Git clone, with a `Chengisfile`
//! override checked for once the checkout lands.

use std::path::{Path, PathBuf};

use chengis_core::{Credentials, GitInfo, Pipeline, Source};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("failed to prepare workspace directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("git checkout failed: {0}")]
    CheckoutFailed(#[from] git2::Error),
    #[error("workspace Chengisfile is invalid: {0}")]
    ChengisfileInvalid(#[from] chengis_dsl::LoadError),
}

/// A prepared, exclusively-owned build directory plus whatever checkout
/// metadata fell out of acquiring it.
pub struct Workspace {
    pub path: PathBuf,
    pub git_info: Option<GitInfo>,
    /// Set when a `Chengisfile` was found at the workspace root; substitutes
    /// for the server-registered pipeline for this one build.
    pub pipeline_override: Option<Pipeline>,
}

/// Acquires and releases per-build workspace directories under one root.
/// Directories are keyed by build id, so two builds never collide even if
/// prepared concurrently.
#[derive(Clone)]
pub struct WorkspaceManager {
    root: PathBuf,
}

impl WorkspaceManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create `build_id`'s directory and, if `source` is given, shallow-clone
    /// it in. Clone failures leave the directory behind but propagate the
    /// error so the caller fails the build with `CheckoutFailed` before any
    /// stage runs.
    pub fn prepare(
        &self,
        build_id: &str,
        pipeline_name: &str,
        source: Option<&Source>,
    ) -> Result<Workspace, WorkspaceError> {
        let path = self.root.join(build_id);
        std::fs::create_dir_all(&path)?;

        let git_info = match source {
            Some(source) => Some(clone_and_inspect(source, &path)?),
            None => None,
        };

        let pipeline_override = load_chengisfile_override(&path, pipeline_name)?;

        Ok(Workspace {
            path,
            git_info,
            pipeline_override,
        })
    }

    /// Remove a build's workspace directory. Best-effort: a failure here
    /// must never flip an already-terminal build back to failing, so it's
    /// logged and swallowed rather than propagated.
    pub fn remove(&self, workspace: &Workspace) {
        if let Err(err) = std::fs::remove_dir_all(&workspace.path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    path = %workspace.path.display(),
                    error = %err,
                    "failed to remove workspace directory"
                );
            }
        }
    }
}

fn load_chengisfile_override(
    workspace_root: &Path,
    pipeline_name: &str,
) -> Result<Option<Pipeline>, WorkspaceError> {
    let candidate = workspace_root.join("Chengisfile");
    if !candidate.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&candidate)?;
    let pipeline = chengis_dsl::load_chengisfile(&content, pipeline_name)?;
    Ok(Some(pipeline))
}

fn clone_and_inspect(source: &Source, dest: &Path) -> Result<GitInfo, git2::Error> {
    let mut callbacks = git2::RemoteCallbacks::new();
    let credentials = source.credentials.clone();
    callbacks.credentials(move |_url, username_from_url, _allowed| match &credentials {
        Some(Credentials::SshKey { key }) => {
            git2::Cred::ssh_key_from_memory(username_from_url.unwrap_or("git"), None, key, None)
        }
        Some(Credentials::Token { token }) => git2::Cred::userpass_plaintext(token, ""),
        None => git2::Cred::default(),
    });

    let mut fetch_opts = git2::FetchOptions::new();
    fetch_opts.remote_callbacks(callbacks);
    // Default is a full clone, i.e. no depth limit at all.
    if let Some(depth) = source.depth {
        fetch_opts.depth(depth as i32);
    }

    let mut builder = git2::build::RepoBuilder::new();
    builder.fetch_options(fetch_opts);
    if let Some(branch) = &source.branch {
        builder.branch(branch);
    }

    let repo = builder.clone(&source.url, dest)?;
    extract_git_info(&repo)
}

fn extract_git_info(repo: &git2::Repository) -> Result<GitInfo, git2::Error> {
    let head = repo.head()?;
    let branch = head.shorthand().unwrap_or("HEAD").to_string();
    let commit = head.peel_to_commit()?;
    let author = commit.author();

    Ok(GitInfo {
        commit: commit.id().to_string(),
        branch,
        author_name: author.name().unwrap_or_default().to_string(),
        author_email: author.email().unwrap_or_default().to_string(),
        message: commit.summary().unwrap_or_default().to_string(),
    })
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
