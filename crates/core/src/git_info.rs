// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git metadata resolved from a checked-out workspace, published to steps as
//! `GIT_*` environment variables and recorded on the build.

/// Commit and branch metadata for the checkout a build ran against.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GitInfo {
    pub commit: String,
    pub branch: String,
    pub author_name: String,
    pub author_email: String,
    pub message: String,
}

impl GitInfo {
    /// First 7 characters of `commit`, or the whole thing if shorter.
    pub fn commit_short(&self) -> &str {
        if self.commit.len() <= 7 {
            &self.commit
        } else {
            &self.commit[..7]
        }
    }

    /// `GIT_COMMIT`, `GIT_COMMIT_SHORT`, `GIT_BRANCH`, `GIT_AUTHOR`,
    /// `GIT_EMAIL`, `GIT_MESSAGE` — published into every step's environment.
    pub fn as_env_vars(&self) -> Vec<(String, String)> {
        vec![
            ("GIT_COMMIT".to_string(), self.commit.clone()),
            ("GIT_COMMIT_SHORT".to_string(), self.commit_short().to_string()),
            ("GIT_BRANCH".to_string(), self.branch.clone()),
            ("GIT_AUTHOR".to_string(), self.author_name.clone()),
            ("GIT_EMAIL".to_string(), self.author_email.clone()),
            ("GIT_MESSAGE".to_string(), self.message.clone()),
        ]
    }
}

#[cfg(test)]
#[path = "git_info_tests.rs"]
mod tests;