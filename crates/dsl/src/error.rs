// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors shared by both DSL surfaces.

use chengis_core::InvalidPipeline;
use thiserror::Error;

/// Either loader returns this. `Invalid` carries every violation the shared
/// `PipelineBuilder` validator found in one pass, same as a hand-written
/// pipeline would get from `PipelineBuilder::build`.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("HCL parse error: {0}")]
    Hcl(#[from] hcl::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid pipeline: {0}")]
    Invalid(#[from] InvalidPipeline),

    #[error("invalid format at {location}: {message}")]
    InvalidFormat { location: String, message: String },

    #[error("syntax error at {location}: {message}")]
    Syntax { location: String, message: String },
}

impl LoadError {
    pub(crate) fn invalid_format(location: impl Into<String>, message: impl Into<String>) -> Self {
        LoadError::InvalidFormat {
            location: location.into(),
            message: message.into(),
        }
    }

    pub(crate) fn syntax(location: impl Into<String>, message: impl Into<String>) -> Self {
        LoadError::Syntax {
            location: location.into(),
            message: message.into(),
        }
    }
}
