// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Error kinds surfaced by the viewer core.
//!
//! Collaborators (disk, HTTP, the local video server) translate their own
//! failures into one of these kinds before anything reaches the playback
//! state machine.

use crate::models::playback::RequestToken;
use thiserror::Error;

/// Errors produced by the viewer core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewerError {
    /// Media or annotation source failed to load or fetch.
    #[error("source unavailable: {uri}: {reason}")]
    SourceUnavailable { uri: String, reason: String },

    /// Caller violated an API contract (e.g. a non-positive frame rate).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Capture was requested before any frame was decoded.
    #[error("no decoded frame is available to capture")]
    CaptureUnavailable,

    /// Result of a superseded request.
    #[error("stale response for request {0}")]
    StaleResponse(RequestToken),
}

impl ViewerError {
    /// Build a `SourceUnavailable` from any displayable failure.
    pub fn source_unavailable(uri: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::SourceUnavailable {
            uri: uri.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error should be shown to the user.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, Self::StaleResponse(_))
    }
}

pub type Result<T> = std::result::Result<T, ViewerError>;
