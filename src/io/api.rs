// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Client for the remote annotation API.
//!
//! Calls are blocking and meant to run on a background thread; results are
//! handed back to the UI through a channel like any other load.

use crate::error::ViewerError;
use crate::models::annotation::FrameMap;
use crate::models::remote::{
    frame_map_from_records, AnnotationRecord, Listing, LogRecord, VideoRecord,
};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Production API host.
pub const PRODUCTION_URL: &str = "https://vat.berlin-united.com";

/// API host used when `use_dev` is set.
pub const DEVELOPMENT_URL: &str = "http://127.0.0.1:8000";

/// Errors from the remote API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, body decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("API error ({status}): {body}")]
    Status { status: u16, body: String },
}

impl ApiError {
    /// Translate into the viewer's error kind for `uri`.
    pub fn into_viewer_error(self, uri: &str) -> ViewerError {
        ViewerError::source_unavailable(uri, self)
    }
}

/// Blocking HTTP client for one API host.
pub struct ApiClient {
    client: reqwest::blocking::Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    /// Create a client for `base_url`, authenticating with `token`.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, ApiError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Logs recorded during `game_id`.
    pub fn logs(&self, game_id: i64) -> Result<Vec<LogRecord>, ApiError> {
        self.get_list("/api/logs", &[("game", game_id.to_string())])
    }

    /// Video recordings of `game_id`.
    pub fn videos(&self, game_id: i64) -> Result<Vec<VideoRecord>, ApiError> {
        self.get_list("/api/video", &[("game", game_id.to_string())])
    }

    /// Raw annotation records of one log.
    pub fn annotations(&self, log_id: i64) -> Result<Vec<AnnotationRecord>, ApiError> {
        self.get_list("/api/annotations/", &[("log", log_id.to_string())])
    }

    /// Annotations of one log, grouped by frame.
    pub fn annotations_for_log(&self, log_id: i64) -> Result<FrameMap, ApiError> {
        let records = self.annotations(log_id)?;
        let map = frame_map_from_records(&records);
        log::info!(
            "Fetched {} annotations over {} frames for log {}",
            records.len(),
            map.len(),
            log_id
        );
        Ok(map)
    }

    /// URL of an API path, for error reporting.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ---- private helpers ----

    fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, ApiError> {
        let response = self
            .client
            .get(self.url_for(path))
            .header(reqwest::header::AUTHORIZATION, format!("Token {}", self.token))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .query(query)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let listing: Listing<T> = response.json()?;
        Ok(listing.into_vec())
    }
}
