// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Interface between the playback controller and a media backend.
//!
//! Commands are requests. A backend answers them later through events
//! returned from [`MediaSource::poll_events`], which the controller drains
//! once per UI turn.

use crate::models::playback::RequestToken;
use image::RgbaImage;

/// Decoded pixels of the frame the media is currently showing.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Bumped every time a different frame is decoded.
    pub revision: u64,
    pub image: RgbaImage,
}

/// What happened inside the media.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEventKind {
    MetadataLoaded {
        width: u32,
        height: u32,
        duration_seconds: f64,
    },
    LoadFailed(String),
    Played,
    Paused,
    Ended,
    TimeUpdate(f64),
    /// A seek finished at the given time.
    Seeked(f64),
}

/// An event stamped with the request it belongs to.
///
/// `Seeked` carries the token passed to [`MediaSource::seek`]; every other
/// event carries the token passed to [`MediaSource::open`].
#[derive(Debug, Clone, PartialEq)]
pub struct MediaEvent {
    pub token: RequestToken,
    pub kind: MediaEventKind,
}

impl MediaEvent {
    pub fn new(token: RequestToken, kind: MediaEventKind) -> Self {
        Self { token, kind }
    }
}

/// A playable media backend.
pub trait MediaSource {
    /// Start opening `uri`. Completion is reported as `MetadataLoaded` or `LoadFailed`.
    fn open(&mut self, uri: &str, token: RequestToken);

    /// Request playback. Confirmed by a `Played` event.
    fn play(&mut self);

    /// Request a pause. Confirmed by a `Paused` event.
    fn pause(&mut self);

    /// Request a seek. Confirmed by a `Seeked` event tagged with `token`.
    fn seek(&mut self, time_seconds: f64, token: RequestToken);

    /// Events produced since the previous call, oldest first.
    fn poll_events(&mut self) -> Vec<MediaEvent>;

    /// The currently decoded frame, if any.
    fn frame(&self) -> Option<&VideoFrame>;
}
