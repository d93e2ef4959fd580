// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Playback state owned by the playback controller.

use std::fmt;

/// Monotonically increasing identifier of an asynchronous request.
///
/// Results tagged with an older token than the latest request of the same
/// kind are stale and get discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle phase of the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// No source assigned.
    Idle,
    /// Waiting for media metadata and/or the annotation mapping.
    Loading,
    /// Metadata and annotations available, never played.
    Ready,
    Playing,
    Paused,
}

/// Transport command sent to the media and not yet confirmed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportRequest {
    Play,
    Pause,
}

/// Snapshot of what the media is doing.
///
/// Once the duration is known, `0 <= current_time_seconds <= duration_seconds`.
/// Before metadata arrives both are zero.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaybackState {
    pub source_uri: Option<String>,
    pub is_playing: bool,
    pub current_time_seconds: f64,
    pub duration_seconds: f64,
    pub media_width: u32,
    pub media_height: u32,
}

impl PlaybackState {
    /// Fresh state for a newly assigned source.
    pub fn for_source(uri: impl Into<String>) -> Self {
        Self {
            source_uri: Some(uri.into()),
            ..Self::default()
        }
    }

    /// Clamp a time into the playable range.
    pub fn clamp_time(&self, time_seconds: f64) -> f64 {
        if !time_seconds.is_finite() || time_seconds <= 0.0 {
            return 0.0;
        }
        time_seconds.min(self.duration_seconds)
    }

    pub fn has_dimensions(&self) -> bool {
        self.media_width > 0 && self.media_height > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_before_metadata_is_zero() {
        let state = PlaybackState::for_source("a.mp4");
        assert_eq!(state.clamp_time(5.0), 0.0);
    }

    #[test]
    fn test_clamp_to_duration() {
        let state = PlaybackState {
            duration_seconds: 10.0,
            ..PlaybackState::default()
        };
        assert_eq!(state.clamp_time(12.5), 10.0);
        assert_eq!(state.clamp_time(-1.0), 0.0);
        assert_eq!(state.clamp_time(f64::NAN), 0.0);
        assert_eq!(state.clamp_time(4.25), 4.25);
    }

    #[test]
    fn test_tokens_order() {
        assert!(RequestToken::new(2) > RequestToken::new(1));
        assert_eq!(RequestToken::new(7).to_string(), "#7");
    }
}
