// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Conversion between continuous playback time and frame indices.

use crate::error::{Result, ViewerError};
use crate::models::annotation::FrameIndex;

/// Frame index containing `time_seconds` at `frame_rate` frames per second.
///
/// Uses floor semantics: `frame_index_for(1.0, 30.0) == 30` and
/// `frame_index_for(0.999, 30.0) == 29`.
pub fn frame_index_for(time_seconds: f64, frame_rate: f64) -> Result<FrameIndex> {
    validate_frame_rate(frame_rate)?;
    if !time_seconds.is_finite() || time_seconds < 0.0 {
        return Err(ViewerError::InvalidArgument(format!(
            "time must be finite and non-negative, got {time_seconds}"
        )));
    }
    Ok((time_seconds * frame_rate).floor() as FrameIndex)
}

fn validate_frame_rate(frame_rate: f64) -> Result<()> {
    if frame_rate.is_finite() && frame_rate > 0.0 {
        Ok(())
    } else {
        Err(ViewerError::InvalidArgument(format!(
            "frame rate must be positive, got {frame_rate}"
        )))
    }
}

/// A validated, fixed frame rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    frame_rate: f64,
}

impl FrameClock {
    pub fn new(frame_rate: f64) -> Result<Self> {
        validate_frame_rate(frame_rate)?;
        Ok(Self { frame_rate })
    }

    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Length of one frame in seconds.
    pub fn frame_duration(&self) -> f64 {
        1.0 / self.frame_rate
    }

    /// Frame index for a playback time. Times below zero map to frame 0.
    pub fn frame_index(&self, time_seconds: f64) -> FrameIndex {
        if !time_seconds.is_finite() || time_seconds <= 0.0 {
            return 0;
        }
        (time_seconds * self.frame_rate).floor() as FrameIndex
    }

    /// Time at the middle of `frame`; seeking there lands on `frame` without
    /// rounding into a neighbour.
    pub fn frame_midpoint(&self, frame: FrameIndex) -> f64 {
        (frame as f64 + 0.5) / self.frame_rate
    }

    /// Number of whole or partial frames in a clip of `duration_seconds`.
    pub fn frame_count(&self, duration_seconds: f64) -> u64 {
        if duration_seconds <= 0.0 {
            return 0;
        }
        (duration_seconds * self.frame_rate).ceil() as u64
    }
}
