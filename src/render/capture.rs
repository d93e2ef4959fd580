// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Flattening the current frame and its overlay into a PNG.

use super::overlay::OverlayRenderer;
use super::raster::RasterSurface;
use crate::error::{Result, ViewerError};
use crate::models::annotation::AnnotationShape;
use crate::models::sketch::Sketch;
use crate::playback::controller::PlaybackController;
use crate::util::geometry::Size;
use chrono::{DateTime, Utc};
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;

/// Encoded still of a frame with its overlay burned in.
#[derive(Debug, Clone)]
pub struct CaptureArtifact {
    /// Lossless PNG bytes.
    pub pixel_data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub created_at: DateTime<Utc>,
}

/// Produces captures at the media's native resolution.
#[derive(Debug, Default)]
pub struct FrameCapture {
    renderer: OverlayRenderer,
}

impl FrameCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compose `frame`, `shapes` and `sketch` and encode the result.
    ///
    /// Fails with `CaptureUnavailable` when no frame has been decoded.
    pub fn capture(
        &mut self,
        frame: Option<&RgbaImage>,
        shapes: &[AnnotationShape],
        sketch: &Sketch,
    ) -> Result<CaptureArtifact> {
        let frame = frame.ok_or(ViewerError::CaptureUnavailable)?;
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Err(ViewerError::CaptureUnavailable);
        }

        let size = Size::from_pixels(width, height);
        let mut surface = RasterSurface::new();
        self.renderer
            .draw(&mut surface, frame, shapes, sketch, size, size)?;

        let mut pixel_data = Vec::new();
        surface
            .image()
            .write_to(&mut Cursor::new(&mut pixel_data), ImageFormat::Png)
            .map_err(|e| {
                log::error!("Failed to encode capture: {}", e);
                ViewerError::CaptureUnavailable
            })?;

        log::info!("Captured {}x{} frame ({} bytes)", width, height, pixel_data.len());
        Ok(CaptureArtifact {
            pixel_data,
            width,
            height,
            created_at: Utc::now(),
        })
    }

    /// Capture whatever the controller is currently showing.
    pub fn capture_current(
        &mut self,
        controller: &PlaybackController,
        sketch: &Sketch,
    ) -> Result<CaptureArtifact> {
        let frame = controller.video_frame().map(|f| &f.image);
        self.capture(frame, controller.current_shapes(), sketch)
    }
}
