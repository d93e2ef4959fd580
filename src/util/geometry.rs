// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module provides utilities for coordinate transformations between
//! source pixel coordinates and display coordinates.

use crate::error::{Result, ViewerError};
use crate::models::annotation::Point;

/// Width and height of a surface, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Size of a pixel buffer.
    pub fn from_pixels(width: u32, height: u32) -> Self {
        Self::new(width as f64, height as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }

    /// Multiply position and size by independent axis factors.
    pub fn scaled(&self, sx: f64, sy: f64) -> Self {
        Self::new(self.x * sx, self.y * sy, self.width * sx, self.height * sy)
    }
}

/// Per-axis factors mapping source pixels onto a display surface.
pub fn scale_factors(display: Size, source: Size) -> Result<(f64, f64)> {
    if source.is_empty() {
        return Err(ViewerError::InvalidArgument(format!(
            "source size must be positive, got {}x{}",
            source.width, source.height
        )));
    }
    Ok((display.width / source.width, display.height / source.height))
}

/// Largest rectangle with the source aspect ratio that fits centered in `available`.
pub fn fit_within(source: Size, available: Size) -> Rect {
    if source.is_empty() || available.is_empty() {
        return Rect::new(0.0, 0.0, 0.0, 0.0);
    }

    let source_aspect = source.width / source.height;
    let available_aspect = available.width / available.height;

    let (width, height) = if source_aspect > available_aspect {
        // Source is wider - fit to width
        (available.width, available.width / source_aspect)
    } else {
        // Source is taller - fit to height
        (available.height * source_aspect, available.height)
    };

    Rect::new(
        (available.width - width) / 2.0,
        (available.height - height) / 2.0,
        width,
        height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_factors_double() {
        let (sx, sy) = scale_factors(Size::new(1280.0, 960.0), Size::new(640.0, 480.0)).unwrap();
        assert_eq!(sx, 2.0);
        assert_eq!(sy, 2.0);
    }

    #[test]
    fn test_scale_factors_reject_empty_source() {
        let result = scale_factors(Size::new(1280.0, 960.0), Size::new(0.0, 480.0));
        assert!(matches!(result, Err(ViewerError::InvalidArgument(_))));
    }

    #[test]
    fn test_fit_within_letterboxes_wide_source() {
        let rect = fit_within(Size::new(1920.0, 1080.0), Size::new(960.0, 960.0));
        assert_eq!(rect.width, 960.0);
        assert!((rect.height - 540.0).abs() < 1e-9);
        assert!((rect.y - 210.0).abs() < 1e-9);
        assert_eq!(rect.x, 0.0);
    }

    #[test]
    fn test_fit_within_pillarboxes_tall_source() {
        let rect = fit_within(Size::new(480.0, 640.0), Size::new(800.0, 640.0));
        assert_eq!(rect.height, 640.0);
        assert_eq!(rect.width, 480.0);
        assert_eq!(rect.x, 160.0);
    }
}
