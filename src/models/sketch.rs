// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Free-hand markup drawn over the current frame.
//!
//! Strokes are stored in normalized coordinates so they stay registered
//! with the frame at any display scale. The stroke list is shared
//! copy-on-write: a clone handed to the renderer or to a capture keeps
//! seeing the strokes as they were when it was taken.

use super::annotation::{Color, Point};
use std::sync::Arc;

/// One continuous pen stroke.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub points: Vec<Point>,
    pub color: Color,
    pub width: f32,
}

/// Ordered collection of strokes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sketch {
    strokes: Arc<Vec<Stroke>>,
}

impl Sketch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    /// Start a new stroke at `point`.
    pub fn begin_stroke(&mut self, point: Point, color: Color, width: f32) {
        Arc::make_mut(&mut self.strokes).push(Stroke {
            points: vec![point],
            color,
            width,
        });
    }

    /// Append `point` to the most recent stroke. Ignored when no stroke exists.
    pub fn extend_stroke(&mut self, point: Point) {
        if self.strokes.is_empty() {
            return;
        }
        if let Some(last) = Arc::make_mut(&mut self.strokes).last_mut() {
            last.points.push(point);
        }
    }

    pub fn clear(&mut self) {
        self.strokes = Arc::new(Vec::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_unaffected_by_later_strokes() {
        let mut sketch = Sketch::new();
        sketch.begin_stroke(Point::new(0.1, 0.1), Color::RED, 5.0);

        let snapshot = sketch.clone();
        sketch.extend_stroke(Point::new(0.2, 0.2));
        sketch.begin_stroke(Point::new(0.5, 0.5), Color::RED, 5.0);

        assert_eq!(snapshot.strokes().len(), 1);
        assert_eq!(snapshot.strokes()[0].points.len(), 1);
        assert_eq!(sketch.strokes().len(), 2);
        assert_eq!(sketch.strokes()[0].points.len(), 2);
    }

    #[test]
    fn test_extend_without_stroke_is_noop() {
        let mut sketch = Sketch::new();
        sketch.extend_stroke(Point::new(0.3, 0.3));
        assert!(sketch.is_empty());
    }
}
