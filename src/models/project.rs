// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation documents stored on disk.
//!
//! A document carries the frame mapping for one media file, together with
//! the frame rate its frame indices were computed at.

use super::annotation::{AnnotationShape, FrameIndex, FrameMap};
use serde::{Deserialize, Serialize};

/// Complete annotation data for serialization.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnnotationDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<f64>,
    #[serde(default)]
    pub frames: FrameMap,
}

impl AnnotationDocument {
    /// Create an empty document for the given media file.
    pub fn new(media_file: impl Into<String>) -> Self {
        Self {
            media_file: Some(media_file.into()),
            ..Self::default()
        }
    }

    /// Append a shape to a frame's list, after any shapes already there.
    pub fn push(&mut self, frame: FrameIndex, shape: AnnotationShape) {
        self.frames.entry(frame).or_default().push(shape);
    }

    pub fn shape_count(&self) -> usize {
        self.frames.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_keeps_insertion_order() {
        let mut doc = AnnotationDocument::new("game.mp4");
        doc.push(30, AnnotationShape::rect("box1", 50.0, 60.0, 150.0, 100.0));
        doc.push(30, AnnotationShape::rect("box2", 350.0, 150.0, 120.0, 120.0));
        doc.push(31, AnnotationShape::rect("box1", 53.0, 60.0, 150.0, 100.0));

        let ids: Vec<&str> = doc.frames[&30].iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["box1", "box2"]);
        assert_eq!(doc.shape_count(), 3);
    }
}
