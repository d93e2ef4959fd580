// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation document serialization and deserialization.
//!
//! This module handles exporting and importing annotation documents in YAML
//! and JSON formats. The format is chosen from the file extension.

use crate::models::project::AnnotationDocument;
use anyhow::{bail, Result};
use std::path::Path;

/// Export an annotation document to YAML format.
pub fn export_yaml(data: &AnnotationDocument, path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(data)?;
    std::fs::write(path, yaml)?;
    Ok(())
}

/// Export an annotation document to JSON format.
pub fn export_json(data: &AnnotationDocument, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Import an annotation document from YAML format.
pub fn import_yaml(path: &Path) -> Result<AnnotationDocument> {
    let yaml = std::fs::read_to_string(path)?;
    let data = serde_yaml::from_str(&yaml)?;
    Ok(data)
}

/// Import an annotation document from JSON format.
pub fn import_json(path: &Path) -> Result<AnnotationDocument> {
    let json = std::fs::read_to_string(path)?;
    let data = serde_json::from_str(&json)?;
    Ok(data)
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase)
}

/// Export using the format implied by the file extension.
pub fn export_document(data: &AnnotationDocument, path: &Path) -> Result<()> {
    match extension(path).as_deref() {
        Some("yaml") | Some("yml") => export_yaml(data, path),
        Some("json") => export_json(data, path),
        other => bail!("Unsupported file extension: {:?}", other),
    }
}

/// Import using the format implied by the file extension.
pub fn import_document(path: &Path) -> Result<AnnotationDocument> {
    let document = match extension(path).as_deref() {
        Some("yaml") | Some("yml") => import_yaml(path)?,
        Some("json") => import_json(path)?,
        other => bail!("Unsupported file extension: {:?}", other),
    };
    log::info!(
        "Imported {} shapes over {} frames from {}",
        document.shape_count(),
        document.frames.len(),
        path.display()
    );
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::{AnnotationShape, Color, ShapeKind, ShapeStyle};

    fn sample() -> AnnotationDocument {
        let mut doc = AnnotationDocument::new("game.mp4");
        doc.frame_rate = Some(30.0);
        doc.push(30, AnnotationShape::rect("box1", 50.0, 60.0, 150.0, 100.0));
        doc.push(
            30,
            AnnotationShape::circle("ball", 350.0, 150.0, 20.0, 20.0).with_style(ShapeStyle {
                stroke: Color::rgb(255, 77, 77),
                stroke_width: 4.0,
                fill: Some(Color::rgba(255, 77, 77, 51)),
                corner_radius: 0.0,
            }),
        );
        doc
    }

    #[test]
    fn test_yaml_file_preserves_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("annotations.yaml");

        export_document(&sample(), &path).unwrap();
        assert_eq!(import_document(&path).unwrap(), sample());
    }

    #[test]
    fn test_json_file_preserves_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("annotations.JSON");

        export_document(&sample(), &path).unwrap();
        assert_eq!(import_document(&path).unwrap(), sample());
    }

    #[test]
    fn test_imports_hand_written_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frames.json");
        std::fs::write(
            &path,
            r##"{
                "frames": {
                    "30": [
                        {"id": "box1", "type": "rect", "x": 50, "y": 60, "width": 150, "height": 100,
                         "stroke": "#ff4d4d", "strokeWidth": 4, "fill": "rgba(255, 77, 77, 0.2)",
                         "cornerRadius": 10}
                    ]
                }
            }"##,
        )
        .unwrap();

        let doc = import_document(&path).unwrap();
        let shape = &doc.frames[&30][0];
        assert_eq!(shape.kind, ShapeKind::Rect);
        assert_eq!(shape.style.stroke, Color::rgb(255, 77, 77));
        assert_eq!(shape.style.corner_radius, 10.0);
        assert!(doc.media_file.is_none());
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("annotations.txt");

        assert!(export_document(&sample(), &path).is_err());
        assert!(import_document(&path).is_err());
    }
}
