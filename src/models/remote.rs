// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Records returned by the remote annotation API.
//!
//! Only the fields the viewer uses are modelled; unknown fields are ignored.

use super::annotation::{AnnotationShape, Color, FrameIndex, FrameMap, ShapeStyle, Units};
use serde::{Deserialize, Deserializer, Serialize};

/// A log recorded by a robot during a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub id: i64,
    #[serde(default)]
    pub game: Option<i64>,
    #[serde(default)]
    pub player_number: Option<i64>,
    #[serde(default)]
    pub head_number: Option<i64>,
    #[serde(default)]
    pub log_path: Option<String>,
}

impl LogRecord {
    pub fn title(&self) -> String {
        match (self.player_number, self.head_number) {
            (Some(player), Some(head)) => format!("Log {} (player {player}, head {head})", self.id),
            (Some(player), None) => format!("Log {} (player {player})", self.id),
            _ => format!("Log {}", self.id),
        }
    }
}

/// A video recording of a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: i64,
    #[serde(default)]
    pub game: Option<i64>,
    #[serde(default)]
    pub video_path: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, rename = "type")]
    pub camera: Option<String>,
}

impl VideoRecord {
    /// File name of the recording, used to address it on the local video server.
    pub fn file_name(&self) -> Option<&str> {
        let path = self.video_path.as_deref()?;
        path.rsplit(|c: char| c == '/' || c == '\\').next().filter(|name| !name.is_empty())
    }
}

/// Normalized bounding box, fractions of the image dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxData {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A single annotation as returned by `/api/annotations/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub id: i64,
    #[serde(default, deserialize_with = "frame_number_from_any")]
    pub frame_number: Option<FrameIndex>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, rename = "type")]
    pub annotation_type: Option<String>,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub validated: bool,
    #[serde(default)]
    pub concealed: bool,
    #[serde(default, deserialize_with = "box_data_lenient")]
    pub data: Option<BoxData>,
}

/// The server serializes `frame_number` as a string.
fn frame_number_from_any<'de, D>(deserializer: D) -> Result<Option<FrameIndex>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_u64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// `data` is free-form JSON; anything that is not a box is treated as absent.
fn box_data_lenient<'de, D>(deserializer: D) -> Result<Option<BoxData>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// Colour the server assigns to an annotation class.
pub fn class_color(class_name: &str) -> Option<Color> {
    let hex = match class_name {
        "nao" => "#134dab",
        "ball" => "#b31290",
        "penaltymark" => "#f51b1f",
        "referee" => "#ffffff",
        "goalpost" => "#1de6f5",
        "t_cross" | "center_cross" | "circle_cross" | "l_cross" => "#6608c4",
        "line" => "#ff0000",
        "own_contour" => "#0000ff",
        _ => return None,
    };
    Color::parse(hex).ok()
}

impl AnnotationRecord {
    /// Convert to a normalized rectangle, or `None` when the record has no box.
    ///
    /// Validated boxes get a heavier stroke; concealed ones are drawn at half
    /// the stroke alpha.
    pub fn to_shape(&self) -> Option<AnnotationShape> {
        let data = self.data?;
        let mut stroke = self
            .color
            .as_deref()
            .and_then(|c| Color::parse(c).ok())
            .or_else(|| self.class_name.as_deref().and_then(class_color))
            .unwrap_or(Color::YELLOW);
        if self.concealed {
            stroke.a /= 2;
        }

        let mut shape = AnnotationShape::rect(
            self.id.to_string(),
            data.x,
            data.y,
            data.width,
            data.height,
        )
        .with_units(Units::Normalized)
        .with_style(ShapeStyle {
            stroke,
            stroke_width: if self.validated { 2.0 } else { 1.0 },
            ..ShapeStyle::default()
        });
        if let Some(class_name) = &self.class_name {
            shape = shape.with_label(class_name.clone());
        }
        Some(shape)
    }
}

/// Group records into a frame mapping, preserving record order within a frame.
///
/// Records without a frame number or bounding box are skipped.
pub fn frame_map_from_records(records: &[AnnotationRecord]) -> FrameMap {
    let mut map = FrameMap::new();
    for record in records {
        let (Some(frame), Some(shape)) = (record.frame_number, record.to_shape()) else {
            log::debug!("Skipping annotation {} without frame or box", record.id);
            continue;
        };
        map.entry(frame).or_default().push(shape);
    }
    map
}

/// Response body that is either a bare list or a paginated envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Page { results: Vec<T> },
    List(Vec<T>),
}

impl<T> Listing<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Page { results } => results,
            Listing::List(items) => items,
        }
    }
}
