// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation data structures.
//!
//! This module defines the overlay shapes attached to video frames, their
//! drawing style, and the sparse frame-to-shapes mapping loaded in bulk for
//! each media source.

use crate::util::geometry::Rect;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Integer frame sequence number at a fixed frame rate.
pub type FrameIndex = u64;

/// Shapes of a single frame, in draw order.
pub type ShapeList = Arc<[AnnotationShape]>;

/// Sparse mapping from frame index to the shapes drawn on that frame.
pub type FrameMap = BTreeMap<FrameIndex, Vec<AnnotationShape>>;

/// A 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// 8-bit RGBA colour.
///
/// Serialized as `#rrggbb` when opaque and `rgba(r, g, b, a)` otherwise,
/// matching the colour strings used by the annotation API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const RED: Color = Color::rgb(255, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(..)`, `rgba(..)` or a few CSS names.
    pub fn parse(value: &str) -> Result<Self, String> {
        let value = value.trim();
        if let Some(hex) = value.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| format!("invalid hex colour: {value}"));
        }
        if let Some(body) = value
            .strip_prefix("rgba(")
            .or_else(|| value.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return parse_functional(body).ok_or_else(|| format!("invalid colour: {value}"));
        }
        match value.to_ascii_lowercase().as_str() {
            "yellow" => Ok(Self::YELLOW),
            "white" => Ok(Self::WHITE),
            "black" => Ok(Self::BLACK),
            "red" => Ok(Self::RED),
            "green" => Ok(Self::rgb(0, 128, 0)),
            "blue" => Ok(Self::rgb(0, 0, 255)),
            "transparent" => Ok(Self::rgba(0, 0, 0, 0)),
            _ => Err(format!("unknown colour: {value}")),
        }
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (slot, c) in rgb.iter_mut().zip(hex.chars()) {
                let v = c.to_digit(16)? as u8;
                *slot = v * 17;
            }
            Some(Color::rgb(rgb[0], rgb[1], rgb[2]))
        }
        6 => Some(Color::rgb(channel(0)?, channel(2)?, channel(4)?)),
        8 => Some(Color::rgba(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
        _ => None,
    }
}

fn parse_functional(body: &str) -> Option<Color> {
    let parts: Vec<&str> = body.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let r = parts[0].parse::<u8>().ok()?;
    let g = parts[1].parse::<u8>().ok()?;
    let b = parts[2].parse::<u8>().ok()?;
    let a = match parts.get(3) {
        Some(alpha) => {
            let alpha = alpha.parse::<f64>().ok()?;
            (alpha.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        None => 255,
    };
    Some(Color::rgba(r, g, b, a))
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::parse(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            let alpha = (self.a as f64 / 255.0 * 1000.0).round() / 1000.0;
            write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, alpha)
        }
    }
}

/// Kind of overlay shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Rect,
    /// Ellipse inscribed in the shape's bounding box.
    Circle,
}

/// Coordinate units of a shape's position and size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Source media pixels.
    #[default]
    Pixels,
    /// Fractions (0 to 1) of the source media dimensions.
    Normalized,
}

/// Stroke and fill used to draw a shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeStyle {
    #[serde(default = "default_stroke")]
    pub stroke: Color,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub corner_radius: f32,
}

fn default_stroke() -> Color {
    Color::YELLOW
}

fn default_stroke_width() -> f32 {
    2.0
}

fn is_zero(value: &f32) -> bool {
    *value == 0.0
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            stroke: default_stroke(),
            stroke_width: default_stroke_width(),
            fill: None,
            corner_radius: 0.0,
        }
    }
}

/// A drawable annotation attached to one frame.
///
/// `id` is unique within a frame's list only; the same tracked object
/// reappears under the same id on consecutive frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationShape {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ShapeKind,
    #[serde(default)]
    pub units: Units,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(flatten)]
    pub style: ShapeStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl AnnotationShape {
    /// Create a rectangle in source pixel units with the default style.
    pub fn rect(id: impl Into<String>, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            kind: ShapeKind::Rect,
            units: Units::Pixels,
            x,
            y,
            width,
            height,
            style: ShapeStyle::default(),
            label: None,
        }
    }

    /// Create an ellipse inscribed in the given box, in source pixel units.
    pub fn circle(id: impl Into<String>, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            kind: ShapeKind::Circle,
            ..Self::rect(id, x, y, width, height)
        }
    }

    pub fn with_units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    pub fn with_style(mut self, style: ShapeStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Bounding box in source pixels for media of the given dimensions.
    pub fn source_bounds(&self, source_width: u32, source_height: u32) -> Rect {
        let bounds = Rect::new(self.x, self.y, self.width, self.height);
        match self.units {
            Units::Pixels => bounds,
            Units::Normalized => bounds.scaled(source_width as f64, source_height as f64),
        }
    }
}
