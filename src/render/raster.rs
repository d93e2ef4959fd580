// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Software rasterizer used for captures.
//!
//! Coverage is sampled at pixel centers and colours are blended source-over.
//! Labels are not rasterized; text only appears on screen.

use super::overlay::{Pen, Primitive, Surface};
use crate::models::annotation::{Color, Point};
use crate::util::geometry::{Rect, Size};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

/// Draws onto an owned RGBA image.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    canvas: RgbaImage,
}

impl Default for RasterSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterSurface {
    pub fn new() -> Self {
        Self {
            canvas: RgbaImage::new(0, 0),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.canvas
    }

    fn fill_where(&mut self, bounds: Rect, color: Color, inside: impl Fn(f64, f64) -> bool) {
        if color.a == 0 {
            return;
        }
        let (width, height) = self.canvas.dimensions();
        let x0 = bounds.x.floor().max(0.0) as u32;
        let y0 = bounds.y.floor().max(0.0) as u32;
        let x1 = (bounds.right().ceil().max(0.0) as u32).min(width);
        let y1 = (bounds.bottom().ceil().max(0.0) as u32).min(height);

        for y in y0..y1 {
            for x in x0..x1 {
                if inside(x as f64 + 0.5, y as f64 + 0.5) {
                    blend(self.canvas.get_pixel_mut(x, y), color);
                }
            }
        }
    }

    fn rounded_rect(&mut self, rect: Rect, radius: f64, pen: Pen, fill: Option<Color>) {
        if let Some(fill) = fill {
            self.fill_where(rect, fill, |x, y| in_rounded_rect(x, y, rect, radius));
        }
        if pen.width <= 0.0 {
            return;
        }
        let half = pen.width as f64 / 2.0;
        let outer = inflate(rect, half);
        let inner = inflate(rect, -half);
        let inner_radius = (radius - half).max(0.0);
        self.fill_where(outer, pen.color, |x, y| {
            in_rounded_rect(x, y, outer, radius + half)
                && !(has_area(inner) && in_rounded_rect(x, y, inner, inner_radius))
        });
    }

    fn ellipse(&mut self, rect: Rect, pen: Pen, fill: Option<Color>) {
        if let Some(fill) = fill {
            self.fill_where(rect, fill, |x, y| in_ellipse(x, y, rect));
        }
        if pen.width <= 0.0 {
            return;
        }
        let half = pen.width as f64 / 2.0;
        let outer = inflate(rect, half);
        let inner = inflate(rect, -half);
        self.fill_where(outer, pen.color, |x, y| {
            in_ellipse(x, y, outer) && !(has_area(inner) && in_ellipse(x, y, inner))
        });
    }

    fn polyline(&mut self, points: &[Point], pen: Pen) {
        let Some(first) = points.first() else {
            return;
        };
        let half = (pen.width as f64 / 2.0).max(0.5);
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        let bounds = inflate(Rect::new(min_x, min_y, max_x - min_x, max_y - min_y), half);

        // Each pixel is blended once even where segments overlap.
        self.fill_where(bounds, pen.color, |x, y| {
            let p = Point::new(x, y);
            if points.len() == 1 {
                return distance(p, *first) <= half;
            }
            points
                .windows(2)
                .any(|seg| distance_to_segment(p, seg[0], seg[1]) <= half)
        });
    }
}

impl Surface for RasterSurface {
    type Frame = RgbaImage;

    fn begin(&mut self, frame: &RgbaImage, display: Size) {
        let width = display.width.round().max(0.0) as u32;
        let height = display.height.round().max(0.0) as u32;
        self.canvas = if frame.dimensions() == (width, height) {
            frame.clone()
        } else {
            imageops::resize(frame, width, height, FilterType::Triangle)
        };
    }

    fn paint(&mut self, primitive: &Primitive) {
        match primitive {
            Primitive::Rect {
                rect,
                corner_radius,
                pen,
                fill,
            } => self.rounded_rect(*rect, *corner_radius, *pen, *fill),
            Primitive::Ellipse { rect, pen, fill } => self.ellipse(*rect, *pen, *fill),
            Primitive::Polyline { points, pen } => self.polyline(points, *pen),
            Primitive::Label { .. } => {}
        }
    }
}

fn blend(pixel: &mut Rgba<u8>, color: Color) {
    let alpha = color.a as u32;
    let inverse = 255 - alpha;
    let source = [color.r, color.g, color.b];
    for (dst, src) in pixel.0[..3].iter_mut().zip(source) {
        *dst = ((src as u32 * alpha + *dst as u32 * inverse + 127) / 255) as u8;
    }
    pixel.0[3] = (alpha + (pixel.0[3] as u32 * inverse + 127) / 255).min(255) as u8;
}

fn inflate(rect: Rect, amount: f64) -> Rect {
    Rect::new(
        rect.x - amount,
        rect.y - amount,
        rect.width + 2.0 * amount,
        rect.height + 2.0 * amount,
    )
}

fn has_area(rect: Rect) -> bool {
    rect.width > 0.0 && rect.height > 0.0
}

fn in_rounded_rect(x: f64, y: f64, rect: Rect, radius: f64) -> bool {
    if x < rect.x || x >= rect.right() || y < rect.y || y >= rect.bottom() {
        return false;
    }
    let r = radius.min(rect.width / 2.0).min(rect.height / 2.0).max(0.0);
    if r == 0.0 {
        return true;
    }
    let cx = x.clamp(rect.x + r, rect.right() - r);
    let cy = y.clamp(rect.y + r, rect.bottom() - r);
    (x - cx).powi(2) + (y - cy).powi(2) <= r * r
}

fn in_ellipse(x: f64, y: f64, rect: Rect) -> bool {
    let a = rect.width / 2.0;
    let b = rect.height / 2.0;
    if a <= 0.0 || b <= 0.0 {
        return false;
    }
    let c = rect.center();
    ((x - c.x) / a).powi(2) + ((y - c.y) / b).powi(2) <= 1.0
}

fn distance(a: Point, b: Point) -> f64 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length_sq = dx * dx + dy * dy;
    if length_sq == 0.0 {
        return distance(p, a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / length_sq).clamp(0.0, 1.0);
    distance(p, Point::new(a.x + t * dx, a.y + t * dy))
}
