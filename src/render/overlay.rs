// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Overlay drawing in registration with the video frame.
//!
//! Shapes are laid out into display-space primitives: source-pixel and
//! normalized coordinates are scaled by `display / source`, so the overlay
//! lines up with the frame at any display size. A [`Surface`] then draws
//! the frame followed by the primitives in input order.

use crate::error::Result;
use crate::models::annotation::{AnnotationShape, Color, Point, ShapeKind};
use crate::models::sketch::Sketch;
use crate::util::geometry::{scale_factors, Rect, Size};

/// Outline colour and width in display pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pen {
    pub color: Color,
    pub width: f32,
}

/// Display-space drawing command.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Rect {
        rect: Rect,
        corner_radius: f64,
        pen: Pen,
        fill: Option<Color>,
    },
    /// Ellipse inscribed in `rect`.
    Ellipse {
        rect: Rect,
        pen: Pen,
        fill: Option<Color>,
    },
    Polyline {
        points: Vec<Point>,
        pen: Pen,
    },
    /// Text whose bottom-left corner sits at `anchor`.
    Label {
        anchor: Point,
        text: String,
        color: Color,
    },
}

/// Something the renderer can draw onto.
pub trait Surface {
    /// Pixel source the surface presents under the overlay.
    type Frame: ?Sized;

    /// Discard the previous drawing and present `frame` scaled to `display`.
    fn begin(&mut self, frame: &Self::Frame, display: Size);

    fn paint(&mut self, primitive: &Primitive);
}

/// Lays out overlay shapes and draws them onto a surface.
#[derive(Debug, Default)]
pub struct OverlayRenderer {
    primitives: Vec<Primitive>,
}

impl OverlayRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Primitives produced by the most recent layout.
    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    /// Compute display-space primitives for `shapes` and `sketch`.
    ///
    /// The previous layout is replaced, never appended to.
    pub fn layout(
        &mut self,
        shapes: &[AnnotationShape],
        sketch: &Sketch,
        display: Size,
        source: Size,
    ) -> Result<&[Primitive]> {
        let (sx, sy) = scale_factors(display, source)?;
        let source_width = source.width.round() as u32;
        let source_height = source.height.round() as u32;

        self.primitives.clear();
        for shape in shapes {
            let rect = shape.source_bounds(source_width, source_height).scaled(sx, sy);
            let pen = Pen {
                color: shape.style.stroke,
                width: shape.style.stroke_width,
            };
            let primitive = match shape.kind {
                ShapeKind::Rect => Primitive::Rect {
                    rect,
                    corner_radius: shape.style.corner_radius as f64 * sx.min(sy),
                    pen,
                    fill: shape.style.fill,
                },
                ShapeKind::Circle => Primitive::Ellipse {
                    rect,
                    pen,
                    fill: shape.style.fill,
                },
            };
            self.primitives.push(primitive);

            if let Some(label) = &shape.label {
                self.primitives.push(Primitive::Label {
                    anchor: Point::new(rect.x, rect.y - 2.0),
                    text: label.clone(),
                    color: shape.style.stroke,
                });
            }
        }

        for stroke in sketch.strokes() {
            self.primitives.push(Primitive::Polyline {
                points: stroke
                    .points
                    .iter()
                    .map(|p| Point::new(p.x * display.width, p.y * display.height))
                    .collect(),
                pen: Pen {
                    color: stroke.color,
                    width: stroke.width,
                },
            });
        }

        Ok(&self.primitives)
    }

    /// Present `frame` and draw the overlay on top of it.
    ///
    /// Drawing twice with the same inputs leaves the surface in the same state.
    pub fn draw<S: Surface>(
        &mut self,
        surface: &mut S,
        frame: &S::Frame,
        shapes: &[AnnotationShape],
        sketch: &Sketch,
        display: Size,
        source: Size,
    ) -> Result<()> {
        self.layout(shapes, sketch, display, source)?;
        surface.begin(frame, display);
        for primitive in &self.primitives {
            surface.paint(primitive);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViewerError;
    use crate::models::annotation::{ShapeStyle, Units};

    /// Records what it was asked to draw.
    #[derive(Default)]
    struct RecordingSurface {
        begins: usize,
        painted: Vec<Primitive>,
    }

    impl Surface for RecordingSurface {
        type Frame = ();

        fn begin(&mut self, _frame: &(), _display: Size) {
            self.begins += 1;
            self.painted.clear();
        }

        fn paint(&mut self, primitive: &Primitive) {
            self.painted.push(primitive.clone());
        }
    }

    fn rect_of(primitive: &Primitive) -> Rect {
        match primitive {
            Primitive::Rect { rect, .. } | Primitive::Ellipse { rect, .. } => *rect,
            other => panic!("unexpected primitive {other:?}"),
        }
    }

    #[test]
    fn test_pixel_shape_scales_with_display() {
        let mut renderer = OverlayRenderer::new();
        let shapes = [AnnotationShape::rect("box1", 50.0, 60.0, 150.0, 100.0)];
        let primitives = renderer
            .layout(&shapes, &Sketch::new(), Size::new(1280.0, 960.0), Size::new(640.0, 480.0))
            .unwrap();

        assert_eq!(primitives.len(), 1);
        assert_eq!(rect_of(&primitives[0]), Rect::new(100.0, 120.0, 300.0, 200.0));
    }

    #[test]
    fn test_normalized_shape_scales_to_display() {
        let mut renderer = OverlayRenderer::new();
        let shapes = [AnnotationShape::circle("ball", 0.5, 0.25, 0.1, 0.1).with_units(Units::Normalized)];
        let primitives = renderer
            .layout(&shapes, &Sketch::new(), Size::new(800.0, 600.0), Size::new(1920.0, 1080.0))
            .unwrap();

        let rect = rect_of(&primitives[0]);
        assert!((rect.x - 400.0).abs() < 1e-9);
        assert!((rect.y - 150.0).abs() < 1e-9);
        assert!((rect.width - 80.0).abs() < 1e-9);
        assert!((rect.height - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_draw_order_matches_input() {
        let mut renderer = OverlayRenderer::new();
        let mut surface = RecordingSurface::default();
        let shapes = [
            AnnotationShape::rect("under", 0.0, 0.0, 10.0, 10.0),
            AnnotationShape::circle("over", 5.0, 5.0, 10.0, 10.0),
        ];
        renderer
            .draw(&mut surface, &(), &shapes, &Sketch::new(), Size::new(100.0, 100.0), Size::new(100.0, 100.0))
            .unwrap();

        assert!(matches!(surface.painted[0], Primitive::Rect { .. }));
        assert!(matches!(surface.painted[1], Primitive::Ellipse { .. }));
    }

    #[test]
    fn test_redraw_is_idempotent() {
        let mut renderer = OverlayRenderer::new();
        let mut surface = RecordingSurface::default();
        let shapes = [AnnotationShape::rect("box1", 50.0, 60.0, 150.0, 100.0).with_label("nao")];
        let display = Size::new(1280.0, 960.0);
        let source = Size::new(640.0, 480.0);

        renderer.draw(&mut surface, &(), &shapes, &Sketch::new(), display, source).unwrap();
        let first = surface.painted.clone();
        renderer.draw(&mut surface, &(), &shapes, &Sketch::new(), display, source).unwrap();

        assert_eq!(surface.painted, first);
        assert_eq!(renderer.primitives().len(), 2);
        assert_eq!(surface.begins, 2);
    }

    #[test]
    fn test_style_carried_to_primitive() {
        let mut renderer = OverlayRenderer::new();
        let style = ShapeStyle {
            stroke: Color::rgb(77, 77, 255),
            stroke_width: 4.0,
            fill: Some(Color::rgba(77, 77, 255, 51)),
            corner_radius: 10.0,
        };
        let shapes = [AnnotationShape::rect("box2", 350.0, 150.0, 120.0, 120.0).with_style(style)];
        let primitives = renderer
            .layout(&shapes, &Sketch::new(), Size::new(320.0, 240.0), Size::new(640.0, 480.0))
            .unwrap();

        match &primitives[0] {
            Primitive::Rect { corner_radius, pen, fill, .. } => {
                assert_eq!(*corner_radius, 5.0);
                assert_eq!(pen.width, 4.0);
                assert_eq!(*fill, Some(Color::rgba(77, 77, 255, 51)));
            }
            other => panic!("unexpected primitive {other:?}"),
        }
    }

    #[test]
    fn test_sketch_strokes_follow_shapes() {
        let mut renderer = OverlayRenderer::new();
        let mut sketch = Sketch::new();
        sketch.begin_stroke(Point::new(0.5, 0.5), Color::RED, 5.0);
        sketch.extend_stroke(Point::new(1.0, 0.5));
        let shapes = [AnnotationShape::rect("a", 0.0, 0.0, 1.0, 1.0)];

        let primitives = renderer
            .layout(&shapes, &sketch, Size::new(200.0, 100.0), Size::new(200.0, 100.0))
            .unwrap();

        match &primitives[1] {
            Primitive::Polyline { points, .. } => {
                assert_eq!(points, &vec![Point::new(100.0, 50.0), Point::new(200.0, 50.0)]);
            }
            other => panic!("unexpected primitive {other:?}"),
        }
    }

    #[test]
    fn test_zero_source_size_is_rejected() {
        let mut renderer = OverlayRenderer::new();
        let result = renderer.layout(&[], &Sketch::new(), Size::new(10.0, 10.0), Size::new(0.0, 0.0));
        assert!(matches!(result, Err(ViewerError::InvalidArgument(_))));
    }
}
