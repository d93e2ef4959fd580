// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Video canvas with the annotation overlay.
//!
//! The current frame is fitted into the available space and the overlay is
//! drawn through the same [`OverlayRenderer`] used for captures, so what is
//! on screen is what ends up in a capture. Dragging on the frame sketches
//! when the sketch tool is active.

use crate::models::annotation::{Color, Point};
use crate::models::sketch::Sketch;
use crate::playback::controller::{Placeholder, RenderInput};
use crate::render::overlay::{OverlayRenderer, Primitive, Surface};
use crate::util::geometry::{fit_within, Size};

/// Result of canvas interaction.
pub enum CanvasAction {
    None,
    BeginStroke(Point),
    ExtendStroke(Point),
}

/// Convert an overlay colour to an egui colour.
pub fn color32(color: Color) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
}

/// Draws overlay primitives with an egui painter, offset to the frame's screen rect.
struct PainterSurface {
    painter: egui::Painter,
    origin: egui::Pos2,
}

impl PainterSurface {
    fn pos(&self, point: Point) -> egui::Pos2 {
        self.origin + egui::vec2(point.x as f32, point.y as f32)
    }

    fn rect(&self, rect: &crate::util::geometry::Rect) -> egui::Rect {
        egui::Rect::from_min_size(
            self.pos(Point::new(rect.x, rect.y)),
            egui::vec2(rect.width as f32, rect.height as f32),
        )
    }
}

/// Points on the ellipse inscribed in `rect`.
fn ellipse_points(rect: egui::Rect) -> Vec<egui::Pos2> {
    const SEGMENTS: usize = 48;
    let center = rect.center();
    let (rx, ry) = (rect.width() / 2.0, rect.height() / 2.0);
    (0..SEGMENTS)
        .map(|i| {
            let angle = i as f32 / SEGMENTS as f32 * std::f32::consts::TAU;
            egui::pos2(center.x + rx * angle.cos(), center.y + ry * angle.sin())
        })
        .collect()
}

impl Surface for PainterSurface {
    type Frame = egui::TextureId;

    fn begin(&mut self, frame: &egui::TextureId, display: Size) {
        let rect = egui::Rect::from_min_size(
            self.origin,
            egui::vec2(display.width as f32, display.height as f32),
        );
        self.painter.image(
            *frame,
            rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );
    }

    fn paint(&mut self, primitive: &Primitive) {
        match primitive {
            Primitive::Rect {
                rect,
                corner_radius,
                pen,
                fill,
            } => {
                let rect = self.rect(rect);
                let rounding = egui::Rounding::same(*corner_radius as f32);
                if let Some(fill) = fill {
                    self.painter.rect_filled(rect, rounding, color32(*fill));
                }
                self.painter
                    .rect_stroke(rect, rounding, egui::Stroke::new(pen.width, color32(pen.color)));
            }
            Primitive::Ellipse { rect, pen, fill } => {
                let points = ellipse_points(self.rect(rect));
                let stroke = egui::Stroke::new(pen.width, color32(pen.color));
                match fill {
                    Some(fill) => {
                        self.painter
                            .add(egui::Shape::convex_polygon(points, color32(*fill), stroke));
                    }
                    None => {
                        self.painter.add(egui::Shape::closed_line(points, stroke));
                    }
                }
            }
            Primitive::Polyline { points, pen } => {
                let points: Vec<egui::Pos2> = points.iter().map(|p| self.pos(*p)).collect();
                let stroke = egui::Stroke::new(pen.width, color32(pen.color));
                if points.len() == 1 {
                    self.painter
                        .circle_filled(points[0], pen.width / 2.0, stroke.color);
                } else {
                    self.painter.add(egui::Shape::line(points, stroke));
                }
            }
            Primitive::Label {
                anchor,
                text,
                color,
            } => {
                self.painter.text(
                    self.pos(*anchor),
                    egui::Align2::LEFT_BOTTOM,
                    text,
                    egui::FontId::proportional(13.0),
                    color32(*color),
                );
            }
        }
    }
}

fn centered_message(ui: &mut egui::Ui, heading: &str, detail: &str, color: egui::Color32) {
    ui.centered_and_justified(|ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(20.0);
            ui.heading(egui::RichText::new(heading).size(28.0).color(color));
            ui.add_space(10.0);
            ui.label(egui::RichText::new(detail).color(egui::Color32::from_gray(170)));
        });
    });
}

/// Display the canvas and handle sketch input.
pub fn show(
    ui: &mut egui::Ui,
    input: &RenderInput,
    texture: Option<&egui::TextureHandle>,
    renderer: &mut OverlayRenderer,
    sketch: &Sketch,
    sketch_enabled: bool,
) -> CanvasAction {
    let mut action = CanvasAction::None;
    // Set background color
    ui.style_mut().visuals.extreme_bg_color = egui::Color32::from_gray(40);

    let available_size = ui.available_size();

    egui::Frame::canvas(ui.style()).show(ui, |ui| {
        ui.set_min_size(available_size);

        match input {
            RenderInput::Placeholder(Placeholder::NoSource) => centered_message(
                ui,
                "VAT Viewer",
                "File → Open Video... or pick a recording from the remote panel",
                egui::Color32::from_gray(200),
            ),
            RenderInput::Placeholder(Placeholder::Loading) => {
                ui.centered_and_justified(|ui| {
                    ui.spinner();
                });
            }
            RenderInput::Placeholder(Placeholder::Failed(err)) => centered_message(
                ui,
                "Could not load",
                &err.to_string(),
                egui::Color32::from_rgb(230, 90, 90),
            ),
            RenderInput::Frame {
                shapes,
                source_width,
                source_height,
                ..
            } => {
                let Some(texture) = texture else {
                    ui.centered_and_justified(|ui| {
                        ui.spinner();
                    });
                    return;
                };

                let source = Size::from_pixels(*source_width, *source_height);
                let area = ui.max_rect();
                let fitted = fit_within(
                    source,
                    Size::new(area.width() as f64, area.height() as f64),
                );
                let image_rect = egui::Rect::from_min_size(
                    area.min + egui::vec2(fitted.x as f32, fitted.y as f32),
                    egui::vec2(fitted.width as f32, fitted.height as f32),
                );

                let sense = if sketch_enabled {
                    egui::Sense::drag()
                } else {
                    egui::Sense::hover()
                };
                let response = ui.allocate_rect(image_rect, sense);

                let mut surface = PainterSurface {
                    painter: ui.painter_at(image_rect),
                    origin: image_rect.min,
                };
                let display = Size::new(fitted.width, fitted.height);
                if let Err(e) =
                    renderer.draw(&mut surface, &texture.id(), shapes, sketch, display, source)
                {
                    log::warn!("Overlay not drawn: {}", e);
                }

                if sketch_enabled {
                    if let Some(pos) = response.interact_pointer_pos() {
                        let point = Point::new(
                            ((pos.x - image_rect.min.x) / image_rect.width()).clamp(0.0, 1.0)
                                as f64,
                            ((pos.y - image_rect.min.y) / image_rect.height()).clamp(0.0, 1.0)
                                as f64,
                        );
                        if response.drag_started() {
                            action = CanvasAction::BeginStroke(point);
                        } else if response.dragged() {
                            action = CanvasAction::ExtendStroke(point);
                        }
                    }
                }
            }
        }
    });

    action
}
