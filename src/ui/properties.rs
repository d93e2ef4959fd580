// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Playback and annotation properties panel.
//!
//! This module shows the playback state and the shapes attached to the
//! current frame.

use crate::models::annotation::{AnnotationShape, ShapeKind, Units};
use crate::playback::controller::PlaybackController;
use crate::ui::canvas::color32;
use crate::ui::timeline::format_time;
use std::path::Path;

/// One-line description of a shape.
pub fn describe_shape(shape: &AnnotationShape) -> String {
    let kind = match shape.kind {
        ShapeKind::Rect => "rect",
        ShapeKind::Circle => "circle",
    };
    let (x, y, w, h) = (shape.x, shape.y, shape.width, shape.height);
    let geometry = match shape.units {
        Units::Pixels => format!("{x:.0},{y:.0} {w:.0}×{h:.0}"),
        Units::Normalized => format!("{x:.3},{y:.3} {w:.3}×{h:.3}"),
    };
    match &shape.label {
        Some(label) => format!("{} {} ({}) {}", kind, shape.id, label, geometry),
        None => format!("{} {} {}", kind, shape.id, geometry),
    }
}

/// Display the properties panel.
pub fn show(ui: &mut egui::Ui, controller: &PlaybackController, last_capture: Option<&Path>) {
    let state = controller.state();

    ui.heading("Playback");
    ui.separator();

    egui::Grid::new("playback_grid")
        .num_columns(2)
        .spacing([12.0, 4.0])
        .show(ui, |ui| {
            ui.label("Source:");
            ui.label(state.source_uri.as_deref().unwrap_or("none"));
            ui.end_row();

            ui.label("State:");
            ui.label(format!("{:?}", controller.player_state()));
            ui.end_row();

            ui.label("Time:");
            ui.label(format_time(state.current_time_seconds));
            ui.end_row();

            ui.label("Duration:");
            ui.label(format_time(state.duration_seconds));
            ui.end_row();

            ui.label("Frame:");
            ui.label(format!(
                "{} @ {} fps",
                controller.current_frame(),
                controller.clock().frame_rate()
            ));
            ui.end_row();

            if state.has_dimensions() {
                ui.label("Size:");
                ui.label(format!("{}×{}", state.media_width, state.media_height));
                ui.end_row();
            }

            ui.label("Annotated:");
            ui.label(format!("{} frames", controller.annotations().frame_count()));
            ui.end_row();
        });

    if controller.is_annotation_fetch_pending() {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label("Loading annotations...");
        });
    }

    ui.add_space(12.0);
    ui.heading("Current frame");
    ui.separator();

    let shapes = controller.current_shapes();
    if shapes.is_empty() {
        ui.label(egui::RichText::new("No annotations on this frame").weak());
    } else {
        egui::ScrollArea::vertical().show(ui, |ui| {
            for shape in shapes.iter() {
                ui.horizontal(|ui| {
                    let (swatch, _) =
                        ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
                    ui.painter()
                        .rect_filled(swatch, egui::Rounding::same(2.0), color32(shape.style.stroke));
                    ui.label(describe_shape(shape));
                });
            }
        });
    }

    if let Some(path) = last_capture {
        ui.add_space(12.0);
        ui.separator();
        ui.label(egui::RichText::new(format!("Last capture: {}", path.display())).small());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_shape() {
        let rect = AnnotationShape::rect("box1", 50.0, 60.0, 150.0, 100.0);
        assert_eq!(describe_shape(&rect), "rect box1 50,60 150×100");

        let ball = AnnotationShape::circle("7", 0.5, 0.25, 0.05, 0.05)
            .with_units(Units::Normalized)
            .with_label("ball");
        assert_eq!(describe_shape(&ball), "circle 7 (ball) 0.500,0.250 0.050×0.050");
    }
}
