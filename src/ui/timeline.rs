// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Video timeline scrubber control.
//!
//! This module provides the timeline scrubber for navigating through the
//! video, with a tick for every frame that carries annotations.

use crate::playback::clock::FrameClock;
use crate::playback::store::StoreSnapshot;
use crate::playback::timeline::TimelineNavigator;

/// Result of timeline interaction. Positions are fractions of the track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimelineAction {
    None,
    /// Single click: seek once.
    Jump(f64),
    ScrubStart(f64),
    ScrubMove(f64),
    ScrubEnd,
}

/// Format seconds as `m:ss.mmm`.
pub fn format_time(seconds: f64) -> String {
    let millis = (seconds.max(0.0) * 1000.0).round() as u64;
    format!("{}:{:02}.{:03}", millis / 60_000, (millis / 1000) % 60, millis % 1000)
}

/// Track positions of annotated frames, one per distinct pixel column.
pub fn marker_positions(
    annotations: &StoreSnapshot,
    clock: &FrameClock,
    duration_seconds: f64,
    track_width: f32,
) -> Vec<f32> {
    if duration_seconds <= 0.0 || track_width <= 0.0 {
        return Vec::new();
    }
    let mut columns: Vec<f32> = annotations
        .annotated_frames()
        .map(|frame| {
            let fraction = (frame as f64 / clock.frame_rate() / duration_seconds).clamp(0.0, 1.0);
            (fraction as f32 * track_width).round()
        })
        .collect();
    columns.dedup();
    columns
}

/// Display the scrubber and report pointer interaction.
pub fn show(
    ui: &mut egui::Ui,
    time_seconds: f64,
    duration_seconds: f64,
    annotations: &StoreSnapshot,
    clock: &FrameClock,
    frame: u64,
) -> TimelineAction {
    let mut action = TimelineAction::None;
    let enabled = duration_seconds > 0.0;

    ui.horizontal(|ui| {
        ui.label(
            egui::RichText::new(format!(
                "{} / {}",
                format_time(time_seconds),
                format_time(duration_seconds)
            ))
            .monospace(),
        );
        ui.separator();
        ui.label(egui::RichText::new(format!("frame {}", frame)).monospace());
    });

    let width = ui.available_width();
    let sense = if enabled {
        egui::Sense::click_and_drag()
    } else {
        egui::Sense::hover()
    };
    let (rect, response) = ui.allocate_exact_size(egui::vec2(width, 24.0), sense);
    let painter = ui.painter_at(rect);

    // Track
    let track = egui::Rect::from_center_size(rect.center(), egui::vec2(rect.width(), 6.0));
    painter.rect_filled(track, egui::Rounding::same(3.0), egui::Color32::from_gray(70));

    // Annotated frames
    for x in marker_positions(annotations, clock, duration_seconds, rect.width()) {
        let x = rect.left() + x;
        painter.line_segment(
            [egui::pos2(x, rect.top() + 3.0), egui::pos2(x, rect.bottom() - 3.0)],
            egui::Stroke::new(1.0, egui::Color32::from_rgb(255, 200, 0)),
        );
    }

    // Playhead
    if enabled {
        let fraction = TimelineNavigator::time_to_position(time_seconds, duration_seconds) as f32;
        let x = rect.left() + fraction * rect.width();
        painter.circle_filled(egui::pos2(x, rect.center().y), 7.0, egui::Color32::WHITE);
    }

    let fraction_at = |pos: egui::Pos2| ((pos.x - rect.left()) / rect.width()).clamp(0.0, 1.0) as f64;
    if let Some(pos) = response.interact_pointer_pos() {
        if response.clicked() {
            action = TimelineAction::Jump(fraction_at(pos));
        } else if response.drag_started() {
            action = TimelineAction::ScrubStart(fraction_at(pos));
        } else if response.dragged() {
            action = TimelineAction::ScrubMove(fraction_at(pos));
        }
    }
    if action == TimelineAction::None && response.drag_stopped() {
        action = TimelineAction::ScrubEnd;
    }

    action
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::{AnnotationShape, FrameMap};
    use crate::playback::store::AnnotationStore;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "0:00.000");
        assert_eq!(format_time(1.5), "0:01.500");
        assert_eq!(format_time(75.25), "1:15.250");
        assert_eq!(format_time(-3.0), "0:00.000");
    }

    #[test]
    fn test_markers_collapse_to_columns() {
        let clock = FrameClock::new(30.0).unwrap();
        let store = AnnotationStore::new();
        let shape = || vec![AnnotationShape::rect("a", 0.0, 0.0, 1.0, 1.0)];
        store.load(FrameMap::from([(0, shape()), (1, shape()), (150, shape()), (300, shape())]));

        let markers = marker_positions(&store.snapshot(), &clock, 10.0, 100.0);
        assert_eq!(markers, vec![0.0, 50.0, 100.0]);
    }

    #[test]
    fn test_no_markers_without_duration() {
        let clock = FrameClock::new(30.0).unwrap();
        let store = AnnotationStore::new();
        assert!(marker_positions(&store.snapshot(), &clock, 0.0, 100.0).is_empty());
    }
}
