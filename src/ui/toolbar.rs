// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Transport toolbar.
//!
//! This module provides the playback controls, frame navigation buttons
//! and the sketch and capture tools.

use crate::models::playback::{PlayerState, TransportRequest};

/// Result of toolbar interaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToolbarAction {
    None,
    TogglePlayback,
    StepFrames(i64),
    JumpSeconds(f64),
    PreviousAnnotated,
    NextAnnotated,
    ToggleSketch,
    ClearSketch,
    Capture,
}

/// Label for the play/pause button.
pub fn transport_label(state: PlayerState, pending: Option<TransportRequest>) -> &'static str {
    match (pending, state) {
        (Some(TransportRequest::Play), _) => "⏳ Starting",
        (Some(TransportRequest::Pause), _) => "⏳ Pausing",
        (None, PlayerState::Playing) => "⏸ Pause",
        _ => "▶ Play",
    }
}

/// Display the toolbar.
pub fn show(
    ui: &mut egui::Ui,
    state: PlayerState,
    pending: Option<TransportRequest>,
    sketch_enabled: bool,
    has_sketch: bool,
) -> ToolbarAction {
    let mut action = ToolbarAction::None;
    let ready = matches!(
        state,
        PlayerState::Ready | PlayerState::Playing | PlayerState::Paused
    );

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;
        ui.add_enabled_ui(ready, |ui| {
            if ui.button("⏮").on_hover_text("Previous annotated frame (Ctrl+←)").clicked() {
                action = ToolbarAction::PreviousAnnotated;
            }
            if ui.button("-1s").on_hover_text("Back one second (Shift+←)").clicked() {
                action = ToolbarAction::JumpSeconds(-1.0);
            }
            if ui.button("◀").on_hover_text("Previous frame (←)").clicked() {
                action = ToolbarAction::StepFrames(-1);
            }
            if ui
                .button(transport_label(state, pending))
                .on_hover_text("Play / pause (Space)")
                .clicked()
            {
                action = ToolbarAction::TogglePlayback;
            }
            if ui.button("▶").on_hover_text("Next frame (→)").clicked() {
                action = ToolbarAction::StepFrames(1);
            }
            if ui.button("+1s").on_hover_text("Forward one second (Shift+→)").clicked() {
                action = ToolbarAction::JumpSeconds(1.0);
            }
            if ui.button("⏭").on_hover_text("Next annotated frame (Ctrl+→)").clicked() {
                action = ToolbarAction::NextAnnotated;
            }

            ui.separator();

            if ui.selectable_label(sketch_enabled, "✏ Sketch").clicked() {
                action = ToolbarAction::ToggleSketch;
            }
            if ui
                .add_enabled(has_sketch, egui::Button::new("Clear sketch"))
                .clicked()
            {
                action = ToolbarAction::ClearSketch;
            }

            ui.separator();

            if ui.button("📷 Capture").on_hover_text("Save the frame with its overlay").clicked() {
                action = ToolbarAction::Capture;
            }
        });

        ui.separator();
        ui.label(egui::RichText::new(format!("{:?}", state)).italics().weak());
    });

    action
}
