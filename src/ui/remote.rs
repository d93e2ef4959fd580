// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Remote game browser.
//!
//! Lists the recordings and robot logs of a game fetched from the API.
//! Picking a video opens it; picking a log loads its annotations onto the
//! open video.

use crate::models::remote::{LogRecord, VideoRecord};

/// State of the remote panel.
#[derive(Default)]
pub struct RemotePanel {
    pub game_id: String,
    pub videos: Vec<VideoRecord>,
    pub logs: Vec<LogRecord>,
    pub selected_video: Option<i64>,
    pub selected_log: Option<i64>,
    pub busy: bool,
}

impl RemotePanel {
    pub fn parsed_game_id(&self) -> Option<i64> {
        self.game_id.trim().parse().ok()
    }

    /// Replace the listings after a fetch.
    pub fn set_listings(&mut self, videos: Vec<VideoRecord>, logs: Vec<LogRecord>) {
        self.videos = videos;
        self.logs = logs;
        self.selected_video = None;
        self.selected_log = None;
        self.busy = false;
    }
}

/// Result of remote panel interaction.
pub enum RemoteAction {
    None,
    FetchGame(i64),
    OpenVideo(VideoRecord),
    LoadLogAnnotations(i64),
}

/// Display the remote panel.
pub fn show(ui: &mut egui::Ui, panel: &mut RemotePanel, can_load_annotations: bool) -> RemoteAction {
    let mut action = RemoteAction::None;

    ui.heading("Remote");
    ui.separator();

    ui.horizontal(|ui| {
        ui.label("Game:");
        let edit = ui.add(egui::TextEdit::singleline(&mut panel.game_id).desired_width(80.0));
        let submitted = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        let game = panel.parsed_game_id();
        if (ui
            .add_enabled(game.is_some() && !panel.busy, egui::Button::new("Fetch"))
            .clicked()
            || submitted)
            && !panel.busy
        {
            if let Some(game) = game {
                panel.busy = true;
                action = RemoteAction::FetchGame(game);
            }
        }
        if panel.busy {
            ui.spinner();
        }
    });

    ui.add_space(8.0);
    ui.label(egui::RichText::new("Videos").strong());
    if panel.videos.is_empty() {
        ui.label(egui::RichText::new("No videos").weak());
    }
    for video in &panel.videos {
        let title = format!(
            "{} {}",
            video.camera.as_deref().unwrap_or("video"),
            video.file_name().unwrap_or("?")
        );
        if ui
            .selectable_label(panel.selected_video == Some(video.id), title)
            .clicked()
        {
            panel.selected_video = Some(video.id);
            action = RemoteAction::OpenVideo(video.clone());
        }
    }

    ui.add_space(8.0);
    ui.label(egui::RichText::new("Logs").strong());
    if panel.logs.is_empty() {
        ui.label(egui::RichText::new("No logs").weak());
    }
    ui.add_enabled_ui(can_load_annotations, |ui| {
        for log in &panel.logs {
            if ui
                .selectable_label(panel.selected_log == Some(log.id), log.title())
                .on_hover_text("Load this log's annotations onto the open video")
                .clicked()
            {
                panel.selected_log = Some(log.id);
                action = RemoteAction::LoadLogAnnotations(log.id);
            }
        }
    });

    action
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_id_parsing() {
        let mut panel = RemotePanel::default();
        assert_eq!(panel.parsed_game_id(), None);
        panel.game_id = " 42 ".to_string();
        assert_eq!(panel.parsed_game_id(), Some(42));
    }

    #[test]
    fn test_new_listings_reset_selection() {
        let mut panel = RemotePanel {
            selected_log: Some(3),
            busy: true,
            ..RemotePanel::default()
        };
        panel.set_listings(Vec::new(), Vec::new());
        assert_eq!(panel.selected_log, None);
        assert!(!panel.busy);
    }
}
