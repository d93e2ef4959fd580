// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Settings window.
//!
//! Edits a draft of the user-facing settings and writes it back through the
//! platform bridge when saved.

use crate::config::{
    PlatformBridge, ViewerConfig, KEY_API_TOKEN, KEY_CAPTURE_DIR, KEY_DEV_TOKEN, KEY_LOG_ROOT,
    KEY_USE_DEV,
};

/// Editable copy of the settings shown in the window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsDraft {
    pub api_token: String,
    pub dev_token: String,
    pub use_dev: bool,
    pub log_root: String,
    pub capture_dir: String,
}

impl SettingsDraft {
    pub fn from_config(config: &ViewerConfig) -> Self {
        Self {
            api_token: config.api_token.clone().unwrap_or_default(),
            dev_token: config.dev_token.clone().unwrap_or_default(),
            use_dev: config.use_dev,
            log_root: config
                .log_root
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            capture_dir: config.capture_dir.display().to_string(),
        }
    }

    /// Write every field to `bridge`.
    pub fn apply(&self, bridge: &dyn PlatformBridge) -> anyhow::Result<()> {
        bridge.set_value(KEY_API_TOKEN, self.api_token.trim())?;
        bridge.set_value(KEY_DEV_TOKEN, self.dev_token.trim())?;
        bridge.set_value(KEY_USE_DEV, if self.use_dev { "true" } else { "false" })?;
        bridge.set_value(KEY_LOG_ROOT, self.log_root.trim())?;
        bridge.set_value(KEY_CAPTURE_DIR, self.capture_dir.trim())?;
        Ok(())
    }
}

/// Display the settings window. Returns true when the user pressed Save.
pub fn show(ctx: &egui::Context, open: &mut bool, draft: &mut SettingsDraft) -> bool {
    let mut saved = false;
    let mut close = false;

    egui::Window::new("Settings")
        .open(open)
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            egui::Grid::new("settings_grid")
                .num_columns(2)
                .spacing([12.0, 6.0])
                .show(ui, |ui| {
                    ui.label("API token:");
                    ui.add(egui::TextEdit::singleline(&mut draft.api_token).password(true));
                    ui.end_row();

                    ui.label("Dev token:");
                    ui.add(egui::TextEdit::singleline(&mut draft.dev_token).password(true));
                    ui.end_row();

                    ui.label("Server:");
                    ui.checkbox(&mut draft.use_dev, "Use local development API");
                    ui.end_row();

                    ui.label("Log root:");
                    ui.horizontal(|ui| {
                        ui.text_edit_singleline(&mut draft.log_root);
                        if ui.button("…").clicked() {
                            if let Some(dir) = rfd::FileDialog::new().pick_folder() {
                                draft.log_root = dir.display().to_string();
                            }
                        }
                    });
                    ui.end_row();

                    ui.label("Captures:");
                    ui.horizontal(|ui| {
                        ui.text_edit_singleline(&mut draft.capture_dir);
                        if ui.button("…").clicked() {
                            if let Some(dir) = rfd::FileDialog::new().pick_folder() {
                                draft.capture_dir = dir.display().to_string();
                            }
                        }
                    });
                    ui.end_row();
                });

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("Save").clicked() {
                    saved = true;
                    close = true;
                }
                if ui.button("Cancel").clicked() {
                    close = true;
                }
            });
        });

    if close {
        *open = false;
    }
    saved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryBridge;
    use std::path::PathBuf;

    #[test]
    fn test_apply_round_trips_through_bridge() {
        let bridge = MemoryBridge::new();
        let draft = SettingsDraft {
            api_token: " abc ".to_string(),
            dev_token: String::new(),
            use_dev: true,
            log_root: "/data/logs".to_string(),
            capture_dir: "/tmp/captures".to_string(),
        };
        draft.apply(&bridge).unwrap();

        let config = ViewerConfig::resolve(&bridge).unwrap();
        assert!(config.use_dev);
        assert_eq!(config.api_token.as_deref(), Some("abc"));
        assert_eq!(config.dev_token, None);
        assert_eq!(config.log_root, Some(PathBuf::from("/data/logs")));
        assert_eq!(config.capture_dir, PathBuf::from("/tmp/captures"));
        assert_eq!(SettingsDraft::from_config(&config).api_token, "abc");
    }
}
