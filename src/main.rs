// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! VAT Viewer - frame-synchronized annotation viewer
//!
//! A cross-platform desktop application for reviewing robot logs and game
//! videos with their per-frame annotations drawn on top.

mod app;
mod config;
mod error;
mod io;
mod models;
mod playback;
mod render;
mod ui;
mod util;

use anyhow::Result;
use app::ViewerApp;
use config::{FileBridge, MemoryBridge, PlatformBridge};

fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let bridge: Box<dyn PlatformBridge> = match FileBridge::user_default() {
        Ok(bridge) => {
            if let Some(path) = bridge.config_path() {
                log::info!("Settings file: {}", path.display());
            }
            Box::new(bridge)
        }
        Err(e) => {
            log::warn!("Settings will not be saved: {}", e);
            Box::new(MemoryBridge::new())
        }
    };
    let app = ViewerApp::new(bridge)?;

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("VAT Viewer"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native("VAT Viewer", options, Box::new(move |_cc| Ok(Box::new(app))))
        .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
