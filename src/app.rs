// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! This module contains the main application structure that implements
//! the egui::App trait. It owns the playback controller and wires the
//! background loaders, the local video server and the UI panels to it.

use crate::config::{PlatformBridge, ViewerConfig};
use crate::error::ViewerError;
use crate::io::api::ApiClient;
use crate::io::media::{self, LocalMediaSource, IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};
use crate::io::serialization;
use crate::io::server::{self, ServerHandle};
use crate::models::annotation::{Color, FrameIndex, FrameMap};
use crate::models::playback::{PlayerState, RequestToken};
use crate::models::project::AnnotationDocument;
use crate::models::remote::{LogRecord, VideoRecord};
use crate::models::sketch::Sketch;
use crate::playback::controller::PlaybackController;
use crate::playback::store::StoreSnapshot;
use crate::playback::timeline::TimelineNavigator;
use crate::render::capture::FrameCapture;
use crate::render::overlay::OverlayRenderer;
use crate::ui::remote::{RemoteAction, RemotePanel};
use crate::ui::settings::SettingsDraft;
use crate::ui::timeline::TimelineAction;
use crate::ui::toolbar::ToolbarAction;
use crate::ui::{canvas, properties, remote, settings, timeline, toolbar};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::time::Instant;

const SKETCH_COLOR: Color = Color::RED;
const SKETCH_WIDTH: f32 = 3.0;

/// Result of a background annotation load.
type AnnotationJob = (RequestToken, Receiver<Result<FrameMap, ViewerError>>);

/// Result of a background game listing fetch.
type ListingJob = Receiver<Result<(Vec<VideoRecord>, Vec<LogRecord>), String>>;

/// Build a document holding every annotated frame of `snapshot`.
pub fn document_from_snapshot(
    media_file: Option<&str>,
    frame_rate: f64,
    snapshot: &StoreSnapshot,
) -> AnnotationDocument {
    let mut document = AnnotationDocument {
        media_file: media_file.map(str::to_string),
        frame_rate: Some(frame_rate),
        ..AnnotationDocument::default()
    };
    for frame in snapshot.annotated_frames() {
        document.frames.insert(frame, snapshot.lookup(frame).to_vec());
    }
    document
}

/// Map the navigation keys pressed this frame to a toolbar action.
pub fn key_action(space: bool, left: bool, right: bool, shift: bool, command: bool) -> ToolbarAction {
    if space {
        return ToolbarAction::TogglePlayback;
    }
    let direction = match (left, right) {
        (true, false) => -1,
        (false, true) => 1,
        _ => return ToolbarAction::None,
    };
    if command {
        if direction < 0 {
            ToolbarAction::PreviousAnnotated
        } else {
            ToolbarAction::NextAnnotated
        }
    } else if shift {
        ToolbarAction::JumpSeconds(direction as f64)
    } else {
        ToolbarAction::StepFrames(direction)
    }
}

/// Main application state.
pub struct ViewerApp {
    /// Settings store injected at startup
    bridge: Box<dyn PlatformBridge>,

    /// Settings resolved from the bridge
    config: ViewerConfig,

    controller: PlaybackController,
    renderer: OverlayRenderer,
    capture: FrameCapture,
    navigator: TimelineNavigator,

    /// Free-hand markup on the current frame
    sketch: Sketch,
    sketch_enabled: bool,
    sketch_frame: FrameIndex,

    /// Texture holding the decoded frame and the revision it was made from
    texture: Option<egui::TextureHandle>,
    texture_revision: Option<u64>,

    /// Receivers for background loads
    annotation_job: Option<AnnotationJob>,
    listing_job: Option<ListingJob>,

    remote: RemotePanel,
    server: Option<ServerHandle>,

    settings_open: bool,
    settings_draft: SettingsDraft,

    last_capture: Option<PathBuf>,

    /// Message shown in the banner until dismissed
    notice: Option<String>,
}

impl ViewerApp {
    /// Create the application from the settings held by `bridge`.
    pub fn new(bridge: Box<dyn PlatformBridge>) -> anyhow::Result<Self> {
        let config = ViewerConfig::resolve(bridge.as_ref())?;
        let media = LocalMediaSource::new(config.frame_rate);
        let controller = PlaybackController::new(Box::new(media), config.frame_rate)?;

        let mut app = Self {
            bridge,
            navigator: TimelineNavigator::new(config.scrub_debounce()),
            settings_draft: SettingsDraft::from_config(&config),
            config,
            controller,
            renderer: OverlayRenderer::new(),
            capture: FrameCapture::new(),
            sketch: Sketch::new(),
            sketch_enabled: false,
            sketch_frame: 0,
            texture: None,
            texture_revision: None,
            annotation_job: None,
            listing_job: None,
            remote: RemotePanel::default(),
            server: None,
            settings_open: false,
            last_capture: None,
            notice: None,
        };
        app.restart_server();
        Ok(app)
    }

    /// (Re)start the video server for the configured log root.
    fn restart_server(&mut self) {
        if let Some(server) = self.server.take() {
            server.stop();
        }
        let Some(root) = self.config.log_root.clone() else {
            return;
        };
        match server::spawn(root.clone(), self.config.server_port) {
            Ok(handle) => {
                log::info!("Serving {} at http://{}", root.display(), handle.addr());
                self.server = Some(handle);
            }
            Err(e) => {
                log::error!("Failed to start video server: {}", e);
                self.notice = Some(format!("Video server unavailable: {}", e));
            }
        }
    }

    /// URI the media should open for a local file.
    ///
    /// Videos directly inside the log root go through the video server.
    fn media_uri(&self, path: &Path) -> String {
        if let Some(server) = &self.server {
            let in_root = self.config.is_under_log_root(path)
                && path.parent() == self.config.log_root.as_deref();
            if in_root && media::is_video_path(path) {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    return server.video_url(name);
                }
            }
        }
        path.display().to_string()
    }

    fn open_source(&mut self, uri: String) {
        self.annotation_job = None;
        self.texture_revision = None;
        self.sketch.clear();
        self.controller.load_source(uri);
    }

    fn open_remote_video(&mut self, video: VideoRecord) {
        let uri = match (video.file_name(), &self.server, &self.config.log_root) {
            (Some(name), Some(server), _) => server.video_url(name),
            (Some(name), None, Some(root)) => root.join(name).display().to_string(),
            _ => match video.url.clone() {
                Some(url) => url,
                None => {
                    self.notice = Some(format!("Video {} has no playable location", video.id));
                    return;
                }
            },
        };
        self.open_source(uri);
    }

    /// Load an annotation document onto the open source (asynchronously).
    fn load_annotation_file(&mut self, path: PathBuf) {
        let token = match self.controller.begin_annotation_fetch() {
            Ok(token) => token,
            Err(e) => {
                log::warn!("{}", e);
                self.notice = Some("Open a video before loading annotations".to_string());
                return;
            }
        };

        let (sender, receiver) = channel();
        self.annotation_job = Some((token, receiver));
        let frame_rate = self.controller.clock().frame_rate();

        std::thread::spawn(move || {
            let result = serialization::import_document(&path)
                .map_err(|e| ViewerError::source_unavailable(path.display().to_string(), e))
                .map(|document| {
                    if let Some(rate) = document.frame_rate.filter(|rate| *rate != frame_rate) {
                        log::warn!(
                            "{} was annotated at {} fps, playing at {} fps",
                            path.display(),
                            rate,
                            frame_rate
                        );
                    }
                    document.frames
                });
            let _ = sender.send(result);
        });
    }

    /// Fetch the annotations of a remote log onto the open source.
    fn load_log_annotations(&mut self, log_id: i64) {
        let Some(api_token) = self.config.active_token().map(str::to_string) else {
            self.notice = Some("Set an API token in Settings first".to_string());
            return;
        };
        let token = match self.controller.begin_annotation_fetch() {
            Ok(token) => token,
            Err(e) => {
                log::warn!("{}", e);
                self.notice = Some("Open a video before loading annotations".to_string());
                return;
            }
        };

        let (sender, receiver) = channel();
        self.annotation_job = Some((token, receiver));
        let base_url = self.config.api_base_url();

        std::thread::spawn(move || {
            let uri = format!("{}/api/annotations/?log={}", base_url, log_id);
            let result = ApiClient::new(base_url, api_token)
                .and_then(|client| client.annotations_for_log(log_id))
                .map_err(|e| e.into_viewer_error(&uri));
            let _ = sender.send(result);
        });
    }

    /// Fetch the videos and logs of a game.
    fn fetch_game(&mut self, game_id: i64) {
        let Some(api_token) = self.config.active_token().map(str::to_string) else {
            self.remote.busy = false;
            self.notice = Some("Set an API token in Settings first".to_string());
            return;
        };

        let (sender, receiver) = channel();
        self.listing_job = Some(receiver);
        let base_url = self.config.api_base_url();

        std::thread::spawn(move || {
            let result = ApiClient::new(base_url, api_token)
                .and_then(|client| Ok((client.videos(game_id)?, client.logs(game_id)?)))
                .map_err(|e| e.to_string());
            let _ = sender.send(result);
        });
    }

    fn export_annotations(&mut self, path: PathBuf) {
        let document = document_from_snapshot(
            self.controller.state().source_uri.as_deref(),
            self.controller.clock().frame_rate(),
            &self.controller.annotations(),
        );
        match serialization::export_document(&document, &path) {
            Ok(()) => log::info!("Exported annotations to {}", path.display()),
            Err(e) => {
                log::error!("Failed to export annotations: {}", e);
                self.notice = Some(format!("Export failed: {}", e));
            }
        }
    }

    fn save_capture(&mut self) {
        let artifact = match self.capture.capture_current(&self.controller, &self.sketch) {
            Ok(artifact) => artifact,
            Err(e) => {
                log::warn!("Capture failed: {}", e);
                self.notice = Some(e.to_string());
                return;
            }
        };
        match media::save_capture(&artifact, &self.config.capture_dir) {
            Ok(path) => self.last_capture = Some(path),
            Err(e) => {
                log::error!("Failed to save capture: {}", e);
                self.notice = Some(format!("Could not save capture: {}", e));
            }
        }
    }

    fn save_settings(&mut self) {
        if let Err(e) = self.settings_draft.apply(self.bridge.as_ref()) {
            log::error!("Failed to save settings: {}", e);
            self.notice = Some(format!("Could not save settings: {}", e));
            return;
        }
        match ViewerConfig::resolve(self.bridge.as_ref()) {
            Ok(config) => {
                let restart = config.log_root != self.config.log_root
                    || config.server_port != self.config.server_port;
                self.config = config;
                if restart {
                    self.restart_server();
                }
                log::info!("Settings saved");
            }
            Err(e) => self.notice = Some(e.to_string()),
        }
    }

    fn seek(&mut self, time_seconds: f64) {
        if self.controller.seek(time_seconds).is_none() {
            log::debug!("Seek ignored, no source loaded");
        }
    }

    fn apply_toolbar_action(&mut self, action: ToolbarAction) {
        let duration = self.controller.state().duration_seconds;
        let frame = self.controller.current_frame();
        match action {
            ToolbarAction::TogglePlayback => self.controller.toggle_playback(),
            ToolbarAction::StepFrames(delta) => {
                let time =
                    TimelineNavigator::step_frames(self.controller.clock(), frame, delta, duration);
                self.seek(time);
            }
            ToolbarAction::JumpSeconds(delta) => {
                let current = self.controller.state().current_time_seconds;
                self.seek(TimelineNavigator::jump_seconds(current, delta, duration));
            }
            ToolbarAction::PreviousAnnotated => {
                let snapshot = self.controller.annotations();
                match TimelineNavigator::previous_annotated(self.controller.clock(), &snapshot, frame)
                {
                    Some(time) => self.seek(time),
                    None => log::info!("No annotated frame before {}", frame),
                }
            }
            ToolbarAction::NextAnnotated => {
                let snapshot = self.controller.annotations();
                match TimelineNavigator::next_annotated(self.controller.clock(), &snapshot, frame) {
                    Some(time) => self.seek(time),
                    None => log::info!("No annotated frame after {}", frame),
                }
            }
            ToolbarAction::ToggleSketch => self.sketch_enabled = !self.sketch_enabled,
            ToolbarAction::ClearSketch => self.sketch.clear(),
            ToolbarAction::Capture => self.save_capture(),
            ToolbarAction::None => {}
        }
    }

    fn apply_timeline_action(&mut self, action: TimelineAction) {
        let duration = self.controller.state().duration_seconds;
        let now = Instant::now();
        match action {
            TimelineAction::Jump(fraction) => {
                self.seek(TimelineNavigator::position_to_time(fraction, duration));
            }
            TimelineAction::ScrubStart(fraction) => {
                let time = self.navigator.begin_scrub(fraction, duration, now);
                self.seek(time);
            }
            TimelineAction::ScrubMove(fraction) => {
                if let Some(time) = self.navigator.update_scrub(fraction, duration, now) {
                    self.seek(time);
                }
            }
            TimelineAction::ScrubEnd => {
                if let Some(time) = self.navigator.end_scrub() {
                    self.seek(time);
                }
            }
            TimelineAction::None => {}
        }
    }

    /// Collect finished background work.
    fn poll_jobs(&mut self) {
        if let Some((token, ref receiver)) = self.annotation_job {
            let result = match receiver.try_recv() {
                Ok(result) => Some(result),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => Some(Err(ViewerError::source_unavailable(
                    "annotations",
                    "loader thread exited",
                ))),
            };
            if let Some(result) = result {
                self.annotation_job = None;
                if let Err(e) = self.controller.on_annotations_loaded(token, result) {
                    log::debug!("Annotation result ignored: {}", e);
                }
            }
        }

        if let Some(ref receiver) = self.listing_job {
            let result = match receiver.try_recv() {
                Ok(result) => Some(result),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => Some(Err("listing thread exited".to_string())),
            };
            if let Some(result) = result {
                self.listing_job = None;
                match result {
                    Ok((videos, logs)) => {
                        log::info!("Game has {} videos and {} logs", videos.len(), logs.len());
                        self.remote.set_listings(videos, logs);
                    }
                    Err(e) => {
                        log::error!("Failed to fetch game: {}", e);
                        self.remote.busy = false;
                        self.notice = Some(e);
                    }
                }
            }
        }
    }

    /// Upload the decoded frame when it changed.
    fn refresh_texture(&mut self, ctx: &egui::Context) {
        let Some(frame) = self.controller.video_frame() else {
            return;
        };
        if self.texture.is_some() && self.texture_revision == Some(frame.revision) {
            return;
        }

        let size = [frame.image.width() as usize, frame.image.height() as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, frame.image.as_raw());
        let revision = frame.revision;
        match self.texture.as_mut() {
            Some(texture) => texture.set(color_image, egui::TextureOptions::LINEAR),
            None => {
                self.texture = Some(ctx.load_texture(
                    "video_frame",
                    color_image,
                    egui::TextureOptions::LINEAR,
                ))
            }
        }
        self.texture_revision = Some(revision);
    }

    fn menu_bar(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open Video...").clicked() {
                    let mut extensions: Vec<&str> = VIDEO_EXTENSIONS.to_vec();
                    extensions.extend_from_slice(IMAGE_EXTENSIONS);
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Media", extensions.as_slice())
                        .pick_file()
                    {
                        let uri = self.media_uri(&path);
                        self.open_source(uri);
                    }
                    ui.close_menu();
                }
                if ui.button("Open Frame Folder...").clicked() {
                    if let Some(dir) = rfd::FileDialog::new().pick_folder() {
                        self.open_source(dir.display().to_string());
                    }
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("Load Annotations...").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Annotations", &["yaml", "yml", "json"])
                        .pick_file()
                    {
                        self.load_annotation_file(path);
                    }
                    ui.close_menu();
                }
                ui.menu_button("Export Annotations", |ui| {
                    if ui.button("Export as YAML...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("YAML", &["yaml", "yml"])
                            .set_file_name("annotations.yaml")
                            .save_file()
                        {
                            self.export_annotations(path);
                        }
                        ui.close_menu();
                    }
                    if ui.button("Export as JSON...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("JSON", &["json"])
                            .set_file_name("annotations.json")
                            .save_file()
                        {
                            self.export_annotations(path);
                        }
                        ui.close_menu();
                    }
                });
                ui.separator();
                if ui.button("Save Capture").clicked() {
                    self.save_capture();
                    ui.close_menu();
                }
                if ui.button("Settings...").clicked() {
                    self.settings_draft = SettingsDraft::from_config(&self.config);
                    self.settings_open = true;
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("Quit").clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });
        });
    }

    fn error_banner(&mut self, ctx: &egui::Context) {
        let message = match (self.controller.error(), &self.notice) {
            (Some(err), _) if err.is_user_visible() => Some(err.to_string()),
            (_, Some(notice)) => Some(notice.clone()),
            _ => None,
        };
        let Some(message) = message else {
            return;
        };

        egui::TopBottomPanel::top("error_banner").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(&message).color(egui::Color32::from_rgb(230, 90, 90)));
                if ui.small_button("Dismiss").clicked() {
                    self.controller.dismiss_error();
                    self.notice = None;
                }
            });
        });
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_jobs();
        self.controller.pump();
        if let Some(time) = self.navigator.poll(Instant::now()) {
            self.seek(time);
        }

        // Sketches belong to the frame they were drawn on
        let frame = self.controller.current_frame();
        if frame != self.sketch_frame {
            self.sketch.clear();
            self.sketch_frame = frame;
        }

        self.refresh_texture(ctx);

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            self.menu_bar(ui, ctx);
        });

        // Toolbar
        let toolbar_action = egui::TopBottomPanel::top("toolbar")
            .show(ctx, |ui| {
                toolbar::show(
                    ui,
                    self.controller.player_state(),
                    self.controller.pending_request(),
                    self.sketch_enabled,
                    !self.sketch.is_empty(),
                )
            })
            .inner;
        self.apply_toolbar_action(toolbar_action);

        self.error_banner(ctx);

        // Timeline (bottom)
        let timeline_action = egui::TopBottomPanel::bottom("timeline")
            .show(ctx, |ui| {
                let state = self.controller.state();
                timeline::show(
                    ui,
                    state.current_time_seconds,
                    state.duration_seconds,
                    &self.controller.annotations(),
                    self.controller.clock(),
                    self.controller.current_frame(),
                )
            })
            .inner;
        self.apply_timeline_action(timeline_action);

        // Remote browser (left side)
        let can_load_annotations = self.controller.player_state() != PlayerState::Idle;
        let remote_action = egui::SidePanel::left("remote")
            .default_width(220.0)
            .show(ctx, |ui| remote::show(ui, &mut self.remote, can_load_annotations))
            .inner;
        match remote_action {
            RemoteAction::FetchGame(game_id) => self.fetch_game(game_id),
            RemoteAction::OpenVideo(video) => self.open_remote_video(video),
            RemoteAction::LoadLogAnnotations(log_id) => self.load_log_annotations(log_id),
            RemoteAction::None => {}
        }

        // Properties panel (right side)
        egui::SidePanel::right("properties")
            .default_width(250.0)
            .show(ctx, |ui| {
                properties::show(ui, &self.controller, self.last_capture.as_deref());
            });

        // Main canvas (center)
        let render_input = self.controller.render_input();
        let canvas_action = egui::CentralPanel::default()
            .show(ctx, |ui| {
                canvas::show(
                    ui,
                    &render_input,
                    self.texture.as_ref(),
                    &mut self.renderer,
                    &self.sketch,
                    self.sketch_enabled,
                )
            })
            .inner;
        match canvas_action {
            canvas::CanvasAction::BeginStroke(point) => {
                self.sketch.begin_stroke(point, SKETCH_COLOR, SKETCH_WIDTH)
            }
            canvas::CanvasAction::ExtendStroke(point) => self.sketch.extend_stroke(point),
            canvas::CanvasAction::None => {}
        }

        if self.settings_open
            && settings::show(ctx, &mut self.settings_open, &mut self.settings_draft)
        {
            self.save_settings();
        }

        // Handle keyboard navigation
        // Only process if no text field is focused
        if !ctx.wants_keyboard_input() {
            let action = ctx.input(|i| {
                key_action(
                    i.key_pressed(egui::Key::Space),
                    i.key_pressed(egui::Key::ArrowLeft),
                    i.key_pressed(egui::Key::ArrowRight),
                    i.modifiers.shift,
                    i.modifiers.command,
                )
            });
            self.apply_toolbar_action(action);
        }

        // Keep repainting while something is moving
        let busy = self.controller.player_state() == PlayerState::Loading
            || self.annotation_job.is_some()
            || self.listing_job.is_some();
        if self.controller.state().is_playing || self.navigator.is_scrubbing() || busy {
            ctx.request_repaint();
        }
    }
}
