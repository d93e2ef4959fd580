// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Media file loading (images, frame sequences and videos).
//!
//! This module implements the playback backends behind [`MediaSource`]:
//! a directory of still frames (or a single image) decoded with `image`,
//! and, with the `video-opencv` feature, video files and URLs decoded with
//! OpenCV. [`LocalMediaSource`] picks the backend from the URI.

use crate::models::playback::RequestToken;
use crate::playback::source::{MediaEvent, MediaEventKind, MediaSource, VideoFrame};
use crate::render::capture::CaptureArtifact;
use anyhow::{Context, Result};
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::time::Instant;

/// Extensions decoded as still frames.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif"];

/// Extensions handed to the video backend.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "mkv", "avi"];

/// Decoded image ready for display.
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    /// RGBA8 pixels, row-major.
    pub pixels: Vec<u8>,
}

impl LoadedImage {
    pub fn into_rgba(self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.pixels)
    }
}

/// Load an image file and convert it to RGBA8.
pub fn load_image(path: &Path) -> Result<LoadedImage> {
    let img = image::open(path)
        .with_context(|| format!("Failed to open image {}", path.display()))?
        .to_rgba8();
    let (width, height) = img.dimensions();
    Ok(LoadedImage {
        width,
        height,
        pixels: img.into_raw(),
    })
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

pub fn is_image_path(path: &Path) -> bool {
    has_extension(path, IMAGE_EXTENSIONS)
}

pub fn is_video_path(path: &Path) -> bool {
    has_extension(path, VIDEO_EXTENSIONS)
}

/// Image files in `dir`, sorted by file name.
pub fn list_frames(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut frames = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && is_image_path(&path) {
            frames.push(path);
        }
    }
    frames.sort();
    Ok(frames)
}

/// Turn a `file://` URI or plain path into a filesystem path.
pub fn local_path(uri: &str) -> PathBuf {
    PathBuf::from(uri.strip_prefix("file://").unwrap_or(uri))
}

/// Write a capture as `capture-<millis>.png` inside `dir`.
pub fn save_capture(artifact: &CaptureArtifact, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(format!(
        "capture-{}.png",
        artifact.created_at.timestamp_millis()
    ));
    std::fs::write(&path, &artifact.pixel_data)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Saved capture to {}", path.display());
    Ok(path)
}

/// Wall-clock playhead shared by the backends.
#[derive(Debug, Default)]
struct Transport {
    position: f64,
    duration: f64,
    playing_since: Option<(Instant, f64)>,
}

impl Transport {
    fn is_playing(&self) -> bool {
        self.playing_since.is_some()
    }

    fn position(&self, now: Instant) -> f64 {
        match self.playing_since {
            Some((start, from)) => {
                (from + now.saturating_duration_since(start).as_secs_f64()).min(self.duration)
            }
            None => self.position,
        }
    }

    fn play(&mut self, now: Instant) {
        if self.position >= self.duration {
            self.position = 0.0;
        }
        self.playing_since = Some((now, self.position));
    }

    fn pause(&mut self, now: Instant) {
        self.position = self.position(now);
        self.playing_since = None;
    }

    fn seek(&mut self, time_seconds: f64, now: Instant) -> f64 {
        self.position = time_seconds.clamp(0.0, self.duration);
        if self.playing_since.is_some() {
            self.playing_since = Some((now, self.position));
        }
        self.position
    }

    /// Advance the playhead. Returns the new time and whether the end was reached.
    fn tick(&mut self, now: Instant) -> (f64, bool) {
        let position = self.position(now);
        if self.playing_since.is_some() && position >= self.duration {
            self.position = self.duration;
            self.playing_since = None;
            return (self.duration, true);
        }
        self.position = position;
        (position, false)
    }
}

/// Result of opening a frame sequence in the background.
struct OpenedSequence {
    frames: Vec<PathBuf>,
    first: RgbaImage,
}

fn open_sequence(path: &Path) -> Result<OpenedSequence> {
    let frames = if path.is_dir() {
        list_frames(path)?
    } else if is_image_path(path) && path.is_file() {
        vec![path.to_path_buf()]
    } else {
        anyhow::bail!("{} is not an image or a directory of images", path.display());
    };

    let first_path = frames
        .first()
        .with_context(|| format!("No image frames in {}", path.display()))?;
    let first = load_image(first_path)?
        .into_rgba()
        .context("Decoded image has inconsistent dimensions")?;
    Ok(OpenedSequence { frames, first })
}

/// Plays a directory of still images (or one image) as video.
pub struct FrameSequenceSource {
    frame_rate: f64,
    token: Option<RequestToken>,
    loader: Option<(RequestToken, Receiver<Result<OpenedSequence, String>>)>,
    frames: Vec<PathBuf>,
    transport: Transport,
    shown: Option<usize>,
    current: Option<VideoFrame>,
    revision: u64,
    events: Vec<MediaEvent>,
}

impl FrameSequenceSource {
    pub fn new(frame_rate: f64) -> Self {
        Self {
            frame_rate,
            token: None,
            loader: None,
            frames: Vec::new(),
            transport: Transport::default(),
            shown: None,
            current: None,
            revision: 0,
            events: Vec::new(),
        }
    }

    fn emit(&mut self, token: RequestToken, kind: MediaEventKind) {
        self.events.push(MediaEvent::new(token, kind));
    }

    fn frame_for(&self, time_seconds: f64) -> usize {
        let index = (time_seconds * self.frame_rate).floor().max(0.0) as usize;
        index.min(self.frames.len().saturating_sub(1))
    }

    fn show(&mut self, index: usize, image: RgbaImage) {
        self.revision += 1;
        self.shown = Some(index);
        self.current = Some(VideoFrame {
            revision: self.revision,
            image,
        });
    }

    fn decode_at(&mut self, time_seconds: f64) {
        if self.frames.is_empty() {
            return;
        }
        let index = self.frame_for(time_seconds);
        if self.shown == Some(index) {
            return;
        }
        match load_image(&self.frames[index]).map(LoadedImage::into_rgba) {
            Ok(Some(image)) => self.show(index, image),
            Ok(None) => log::warn!("Frame {} has inconsistent dimensions", index),
            Err(e) => log::warn!("Failed to decode frame {}: {}", index, e),
        }
    }

    fn poll_loader(&mut self) {
        let Some((token, receiver)) = self.loader.as_ref() else {
            return;
        };
        let token = *token;
        let result = match receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => Err("loader thread exited".to_string()),
        };
        self.loader = None;

        match result {
            Ok(opened) => {
                let (width, height) = opened.first.dimensions();
                let duration_seconds = opened.frames.len() as f64 / self.frame_rate;
                log::info!(
                    "Opened {} frames ({}x{}, {:.3}s)",
                    opened.frames.len(),
                    width,
                    height,
                    duration_seconds
                );
                self.frames = opened.frames;
                self.transport = Transport {
                    duration: duration_seconds,
                    ..Transport::default()
                };
                self.show(0, opened.first);
                self.emit(
                    token,
                    MediaEventKind::MetadataLoaded {
                        width,
                        height,
                        duration_seconds,
                    },
                );
            }
            Err(reason) => self.emit(token, MediaEventKind::LoadFailed(reason)),
        }
    }
}

impl MediaSource for FrameSequenceSource {
    fn open(&mut self, uri: &str, token: RequestToken) {
        self.token = Some(token);
        self.frames.clear();
        self.transport = Transport::default();
        self.shown = None;
        self.current = None;

        let path = local_path(uri);
        let (sender, receiver) = channel();
        self.loader = Some((token, receiver));

        // Spawn background thread for loading
        std::thread::spawn(move || {
            let result = open_sequence(&path).map_err(|e| format!("{:#}", e));
            let _ = sender.send(result);
        });
    }

    fn play(&mut self) {
        let Some(token) = self.token else {
            return;
        };
        if self.frames.is_empty() {
            self.emit(token, MediaEventKind::Paused);
            return;
        }
        self.transport.play(Instant::now());
        self.emit(token, MediaEventKind::Played);
    }

    fn pause(&mut self) {
        let Some(token) = self.token else {
            return;
        };
        self.transport.pause(Instant::now());
        self.emit(token, MediaEventKind::Paused);
    }

    fn seek(&mut self, time_seconds: f64, token: RequestToken) {
        let time = self.transport.seek(time_seconds, Instant::now());
        self.decode_at(time);
        self.emit(token, MediaEventKind::Seeked(time));
    }

    fn poll_events(&mut self) -> Vec<MediaEvent> {
        self.poll_loader();

        if let (Some(token), true) = (self.token, self.transport.is_playing()) {
            let (time, ended) = self.transport.tick(Instant::now());
            self.decode_at(time);
            self.emit(token, MediaEventKind::TimeUpdate(time));
            if ended {
                self.emit(token, MediaEventKind::Ended);
            }
        }

        std::mem::take(&mut self.events)
    }

    fn frame(&self) -> Option<&VideoFrame> {
        self.current.as_ref()
    }
}

#[cfg(feature = "video-opencv")]
pub use self::opencv_source::VideoFileSource;

#[cfg(feature = "video-opencv")]
mod opencv_source {
    use super::*;
    use opencv::{core::Mat, imgproc, prelude::*, videoio};

    /// Video files and HTTP URLs decoded with OpenCV.
    pub struct VideoFileSource {
        capture: Option<videoio::VideoCapture>,
        loader: Option<(RequestToken, Receiver<std::result::Result<OpenedVideo, String>>)>,
        token: Option<RequestToken>,
        frame_rate: f64,
        transport: Transport,
        shown: Option<i64>,
        current: Option<VideoFrame>,
        revision: u64,
        events: Vec<MediaEvent>,
    }

    /// Result of opening a video on the loader thread.
    struct OpenedVideo {
        capture: videoio::VideoCapture,
        width: u32,
        height: u32,
        frame_rate: f64,
        duration_seconds: f64,
        first: Option<RgbaImage>,
    }

    fn open_video(uri: &str) -> Result<OpenedVideo> {
        let mut capture = videoio::VideoCapture::from_file(uri, videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            anyhow::bail!("OpenCV could not open {}", uri);
        }
        let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as u32;
        let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as u32;
        let fps = capture.get(videoio::CAP_PROP_FPS)?;
        let count = capture.get(videoio::CAP_PROP_FRAME_COUNT)?;
        let frame_rate = if fps > 0.0 { fps } else { 30.0 };
        let first = read_rgba(&mut capture)?;
        Ok(OpenedVideo {
            capture,
            width,
            height,
            frame_rate,
            duration_seconds: count.max(0.0) / frame_rate,
            first,
        })
    }

    /// Read the next frame and convert it to RGBA8.
    fn read_rgba(capture: &mut videoio::VideoCapture) -> Result<Option<RgbaImage>> {
        let mut bgr = Mat::default();
        if !capture.read(&mut bgr)? || bgr.empty() {
            return Ok(None);
        }
        let mut rgba = Mat::default();
        imgproc::cvt_color(&bgr, &mut rgba, imgproc::COLOR_BGR2RGBA, 0)?;
        let size = rgba.size()?;
        let pixels = rgba.data_bytes()?.to_vec();
        Ok(RgbaImage::from_raw(size.width as u32, size.height as u32, pixels))
    }

    impl Default for VideoFileSource {
        fn default() -> Self {
            Self::new()
        }
    }

    impl VideoFileSource {
        pub fn new() -> Self {
            Self {
                capture: None,
                loader: None,
                token: None,
                frame_rate: 30.0,
                transport: Transport::default(),
                shown: None,
                current: None,
                revision: 0,
                events: Vec::new(),
            }
        }

        fn emit(&mut self, token: RequestToken, kind: MediaEventKind) {
            self.events.push(MediaEvent::new(token, kind));
        }

        fn show(&mut self, index: i64, image: RgbaImage) {
            self.revision += 1;
            self.shown = Some(index);
            self.current = Some(VideoFrame {
                revision: self.revision,
                image,
            });
        }

        fn poll_loader(&mut self) {
            let Some((token, receiver)) = self.loader.as_ref() else {
                return;
            };
            let token = *token;
            let result = match receiver.try_recv() {
                Ok(result) => result,
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => Err("loader thread exited".to_string()),
            };
            self.loader = None;

            match result {
                Ok(opened) => {
                    log::info!(
                        "Opened video ({}x{} @ {:.2} fps)",
                        opened.width,
                        opened.height,
                        opened.frame_rate
                    );
                    self.capture = Some(opened.capture);
                    self.frame_rate = opened.frame_rate;
                    self.transport = Transport {
                        duration: opened.duration_seconds,
                        ..Transport::default()
                    };
                    if let Some(first) = opened.first {
                        self.show(0, first);
                    }
                    self.emit(
                        token,
                        MediaEventKind::MetadataLoaded {
                            width: opened.width,
                            height: opened.height,
                            duration_seconds: opened.duration_seconds,
                        },
                    );
                }
                Err(reason) => self.emit(token, MediaEventKind::LoadFailed(reason)),
            }
        }

        fn decode_at(&mut self, time_seconds: f64) {
            let index = (time_seconds * self.frame_rate).floor() as i64;
            if self.shown == Some(index) {
                return;
            }
            match self.read_frame(index) {
                Ok(Some(image)) => self.show(index, image),
                Ok(None) => {}
                Err(e) => log::warn!("Failed to decode frame {}: {}", index, e),
            }
        }

        fn read_frame(&mut self, index: i64) -> Result<Option<RgbaImage>> {
            let Some(capture) = self.capture.as_mut() else {
                return Ok(None);
            };
            // Sequential reads avoid a costly seek during playback.
            if self.shown.map(|s| s + 1) != Some(index) {
                capture.set(videoio::CAP_PROP_POS_FRAMES, index as f64)?;
            }
            read_rgba(capture)
        }
    }

    impl MediaSource for VideoFileSource {
        fn open(&mut self, uri: &str, token: RequestToken) {
            self.token = Some(token);
            self.capture = None;
            self.transport = Transport::default();
            self.shown = None;
            self.current = None;

            let uri = uri.to_string();
            let (sender, receiver) = channel();
            self.loader = Some((token, receiver));

            std::thread::spawn(move || {
                let result = open_video(&uri).map_err(|e| format!("{:#}", e));
                let _ = sender.send(result);
            });
        }

        fn play(&mut self) {
            let Some(token) = self.token else {
                return;
            };
            self.transport.play(Instant::now());
            self.emit(token, MediaEventKind::Played);
        }

        fn pause(&mut self) {
            let Some(token) = self.token else {
                return;
            };
            self.transport.pause(Instant::now());
            self.emit(token, MediaEventKind::Paused);
        }

        fn seek(&mut self, time_seconds: f64, token: RequestToken) {
            let time = self.transport.seek(time_seconds, Instant::now());
            self.decode_at(time);
            self.emit(token, MediaEventKind::Seeked(time));
        }

        fn poll_events(&mut self) -> Vec<MediaEvent> {
            self.poll_loader();

            if let (Some(token), true) = (self.token, self.transport.is_playing()) {
                let (time, ended) = self.transport.tick(Instant::now());
                self.decode_at(time);
                self.emit(token, MediaEventKind::TimeUpdate(time));
                if ended {
                    self.emit(token, MediaEventKind::Ended);
                }
            }
            std::mem::take(&mut self.events)
        }

        fn frame(&self) -> Option<&VideoFrame> {
            self.current.as_ref()
        }
    }
}

/// Routes each URI to the backend able to play it.
pub struct LocalMediaSource {
    frame_rate: f64,
    active: Option<Box<dyn MediaSource>>,
    events: Vec<MediaEvent>,
}

impl LocalMediaSource {
    pub fn new(frame_rate: f64) -> Self {
        Self {
            frame_rate,
            active: None,
            events: Vec::new(),
        }
    }

    fn backend_for(&self, uri: &str) -> std::result::Result<Box<dyn MediaSource>, String> {
        let path = local_path(uri);
        if path.is_dir() || is_image_path(&path) {
            return Ok(Box::new(FrameSequenceSource::new(self.frame_rate)));
        }

        let is_url = uri.starts_with("http://") || uri.starts_with("https://");
        if is_url || is_video_path(&path) {
            return video_backend(uri);
        }

        Err(format!("unsupported media: {}", uri))
    }
}

#[cfg(feature = "video-opencv")]
fn video_backend(_uri: &str) -> std::result::Result<Box<dyn MediaSource>, String> {
    Ok(Box::new(VideoFileSource::new()))
}

#[cfg(not(feature = "video-opencv"))]
fn video_backend(uri: &str) -> std::result::Result<Box<dyn MediaSource>, String> {
    Err(format!(
        "{} needs video decoding; rebuild with the video-opencv feature",
        uri
    ))
}

impl MediaSource for LocalMediaSource {
    fn open(&mut self, uri: &str, token: RequestToken) {
        match self.backend_for(uri) {
            Ok(mut backend) => {
                backend.open(uri, token);
                self.active = Some(backend);
            }
            Err(reason) => {
                log::warn!("{}", reason);
                self.active = None;
                self.events
                    .push(MediaEvent::new(token, MediaEventKind::LoadFailed(reason)));
            }
        }
    }

    fn play(&mut self) {
        if let Some(backend) = self.active.as_mut() {
            backend.play();
        }
    }

    fn pause(&mut self) {
        if let Some(backend) = self.active.as_mut() {
            backend.pause();
        }
    }

    fn seek(&mut self, time_seconds: f64, token: RequestToken) {
        match self.active.as_mut() {
            Some(backend) => backend.seek(time_seconds, token),
            None => self.events.push(MediaEvent::new(
                token,
                MediaEventKind::Seeked(time_seconds.max(0.0)),
            )),
        }
    }

    fn poll_events(&mut self) -> Vec<MediaEvent> {
        let mut events = std::mem::take(&mut self.events);
        if let Some(backend) = self.active.as_mut() {
            events.extend(backend.poll_events());
        }
        events
    }

    fn frame(&self) -> Option<&VideoFrame> {
        self.active.as_ref().and_then(|b| b.frame())
    }
}
