// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Playback state machine.
//!
//! The controller is the single owner of [`PlaybackState`] and of the
//! annotation store. It forwards user commands to the media backend as
//! requests and only changes state when the backend reports back, so the
//! UI always reflects what the media is actually doing.
//!
//! ```text
//! Idle --load_source--> Loading --metadata (+annotations)--> Ready
//! Ready/Paused --play--> (awaiting) --Played--> Playing
//! Playing --pause--> (awaiting) --Paused--> Paused
//! Playing --Ended--> Paused at end
//! any --load_source--> Loading
//! ```
//!
//! Every `load_source`, `seek` and annotation fetch issues a fresh
//! [`RequestToken`]. Events and annotation results tagged with a
//! superseded token are discarded.

use super::clock::FrameClock;
use super::source::{MediaEvent, MediaEventKind, MediaSource, VideoFrame};
use super::store::{AnnotationStore, StoreSnapshot};
use crate::error::{Result, ViewerError};
use crate::models::annotation::{FrameIndex, FrameMap, ShapeList};
use crate::models::playback::{PlaybackState, PlayerState, RequestToken, TransportRequest};

/// Why no frame can be drawn right now.
#[derive(Debug, Clone, PartialEq)]
pub enum Placeholder {
    NoSource,
    Loading,
    Failed(ViewerError),
}

/// Everything the overlay renderer needs for the current turn.
#[derive(Debug, Clone)]
pub enum RenderInput {
    Placeholder(Placeholder),
    Frame {
        frame: FrameIndex,
        shapes: ShapeList,
        source_width: u32,
        source_height: u32,
    },
}

/// Owns playback state and keeps annotations in step with media time.
pub struct PlaybackController {
    media: Box<dyn MediaSource>,
    clock: FrameClock,
    store: AnnotationStore,
    state: PlaybackState,
    player: PlayerState,
    requested: Option<TransportRequest>,
    next_token: u64,
    load_token: Option<RequestToken>,
    pending_seek: Option<RequestToken>,
    pending_annotations: Option<RequestToken>,
    annotations_failed: bool,
    metadata_loaded: bool,
    started: bool,
    current_frame: FrameIndex,
    current_shapes: ShapeList,
    error: Option<ViewerError>,
}

impl PlaybackController {
    /// Create an idle controller driving `media` at `frame_rate` frames per second.
    pub fn new(media: Box<dyn MediaSource>, frame_rate: f64) -> Result<Self> {
        let clock = FrameClock::new(frame_rate)?;
        let store = AnnotationStore::new();
        let current_shapes = store.lookup(0);
        Ok(Self {
            media,
            clock,
            store,
            state: PlaybackState::default(),
            player: PlayerState::Idle,
            requested: None,
            next_token: 0,
            load_token: None,
            pending_seek: None,
            pending_annotations: None,
            annotations_failed: false,
            metadata_loaded: false,
            started: false,
            current_frame: 0,
            current_shapes,
            error: None,
        })
    }

    fn issue_token(&mut self) -> RequestToken {
        self.next_token += 1;
        RequestToken::new(self.next_token)
    }

    /// Assign a new media source.
    ///
    /// Time and play state are reset before the media is asked to open
    /// `uri`, and the annotation store is emptied; the new mapping arrives
    /// through [`Self::begin_annotation_fetch`] / [`Self::on_annotations_loaded`].
    pub fn load_source(&mut self, uri: impl Into<String>) -> RequestToken {
        let uri = uri.into();
        let token = self.issue_token();
        log::info!("Loading source {} ({})", uri, token);

        self.state = PlaybackState::for_source(uri.clone());
        self.requested = None;
        self.load_token = Some(token);
        self.pending_seek = None;
        self.pending_annotations = None;
        self.annotations_failed = false;
        self.metadata_loaded = false;
        self.started = false;
        self.error = None;
        self.store.clear();
        self.refresh_frame();
        self.update_phase();

        self.media.open(&uri, token);
        token
    }

    /// Mark an annotation fetch for the current source as in flight.
    ///
    /// The returned token must be handed back to [`Self::on_annotations_loaded`].
    pub fn begin_annotation_fetch(&mut self) -> Result<RequestToken> {
        if self.load_token.is_none() {
            return Err(ViewerError::InvalidArgument(
                "annotations requested before any source".to_string(),
            ));
        }
        let token = self.issue_token();
        log::debug!("Fetching annotations ({})", token);
        self.pending_annotations = Some(token);
        self.annotations_failed = false;
        self.update_phase();
        Ok(token)
    }

    /// Deliver the result of an annotation fetch.
    pub fn on_annotations_loaded(
        &mut self,
        token: RequestToken,
        result: Result<FrameMap>,
    ) -> Result<()> {
        if self.pending_annotations != Some(token) {
            return Err(self.stale(token));
        }
        self.pending_annotations = None;

        match result {
            Ok(mapping) => {
                self.store.load(mapping);
                self.annotations_failed = false;
            }
            Err(err) => {
                log::error!("Failed to load annotations: {}", err);
                self.annotations_failed = true;
                self.error = Some(err);
            }
        }

        self.refresh_frame();
        self.update_phase();
        Ok(())
    }

    /// Move the playhead to `time_seconds`, clamped to the media duration.
    ///
    /// The new time is visible immediately; the media confirms with a
    /// `Seeked` event. Returns `None` when no source is loaded.
    pub fn seek(&mut self, time_seconds: f64) -> Option<RequestToken> {
        self.load_token?;
        let target = self.state.clamp_time(time_seconds);
        let token = self.issue_token();
        log::debug!("Seek to {:.3}s ({})", target, token);

        self.pending_seek = Some(token);
        self.state.current_time_seconds = target;
        self.refresh_frame();
        self.media.seek(target, token);
        Some(token)
    }

    /// Ask the media to start playing.
    pub fn play(&mut self) {
        match self.player {
            PlayerState::Ready | PlayerState::Paused => {
                self.requested = Some(TransportRequest::Play);
                self.media.play();
            }
            PlayerState::Playing => {}
            other => log::warn!("Ignoring play request while {:?}", other),
        }
    }

    /// Ask the media to pause.
    pub fn pause(&mut self) {
        if self.state.is_playing {
            self.requested = Some(TransportRequest::Pause);
            self.media.pause();
        }
    }

    pub fn toggle_playback(&mut self) {
        if self.state.is_playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Apply new media metadata. Safe to call repeatedly; always overwrites.
    pub fn on_metadata_loaded(&mut self, width: u32, height: u32, duration_seconds: f64) {
        let duration = if duration_seconds.is_finite() && duration_seconds > 0.0 {
            duration_seconds
        } else {
            0.0
        };
        log::info!("Media metadata: {}x{}, {:.3}s", width, height, duration);

        self.state.media_width = width;
        self.state.media_height = height;
        self.state.duration_seconds = duration;
        self.metadata_loaded = true;
        self.state.current_time_seconds = self.state.clamp_time(self.state.current_time_seconds);
        self.refresh_frame();
        self.update_phase();
    }

    /// Per-frame tick: adopt the media time and look up its annotations.
    pub fn on_time_update(&mut self, time_seconds: f64) {
        self.state.current_time_seconds = self.state.clamp_time(time_seconds);
        self.refresh_frame();
    }

    /// Apply one media event.
    ///
    /// Returns `Err(ViewerError::StaleResponse)` when the event belongs to a
    /// superseded load or seek; such events change nothing.
    pub fn handle_event(&mut self, event: MediaEvent) -> Result<()> {
        let MediaEvent { token, kind } = event;

        if let MediaEventKind::Seeked(time) = kind {
            if self.pending_seek != Some(token) {
                return Err(self.stale(token));
            }
            self.pending_seek = None;
            self.on_time_update(time);
            return Ok(());
        }

        if self.load_token != Some(token) {
            return Err(self.stale(token));
        }

        match kind {
            MediaEventKind::MetadataLoaded {
                width,
                height,
                duration_seconds,
            } => self.on_metadata_loaded(width, height, duration_seconds),
            MediaEventKind::LoadFailed(reason) => {
                let uri = self.state.source_uri.clone().unwrap_or_default();
                let err = ViewerError::source_unavailable(uri, reason);
                log::error!("{}", err);
                self.error = Some(err);
            }
            MediaEventKind::Played => {
                self.state.is_playing = true;
                self.started = true;
                self.requested = None;
            }
            MediaEventKind::Paused => {
                self.state.is_playing = false;
                self.requested = None;
            }
            MediaEventKind::Ended => {
                self.state.is_playing = false;
                self.started = true;
                self.requested = None;
                if self.pending_seek.is_none() {
                    self.on_time_update(self.state.duration_seconds);
                }
            }
            MediaEventKind::TimeUpdate(time) => {
                if self.pending_seek.is_some() {
                    return Err(self.stale(token));
                }
                self.on_time_update(time);
            }
            MediaEventKind::Seeked(_) => {}
        }

        self.update_phase();
        Ok(())
    }

    /// Drain and apply all pending media events. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        for event in self.media.poll_events() {
            match self.handle_event(event) {
                Ok(()) => applied += 1,
                Err(err) => log::debug!("Discarded media event: {}", err),
            }
        }
        applied
    }

    /// What to draw this turn.
    pub fn render_input(&self) -> RenderInput {
        match self.player {
            PlayerState::Idle => RenderInput::Placeholder(Placeholder::NoSource),
            PlayerState::Loading => match &self.error {
                Some(err) => RenderInput::Placeholder(Placeholder::Failed(err.clone())),
                None => RenderInput::Placeholder(Placeholder::Loading),
            },
            _ => RenderInput::Frame {
                frame: self.current_frame,
                shapes: self.current_shapes.clone(),
                source_width: self.state.media_width,
                source_height: self.state.media_height,
            },
        }
    }

    fn refresh_frame(&mut self) {
        self.current_frame = self.clock.frame_index(self.state.current_time_seconds);
        self.current_shapes = self.store.lookup(self.current_frame);
    }

    fn update_phase(&mut self) {
        self.player = if self.load_token.is_none() {
            PlayerState::Idle
        } else if !self.metadata_loaded
            || self.pending_annotations.is_some()
            || self.annotations_failed
        {
            PlayerState::Loading
        } else if self.state.is_playing {
            PlayerState::Playing
        } else if self.started {
            PlayerState::Paused
        } else {
            PlayerState::Ready
        };
    }

    fn stale(&self, token: RequestToken) -> ViewerError {
        log::debug!("Dropping stale response {}", token);
        ViewerError::StaleResponse(token)
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn player_state(&self) -> PlayerState {
        self.player
    }

    /// Transport request sent to the media and not yet confirmed.
    pub fn pending_request(&self) -> Option<TransportRequest> {
        self.requested
    }

    pub fn current_frame(&self) -> FrameIndex {
        self.current_frame
    }

    pub fn current_shapes(&self) -> &ShapeList {
        &self.current_shapes
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn annotations(&self) -> StoreSnapshot {
        self.store.snapshot()
    }

    pub fn is_annotation_fetch_pending(&self) -> bool {
        self.pending_annotations.is_some()
    }

    /// Decoded pixels of the current frame, once metadata has arrived.
    pub fn video_frame(&self) -> Option<&VideoFrame> {
        if self.metadata_loaded {
            self.media.frame()
        } else {
            None
        }
    }

    /// The user-visible error, if any.
    pub fn error(&self) -> Option<&ViewerError> {
        self.error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::AnnotationShape;
    use crate::playback::clock::frame_index_for;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum Command {
        Open(String, RequestToken),
        Play,
        Pause,
        Seek(f64, RequestToken),
    }

    #[derive(Default, Clone)]
    struct ScriptedMedia {
        commands: Rc<RefCell<Vec<Command>>>,
        queued: Rc<RefCell<Vec<MediaEvent>>>,
    }

    impl MediaSource for ScriptedMedia {
        fn open(&mut self, uri: &str, token: RequestToken) {
            self.commands.borrow_mut().push(Command::Open(uri.to_string(), token));
        }

        fn play(&mut self) {
            self.commands.borrow_mut().push(Command::Play);
        }

        fn pause(&mut self) {
            self.commands.borrow_mut().push(Command::Pause);
        }

        fn seek(&mut self, time_seconds: f64, token: RequestToken) {
            self.commands.borrow_mut().push(Command::Seek(time_seconds, token));
        }

        fn poll_events(&mut self) -> Vec<MediaEvent> {
            self.queued.borrow_mut().drain(..).collect()
        }

        fn frame(&self) -> Option<&VideoFrame> {
            None
        }
    }

    fn controller() -> (PlaybackController, ScriptedMedia) {
        let media = ScriptedMedia::default();
        let controller = PlaybackController::new(Box::new(media.clone()), 30.0).unwrap();
        (controller, media)
    }

    fn metadata(token: RequestToken) -> MediaEvent {
        MediaEvent::new(
            token,
            MediaEventKind::MetadataLoaded {
                width: 640,
                height: 480,
                duration_seconds: 10.0,
            },
        )
    }

    /// Controller with `a.mp4` loaded, metadata applied and no annotations.
    fn ready_controller() -> (PlaybackController, ScriptedMedia, RequestToken) {
        let (mut controller, media) = controller();
        let token = controller.load_source("a.mp4");
        controller.handle_event(metadata(token)).unwrap();
        (controller, media, token)
    }

    #[test]
    fn test_rejects_invalid_frame_rate() {
        let result = PlaybackController::new(Box::new(ScriptedMedia::default()), 0.0);
        assert!(matches!(result, Err(ViewerError::InvalidArgument(_))));
    }

    #[test]
    fn test_load_source_resets_and_opens() {
        let (mut controller, media, first) = ready_controller();
        controller.on_time_update(4.0);

        let second = controller.load_source("b.mp4");

        assert!(second > first);
        assert_eq!(controller.player_state(), PlayerState::Loading);
        assert_eq!(controller.state().current_time_seconds, 0.0);
        assert_eq!(controller.state().duration_seconds, 0.0);
        assert!(!controller.state().is_playing);
        assert_eq!(controller.state().source_uri.as_deref(), Some("b.mp4"));
        assert!(matches!(
            controller.render_input(),
            RenderInput::Placeholder(Placeholder::Loading)
        ));
        assert_eq!(
            media.commands.borrow().last(),
            Some(&Command::Open("b.mp4".to_string(), second))
        );
    }

    #[test]
    fn test_metadata_moves_to_ready_and_overwrites() {
        let (mut controller, _media, _token) = ready_controller();
        assert_eq!(controller.player_state(), PlayerState::Ready);
        assert_eq!(controller.state().media_width, 640);

        controller.on_metadata_loaded(1920, 1080, 3.0);
        assert_eq!(controller.state().media_width, 1920);
        assert_eq!(controller.state().media_height, 1080);
        assert_eq!(controller.state().duration_seconds, 3.0);
    }

    #[test]
    fn test_time_update_looks_up_shapes() {
        let (mut controller, _media, _token) = ready_controller();
        let fetch = controller.begin_annotation_fetch().unwrap();
        let mapping = FrameMap::from([(30, vec![AnnotationShape::rect("box1", 50.0, 60.0, 150.0, 100.0)])]);
        controller.on_annotations_loaded(fetch, Ok(mapping)).unwrap();

        controller.on_time_update(1.0);

        assert_eq!(controller.current_frame(), 30);
        match controller.render_input() {
            RenderInput::Frame { frame, shapes, .. } => {
                assert_eq!(frame, 30);
                assert_eq!(shapes.len(), 1);
                assert_eq!(shapes[0].id, "box1");
            }
            other => panic!("expected a frame, got {other:?}"),
        }

        controller.on_time_update(1.04);
        assert_eq!(controller.current_frame(), 31);
        assert!(controller.current_shapes().is_empty());
    }

    #[test]
    fn test_frame_always_matches_time_after_update() {
        let (mut controller, _media, _token) = ready_controller();
        for step in 0..400 {
            let t = step as f64 * 0.0271;
            controller.on_time_update(t);
            let time = controller.state().current_time_seconds;
            assert_eq!(controller.current_frame(), frame_index_for(time, 30.0).unwrap());
        }
    }

    #[test]
    fn test_seek_clamps_and_updates_immediately() {
        let (mut controller, media, _token) = ready_controller();

        let token = controller.seek(25.0).unwrap();
        assert_eq!(controller.state().current_time_seconds, 10.0);
        assert_eq!(controller.current_frame(), 300);
        assert_eq!(
            media.commands.borrow().last(),
            Some(&Command::Seek(10.0, token))
        );

        controller.seek(-2.0);
        assert_eq!(controller.state().current_time_seconds, 0.0);
    }

    #[test]
    fn test_seek_reconciles_within_one_frame() {
        let (mut controller, _media, _token) = ready_controller();
        let target = 2.0;
        let token = controller.seek(target).unwrap();

        // Media lands on the start of the containing frame.
        let landed = (target * 30.0).floor() / 30.0 - 0.001;
        controller
            .handle_event(MediaEvent::new(token, MediaEventKind::Seeked(landed)))
            .unwrap();

        let time = controller.state().current_time_seconds;
        assert!((time - target).abs() <= controller.clock().frame_duration());
        assert_eq!(controller.current_frame(), frame_index_for(time, 30.0).unwrap());
    }

    #[test]
    fn test_time_updates_during_pending_seek_are_stale() {
        let (mut controller, _media, load) = ready_controller();
        let seek = controller.seek(6.0).unwrap();

        let result = controller.handle_event(MediaEvent::new(load, MediaEventKind::TimeUpdate(1.2)));
        assert!(matches!(result, Err(ViewerError::StaleResponse(_))));
        assert_eq!(controller.state().current_time_seconds, 6.0);

        controller
            .handle_event(MediaEvent::new(seek, MediaEventKind::Seeked(6.0)))
            .unwrap();
        controller
            .handle_event(MediaEvent::new(load, MediaEventKind::TimeUpdate(6.1)))
            .unwrap();
        assert_eq!(controller.state().current_time_seconds, 6.1);
    }

    #[test]
    fn test_superseded_seek_is_stale() {
        let (mut controller, _media, _load) = ready_controller();
        let first = controller.seek(3.0).unwrap();
        let second = controller.seek(4.0).unwrap();

        let result = controller.handle_event(MediaEvent::new(first, MediaEventKind::Seeked(3.0)));
        assert_eq!(result, Err(ViewerError::StaleResponse(first)));
        assert_eq!(controller.state().current_time_seconds, 4.0);

        controller
            .handle_event(MediaEvent::new(second, MediaEventKind::Seeked(4.0)))
            .unwrap();
        assert_eq!(controller.state().current_time_seconds, 4.0);
    }

    #[test]
    fn test_seek_then_new_source_discards_old_seek() {
        let (mut controller, _media, first_load) = ready_controller();
        let seek = controller.seek(5.0).unwrap();
        let second_load = controller.load_source("b.mp4");

        let seeked = controller.handle_event(MediaEvent::new(seek, MediaEventKind::Seeked(5.0)));
        let late_tick =
            controller.handle_event(MediaEvent::new(first_load, MediaEventKind::TimeUpdate(5.0)));

        assert_eq!(seeked, Err(ViewerError::StaleResponse(seek)));
        assert_eq!(late_tick, Err(ViewerError::StaleResponse(first_load)));
        assert_eq!(controller.state().source_uri.as_deref(), Some("b.mp4"));
        assert_eq!(controller.state().current_time_seconds, 0.0);
        assert_eq!(controller.current_frame(), 0);

        controller.handle_event(metadata(second_load)).unwrap();
        assert_eq!(controller.player_state(), PlayerState::Ready);
        assert_eq!(controller.state().current_time_seconds, 0.0);
    }

    #[test]
    fn test_play_waits_for_media_confirmation() {
        let (mut controller, media, load) = ready_controller();

        controller.play();
        assert_eq!(media.commands.borrow().last(), Some(&Command::Play));
        assert!(!controller.state().is_playing);
        assert_eq!(controller.player_state(), PlayerState::Ready);
        assert_eq!(controller.pending_request(), Some(TransportRequest::Play));

        controller
            .handle_event(MediaEvent::new(load, MediaEventKind::Played))
            .unwrap();
        assert!(controller.state().is_playing);
        assert_eq!(controller.player_state(), PlayerState::Playing);
        assert_eq!(controller.pending_request(), None);

        controller.pause();
        assert_eq!(controller.player_state(), PlayerState::Playing);
        controller
            .handle_event(MediaEvent::new(load, MediaEventKind::Paused))
            .unwrap();
        assert_eq!(controller.player_state(), PlayerState::Paused);
    }

    #[test]
    fn test_play_ignored_while_loading() {
        let (mut controller, media) = controller();
        controller.load_source("a.mp4");
        controller.play();
        assert!(!media.commands.borrow().contains(&Command::Play));
    }

    #[test]
    fn test_ended_pauses_at_end() {
        let (mut controller, _media, load) = ready_controller();
        controller.play();
        controller
            .handle_event(MediaEvent::new(load, MediaEventKind::Played))
            .unwrap();
        controller
            .handle_event(MediaEvent::new(load, MediaEventKind::Ended))
            .unwrap();

        assert_eq!(controller.player_state(), PlayerState::Paused);
        assert!(!controller.state().is_playing);
        assert_eq!(controller.state().current_time_seconds, 10.0);
    }

    #[test]
    fn test_load_failure_stays_loading_with_error() {
        let (mut controller, _media) = controller();
        let token = controller.load_source("missing.mp4");
        controller
            .handle_event(MediaEvent::new(token, MediaEventKind::LoadFailed("not found".into())))
            .unwrap();

        assert_eq!(controller.player_state(), PlayerState::Loading);
        assert!(matches!(
            controller.error(),
            Some(ViewerError::SourceUnavailable { uri, .. }) if uri == "missing.mp4"
        ));
        assert!(matches!(
            controller.render_input(),
            RenderInput::Placeholder(Placeholder::Failed(_))
        ));
    }

    #[test]
    fn test_pending_annotations_keep_loading() {
        let (mut controller, _media) = controller();
        let load = controller.load_source("a.mp4");
        let fetch = controller.begin_annotation_fetch().unwrap();
        controller.handle_event(metadata(load)).unwrap();
        assert_eq!(controller.player_state(), PlayerState::Loading);

        controller.on_annotations_loaded(fetch, Ok(FrameMap::new())).unwrap();
        assert_eq!(controller.player_state(), PlayerState::Ready);
    }

    #[test]
    fn test_stale_annotation_result_is_discarded() {
        let (mut controller, _media) = controller();
        controller.load_source("a.mp4");
        let old_fetch = controller.begin_annotation_fetch().unwrap();
        let new_load = controller.load_source("b.mp4");
        controller.handle_event(metadata(new_load)).unwrap();

        let mapping = FrameMap::from([(0, vec![AnnotationShape::rect("old", 0.0, 0.0, 1.0, 1.0)])]);
        let result = controller.on_annotations_loaded(old_fetch, Ok(mapping));

        assert_eq!(result, Err(ViewerError::StaleResponse(old_fetch)));
        assert!(controller.current_shapes().is_empty());
        assert!(controller.annotations().is_empty());
    }

    #[test]
    fn test_refetch_on_same_source_ignores_late_older_result() {
        let (mut controller, _media, load) = ready_controller();
        let first = controller.begin_annotation_fetch().unwrap();
        let second = controller.begin_annotation_fetch().unwrap();
        assert_ne!(first, second);
        assert_ne!(first, load);

        let old = FrameMap::from([(0, vec![AnnotationShape::rect("old_log", 0.0, 0.0, 1.0, 1.0)])]);
        let new = FrameMap::from([(0, vec![AnnotationShape::rect("new_log", 0.0, 0.0, 1.0, 1.0)])]);

        assert_eq!(
            controller.on_annotations_loaded(first, Ok(old)),
            Err(ViewerError::StaleResponse(first))
        );
        assert_eq!(controller.player_state(), PlayerState::Loading);

        controller.on_annotations_loaded(second, Ok(new)).unwrap();
        assert_eq!(controller.player_state(), PlayerState::Ready);
        assert_eq!(controller.current_shapes()[0].id, "new_log");
    }

    #[test]
    fn test_annotation_failure_is_visible() {
        let (mut controller, _media, _load) = ready_controller();
        let fetch = controller.begin_annotation_fetch().unwrap();
        controller
            .on_annotations_loaded(
                fetch,
                Err(ViewerError::source_unavailable("api", "connection refused")),
            )
            .unwrap();

        assert_eq!(controller.player_state(), PlayerState::Loading);
        assert!(controller.error().is_some());
    }

    #[test]
    fn test_annotation_fetch_requires_source() {
        let (mut controller, _media) = controller();
        assert!(controller.begin_annotation_fetch().is_err());
        assert!(controller.seek(1.0).is_none());
    }

    #[test]
    fn test_pump_applies_fresh_and_drops_stale() {
        let (mut controller, media) = controller();
        let old = controller.load_source("a.mp4");
        let new = controller.load_source("b.mp4");
        media.queued.borrow_mut().extend([
            metadata(old),
            metadata(new),
            MediaEvent::new(new, MediaEventKind::TimeUpdate(1.0)),
        ]);

        assert_eq!(controller.pump(), 2);
        assert_eq!(controller.current_frame(), 30);
    }
}
