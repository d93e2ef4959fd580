// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Translation of timeline gestures into seek targets.
//!
//! Scrub positions arrive as fractions of the timeline width. While a drag
//! is in progress, seeks are throttled to one per debounce interval; the
//! latest position is kept and flushed when the interval elapses or the
//! gesture ends, so the final position is never lost.

use super::clock::FrameClock;
use super::store::StoreSnapshot;
use crate::models::annotation::FrameIndex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct Gesture {
    last_emit: Instant,
    last_emitted: f64,
    pending: Option<f64>,
}

/// Converts scrub gestures and jump controls into seek times.
#[derive(Debug, Clone)]
pub struct TimelineNavigator {
    debounce: Duration,
    gesture: Option<Gesture>,
}

impl TimelineNavigator {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            gesture: None,
        }
    }

    pub fn is_scrubbing(&self) -> bool {
        self.gesture.is_some()
    }

    /// Convert a timeline position (0 = start, 1 = end) into seconds.
    pub fn position_to_time(fraction: f64, duration_seconds: f64) -> f64 {
        if !fraction.is_finite() || duration_seconds <= 0.0 {
            return 0.0;
        }
        fraction.clamp(0.0, 1.0) * duration_seconds
    }

    /// Convert seconds into a timeline position.
    pub fn time_to_position(time_seconds: f64, duration_seconds: f64) -> f64 {
        if duration_seconds <= 0.0 {
            return 0.0;
        }
        (time_seconds / duration_seconds).clamp(0.0, 1.0)
    }

    /// Pointer went down on the timeline. Always seeks immediately.
    pub fn begin_scrub(&mut self, fraction: f64, duration_seconds: f64, now: Instant) -> f64 {
        let time = Self::position_to_time(fraction, duration_seconds);
        self.gesture = Some(Gesture {
            last_emit: now,
            last_emitted: time,
            pending: None,
        });
        time
    }

    /// Pointer moved while held. Returns a seek target when one is due.
    pub fn update_scrub(
        &mut self,
        fraction: f64,
        duration_seconds: f64,
        now: Instant,
    ) -> Option<f64> {
        let time = Self::position_to_time(fraction, duration_seconds);
        let Some(gesture) = self.gesture.as_mut() else {
            return Some(self.begin_scrub(fraction, duration_seconds, now));
        };

        if now.saturating_duration_since(gesture.last_emit) >= self.debounce {
            gesture.pending = None;
            if time == gesture.last_emitted {
                return None;
            }
            gesture.last_emit = now;
            gesture.last_emitted = time;
            Some(time)
        } else {
            gesture.pending = Some(time);
            None
        }
    }

    /// Flush a held-back position once the debounce interval has passed.
    pub fn poll(&mut self, now: Instant) -> Option<f64> {
        let gesture = self.gesture.as_mut()?;
        let pending = gesture.pending?;
        if now.saturating_duration_since(gesture.last_emit) < self.debounce {
            return None;
        }
        gesture.pending = None;
        gesture.last_emit = now;
        gesture.last_emitted = pending;
        Some(pending)
    }

    /// Pointer released. Returns the final position if it was never sent.
    pub fn end_scrub(&mut self) -> Option<f64> {
        let gesture = self.gesture.take()?;
        gesture
            .pending
            .filter(|time| *time != gesture.last_emitted)
    }

    /// Seek target `delta` frames away from `current`, landing mid-frame.
    pub fn step_frames(
        clock: &FrameClock,
        current: FrameIndex,
        delta: i64,
        duration_seconds: f64,
    ) -> f64 {
        let target = if delta < 0 {
            current.saturating_sub(delta.unsigned_abs())
        } else {
            current.saturating_add(delta as u64)
        };
        let last = clock.frame_count(duration_seconds).saturating_sub(1);
        clock.frame_midpoint(target.min(last))
    }

    /// Seek target `delta` seconds away from `current`.
    pub fn jump_seconds(current_seconds: f64, delta: f64, duration_seconds: f64) -> f64 {
        (current_seconds + delta).clamp(0.0, duration_seconds.max(0.0))
    }

    /// Seek target for the next annotated frame after `current`, if any.
    pub fn next_annotated(
        clock: &FrameClock,
        annotations: &StoreSnapshot,
        current: FrameIndex,
    ) -> Option<f64> {
        annotations
            .next_annotated_after(current)
            .map(|frame| clock.frame_midpoint(frame))
    }

    /// Seek target for the last annotated frame before `current`, if any.
    pub fn previous_annotated(
        clock: &FrameClock,
        annotations: &StoreSnapshot,
        current: FrameIndex,
    ) -> Option<f64> {
        annotations
            .previous_annotated_before(current)
            .map(|frame| clock.frame_midpoint(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::{AnnotationShape, FrameMap};
    use crate::playback::store::AnnotationStore;

    const DEBOUNCE: Duration = Duration::from_millis(50);

    #[test]
    fn test_position_to_time() {
        assert_eq!(TimelineNavigator::position_to_time(0.5, 10.0), 5.0);
        assert_eq!(TimelineNavigator::position_to_time(1.4, 10.0), 10.0);
        assert_eq!(TimelineNavigator::position_to_time(-0.2, 10.0), 0.0);
        assert_eq!(TimelineNavigator::position_to_time(0.5, 0.0), 0.0);
        assert_eq!(TimelineNavigator::time_to_position(2.5, 10.0), 0.25);
    }

    #[test]
    fn test_rapid_moves_are_throttled() {
        let mut nav = TimelineNavigator::new(DEBOUNCE);
        let t0 = Instant::now();

        assert_eq!(nav.begin_scrub(0.125, 8.0, t0), 1.0);
        assert_eq!(nav.update_scrub(0.25, 8.0, t0 + Duration::from_millis(10)), None);
        assert_eq!(nav.update_scrub(0.375, 8.0, t0 + Duration::from_millis(20)), None);
        assert_eq!(nav.update_scrub(0.5, 8.0, t0 + Duration::from_millis(60)), Some(4.0));
        assert!(nav.is_scrubbing());
    }

    #[test]
    fn test_poll_flushes_trailing_position() {
        let mut nav = TimelineNavigator::new(DEBOUNCE);
        let t0 = Instant::now();

        nav.begin_scrub(0.125, 8.0, t0);
        nav.update_scrub(0.75, 8.0, t0 + Duration::from_millis(5));
        assert_eq!(nav.poll(t0 + Duration::from_millis(30)), None);
        assert_eq!(nav.poll(t0 + Duration::from_millis(55)), Some(6.0));
        assert_eq!(nav.poll(t0 + Duration::from_millis(200)), None);
    }

    #[test]
    fn test_end_scrub_sends_unsent_position() {
        let mut nav = TimelineNavigator::new(DEBOUNCE);
        let t0 = Instant::now();

        nav.begin_scrub(0.125, 8.0, t0);
        nav.update_scrub(0.875, 8.0, t0 + Duration::from_millis(1));
        assert_eq!(nav.end_scrub(), Some(7.0));
        assert!(!nav.is_scrubbing());
        assert_eq!(nav.end_scrub(), None);
    }

    #[test]
    fn test_end_scrub_after_flush_sends_nothing() {
        let mut nav = TimelineNavigator::new(DEBOUNCE);
        let t0 = Instant::now();

        nav.begin_scrub(0.5, 10.0, t0);
        assert_eq!(nav.end_scrub(), None);
    }

    #[test]
    fn test_step_frames_clamps() {
        let clock = FrameClock::new(30.0).unwrap();
        let forward = TimelineNavigator::step_frames(&clock, 30, 1, 10.0);
        assert_eq!(clock.frame_index(forward), 31);

        let back = TimelineNavigator::step_frames(&clock, 0, -5, 10.0);
        assert_eq!(clock.frame_index(back), 0);

        let past_end = TimelineNavigator::step_frames(&clock, 299, 10, 10.0);
        assert_eq!(clock.frame_index(past_end), 299);
    }

    #[test]
    fn test_jump_seconds_clamps() {
        assert_eq!(TimelineNavigator::jump_seconds(9.5, 1.0, 10.0), 10.0);
        assert_eq!(TimelineNavigator::jump_seconds(0.5, -1.0, 10.0), 0.0);
        assert_eq!(TimelineNavigator::jump_seconds(4.0, 1.0, 10.0), 5.0);
    }

    #[test]
    fn test_annotated_frame_jumps() {
        let clock = FrameClock::new(30.0).unwrap();
        let store = AnnotationStore::new();
        store.load(FrameMap::from([
            (45, vec![AnnotationShape::rect("a", 0.0, 0.0, 1.0, 1.0)]),
            (90, vec![AnnotationShape::rect("b", 0.0, 0.0, 1.0, 1.0)]),
        ]));
        let snapshot = store.snapshot();

        let next = TimelineNavigator::next_annotated(&clock, &snapshot, 50).unwrap();
        assert_eq!(clock.frame_index(next), 90);
        let previous = TimelineNavigator::previous_annotated(&clock, &snapshot, 50).unwrap();
        assert_eq!(clock.frame_index(previous), 45);
        assert!(TimelineNavigator::next_annotated(&clock, &snapshot, 90).is_none());
    }
}
