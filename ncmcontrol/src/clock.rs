//! Self-timed playback clock.
//!
//! The downstream device cannot report a reliable position nor a clean
//! end-of-track event, so the position is counted locally, one tick period
//! per tick, and the end of the track is guessed from the remaining time.
//! This is a best-effort approximation; all of the heuristic lives here.

use crate::model::{DeviceReport, DeviceTransport, PlaybackState};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, info};

/// Bounds of the configurable timing offset, in seconds.
pub const MAX_TIMING_OFFSET: f64 = 5.0;

/// Ticks during which an "off" device is ignored unless it was seen playing.
const OFF_GRACE_TICKS: u32 = 2;

/// What the orchestrator must do after a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClockDecision {
    None,
    AdvanceNow,
    AdvanceAfter(Duration),
}

#[derive(Debug, Clone)]
pub struct PlaybackClock {
    state: PlaybackState,
    position_secs: f64,
    track_duration_secs: f64,
    device_duration_secs: f64,
    offset_secs: f64,
    tick_period: Duration,
    advance_scheduled: bool,
    ticks_since_start: u32,
    device_seen_playing: bool,
    position_updated_at: DateTime<Utc>,
}

impl PlaybackClock {
    /// `offset_secs` > 0 delays the switch past the natural end, < 0 switches
    /// early. It is clamped to ±[`MAX_TIMING_OFFSET`].
    pub fn new(tick_period: Duration, offset_secs: f64) -> Self {
        Self {
            state: PlaybackState::Idle,
            position_secs: 0.0,
            track_duration_secs: 0.0,
            device_duration_secs: 0.0,
            offset_secs: clamp_offset(offset_secs),
            tick_period,
            advance_scheduled: false,
            ticks_since_start: 0,
            device_seen_playing: false,
            position_updated_at: Utc::now(),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn position_secs(&self) -> f64 {
        self.position_secs
    }

    pub fn position_updated_at(&self) -> DateTime<Utc> {
        self.position_updated_at
    }

    /// Declared track duration, or the one reported by the device.
    pub fn duration_secs(&self) -> f64 {
        if self.track_duration_secs > 0.0 {
            self.track_duration_secs
        } else {
            self.device_duration_secs
        }
    }

    pub fn offset_secs(&self) -> f64 {
        self.offset_secs
    }

    pub fn set_offset(&mut self, offset_secs: f64) {
        self.offset_secs = clamp_offset(offset_secs);
    }

    pub fn tick_period(&self) -> Duration {
        self.tick_period
    }

    pub fn advance_scheduled(&self) -> bool {
        self.advance_scheduled
    }

    /// Resets the clock for a new track. The clock stays paused until
    /// [`Self::play`] confirms that the play intent went out.
    pub fn begin_track(&mut self, duration_secs: f64) {
        self.state = PlaybackState::Paused;
        self.position_secs = 0.0;
        self.track_duration_secs = duration_secs.max(0.0);
        self.device_duration_secs = 0.0;
        self.advance_scheduled = false;
        self.ticks_since_start = 0;
        self.device_seen_playing = false;
        self.touch();
    }

    pub fn play(&mut self) {
        self.state = PlaybackState::Playing;
        self.touch();
    }

    /// Returns `false` when the clock was not playing. A decided advance is
    /// released and decided again by the first tick after resuming.
    pub fn pause(&mut self) -> bool {
        if self.state != PlaybackState::Playing {
            return false;
        }
        self.state = PlaybackState::Paused;
        self.advance_scheduled = false;
        self.touch();
        true
    }

    /// Returns `false` when the clock was not paused.
    pub fn resume(&mut self) -> bool {
        if self.state != PlaybackState::Paused {
            return false;
        }
        self.state = PlaybackState::Playing;
        self.touch();
        true
    }

    pub fn stop(&mut self) {
        self.state = PlaybackState::Idle;
        self.position_secs = 0.0;
        self.advance_scheduled = false;
        self.touch();
    }

    /// Moves the local position. The caller cancels any pending advance and
    /// issues the transport seek.
    pub fn seek(&mut self, position_secs: f64) {
        let duration = self.duration_secs();
        let mut position = position_secs.max(0.0);
        if duration > 0.0 {
            position = position.min(duration);
        }
        self.position_secs = position;
        self.advance_scheduled = false;
        self.touch();
    }

    /// Counts one tick and decides whether the track should be advanced.
    ///
    /// At most one advance is decided per track: once a decision other than
    /// [`ClockDecision::None`] has been returned, later ticks return `None`
    /// until the next [`Self::begin_track`] or [`Self::seek`].
    pub fn tick(&mut self, device: Option<&DeviceReport>) -> ClockDecision {
        if self.state != PlaybackState::Playing {
            return ClockDecision::None;
        }

        self.position_secs += self.tick_period.as_secs_f64();
        self.ticks_since_start = self.ticks_since_start.saturating_add(1);
        self.touch();

        if let Some(report) = device {
            if let Some(duration) = report.duration_secs.filter(|d| *d > 0.0) {
                self.device_duration_secs = duration;
            }
            match report.transport {
                DeviceTransport::Playing => self.device_seen_playing = true,
                DeviceTransport::Off
                    if !self.advance_scheduled
                        && (self.device_seen_playing
                            || self.ticks_since_start > OFF_GRACE_TICKS) =>
                {
                    info!(
                        position = self.position_secs,
                        "Output device turned off while playing, advancing"
                    );
                    self.advance_scheduled = true;
                    return ClockDecision::AdvanceNow;
                }
                _ => {}
            }
        }

        if self.advance_scheduled {
            return ClockDecision::None;
        }

        let duration = self.duration_secs();
        let delta = duration - self.position_secs;
        let threshold = (1.0 - self.offset_secs).max(1.0);

        if delta <= threshold && duration > 1.0 {
            self.advance_scheduled = true;
            let wait = delta + self.offset_secs;
            debug!(
                position = self.position_secs,
                duration, delta, wait, "End of track reached"
            );
            if wait <= 0.0 {
                return ClockDecision::AdvanceNow;
            }
            return ClockDecision::AdvanceAfter(Duration::from_secs_f64(wait));
        }

        ClockDecision::None
    }

    fn touch(&mut self) {
        self.position_updated_at = Utc::now();
    }
}

fn clamp_offset(offset_secs: f64) -> f64 {
    if offset_secs.is_finite() {
        offset_secs.clamp(-MAX_TIMING_OFFSET, MAX_TIMING_OFFSET)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_secs(1);

    fn playing(duration: f64, offset: f64) -> PlaybackClock {
        let mut clock = PlaybackClock::new(SECOND, offset);
        clock.begin_track(duration);
        clock.play();
        clock
    }

    fn tick_until(clock: &mut PlaybackClock, position: f64) -> Vec<(f64, ClockDecision)> {
        let mut decisions = Vec::new();
        while clock.position_secs() < position {
            let decision = clock.tick(None);
            if decision != ClockDecision::None {
                decisions.push((clock.position_secs(), decision));
            }
        }
        decisions
    }

    #[test]
    fn test_single_schedule_at_end() {
        let mut clock = playing(200.0, 0.0);
        let decisions = tick_until(&mut clock, 199.0);
        assert_eq!(decisions, vec![(199.0, ClockDecision::AdvanceAfter(SECOND))]);

        // Tick observed at 200 before the scheduled advance fires
        assert_eq!(clock.tick(None), ClockDecision::None);
        assert_eq!(clock.position_secs(), 200.0);
        assert!(clock.advance_scheduled());
    }

    #[test]
    fn test_negative_offset_switches_early() {
        let mut clock = playing(100.0, -5.0);
        let decisions = tick_until(&mut clock, 100.0);
        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].0, 94.0);
        assert_eq!(decisions[0].1, ClockDecision::AdvanceAfter(SECOND));
    }

    #[test]
    fn test_positive_offset_waits_past_end() {
        let mut clock = playing(10.0, 3.0);
        let decisions = tick_until(&mut clock, 10.0);
        assert_eq!(
            decisions,
            vec![(9.0, ClockDecision::AdvanceAfter(Duration::from_secs(4)))]
        );
    }

    #[test]
    fn test_offset_is_clamped() {
        let clock = PlaybackClock::new(SECOND, -12.0);
        assert_eq!(clock.offset_secs(), -MAX_TIMING_OFFSET);
        let clock = PlaybackClock::new(SECOND, f64::NAN);
        assert_eq!(clock.offset_secs(), 0.0);
    }

    #[test]
    fn test_paused_clock_does_not_move() {
        let mut clock = playing(100.0, 0.0);
        clock.tick(None);
        assert!(clock.pause());
        assert_eq!(clock.tick(None), ClockDecision::None);
        assert_eq!(clock.position_secs(), 1.0);
        assert!(!clock.pause());
        assert!(clock.resume());
        clock.tick(None);
        assert_eq!(clock.position_secs(), 2.0);
    }

    #[test]
    fn test_pause_releases_decided_advance() {
        let mut clock = playing(10.0, 0.0);
        tick_until(&mut clock, 9.0);
        assert!(clock.advance_scheduled());
        clock.pause();
        assert!(!clock.advance_scheduled());
        clock.resume();
        assert_eq!(clock.tick(None), ClockDecision::AdvanceNow);
    }

    #[test]
    fn test_new_track_starts_paused() {
        let mut clock = PlaybackClock::new(SECOND, 0.0);
        assert_eq!(clock.state(), PlaybackState::Idle);
        clock.begin_track(10.0);
        assert_eq!(clock.state(), PlaybackState::Paused);
        assert_eq!(clock.tick(None), ClockDecision::None);
        assert_eq!(clock.position_secs(), 0.0);
    }

    #[test]
    fn test_device_duration_is_fallback_only() {
        let report = DeviceReport::new(DeviceTransport::Playing).with_duration(30.0);

        let mut declared = playing(200.0, 0.0);
        declared.tick(Some(&report));
        assert_eq!(declared.duration_secs(), 200.0);

        let mut unknown = playing(0.0, 0.0);
        unknown.tick(Some(&report));
        assert_eq!(unknown.duration_secs(), 30.0);
    }

    #[test]
    fn test_unknown_duration_never_advances() {
        let mut clock = playing(0.0, 0.0);
        assert!(tick_until(&mut clock, 500.0).is_empty());
    }

    #[test]
    fn test_device_off_advances_once() {
        let on = DeviceReport::new(DeviceTransport::Playing);
        let off = DeviceReport::new(DeviceTransport::Off);

        let mut clock = playing(200.0, 0.0);
        clock.tick(Some(&on));
        assert_eq!(clock.tick(Some(&off)), ClockDecision::AdvanceNow);
        assert_eq!(clock.tick(Some(&off)), ClockDecision::None);
    }

    #[test]
    fn test_device_off_ignored_right_after_start() {
        let off = DeviceReport::new(DeviceTransport::Off);
        let mut clock = playing(200.0, 0.0);
        assert_eq!(clock.tick(Some(&off)), ClockDecision::None);
        assert_eq!(clock.tick(Some(&off)), ClockDecision::None);
        assert_eq!(clock.tick(Some(&off)), ClockDecision::AdvanceNow);
    }

    #[test]
    fn test_seek_rearms_advance() {
        let mut clock = playing(10.0, 0.0);
        tick_until(&mut clock, 9.0);
        assert!(clock.advance_scheduled());

        clock.seek(2.0);
        assert!(!clock.advance_scheduled());
        assert_eq!(clock.position_secs(), 2.0);
        let decisions = tick_until(&mut clock, 9.0);
        assert_eq!(decisions.len(), 1);

        clock.seek(50.0);
        assert_eq!(clock.position_secs(), 10.0);
    }

    #[test]
    fn test_stop_returns_to_idle() {
        let mut clock = playing(10.0, 0.0);
        clock.tick(None);
        clock.stop();
        assert_eq!(clock.state(), PlaybackState::Idle);
        assert_eq!(clock.position_secs(), 0.0);
        assert!(!clock.resume());
    }
}
