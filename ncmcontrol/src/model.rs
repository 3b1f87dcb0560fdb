//! Values exchanged between the orchestrator and its host.

use crate::time_utils::format_hhmmss_f64;
use chrono::{DateTime, Utc};
use ncmcatalogue::Track;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical playback state owned by the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
    Paused,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PlaybackState::Idle => "IDLE",
            PlaybackState::Playing => "PLAYING",
            PlaybackState::Paused => "PAUSED",
        };
        f.write_str(label)
    }
}

/// Transport state of the downstream device as seen by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceTransport {
    Off,
    Idle,
    Playing,
    Paused,
    Unknown,
}

/// What the host observed on the output device at tick time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceReport {
    pub transport: DeviceTransport,
    /// Media duration reported by the device, if it reports one.
    pub duration_secs: Option<f64>,
}

impl DeviceReport {
    pub fn new(transport: DeviceTransport) -> Self {
        Self {
            transport,
            duration_secs: None,
        }
    }

    pub fn with_duration(mut self, duration_secs: f64) -> Self {
        self.duration_secs = Some(duration_secs);
        self
    }
}

/// Command the host adapter must execute against the physical device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransportIntent {
    /// `track` is `None` for one-off direct URLs.
    Play {
        url: String,
        track: Option<Track>,
    },
    Pause,
    Resume,
    Stop,
    Seek {
        position_secs: f64,
    },
    SetVolume {
        level: f64,
    },
    Mute {
        muted: bool,
    },
}

/// Snapshot used by the host to render now-playing metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NowPlaying {
    pub device: String,
    pub state: PlaybackState,
    pub track: Option<Track>,
    /// Stream being played, also set for direct URLs.
    pub media_url: Option<String>,
    pub position_secs: f64,
    pub position_updated_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub shuffle: bool,
    pub radio_mode: Option<String>,
    pub queue_position: Option<usize>,
    pub queue_len: usize,
    pub volume: f64,
    pub muted: bool,
}

impl NowPlaying {
    pub fn title(&self) -> Option<&str> {
        self.track.as_ref().map(|t| t.title.as_str())
    }

    pub fn position_hhmmss(&self) -> String {
        format_hhmmss_f64(self.position_secs)
    }

    pub fn duration_hhmmss(&self) -> String {
        format_hhmmss_f64(self.duration_secs)
    }
}

/// Result of a public operation.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// Transport command produced by the operation, already published on the
    /// event bus.
    pub intent: Option<TransportIntent>,
    pub now_playing: NowPlaying,
}

impl Outcome {
    pub fn is_noop(&self) -> bool {
        self.intent.is_none()
    }
}

/// Events broadcast by an orchestrator.
#[derive(Debug, Clone)]
pub enum OrchestratorEvent {
    Transport {
        device: String,
        intent: TransportIntent,
    },
    NowPlaying(NowPlaying),
    /// User-facing message (empty result, skipped track, degraded radio…).
    Notice {
        device: String,
        message: String,
    },
}
