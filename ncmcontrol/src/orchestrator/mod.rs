//! Playback orchestrator: the public face of one output device.
//!
//! [`PlaybackOrchestrator`] is a cheap, cloneable handle on a worker task
//! that owns the playlist, the clock and the radio session. Every operation
//! is answered with an [`Outcome`] carrying the transport intent the host
//! must execute; decisions the orchestrator takes on its own (end of track,
//! skipped streams, radio refills) are only published on the event bus.
//!
//! # Example
//!
//! ```rust,ignore
//! let orchestrator = PlaybackOrchestrator::spawn("salon", catalogue, settings);
//! let mut events = orchestrator.subscribe();
//! orchestrator.play("cloudmusic://163/playlist?id=19723756").await?;
//! while let Ok(event) = events.recv().await {
//!     // forward transport intents to the renderer
//! }
//! ```

mod worker;

use crate::errors::ControlError;
use crate::model::{DeviceReport, NowPlaying, OrchestratorEvent, Outcome};
use crate::settings::PlaybackSettings;
use crate::time_utils::parse_time_flexible;
use ncmcatalogue::{CatalogueClient, Track};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::debug;
use worker::{Command, Reply};

const EVENT_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct PlaybackOrchestrator {
    device: Arc<str>,
    tx: mpsc::Sender<Command>,
    events: broadcast::Sender<OrchestratorEvent>,
}

impl std::fmt::Debug for PlaybackOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackOrchestrator")
            .field("device", &self.device)
            .finish()
    }
}

impl PlaybackOrchestrator {
    /// Starts the worker of `device`. Must be called within a tokio runtime.
    pub fn spawn(
        device: impl Into<String>,
        catalogue: Arc<dyn CatalogueClient>,
        settings: PlaybackSettings,
    ) -> Self {
        let device: String = device.into();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let tx = worker::spawn(device.clone(), catalogue, settings, events.clone());
        Self {
            device: device.into(),
            tx,
            events,
        }
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    /// Subscribes to transport intents, now-playing updates and notices.
    pub fn subscribe(&self) -> broadcast::Receiver<OrchestratorEvent> {
        self.events.subscribe()
    }

    /// Resolves `identifier` and plays it.
    ///
    /// Supported forms are `cloudmusic://<route>?<query>` identifiers and
    /// plain `http(s)` URLs. A newer `play` or `play_radio` supersedes one
    /// still resolving; the superseded call returns a no-op outcome.
    pub async fn play(&self, identifier: &str) -> Result<Outcome, ControlError> {
        let identifier = identifier.to_string();
        self.request(|reply| Command::Play { identifier, reply })
            .await
    }

    pub async fn next(&self) -> Result<Outcome, ControlError> {
        self.request(|reply| Command::Next { reply }).await
    }

    pub async fn previous(&self) -> Result<Outcome, ControlError> {
        self.request(|reply| Command::Previous { reply }).await
    }

    /// Plays the track at `index` of the active order.
    pub async fn select(&self, index: usize) -> Result<Outcome, ControlError> {
        self.request(|reply| Command::Select { index, reply }).await
    }

    pub async fn seek(&self, position_secs: f64) -> Result<Outcome, ControlError> {
        self.request(|reply| Command::Seek {
            position_secs,
            reply,
        })
        .await
    }

    /// Seeks to a position written as `SS`, `MM:SS` or `HH:MM:SS`.
    pub async fn seek_to(&self, position: &str) -> Result<Outcome, ControlError> {
        let position_secs = parse_time_flexible(position)?;
        self.seek(position_secs).await
    }

    pub async fn set_shuffle(&self, enabled: bool) -> Result<Outcome, ControlError> {
        self.request(|reply| Command::SetShuffle { enabled, reply })
            .await
    }

    pub async fn pause(&self) -> Result<Outcome, ControlError> {
        self.request(|reply| Command::Pause { reply }).await
    }

    /// Resumes a paused track, or restarts the current one after a stop.
    pub async fn resume(&self) -> Result<Outcome, ControlError> {
        self.request(|reply| Command::Resume { reply }).await
    }

    /// Stops playback; the playlist is kept.
    pub async fn stop(&self) -> Result<Outcome, ControlError> {
        self.request(|reply| Command::Stop { reply }).await
    }

    pub async fn clear_playlist(&self) -> Result<Outcome, ControlError> {
        self.request(|reply| Command::ClearPlaylist { reply }).await
    }

    /// `level` is clamped to `[0, 1]`.
    pub async fn set_volume(&self, level: f64) -> Result<Outcome, ControlError> {
        self.request(|reply| Command::SetVolume { level, reply })
            .await
    }

    pub async fn mute(&self, muted: bool) -> Result<Outcome, ControlError> {
        self.request(|reply| Command::Mute { muted, reply }).await
    }

    /// Advances the clock by one period. The returned outcome never carries
    /// an intent: a resulting track change is published on the event bus.
    pub async fn tick(&self, device: Option<DeviceReport>) -> Result<Outcome, ControlError> {
        self.request(|reply| Command::Tick {
            device,
            reply: Some(reply),
        })
        .await
    }

    /// Queues a tick without waiting. Returns `false` when the worker is
    /// gone or its queue is full.
    pub fn try_tick(&self, device: Option<DeviceReport>) -> bool {
        match self.tx.try_send(Command::Tick {
            device,
            reply: None,
        }) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!(device = %self.device, "Worker busy, tick dropped");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Starts the personal radio; `None` or an unknown name uses the
    /// configured default mode.
    pub async fn play_radio(&self, mode: Option<&str>) -> Result<Outcome, ControlError> {
        let mode = mode.map(str::to_string);
        self.request(|reply| Command::PlayRadio { mode, reply })
            .await
    }

    /// Dislikes the current radio track and skips it.
    pub async fn trash_current(&self) -> Result<Outcome, ControlError> {
        self.request(|reply| Command::TrashCurrent { reply }).await
    }

    pub async fn exit_radio(&self) -> Result<Outcome, ControlError> {
        self.request(|reply| Command::ExitRadio { reply }).await
    }

    pub async fn now_playing(&self) -> Result<NowPlaying, ControlError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Snapshot(reply))
            .await
            .map_err(|_| self.stopped())?;
        rx.await.map_err(|_| self.stopped())
    }

    /// Tracks of the playlist in their original order. Position `n` in this
    /// list is what `cloudmusic://local/playlist?index=n` plays.
    pub async fn queue(&self) -> Result<Vec<Track>, ControlError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Queue(reply))
            .await
            .map_err(|_| self.stopped())?;
        rx.await.map_err(|_| self.stopped())
    }

    /// Stops the worker. Later calls on any clone return `Stopped`.
    pub async fn shutdown(&self) {
        let _ = self.tx.send(Command::Shutdown).await;
    }

    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }

    async fn request<F>(&self, command: F) -> Result<Outcome, ControlError>
    where
        F: FnOnce(Reply) -> Command,
    {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(command(reply))
            .await
            .map_err(|_| self.stopped())?;
        rx.await.map_err(|_| self.stopped())?
    }

    fn stopped(&self) -> ControlError {
        ControlError::Stopped(self.device.to_string())
    }
}
