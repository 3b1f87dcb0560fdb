//! Background worker owning the playback state of one output device.
//!
//! Every public operation, tick and catalogue result reaches the worker as a
//! [`Command`], so state is only ever mutated from this task. Catalogue calls
//! run in spawned tasks and come back tagged with the request or track
//! generation that started them; results for anything superseded since are
//! dropped.

use crate::clock::{ClockDecision, PlaybackClock};
use crate::errors::ControlError;
use crate::model::{
    DeviceReport, NowPlaying, OrchestratorEvent, Outcome, PlaybackState, TransportIntent,
};
use crate::playlist::PlaylistManager;
use crate::radio::{RadioMode, RadioSession};
use crate::resolver::{Resolution, ResourceResolver};
use crate::settings::{PlaybackSettings, ShuffleStrategy};
use ncmcatalogue::{CatalogueClient, CatalogueError, StreamUrl, Track};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{Duration, Sleep, sleep};
use tracing::{debug, info, warn};

pub(crate) type Reply = oneshot::Sender<Result<Outcome, ControlError>>;

/// Messages handled by the worker.
#[derive(Debug)]
pub(crate) enum Command {
    Play {
        identifier: String,
        reply: Reply,
    },
    Next {
        reply: Reply,
    },
    Previous {
        reply: Reply,
    },
    Select {
        index: usize,
        reply: Reply,
    },
    Seek {
        position_secs: f64,
        reply: Reply,
    },
    SetShuffle {
        enabled: bool,
        reply: Reply,
    },
    Pause {
        reply: Reply,
    },
    Resume {
        reply: Reply,
    },
    Stop {
        reply: Reply,
    },
    ClearPlaylist {
        reply: Reply,
    },
    SetVolume {
        level: f64,
        reply: Reply,
    },
    Mute {
        muted: bool,
        reply: Reply,
    },
    Tick {
        device: Option<DeviceReport>,
        reply: Option<Reply>,
    },
    PlayRadio {
        mode: Option<String>,
        reply: Reply,
    },
    TrashCurrent {
        reply: Reply,
    },
    ExitRadio {
        reply: Reply,
    },
    Snapshot(oneshot::Sender<NowPlaying>),
    Queue(oneshot::Sender<Vec<Track>>),
    Shutdown,

    // Results of spawned catalogue calls
    Resolved {
        request: u64,
        identifier: String,
        result: Result<Resolution, ControlError>,
    },
    StreamReady {
        generation: u64,
        track_id: String,
        result: Result<StreamUrl, CatalogueError>,
    },
    RadioBatch {
        request: u64,
        mode: RadioMode,
        result: Result<Vec<Track>, CatalogueError>,
    },
    Preloaded {
        session: u64,
        result: Result<Vec<Track>, CatalogueError>,
    },
}

/// Spawns the worker loop. The loop ends on [`Command::Shutdown`] or when
/// every handle is gone.
pub(crate) fn spawn(
    device: String,
    catalogue: Arc<dyn CatalogueClient>,
    settings: PlaybackSettings,
    events: broadcast::Sender<OrchestratorEvent>,
) -> mpsc::Sender<Command> {
    let (tx, mut rx) = mpsc::channel(64);
    let weak_tx = tx.downgrade();

    tokio::spawn(async move {
        info!(device = %device, "Starting playback worker");
        let mut state = WorkerState::new(device, catalogue, settings, events, weak_tx);

        loop {
            if let Some(advance) = state.scheduled.as_mut() {
                let mut pending_command: Option<Option<Command>> = None;

                tokio::select! {
                    cmd = rx.recv() => {
                        pending_command = Some(cmd);
                    }
                    _ = advance.as_mut() => {
                        state.scheduled = None;
                        state.on_scheduled_advance();
                    }
                }

                match pending_command {
                    Some(Some(cmd)) => {
                        state.handle_command(cmd);
                        if state.shutdown {
                            break;
                        }
                    }
                    // Every handle dropped
                    Some(None) => break,
                    None => {}
                }
            } else {
                match rx.recv().await {
                    Some(cmd) => {
                        state.handle_command(cmd);
                        if state.shutdown {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }

        info!(device = %state.device, "Playback worker stopped");
    });

    tx
}

/// Play or radio request waiting for its catalogue result.
struct PendingRequest {
    request: u64,
    reply: Reply,
}

/// Track start waiting for its stream URL.
struct PendingStart {
    generation: u64,
    reply: Option<Reply>,
    failures: usize,
    /// Pause requested before the stream URL arrived.
    paused: bool,
}

struct WorkerState {
    device: String,
    catalogue: Arc<dyn CatalogueClient>,
    resolver: ResourceResolver,
    settings: PlaybackSettings,
    playlist: PlaylistManager,
    clock: PlaybackClock,
    radio: RadioSession,
    /// Shuffle preference saved while radio forces it off.
    shuffle_before_radio: Option<bool>,
    volume: f64,
    muted: bool,
    media_url: Option<String>,
    direct_play: bool,
    events: broadcast::Sender<OrchestratorEvent>,
    self_tx: mpsc::WeakSender<Command>,
    /// Bumped by every play/radio request.
    request: u64,
    /// Bumped by every track start, stop and direct play.
    generation: u64,
    pending: Option<PendingRequest>,
    pending_start: Option<PendingStart>,
    scheduled: Option<Pin<Box<Sleep>>>,
    shutdown: bool,
}

impl WorkerState {
    fn new(
        device: String,
        catalogue: Arc<dyn CatalogueClient>,
        settings: PlaybackSettings,
        events: broadcast::Sender<OrchestratorEvent>,
        self_tx: mpsc::WeakSender<Command>,
    ) -> Self {
        let resolver = ResourceResolver::new(Arc::clone(&catalogue))
            .with_search_sources(settings.search_sources.clone());
        let playlist = match settings.shuffle_seed {
            Some(seed) => PlaylistManager::with_seed(seed),
            None => PlaylistManager::new(),
        };
        let clock = PlaybackClock::new(settings.tick_interval, settings.next_track_timing_offset);

        Self {
            device,
            catalogue,
            resolver,
            settings,
            playlist,
            clock,
            radio: RadioSession::new(),
            shuffle_before_radio: None,
            volume: 1.0,
            muted: false,
            media_url: None,
            direct_play: false,
            events,
            self_tx,
            request: 0,
            generation: 0,
            pending: None,
            pending_start: None,
            scheduled: None,
            shutdown: false,
        }
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Play { identifier, reply } => self.on_play(identifier, reply),
            Command::Next { reply } => self.on_next(reply),
            Command::Previous { reply } => self.on_previous(reply),
            Command::Select { index, reply } => self.on_select(index, reply),
            Command::Seek {
                position_secs,
                reply,
            } => self.on_seek(position_secs, reply),
            Command::SetShuffle { enabled, reply } => self.on_set_shuffle(enabled, reply),
            Command::Pause { reply } => {
                if let Some(pending) = self.pending_start.as_mut() {
                    debug!(device = %self.device, "Pause recorded until the stream starts");
                    pending.paused = true;
                    self.noop(reply);
                } else if self.clock.pause() {
                    self.cancel_scheduled();
                    self.issue(TransportIntent::Pause, Some(reply));
                } else {
                    self.noop(reply);
                }
            }
            Command::Resume { reply } => self.on_resume(reply),
            Command::Stop { reply } => {
                if self.clock.state() == PlaybackState::Idle
                    && self.pending.is_none()
                    && self.pending_start.is_none()
                {
                    self.noop(reply);
                } else {
                    self.supersede_pending();
                    self.halt();
                    self.issue(TransportIntent::Stop, Some(reply));
                }
            }
            Command::ClearPlaylist { reply } => {
                self.supersede_pending();
                self.halt();
                self.leave_radio();
                self.playlist.clear();
                info!(device = %self.device, "Playlist cleared");
                self.issue(TransportIntent::Stop, Some(reply));
            }
            Command::SetVolume { level, reply } => {
                if level.is_finite() {
                    self.volume = level.clamp(0.0, 1.0);
                }
                let level = self.volume;
                self.issue(TransportIntent::SetVolume { level }, Some(reply));
            }
            Command::Mute { muted, reply } => {
                self.muted = muted;
                self.issue(TransportIntent::Mute { muted }, Some(reply));
            }
            Command::Tick { device, reply } => {
                self.on_tick(device);
                if let Some(reply) = reply {
                    self.noop(reply);
                }
            }
            Command::PlayRadio { mode, reply } => self.begin_radio(mode, reply),
            Command::TrashCurrent { reply } => self.on_trash(reply),
            Command::ExitRadio { reply } => {
                if self.radio.is_active() {
                    self.leave_radio();
                    self.publish_now_playing();
                }
                self.noop(reply);
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.now_playing());
            }
            Command::Queue(reply) => {
                let _ = reply.send(self.playlist.original_order().to_vec());
            }
            Command::Shutdown => {
                self.supersede_pending();
                self.supersede_start();
                self.shutdown = true;
            }
            Command::Resolved {
                request,
                identifier,
                result,
            } => self.on_resolved(request, identifier, result),
            Command::StreamReady {
                generation,
                track_id,
                result,
            } => self.on_stream_ready(generation, track_id, result),
            Command::RadioBatch {
                request,
                mode,
                result,
            } => self.on_radio_batch(request, mode, result),
            Command::Preloaded { session, result } => {
                let batch = result.map_err(|e| e.to_string());
                let fresh = self.radio.finish_preload(session, batch).map(|mut fresh| {
                    fresh.retain(|t| !self.playlist.contains(&t.id));
                    fresh
                });
                match fresh {
                    Some(fresh) if !fresh.is_empty() => {
                        info!(device = %self.device, added = fresh.len(), "Radio queue refilled");
                        self.playlist.append(fresh);
                        self.publish_now_playing();
                    }
                    _ => {}
                }
            }
        }
    }

    // ---------------------------------------------------------------------
    // Play

    fn on_play(&mut self, identifier: String, reply: Reply) {
        info!(device = %self.device, identifier = %identifier, "Play requested");
        let request = self.next_request(reply);
        let resolver = self.resolver.clone();
        self.spawn_task(async move {
            let result = resolver.resolve(&identifier).await;
            Command::Resolved {
                request,
                identifier,
                result,
            }
        });
    }

    fn on_resolved(
        &mut self,
        request: u64,
        identifier: String,
        result: Result<Resolution, ControlError>,
    ) {
        let Some(reply) = self.take_pending(request) else {
            debug!(device = %self.device, identifier = %identifier, "Dropping stale resolution");
            return;
        };

        let resolution = match result {
            Ok(resolution) => resolution,
            Err(e) => {
                self.fail(reply, e);
                return;
            }
        };
        debug!(device = %self.device, kind = ?resolution.kind(), "Identifier resolved");

        match resolution {
            Resolution::Index(index) => match self.playlist.select_original(index) {
                Ok(_) => self.start_current(Some(reply), 0),
                Err(e) => self.fail(reply, e),
            },
            Resolution::Playlist {
                tracks,
                start_index,
            } => {
                if tracks.is_empty() {
                    self.fail(reply, ControlError::EmptyResult(identifier));
                    return;
                }

                // A single radio track already queued is a jump, not new content
                let queued = match tracks.as_slice() {
                    [track] if self.radio.is_active() => self.playlist.index_of(&track.id),
                    _ => None,
                };
                if let Some(index) = queued {
                    match self.playlist.select(index) {
                        Ok(_) => self.start_current(Some(reply), 0),
                        Err(e) => self.fail(reply, e),
                    }
                    return;
                }

                self.leave_radio();
                info!(
                    device = %self.device,
                    tracks = tracks.len(),
                    start_index,
                    "Loading playlist"
                );
                self.playlist.load_from(tracks, start_index);
                self.start_current(Some(reply), 0);
            }
            Resolution::DirectUrl(url) => {
                self.leave_radio();
                self.play_direct(url, reply);
            }
            Resolution::Radio(mode) => {
                let mode = Some(mode).filter(|m| !m.is_empty());
                self.begin_radio(mode, reply);
            }
        }
    }

    fn play_direct(&mut self, url: String, reply: Reply) {
        info!(device = %self.device, url = %url, "Playing direct URL");
        self.halt();
        self.clock.begin_track(0.0);
        self.clock.play();
        self.media_url = Some(url.clone());
        self.direct_play = true;
        self.issue(TransportIntent::Play { url, track: None }, Some(reply));
    }

    /// Starts the current playlist track, resolving its stream URL first
    /// when the track does not carry one.
    fn start_current(&mut self, reply: Option<Reply>, failures: usize) {
        self.halt();

        let track = match self.playlist.current() {
            Ok(track) => track.clone(),
            Err(e) => {
                if let Some(reply) = reply {
                    self.fail(reply, e);
                }
                return;
            }
        };
        self.clock.begin_track(track.duration_secs());

        if let Some(url) = track.stream_url.clone().filter(|u| !u.is_empty()) {
            self.issue_play(track, url, reply);
            return;
        }

        let generation = self.generation;
        self.pending_start = Some(PendingStart {
            generation,
            reply,
            failures,
            paused: false,
        });
        let catalogue = Arc::clone(&self.catalogue);
        self.spawn_task(async move {
            let result = catalogue.stream_url(&track.id).await;
            Command::StreamReady {
                generation,
                track_id: track.id,
                result,
            }
        });
    }

    fn on_stream_ready(
        &mut self,
        generation: u64,
        track_id: String,
        result: Result<StreamUrl, CatalogueError>,
    ) {
        let pending = match self.pending_start.take() {
            Some(pending) if pending.generation == generation => pending,
            other => {
                self.pending_start = other;
                debug!(device = %self.device, track_id = %track_id, "Dropping stale stream URL");
                return;
            }
        };

        let track = match self.playlist.current() {
            Ok(track) if track.id == track_id => track.clone(),
            _ => {
                if let Some(reply) = pending.reply {
                    self.noop(reply);
                }
                return;
            }
        };

        match result {
            Ok(StreamUrl { url: Some(url), .. }) if !url.is_empty() => {
                self.issue_play(track, url, pending.reply);
                if pending.paused && self.clock.pause() {
                    self.issue(TransportIntent::Pause, None);
                }
            }
            Ok(_) => self.skip_unplayable(track, "no stream URL".to_string(), pending),
            Err(e) => self.skip_unplayable(track, e.to_string(), pending),
        }
    }

    fn skip_unplayable(&mut self, track: Track, reason: String, pending: PendingStart) {
        let failures = pending.failures + 1;
        warn!(
            device = %self.device,
            track_id = %track.id,
            failures,
            "Skipping unplayable track: {}", reason
        );
        self.notice(format!("Skipping \"{}\": no playable stream", track.title));

        if failures >= self.playlist.len() {
            warn!(device = %self.device, "No playable track left, stopping");
            self.halt();
            self.emit(TransportIntent::Stop);
            self.publish_now_playing();
            let error = ControlError::StreamUnavailable(track.title);
            match pending.reply {
                Some(reply) => self.fail(reply, error),
                None => self.notice(error.to_string()),
            }
            return;
        }

        self.advance_playlist();
        self.start_current(pending.reply, failures);
    }

    fn issue_play(&mut self, track: Track, url: String, reply: Option<Reply>) {
        info!(
            device = %self.device,
            track_id = %track.id,
            title = %track.title,
            "Starting track"
        );
        self.clock.play();
        self.media_url = Some(url.clone());
        self.direct_play = false;
        let intent = TransportIntent::Play {
            url,
            track: Some(track),
        };
        self.issue(intent, reply);
    }

    // ---------------------------------------------------------------------
    // Navigation

    fn on_next(&mut self, reply: Reply) {
        if self.playlist.is_empty() {
            self.fail(reply, ControlError::EmptyPlaylist);
            return;
        }
        self.advance_playlist();
        self.start_current(Some(reply), 0);
    }

    fn on_previous(&mut self, reply: Reply) {
        if self.playlist.is_empty() {
            self.fail(reply, ControlError::EmptyPlaylist);
            return;
        }
        let random = self.random_navigation();
        if self.playlist.len() <= 1 && !random {
            self.noop(reply);
            return;
        }
        if let Err(e) = self.playlist.retreat(random) {
            self.fail(reply, e);
            return;
        }
        self.start_current(Some(reply), 0);
    }

    fn on_select(&mut self, index: usize, reply: Reply) {
        match self.playlist.select(index) {
            Ok(_) => self.start_current(Some(reply), 0),
            Err(e) => self.fail(reply, e),
        }
    }

    fn on_seek(&mut self, position_secs: f64, reply: Reply) {
        if self.clock.state() == PlaybackState::Idle || !position_secs.is_finite() {
            self.noop(reply);
            return;
        }
        self.cancel_scheduled();
        self.clock.seek(position_secs);
        let position_secs = self.clock.position_secs();
        debug!(device = %self.device, position_secs, "Seek");
        self.issue(TransportIntent::Seek { position_secs }, Some(reply));
    }

    fn on_set_shuffle(&mut self, enabled: bool, reply: Reply) {
        if self.radio.is_active() {
            self.fail(reply, ControlError::InvalidShuffleWhileRadio);
            return;
        }
        info!(device = %self.device, enabled, "Shuffle changed");
        self.playlist.set_shuffle(enabled);
        self.publish_now_playing();
        self.noop(reply);
    }

    fn on_resume(&mut self, reply: Reply) {
        if let Some(pending) = self.pending_start.as_mut() {
            pending.paused = false;
            self.noop(reply);
        } else if self.clock.resume() {
            self.issue(TransportIntent::Resume, Some(reply));
        } else if self.clock.state() == PlaybackState::Idle
            && !self.playlist.is_empty()
        {
            self.start_current(Some(reply), 0);
        } else {
            self.noop(reply);
        }
    }

    /// True when next/previous should jump to a random position.
    fn random_navigation(&self) -> bool {
        self.settings.shuffle_strategy == ShuffleStrategy::Random
            && self.playlist.shuffle_enabled()
    }

    /// Moves to the next track and refills the radio queue if needed.
    fn advance_playlist(&mut self) {
        let random = self.random_navigation();
        if let Err(e) = self.playlist.advance(random) {
            debug!(device = %self.device, "Cannot advance: {}", e);
            return;
        }
        self.maybe_preload();
    }

    // ---------------------------------------------------------------------
    // Clock

    fn on_tick(&mut self, device: Option<DeviceReport>) {
        match self.clock.tick(device.as_ref()) {
            ClockDecision::None => {}
            ClockDecision::AdvanceNow => self.auto_advance(),
            ClockDecision::AdvanceAfter(wait) => self.schedule_advance(wait),
        }
        if self.clock.state() == PlaybackState::Playing {
            self.publish_now_playing();
        }
    }

    fn schedule_advance(&mut self, wait: Duration) {
        debug!(device = %self.device, wait_ms = wait.as_millis() as u64, "Next track scheduled");
        self.scheduled = Some(Box::pin(sleep(wait)));
    }

    fn cancel_scheduled(&mut self) {
        self.scheduled = None;
    }

    fn on_scheduled_advance(&mut self) {
        debug!(device = %self.device, "Scheduled advance fired");
        self.auto_advance();
    }

    /// End of track: next playlist entry, or stop after a direct URL.
    fn auto_advance(&mut self) {
        if self.direct_play || self.playlist.is_empty() {
            info!(device = %self.device, "End of stream, stopping");
            self.halt();
            self.emit(TransportIntent::Stop);
            self.publish_now_playing();
            return;
        }
        self.advance_playlist();
        self.start_current(None, 0);
    }

    // ---------------------------------------------------------------------
    // Radio

    fn begin_radio(&mut self, mode: Option<String>, reply: Reply) {
        let fallback = self.settings.radio_default_mode;
        let mode = match mode {
            Some(name) => RadioMode::from_name_or(&name, fallback),
            None => fallback,
        };
        info!(device = %self.device, mode = %mode, "Radio requested");

        let request = self.next_request(reply);
        let catalogue = Arc::clone(&self.catalogue);
        self.spawn_task(async move {
            let result = catalogue.radio_batch(&mode.fm_mode()).await;
            Command::RadioBatch {
                request,
                mode,
                result,
            }
        });
    }

    fn on_radio_batch(
        &mut self,
        request: u64,
        mode: RadioMode,
        result: Result<Vec<Track>, CatalogueError>,
    ) {
        let Some(reply) = self.take_pending(request) else {
            debug!(device = %self.device, mode = %mode, "Dropping stale radio batch");
            return;
        };

        let tracks = match result {
            Ok(tracks) => tracks,
            Err(e) => {
                self.fail(reply, e.into());
                return;
            }
        };
        if tracks.is_empty() {
            self.fail(reply, ControlError::EmptyResult(format!("radio {}", mode)));
            return;
        }

        if self.shuffle_before_radio.is_none() {
            self.shuffle_before_radio = Some(self.playlist.shuffle_enabled());
        }
        self.radio.enter(mode, &tracks);
        self.playlist.set_shuffle(false);
        self.playlist.load(tracks);
        self.start_current(Some(reply), 0);
    }

    fn on_trash(&mut self, reply: Reply) {
        if !self.radio.is_active() {
            self.fail(reply, ControlError::RadioInactive);
            return;
        }
        let track_id = match self.playlist.current() {
            Ok(track) => track.id.clone(),
            Err(e) => {
                self.fail(reply, e);
                return;
            }
        };

        info!(device = %self.device, track_id = %track_id, "Trashing radio track");
        let catalogue = Arc::clone(&self.catalogue);
        let device = self.device.clone();
        tokio::spawn(async move {
            if let Err(e) = catalogue.trash(&track_id).await {
                warn!(device = %device, track_id = %track_id, "Trash feedback failed: {}", e);
            }
        });

        self.advance_playlist();
        self.start_current(Some(reply), 0);
    }

    /// Ends radio mode and gives back the shuffle preference it overrode.
    fn leave_radio(&mut self) {
        self.radio.exit();
        if let Some(shuffle) = self.shuffle_before_radio.take() {
            self.playlist.set_shuffle(shuffle);
        }
    }

    fn maybe_preload(&mut self) {
        let remaining = self.playlist.remaining();
        let Some((session, fm_mode)) = self
            .radio
            .begin_preload(remaining, self.settings.preload_watermark)
        else {
            return;
        };
        let catalogue = Arc::clone(&self.catalogue);
        self.spawn_task(async move {
            let result = catalogue.radio_batch(&fm_mode).await;
            Command::Preloaded { session, result }
        });
    }

    // ---------------------------------------------------------------------
    // Plumbing

    /// Registers a new play/radio request, superseding the previous one.
    fn next_request(&mut self, reply: Reply) -> u64 {
        self.supersede_pending();
        self.request += 1;
        self.pending = Some(PendingRequest {
            request: self.request,
            reply,
        });
        self.request
    }

    fn take_pending(&mut self, request: u64) -> Option<Reply> {
        match self.pending.take() {
            Some(pending) if pending.request == request => Some(pending.reply),
            other => {
                self.pending = other;
                None
            }
        }
    }

    fn supersede_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!(device = %self.device, request = pending.request, "Request superseded");
            self.noop(pending.reply);
        }
    }

    fn supersede_start(&mut self) {
        if let Some(PendingStart {
            reply: Some(reply), ..
        }) = self.pending_start.take()
        {
            self.noop(reply);
        }
    }

    /// Forgets the current track: pending start, scheduled advance and clock.
    fn halt(&mut self) {
        self.supersede_start();
        self.generation += 1;
        self.cancel_scheduled();
        self.clock.stop();
        self.media_url = None;
        self.direct_play = false;
    }

    fn spawn_task<F>(&self, task: F)
    where
        F: Future<Output = Command> + Send + 'static,
    {
        let Some(tx) = self.self_tx.upgrade() else {
            debug!(device = %self.device, "Worker is closing, task not started");
            return;
        };
        tokio::spawn(async move {
            let cmd = task.await;
            let _ = tx.send(cmd).await;
        });
    }

    fn now_playing(&self) -> NowPlaying {
        let track = if self.direct_play {
            None
        } else {
            self.playlist.current().ok().cloned()
        };
        NowPlaying {
            device: self.device.clone(),
            state: self.clock.state(),
            track,
            media_url: self.media_url.clone(),
            position_secs: self.clock.position_secs(),
            position_updated_at: self.clock.position_updated_at(),
            duration_secs: self.clock.duration_secs(),
            shuffle: self.playlist.shuffle_enabled(),
            radio_mode: self.radio.mode().map(|m| m.display_name().to_string()),
            queue_position: self.playlist.position(),
            queue_len: self.playlist.len(),
            volume: self.volume,
            muted: self.muted,
        }
    }

    fn outcome(&self, intent: Option<TransportIntent>) -> Outcome {
        Outcome {
            intent,
            now_playing: self.now_playing(),
        }
    }

    /// Publishes an intent and answers the caller with it.
    fn issue(&mut self, intent: TransportIntent, reply: Option<Reply>) {
        self.emit(intent.clone());
        self.publish_now_playing();
        if let Some(reply) = reply {
            let _ = reply.send(Ok(self.outcome(Some(intent))));
        }
    }

    fn noop(&self, reply: Reply) {
        let _ = reply.send(Ok(self.outcome(None)));
    }

    fn fail(&self, reply: Reply, error: ControlError) {
        if error.is_user_visible() {
            warn!(device = %self.device, "{}", error);
        } else {
            debug!(device = %self.device, "{}", error);
        }
        let _ = reply.send(Err(error));
    }

    fn emit(&self, intent: TransportIntent) {
        let _ = self.events.send(OrchestratorEvent::Transport {
            device: self.device.clone(),
            intent,
        });
    }

    fn publish_now_playing(&self) {
        let _ = self
            .events
            .send(OrchestratorEvent::NowPlaying(self.now_playing()));
    }

    fn notice(&self, message: String) {
        let _ = self.events.send(OrchestratorEvent::Notice {
            device: self.device.clone(),
            message,
        });
    }
}
