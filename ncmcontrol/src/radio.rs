//! Personal radio mode.
//!
//! Radio is layered on the regular playlist: a batch of recommended tracks
//! is loaded in original order and refilled in the background when the
//! queue runs low. `RadioSession` only keeps the bookkeeping; fetching and
//! appending are driven by the orchestrator.

use ncmcatalogue::{FmMode, Track};
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Number of track ids remembered for duplicate filtering.
const RECENT_TRACKS_LIMIT: usize = 500;

/// Recommendation modes offered by the personal radio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RadioMode {
    #[default]
    Default,
    AiDj,
    Familiar,
    Explore,
    Exercise,
    Focus,
    Night,
}

impl RadioMode {
    pub const ALL: [RadioMode; 7] = [
        RadioMode::Default,
        RadioMode::AiDj,
        RadioMode::Familiar,
        RadioMode::Explore,
        RadioMode::Exercise,
        RadioMode::Focus,
        RadioMode::Night,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            RadioMode::Default => "Default",
            RadioMode::AiDj => "AI DJ",
            RadioMode::Familiar => "Familiar",
            RadioMode::Explore => "Explore",
            RadioMode::Exercise => "Exercise",
            RadioMode::Focus => "Focus",
            RadioMode::Night => "Night",
        }
    }

    /// Mode and submode codes understood by the catalogue.
    pub fn fm_mode(&self) -> FmMode {
        match self {
            RadioMode::Default => FmMode::new("DEFAULT"),
            RadioMode::AiDj => FmMode::new("aidj"),
            RadioMode::Familiar => FmMode::new("FAMILIAR"),
            RadioMode::Explore => FmMode::new("EXPLORE"),
            RadioMode::Exercise => FmMode::with_submode("SCENE_RCMD", "EXERCISE"),
            RadioMode::Focus => FmMode::with_submode("SCENE_RCMD", "FOCUS"),
            RadioMode::Night => FmMode::with_submode("SCENE_RCMD", "NIGHT_EMO"),
        }
    }

    /// Case-insensitive lookup by display name or catalogue code.
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = name.trim();
        Self::ALL.into_iter().find(|mode| {
            let fm = mode.fm_mode();
            let code = fm.submode.as_deref().unwrap_or(fm.mode.as_str());
            mode.display_name().eq_ignore_ascii_case(wanted)
                || code.eq_ignore_ascii_case(wanted)
                || format!("{:?}", mode).eq_ignore_ascii_case(wanted)
        })
    }

    /// Like [`Self::from_name`], but an empty or unknown name gives `fallback`.
    pub fn from_name_or(name: &str, fallback: RadioMode) -> Self {
        if name.trim().is_empty() {
            return fallback;
        }
        Self::from_name(name).unwrap_or_else(|| {
            warn!(
                "Unknown radio mode '{}', using {}",
                name,
                fallback.display_name()
            );
            fallback
        })
    }
}

impl fmt::Display for RadioMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for RadioMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RadioMode::from_name(s).ok_or_else(|| format!("unknown radio mode: {}", s))
    }
}

/// Radio bookkeeping for one orchestrator.
#[derive(Debug, Default)]
pub struct RadioSession {
    mode: Option<RadioMode>,
    preloading: bool,
    recent: VecDeque<String>,
    recent_ids: HashSet<String>,
    session: u64,
}

impl RadioSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.mode.is_some()
    }

    pub fn mode(&self) -> Option<RadioMode> {
        self.mode
    }

    pub fn is_preloading(&self) -> bool {
        self.preloading
    }

    /// Identifies the current radio session; changes on every enter/exit so
    /// that late refills of a previous session can be recognised.
    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn has_seen(&self, track_id: &str) -> bool {
        self.recent_ids.contains(track_id)
    }

    /// Starts a session with the first batch, which is remembered as seen.
    pub fn enter(&mut self, mode: RadioMode, first_batch: &[Track]) -> u64 {
        self.session = self.session.wrapping_add(1);
        self.mode = Some(mode);
        self.preloading = false;
        self.recent.clear();
        self.recent_ids.clear();
        for track in first_batch {
            self.remember(&track.id);
        }
        info!(mode = %mode, tracks = first_batch.len(), "Radio mode started");
        self.session
    }

    pub fn exit(&mut self) {
        if let Some(mode) = self.mode.take() {
            info!(mode = %mode, "Radio mode stopped");
        }
        self.session = self.session.wrapping_add(1);
        self.preloading = false;
        self.recent.clear();
        self.recent_ids.clear();
    }

    pub fn needs_preload(&self, remaining: usize, watermark: usize) -> bool {
        self.is_active() && !self.preloading && remaining <= watermark
    }

    /// Marks a refill as in flight and returns what to fetch, or `None` if
    /// no refill is needed.
    pub fn begin_preload(&mut self, remaining: usize, watermark: usize) -> Option<(u64, FmMode)> {
        if !self.needs_preload(remaining, watermark) {
            return None;
        }
        let mode = self.mode?;
        self.preloading = true;
        debug!(remaining, watermark, mode = %mode, "Radio refill requested");
        Some((self.session, mode.fm_mode()))
    }

    /// Closes a refill. Returns `None` when the batch belongs to an old
    /// session, otherwise the tracks not played recently.
    pub fn finish_preload(
        &mut self,
        session: u64,
        batch: Result<Vec<Track>, String>,
    ) -> Option<Vec<Track>> {
        if session != self.session || !self.is_active() {
            debug!(session, current = self.session, "Dropping stale radio refill");
            return None;
        }
        self.preloading = false;

        let batch = match batch {
            Ok(batch) => batch,
            Err(e) => {
                warn!("Radio refill failed: {}", e);
                return Some(Vec::new());
            }
        };
        Some(self.absorb(batch))
    }

    /// Drops the tracks already seen in this session and remembers the rest.
    pub fn absorb(&mut self, batch: Vec<Track>) -> Vec<Track> {
        let received = batch.len();
        let mut fresh = Vec::with_capacity(received);
        for track in batch {
            if self.has_seen(&track.id) {
                continue;
            }
            self.remember(&track.id);
            fresh.push(track);
        }

        if received > 0 && fresh.is_empty() {
            warn!(received, "Radio refill degraded: every track was already played");
        } else {
            debug!(received, kept = fresh.len(), "Radio refill absorbed");
        }
        fresh
    }

    fn remember(&mut self, track_id: &str) {
        if !self.recent_ids.insert(track_id.to_string()) {
            return;
        }
        self.recent.push_back(track_id.to_string());
        while self.recent.len() > RECENT_TRACKS_LIMIT {
            if let Some(oldest) = self.recent.pop_front() {
                self.recent_ids.remove(&oldest);
            }
        }
    }
}
