//! Playlist manager for one orchestrator.
//!
//! The manager owns:
//!   - the original order, as resolved from the catalogue,
//!   - the active order used for playback (the original order itself, or a
//!     shuffled permutation of it),
//!   - the current position in the active order.
//!
//! It never issues transport commands; the orchestrator does.

use super::shuffle::boundary_shuffle;
use crate::errors::ControlError;
use ncmcatalogue::Track;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Active order of a loaded playlist.
#[derive(Debug, Clone, PartialEq)]
pub enum ActiveOrder {
    /// Playback follows the original order; no separate sequence exists.
    Original,
    Shuffled(Vec<Track>),
}

/// Explicit "nothing loaded" state instead of an empty vector plus index.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PlaylistState {
    #[default]
    Empty,
    Loaded {
        original: Vec<Track>,
        active: ActiveOrder,
        /// Always `< original.len()`.
        position: usize,
    },
}

#[derive(Debug)]
pub struct PlaylistManager {
    state: PlaylistState,
    shuffle_enabled: bool,
    rng: StdRng,
}

impl Default for PlaylistManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaylistManager {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Deterministic manager, for tests and reproducible sessions.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            state: PlaylistState::Empty,
            shuffle_enabled: false,
            rng,
        }
    }

    pub fn state(&self) -> &PlaylistState {
        &self.state
    }

    pub fn shuffle_enabled(&self) -> bool {
        self.shuffle_enabled
    }

    pub fn len(&self) -> usize {
        match &self.state {
            PlaylistState::Empty => 0,
            PlaylistState::Loaded { original, .. } => original.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.state, PlaylistState::Empty)
    }

    /// Current position in the active order.
    pub fn position(&self) -> Option<usize> {
        match &self.state {
            PlaylistState::Empty => None,
            PlaylistState::Loaded { position, .. } => Some(*position),
        }
    }

    /// Tracks left after the current one in the active order.
    pub fn remaining(&self) -> usize {
        match &self.state {
            PlaylistState::Empty => 0,
            PlaylistState::Loaded {
                original, position, ..
            } => original.len() - position - 1,
        }
    }

    pub fn original_order(&self) -> &[Track] {
        match &self.state {
            PlaylistState::Empty => &[],
            PlaylistState::Loaded { original, .. } => original,
        }
    }

    pub fn active_order(&self) -> &[Track] {
        match &self.state {
            PlaylistState::Empty => &[],
            PlaylistState::Loaded {
                original, active, ..
            } => match active {
                ActiveOrder::Original => original,
                ActiveOrder::Shuffled(order) => order,
            },
        }
    }

    pub fn contains(&self, track_id: &str) -> bool {
        self.index_of(track_id).is_some()
    }

    /// Position of a track in the active order.
    pub fn index_of(&self, track_id: &str) -> Option<usize> {
        self.active_order().iter().position(|t| t.id == track_id)
    }

    /// Replaces the playlist and starts at position 0.
    pub fn load(&mut self, tracks: Vec<Track>) {
        self.load_from(tracks, 0);
    }

    /// Replaces the playlist and starts on the track found at `start` in the
    /// original order (clamped to the last track).
    ///
    /// With shuffle enabled that track is moved to the head of the new
    /// shuffled order. An empty list clears the playlist.
    pub fn load_from(&mut self, tracks: Vec<Track>, start: usize) {
        if tracks.is_empty() {
            self.clear();
            return;
        }

        let start = start.min(tracks.len() - 1);
        let (active, position) = if self.shuffle_enabled {
            let start_id = tracks[start].id.clone();
            let previous = self.active_order().to_vec();
            let mut order = tracks.clone();
            boundary_shuffle(&mut order, Some(&previous), &mut self.rng);
            pin_to_head(&mut order, &start_id);
            (ActiveOrder::Shuffled(order), 0)
        } else {
            (ActiveOrder::Original, start)
        };

        debug!(
            tracks = tracks.len(),
            position,
            shuffle = self.shuffle_enabled,
            "Playlist loaded"
        );
        self.state = PlaylistState::Loaded {
            original: tracks,
            active,
            position,
        };
    }

    pub fn clear(&mut self) {
        self.state = PlaylistState::Empty;
    }

    pub fn current(&self) -> Result<&Track, ControlError> {
        match &self.state {
            PlaylistState::Empty => Err(ControlError::EmptyPlaylist),
            PlaylistState::Loaded { position, .. } => Ok(&self.active_order()[*position]),
        }
    }

    /// Moves to the next track.
    ///
    /// `random` picks a uniformly random position. Otherwise the position
    /// moves forward and wraps; with shuffle enabled, wrapping starts a new
    /// shuffled pass.
    pub fn advance(&mut self, random: bool) -> Result<&Track, ControlError> {
        let len = self.len();
        let position = self.position().ok_or(ControlError::EmptyPlaylist)?;

        let next = if random {
            self.rng.random_range(0..len)
        } else if position + 1 < len {
            position + 1
        } else {
            if self.shuffle_enabled {
                self.start_new_pass();
            }
            0
        };

        self.set_position(next);
        self.current()
    }

    /// Moves to the previous track; symmetric to [`Self::advance`].
    ///
    /// A non-random retreat on a single-track playlist does nothing.
    pub fn retreat(&mut self, random: bool) -> Result<&Track, ControlError> {
        let len = self.len();
        let position = self.position().ok_or(ControlError::EmptyPlaylist)?;

        let previous = if random {
            self.rng.random_range(0..len)
        } else if len <= 1 {
            position
        } else {
            (position + len - 1) % len
        };

        self.set_position(previous);
        self.current()
    }

    /// Jumps to `index` in the active order.
    pub fn select(&mut self, index: usize) -> Result<&Track, ControlError> {
        let len = self.len();
        if self.is_empty() {
            return Err(ControlError::EmptyPlaylist);
        }
        if index >= len {
            return Err(ControlError::IndexOutOfRange { index, len });
        }
        self.set_position(index);
        self.current()
    }

    /// Jumps to the track found at `index` in the original order, wherever
    /// shuffle placed it in the active order.
    pub fn select_original(&mut self, index: usize) -> Result<&Track, ControlError> {
        let len = self.len();
        if self.is_empty() {
            return Err(ControlError::EmptyPlaylist);
        }
        let Some(track) = self.original_order().get(index) else {
            return Err(ControlError::IndexOutOfRange { index, len });
        };
        let track_id = track.id.clone();
        let position = self
            .index_of(&track_id)
            .ok_or(ControlError::IndexOutOfRange { index, len })?;
        self.set_position(position);
        self.current()
    }

    /// Turns shuffle on or off, keeping the current track.
    ///
    /// Turning it on (again) derives a new pass with the current track at
    /// position 0. Turning it off restores the original order and moves the
    /// position onto the current track, or 0 when it cannot be found.
    pub fn set_shuffle(&mut self, enabled: bool) {
        self.shuffle_enabled = enabled;

        let current_id = match self.current() {
            Ok(track) => track.id.clone(),
            Err(_) => return,
        };

        if enabled {
            let previous = self.active_order().to_vec();
            let mut order = self.original_order().to_vec();
            boundary_shuffle(&mut order, Some(&previous), &mut self.rng);
            pin_to_head(&mut order, &current_id);
            if let PlaylistState::Loaded {
                active, position, ..
            } = &mut self.state
            {
                *active = ActiveOrder::Shuffled(order);
                *position = 0;
            }
        } else {
            let restored = self
                .original_order()
                .iter()
                .position(|t| t.id == current_id)
                .unwrap_or(0);
            if let PlaylistState::Loaded {
                active, position, ..
            } = &mut self.state
            {
                *active = ActiveOrder::Original;
                *position = restored;
            }
        }
    }

    /// Appends tracks to both orders (radio refills).
    pub fn append(&mut self, tracks: Vec<Track>) {
        if tracks.is_empty() {
            return;
        }
        if self.is_empty() {
            self.load(tracks);
            return;
        }
        match &mut self.state {
            PlaylistState::Empty => {}
            PlaylistState::Loaded {
                original, active, ..
            } => {
                if let ActiveOrder::Shuffled(order) = active {
                    order.extend(tracks.iter().cloned());
                }
                original.extend(tracks);
            }
        }
    }

    fn set_position(&mut self, index: usize) {
        if let PlaylistState::Loaded { position, .. } = &mut self.state {
            *position = index;
        }
    }

    /// Reshuffles after a full pass over the shuffled order.
    fn start_new_pass(&mut self) {
        if let PlaylistState::Loaded {
            active: ActiveOrder::Shuffled(order),
            ..
        } = &mut self.state
        {
            let previous = order.clone();
            boundary_shuffle(order, Some(&previous), &mut self.rng);
            debug!(tracks = order.len(), "Starting a new shuffled pass");
        }
    }
}

/// Swaps the track with `id` into position 0.
fn pin_to_head(order: &mut [Track], id: &str) {
    if let Some(index) = order.iter().position(|t| t.id == id) {
        order.swap(0, index);
    }
}
