//! Tunables of an orchestrator instance.

use crate::radio::RadioMode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// How next/previous use the shuffle flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShuffleStrategy {
    /// Walk the active order; shuffle only changes that order.
    #[default]
    Pass,
    /// With shuffle on, every next/previous jumps to a random position.
    Random,
}

impl fmt::Display for ShuffleStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShuffleStrategy::Pass => f.write_str("pass"),
            ShuffleStrategy::Random => f.write_str("random"),
        }
    }
}

impl FromStr for ShuffleStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pass" => Ok(ShuffleStrategy::Pass),
            "random" => Ok(ShuffleStrategy::Random),
            other => Err(format!("unknown shuffle strategy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSettings {
    pub tick_interval: Duration,
    /// Seconds added to the natural end of a track before switching.
    pub next_track_timing_offset: f64,
    pub shuffle_strategy: ShuffleStrategy,
    pub radio_default_mode: RadioMode,
    /// Refill the radio queue when at most this many tracks are left.
    pub preload_watermark: usize,
    /// Sources tried by `search/play` identifiers.
    pub search_sources: Vec<String>,
    /// Seed for the shuffle RNG; `None` seeds from the OS.
    pub shuffle_seed: Option<u64>,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            next_track_timing_offset: 0.0,
            shuffle_strategy: ShuffleStrategy::Pass,
            radio_default_mode: RadioMode::Default,
            preload_watermark: 2,
            search_sources: Vec::new(),
            shuffle_seed: None,
        }
    }
}

impl PlaybackSettings {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.shuffle_seed = Some(seed);
        self
    }

    pub fn with_search_sources(mut self, sources: Vec<String>) -> Self {
        self.search_sources = sources;
        self
    }
}
