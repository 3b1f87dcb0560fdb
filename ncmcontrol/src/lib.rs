//! # ncmcontrol - Playback orchestration for a remote music catalogue
//!
//! One [`PlaybackOrchestrator`] drives one output device: it resolves
//! identifiers into playlists, keeps the playback order (with a
//! boundary-aware shuffle), runs a self-timed clock that decides when to
//! move to the next track, and layers a personal radio mode with background
//! refills on top of the playlist.
//!
//! The orchestrator never talks to the device itself. Each operation returns
//! a [`TransportIntent`] for the host to execute, and autonomous decisions
//! are published as [`OrchestratorEvent`]s.
//!
//! ## Architecture
//!
//! - `identifier` / `resolver` : `cloudmusic://` identifiers to [`Resolution`]s
//! - `playlist` : original and active orders, shuffle
//! - `clock` : position counting and end-of-track heuristic
//! - `radio` : radio modes and refill bookkeeping
//! - `orchestrator` : the worker task and its handle
//! - `scheduler` : the periodic tick shared by all orchestrators
//! - `config_ext` : `playback` and `radio` sections of `ncmconfig::Config`

pub mod clock;
pub mod config_ext;
pub mod errors;
pub mod identifier;
pub mod model;
pub mod orchestrator;
pub mod playlist;
pub mod radio;
pub mod resolver;
pub mod scheduler;
pub mod settings;
pub mod time_utils;

pub use clock::{ClockDecision, PlaybackClock};
pub use config_ext::PlaybackConfigExt;
pub use errors::ControlError;
pub use identifier::Identifier;
pub use model::{
    DeviceReport, DeviceTransport, NowPlaying, OrchestratorEvent, Outcome, PlaybackState,
    TransportIntent,
};
pub use orchestrator::PlaybackOrchestrator;
pub use playlist::{PlaylistManager, PlaylistState};
pub use radio::{RadioMode, RadioSession};
pub use resolver::{Resolution, ResolutionKind, ResourceResolver};
pub use scheduler::{DeviceProbe, TickScheduler};
pub use settings::{PlaybackSettings, ShuffleStrategy};
