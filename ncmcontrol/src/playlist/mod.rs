//! Playlist ordering: original order, active order and the boundary-aware
//! shuffle that derives one from the other.

pub mod manager;
pub mod shuffle;

pub use manager::{ActiveOrder, PlaylistManager, PlaylistState};
pub use shuffle::{avoid_count, boundary_shuffle};
