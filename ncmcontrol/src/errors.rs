use ncmcatalogue::CatalogueError;
use thiserror::Error;

/// Errors reported by the playback core.
///
/// None of them is fatal: the orchestrator stays usable for the next
/// operation and its state is left as it was before the failing call.
#[derive(Error, Debug)]
pub enum ControlError {
    #[error("Unsupported identifier: {0}")]
    UnsupportedIdentifier(String),
    #[error("Invalid identifier {0}: {1}")]
    InvalidIdentifier(String, String),
    #[error("Nothing to play for {0}")]
    EmptyResult(String),
    #[error("Catalogue unavailable: {0}")]
    CatalogueUnavailable(#[from] CatalogueError),
    #[error("No playlist loaded")]
    EmptyPlaylist,
    #[error("Index {index} is out of range (playlist has {len} tracks)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Shuffle cannot be changed while radio mode is active")]
    InvalidShuffleWhileRadio,
    #[error("Radio mode is not active")]
    RadioInactive,
    #[error("No playable stream for {0}")]
    StreamUnavailable(String),
    #[error("Invalid time format: {0}")]
    InvalidTimeFormat(String),
    #[error("Orchestrator {0} is stopped")]
    Stopped(String),
}

impl ControlError {
    pub fn invalid_identifier(identifier: &str, reason: &str) -> Self {
        ControlError::InvalidIdentifier(identifier.to_string(), reason.to_string())
    }

    pub fn unsupported_identifier(identifier: &str) -> Self {
        ControlError::UnsupportedIdentifier(identifier.to_string())
    }

    /// True for errors a host should show to the user rather than only log.
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            ControlError::EmptyResult(_)
                | ControlError::InvalidShuffleWhileRadio
                | ControlError::StreamUnavailable(_)
                | ControlError::CatalogueUnavailable(_)
        )
    }
}
