//! Error types for the coordination engine

use thiserror::Error;

/// Coarse classification used to decide how an error propagates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input from a participant
    InvalidInput,

    /// Participant lacks the required access level
    PermissionDenied,

    /// Participant already voted on this item
    AlreadyVoted,

    /// Remote media could not be resolved
    FetchFailed,

    /// Audio backend refused a play/stop request
    BackendFailure,

    /// Operation needs something playing
    NothingPlaying,

    /// Operation needs a playlist playing
    NoPlaylistPlaying,

    /// Media cache could not be cleaned
    Cleanup,

    /// Chat transport failure
    Transport,

    /// Configuration could not be loaded
    Config,
}

/// Coordination errors
#[derive(Debug, Error)]
pub enum ChorusError {
    /// URL matched neither a track nor a playlist pattern
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A command that needs an argument was sent without one
    #[error("Missing argument for {0}")]
    MissingArgument(&'static str),

    /// Requested volume is unparsable or outside the configured range
    #[error("Volume must be between {lowest:.2} and {highest:.2}")]
    VolumeOutOfRange { lowest: f32, highest: f32 },

    /// Target channel is unknown to the transport
    #[error("Channel does not exist: {0}")]
    UnknownChannel(String),

    /// Participant is not allowed to run the command
    #[error("Permission denied")]
    PermissionDenied,

    /// Participant is not allowed to add playlists
    #[error("Playlist permission denied")]
    PlaylistPermissionDenied,

    /// Participant already voted to skip this item
    #[error("{0} has already voted to skip")]
    AlreadyVoted(String),

    /// Fetching media or playlist members failed
    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    /// Audio backend error
    #[error("Audio backend failure: {0}")]
    BackendFailure(String),

    /// Nothing is playing
    #[error("No audio is playing")]
    NothingPlaying,

    /// Current item is not a playlist
    #[error("No playlist is playing")]
    NoPlaylistPlaying,

    /// Media cache cleanup failed
    #[error("Media cache cleanup failed: {0}")]
    Cleanup(String),

    /// Transport could not switch to an existing channel
    #[error("Could not move to channel {0}")]
    MoveFailed(String),

    /// Chat transport error
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ChorusError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChorusError::InvalidUrl(_)
            | ChorusError::MissingArgument(_)
            | ChorusError::VolumeOutOfRange { .. }
            | ChorusError::UnknownChannel(_) => ErrorKind::InvalidInput,
            ChorusError::PermissionDenied | ChorusError::PlaylistPermissionDenied => {
                ErrorKind::PermissionDenied
            }
            ChorusError::AlreadyVoted(_) => ErrorKind::AlreadyVoted,
            ChorusError::FetchFailed(_) => ErrorKind::FetchFailed,
            ChorusError::BackendFailure(_) => ErrorKind::BackendFailure,
            ChorusError::NothingPlaying => ErrorKind::NothingPlaying,
            ChorusError::NoPlaylistPlaying => ErrorKind::NoPlaylistPlaying,
            ChorusError::Cleanup(_) => ErrorKind::Cleanup,
            ChorusError::MoveFailed(_) | ChorusError::Transport(_) => ErrorKind::Transport,
            ChorusError::Config(_) => ErrorKind::Config,
        }
    }

    /// Whether the session can no longer guarantee consistent playback state
    ///
    /// Fatal errors end the session loop and are handed to the caller of
    /// [`Session::run`](crate::Session::run).
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::BackendFailure | ErrorKind::Cleanup | ErrorKind::Config
        )
    }
}

/// Result type for coordination operations
pub type Result<T> = std::result::Result<T, ChorusError>;
