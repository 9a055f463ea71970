//! Collaborator traits
//!
//! The coordinator never talks to a chat server, an audio device or the
//! network directly. Platform code provides these.

use crate::error::Result;
use crate::settings::SessionSettings;
use crate::types::{FetchTicket, FetchedMedia, MediaHandle, PlayToken, ResolvedPlaylist};
use async_trait::async_trait;

/// Chat/voice transport
pub trait Transport: Send + Sync {
    /// Broadcast to everyone in the current channel
    fn send_to_channel(&self, text: &str);

    /// Whisper to one participant
    fn send_to_user(&self, participant: &str, text: &str);

    /// Listeners currently in the channel, not counting the session itself
    fn participant_count(&self) -> usize;

    fn channel_exists(&self, channel: &str) -> bool;

    /// Relocate the session to another channel
    ///
    /// # Errors
    /// Returns an error if the server refuses the move
    fn move_to(&self, channel: &str) -> Result<()>;

    /// Leave the server
    fn disconnect(&self) -> Result<()>;
}

/// Audio output backend
///
/// `play` returns as soon as playback has started. When the stream ends, for
/// any reason including `stop`, the backend reports the token back through
/// [`EventSender::playback_finished`](crate::EventSender::playback_finished).
pub trait AudioBackend: Send + Sync {
    /// Start streaming a local file
    fn play(&self, token: PlayToken, media: &MediaHandle) -> Result<()>;

    /// Request the current stream to stop
    fn stop(&self) -> Result<()>;

    fn is_playing(&self) -> bool;

    fn set_volume(&self, level: f32);

    fn volume(&self) -> f32;
}

/// Remote media resolution
///
/// These calls may take a long time. The session runs them off the
/// serialized event loop.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Download a track into the local media cache
    ///
    /// Two fetches of the same id can be in flight at once (the second one
    /// after a reset), so the ticket should make the local file name unique.
    async fn fetch_track(&self, ticket: FetchTicket, track_id: &str) -> Result<FetchedMedia>;

    /// List the ordered members of a playlist
    async fn fetch_playlist(&self, playlist_id: &str) -> Result<ResolvedPlaylist>;
}

/// Local media cache owned by the session
pub trait MediaCache: Send + Sync {
    /// Remove one fetched file
    fn remove(&self, media: &MediaHandle) -> Result<()>;

    /// Remove every cached file, leaving an empty cache
    fn purge(&self) -> Result<()>;
}

/// Source of settings for the `reload` command
pub trait SettingsSource: Send + Sync {
    fn reload(&self) -> Result<SessionSettings>;
}
