//! Chorus - Queue & Skip-Vote Coordination
//!
//! Platform-agnostic coordination engine for a shared listening session.
//!
//! This crate provides:
//! - Tracks and playlists as one closed item type
//! - Per-item skip ledgers with a configurable quorum
//! - The play queue (playlists advance internally by cursor)
//! - The fetch → play → stop → advance state machine
//! - Chat command parsing, permission checks and templated replies
//! - A serialized session event loop
//!
//! # Architecture
//!
//! `chorus-core` never touches a chat server, an audio device or the network.
//! Those are provided through the traits in [`traits`]:
//! - [`Transport`] - chat/voice connection
//! - [`AudioBackend`] - local playback
//! - [`MediaFetcher`] - remote media resolution (async)
//! - [`MediaCache`] - local file cleanup
//! - [`SettingsSource`] - configuration reload
//!
//! # Example: Driving the coordinator
//!
//! ```rust,no_run
//! use chorus_core::{
//!     FetchedMedia, MediaHandle, PlaybackCoordinator, PlaybackState, Track,
//! };
//! # use chorus_core::{AudioBackend, MediaCache, Transport, PlayToken, Result};
//! # use std::sync::Arc;
//! # struct Null;
//! # impl Transport for Null {
//! #     fn send_to_channel(&self, _: &str) {}
//! #     fn send_to_user(&self, _: &str, _: &str) {}
//! #     fn participant_count(&self) -> usize { 3 }
//! #     fn channel_exists(&self, _: &str) -> bool { true }
//! #     fn move_to(&self, _: &str) -> Result<()> { Ok(()) }
//! #     fn disconnect(&self) -> Result<()> { Ok(()) }
//! # }
//! # impl AudioBackend for Null {
//! #     fn play(&self, _: PlayToken, _: &MediaHandle) -> Result<()> { Ok(()) }
//! #     fn stop(&self) -> Result<()> { Ok(()) }
//! #     fn is_playing(&self) -> bool { false }
//! #     fn set_volume(&self, _: f32) {}
//! #     fn volume(&self) -> f32 { 0.2 }
//! # }
//! # impl MediaCache for Null {
//! #     fn remove(&self, _: &MediaHandle) -> Result<()> { Ok(()) }
//! #     fn purge(&self) -> Result<()> { Ok(()) }
//! # }
//! # let null = Arc::new(Null);
//! let mut coordinator = PlaybackCoordinator::new(null.clone(), null.clone(), null);
//!
//! // Adding to an idle session hands out a fetch
//! let request = coordinator.enqueue(Track::new("alice", "dQw4w9WgXcQ").into()).unwrap();
//! assert_eq!(coordinator.state(), PlaybackState::Fetching);
//!
//! // The platform fetches, then reports back
//! let media = FetchedMedia {
//!     media: MediaHandle::new("/tmp/dQw4w9WgXcQ.m4a"),
//!     title: Some("Never Gonna Give You Up".to_string()),
//! };
//! coordinator.complete_fetch(request.ticket, Ok(media)).unwrap();
//! assert_eq!(coordinator.state(), PlaybackState::Playing);
//! ```

pub mod command;
mod coordinator;
mod dispatcher;
mod error;
mod item;
mod notice;
pub mod permissions;
mod queue;
pub mod session;
mod settings;
mod skip;
pub mod traits;
pub mod types;
mod url;
mod volume;

// Public exports
pub use command::{Aliases, CommandKind, CommandSettings};
pub use coordinator::{PlaybackCoordinator, SkipTarget};
pub use dispatcher::Dispatcher;
pub use error::{ChorusError, ErrorKind, Result};
pub use item::{ItemKind, PlayableItem, Playlist, Track};
pub use notice::Notice;
pub use permissions::{AccessLevel, AdminList, CommandAccess, PermissionCheck};
pub use queue::Queue;
pub use session::{Collaborators, EventSender, Session, SessionEvent, SessionExit};
pub use settings::SessionSettings;
pub use skip::{QuorumPolicy, SkipLedger};
pub use traits::{AudioBackend, MediaCache, MediaFetcher, SettingsSource, Transport};
pub use types::{
    Directive, FetchRequest, FetchTicket, FetchedMedia, MediaHandle, PlayToken, PlaybackState,
    PlaylistEntry, PlaylistRequest, ResolvedPlaylist,
};
pub use url::{ParsedUrl, UrlMatcher, DEFAULT_PLAYLIST_PATTERN, DEFAULT_TRACK_PATTERNS};
pub use volume::VolumeRange;
