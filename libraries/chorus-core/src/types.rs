//! Core types shared by the coordinator and its collaborators

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Locally playable media produced by a fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaHandle {
    /// File path handed to the audio backend
    pub path: PathBuf,
}

impl MediaHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Result of fetching a single track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedMedia {
    pub media: MediaHandle,

    /// Title reported by the remote, if any
    pub title: Option<String>,
}

/// One member of a resolved playlist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub id: String,
    pub title: Option<String>,
}

/// Member list of a remote playlist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPlaylist {
    pub title: Option<String>,

    /// Ordered members; must be non-empty to be enqueued
    pub entries: Vec<PlaylistEntry>,
}

/// Identifies one in-flight fetch
///
/// The coordinator only accepts the outcome whose ticket matches the fetch it
/// is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchTicket(pub u64);

/// Identifies one playback started on the audio backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlayToken(pub u64);

impl fmt::Display for FetchTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fetch#{}", self.0)
    }
}

impl fmt::Display for PlayToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "play#{}", self.0)
    }
}

/// Coordinator playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Nothing queued or nothing playing
    Idle,

    /// Retrieving media for the current item
    Fetching,

    /// Backend actively streaming
    Playing,

    /// Stop requested, awaiting backend confirmation
    Stopping,
}

/// Request to fetch media for the current track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub ticket: FetchTicket,
    pub track_id: String,
}

/// Request to resolve a playlist's members before it is enqueued
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistRequest {
    pub submitter: String,
    pub playlist_id: String,

    /// Coordinator generation at submit time; a reset in between makes the
    /// resolved playlist stale
    pub generation: u64,
}

/// Follow-up work produced by handling one event
///
/// The session runtime carries these out outside the serialized section and
/// feeds the results back as new events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Fetch media for the coordinator's current track
    Fetch(FetchRequest),

    /// Resolve a playlist, then enqueue it
    ResolvePlaylist(PlaylistRequest),

    /// Reload settings and report back to the participant
    Reload { requester: String },

    /// Disconnect and end the session
    Shutdown,
}

impl From<FetchRequest> for Directive {
    fn from(request: FetchRequest) -> Self {
        Directive::Fetch(request)
    }
}
