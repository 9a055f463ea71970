//! Playable items: single tracks and playlists

use crate::error::{ChorusError, Result};
use crate::skip::{QuorumPolicy, SkipLedger};
use crate::types::{MediaHandle, PlaylistEntry, ResolvedPlaylist};
use std::fmt;

/// Discriminator for [`PlayableItem`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Track,
    Playlist,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Track => write!(f, "track"),
            ItemKind::Playlist => write!(f, "playlist"),
        }
    }
}

/// One playable audio unit
#[derive(Debug, Clone)]
pub struct Track {
    id: String,
    submitter: String,
    title: String,
    skip_ledger: SkipLedger,
    media: Option<MediaHandle>,
}

impl Track {
    /// Create a track from an identifier extracted by [`UrlMatcher`](crate::UrlMatcher)
    ///
    /// The title falls back to the id until the fetch reports one.
    pub fn new(submitter: impl Into<String>, id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            title: id.clone(),
            id,
            submitter: submitter.into(),
            skip_ledger: SkipLedger::new(),
            media: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn submitter(&self) -> &str {
        &self.submitter
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn skip_ledger(&self) -> &SkipLedger {
        &self.skip_ledger
    }

    pub fn add_skip_vote(&mut self, voter: &str) -> Result<usize> {
        self.skip_ledger.record(voter)
    }

    pub fn quorum_reached(&self, participants: usize, policy: &QuorumPolicy) -> bool {
        self.skip_ledger.quorum_reached(participants, policy)
    }

    /// Local media, once fetched
    pub fn media(&self) -> Option<&MediaHandle> {
        self.media.as_ref()
    }

    pub fn set_media(&mut self, media: MediaHandle) {
        self.media = Some(media);
    }

    /// Detach the local media so it can be cleaned up
    pub fn take_media(&mut self) -> Option<MediaHandle> {
        self.media.take()
    }
}

/// Ordered group of tracks submitted together
///
/// The cursor always points at a valid track. Advancing past the last track
/// reports exhaustion instead of moving the cursor.
#[derive(Debug, Clone)]
pub struct Playlist {
    id: String,
    submitter: String,
    title: String,
    tracks: Vec<Track>,
    cursor: usize,
    skip_ledger: SkipLedger,
    skipped: bool,
}

impl Playlist {
    /// Build a playlist from resolved members
    ///
    /// Fails when the remote returned no members.
    pub fn new(
        submitter: impl Into<String>,
        id: impl Into<String>,
        resolved: ResolvedPlaylist,
    ) -> Result<Self> {
        let id = id.into();
        let submitter = submitter.into();

        if resolved.entries.is_empty() {
            return Err(ChorusError::FetchFailed(format!("playlist {} has no tracks", id)));
        }

        let tracks = resolved
            .entries
            .into_iter()
            .map(|PlaylistEntry { id, title }| {
                let track = Track::new(submitter.clone(), id);
                match title {
                    Some(title) => track.with_title(title),
                    None => track,
                }
            })
            .collect();

        Ok(Self {
            title: resolved.title.unwrap_or_else(|| id.clone()),
            id,
            submitter,
            tracks,
            cursor: 0,
            skip_ledger: SkipLedger::new(),
            skipped: false,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn submitter(&self) -> &str {
        &self.submitter
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current_track(&self) -> &Track {
        &self.tracks[self.cursor]
    }

    pub fn current_track_mut(&mut self) -> &mut Track {
        &mut self.tracks[self.cursor]
    }

    pub fn is_last_track(&self) -> bool {
        self.cursor + 1 >= self.tracks.len()
    }

    /// Move to the next member
    ///
    /// Returns `false` when the playlist is exhausted; the cursor stays put.
    pub fn advance_cursor(&mut self) -> bool {
        if self.is_last_track() {
            return false;
        }
        self.cursor += 1;
        true
    }

    pub fn is_skipped(&self) -> bool {
        self.skipped
    }

    /// Flag the whole playlist for removal once the current track stops
    pub fn mark_skipped(&mut self) {
        self.skipped = true;
    }

    pub fn skip_ledger(&self) -> &SkipLedger {
        &self.skip_ledger
    }

    pub fn add_skip_vote(&mut self, voter: &str) -> Result<usize> {
        self.skip_ledger.record(voter)
    }

    pub fn quorum_reached(&self, participants: usize, policy: &QuorumPolicy) -> bool {
        self.skip_ledger.quorum_reached(participants, policy)
    }

    /// Detach every fetched file in the playlist
    pub fn take_all_media(&mut self) -> Vec<MediaHandle> {
        self.tracks.iter_mut().filter_map(Track::take_media).collect()
    }
}

/// Unit stored in the [`Queue`](crate::Queue)
#[derive(Debug, Clone)]
pub enum PlayableItem {
    Track(Track),
    Playlist(Playlist),
}

impl PlayableItem {
    pub fn kind(&self) -> ItemKind {
        match self {
            PlayableItem::Track(_) => ItemKind::Track,
            PlayableItem::Playlist(_) => ItemKind::Playlist,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            PlayableItem::Track(track) => track.id(),
            PlayableItem::Playlist(playlist) => playlist.id(),
        }
    }

    pub fn title(&self) -> &str {
        match self {
            PlayableItem::Track(track) => track.title(),
            PlayableItem::Playlist(playlist) => playlist.title(),
        }
    }

    pub fn submitter(&self) -> &str {
        match self {
            PlayableItem::Track(track) => track.submitter(),
            PlayableItem::Playlist(playlist) => playlist.submitter(),
        }
    }

    /// Vote against this item as a whole
    ///
    /// For a playlist this is the playlist ledger, not the member's.
    pub fn add_skip_vote(&mut self, voter: &str) -> Result<usize> {
        match self {
            PlayableItem::Track(track) => track.add_skip_vote(voter),
            PlayableItem::Playlist(playlist) => playlist.add_skip_vote(voter),
        }
    }

    pub fn quorum_reached(&self, participants: usize, policy: &QuorumPolicy) -> bool {
        match self {
            PlayableItem::Track(track) => track.quorum_reached(participants, policy),
            PlayableItem::Playlist(playlist) => playlist.quorum_reached(participants, policy),
        }
    }

    /// Track that is (or will be) streaming for this item
    pub fn current_track(&self) -> &Track {
        match self {
            PlayableItem::Track(track) => track,
            PlayableItem::Playlist(playlist) => playlist.current_track(),
        }
    }

    pub fn current_track_mut(&mut self) -> &mut Track {
        match self {
            PlayableItem::Track(track) => track,
            PlayableItem::Playlist(playlist) => playlist.current_track_mut(),
        }
    }

    pub fn as_playlist_mut(&mut self) -> Option<&mut Playlist> {
        match self {
            PlayableItem::Playlist(playlist) => Some(playlist),
            PlayableItem::Track(_) => None,
        }
    }

    /// Detach every fetched file held by this item
    pub fn take_all_media(&mut self) -> Vec<MediaHandle> {
        match self {
            PlayableItem::Track(track) => track.take_media().into_iter().collect(),
            PlayableItem::Playlist(playlist) => playlist.take_all_media(),
        }
    }
}

impl From<Track> for PlayableItem {
    fn from(track: Track) -> Self {
        PlayableItem::Track(track)
    }
}

impl From<Playlist> for PlayableItem {
    fn from(playlist: Playlist) -> Self {
        PlayableItem::Playlist(playlist)
    }
}
