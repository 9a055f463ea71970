//! Playback coordinator - core state machine
//!
//! Owns the queue and decides when to fetch, start, stop and advance.
//!
//! ```text
//! Idle     --enqueue-------------------> Fetching
//! Fetching --fetch ok------------------> Playing
//! Fetching --fetch failed--------------> Fetching (next) | Idle
//! Playing  --quorum / forceskip--------> Stopping
//! Playing  --finished------------------> Fetching (next) | Idle
//! Stopping --finished------------------> Fetching (next) | Idle
//! any      --reset / kill--------------> Idle
//! ```
//!
//! Nothing here blocks. Fetches are handed out as [`FetchRequest`]s and their
//! outcome comes back through [`PlaybackCoordinator::complete_fetch`].

use crate::{
    error::{ChorusError, Result},
    item::PlayableItem,
    notice::Notice,
    queue::Queue,
    skip::QuorumPolicy,
    traits::{AudioBackend, MediaCache, Transport},
    types::{
        FetchRequest, FetchTicket, FetchedMedia, MediaHandle, PlayToken, PlaybackState,
        PlaylistRequest,
    },
    volume::VolumeRange,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What a skip vote targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipTarget {
    /// The streaming track, or the current member of a playlist
    Track,

    /// The whole current playlist
    Playlist,
}

/// Queue and playback state machine
///
/// Invariant: the state is `Idle` exactly when no item is queued.
pub struct PlaybackCoordinator {
    // State
    state: PlaybackState,
    queue: Queue,
    pending_fetch: Option<FetchTicket>,
    now_playing: Option<PlayToken>,
    next_ticket: u64,
    next_token: u64,
    generation: u64,

    // Policy
    quorum: QuorumPolicy,
    volume_range: VolumeRange,

    // Collaborators
    transport: Arc<dyn Transport>,
    backend: Arc<dyn AudioBackend>,
    cache: Arc<dyn MediaCache>,
}

impl PlaybackCoordinator {
    pub fn new(
        transport: Arc<dyn Transport>,
        backend: Arc<dyn AudioBackend>,
        cache: Arc<dyn MediaCache>,
    ) -> Self {
        Self {
            state: PlaybackState::Idle,
            queue: Queue::new(),
            pending_fetch: None,
            now_playing: None,
            next_ticket: 0,
            next_token: 0,
            generation: 0,
            quorum: QuorumPolicy::default(),
            volume_range: VolumeRange::default(),
            transport,
            backend,
            cache,
        }
    }

    pub fn apply_settings(&mut self, quorum: QuorumPolicy, volume_range: VolumeRange) {
        self.quorum = quorum;
        self.volume_range = volume_range;
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn quorum(&self) -> QuorumPolicy {
        self.quorum
    }

    pub fn volume_range(&self) -> VolumeRange {
        self.volume_range
    }

    /// Ticket of the fetch the coordinator is waiting for
    pub fn pending_fetch(&self) -> Option<FetchTicket> {
        self.pending_fetch
    }

    /// Token of the playback currently on the backend
    pub fn now_playing(&self) -> Option<PlayToken> {
        self.now_playing
    }

    /// Bumped by every reset and kill
    ///
    /// Work started before a reset carries the old generation and is dropped
    /// when it comes back.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Request to resolve a playlist, stamped with the current generation
    pub fn playlist_request(&self, submitter: &str, playlist_id: String) -> PlaylistRequest {
        PlaylistRequest {
            submitter: submitter.to_string(),
            playlist_id,
            generation: self.generation,
        }
    }

    /// Whether a resolved playlist still belongs to this generation
    pub fn accepts_playlist(&self, request: &PlaylistRequest) -> bool {
        request.generation == self.generation
    }

    // ===== Queue input =====

    /// Append an item, starting it right away if the session is idle
    pub fn enqueue(&mut self, item: PlayableItem) -> Option<FetchRequest> {
        let notice = match &item {
            PlayableItem::Track(track) => Notice::TrackAdded {
                submitter: track.submitter().to_string(),
                title: track.title().to_string(),
            },
            PlayableItem::Playlist(playlist) => Notice::PlaylistAdded {
                submitter: playlist.submitter().to_string(),
                title: playlist.title().to_string(),
                tracks: playlist.len(),
            },
        };

        info!(
            "{} added {} {} (queue length {})",
            item.submitter(),
            item.kind(),
            item.id(),
            self.queue.len() + 1
        );

        let idle = self.state == PlaybackState::Idle;
        self.queue.append(item);
        self.broadcast(&notice);

        if idle {
            self.start_current()
        } else {
            None
        }
    }

    // ===== Fetch outcome =====

    /// Accept the result of a fetch handed out earlier
    ///
    /// Results for anything but the pending ticket are stale (the queue was
    /// reset or moved on) and their media is discarded.
    ///
    /// # Errors
    /// Only fatal errors: the backend refused to start playback.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        outcome: Result<FetchedMedia>,
    ) -> Result<Option<FetchRequest>> {
        if self.state != PlaybackState::Fetching || self.pending_fetch != Some(ticket) {
            debug!("Discarding stale {}", ticket);
            if let Ok(fetched) = outcome {
                if self.holds_media(&fetched.media) {
                    debug!("{} is in use, keeping it", fetched.media.path.display());
                } else {
                    self.discard_media(&fetched.media);
                }
            }
            return Ok(None);
        }
        self.pending_fetch = None;

        match outcome {
            Ok(fetched) => {
                self.start_playback(fetched)?;
                Ok(None)
            }
            Err(err) => {
                self.fail_current(&err);
                Ok(self.start_current())
            }
        }
    }

    // ===== Backend input =====

    /// The backend stopped streaming, naturally or on request
    pub fn playback_finished(&mut self, token: PlayToken) -> Option<FetchRequest> {
        if self.now_playing != Some(token) {
            debug!("Ignoring finish for stale {}", token);
            return None;
        }
        self.now_playing = None;

        if let Some(item) = self.queue.current() {
            info!("Finished {} ({})", item.current_track().id(), token);
        }
        self.retire_current_track();
        self.start_current()
    }

    // ===== Commands =====

    /// Vote to skip, or force a skip when `forced`
    ///
    /// Quorum is evaluated against the participant count at the time of the
    /// vote, not when earlier votes were cast.
    ///
    /// # Errors
    /// `NothingPlaying`, `NoPlaylistPlaying` and `AlreadyVoted` are local;
    /// a failed backend stop is fatal.
    pub fn skip(&mut self, voter: &str, target: SkipTarget, forced: bool) -> Result<()> {
        if self.state != PlaybackState::Playing {
            return Err(ChorusError::NothingPlaying);
        }

        let participants = self.transport.participant_count();
        let quorum = self.quorum;
        let item = self
            .queue
            .current_mut()
            .ok_or(ChorusError::NothingPlaying)?;

        let mut notices = Vec::new();
        let stop = match target {
            SkipTarget::Playlist => {
                let playlist = item
                    .as_playlist_mut()
                    .ok_or(ChorusError::NoPlaylistPlaying)?;
                if forced {
                    notices.push(Notice::AdminPlaylistSkip);
                    playlist.mark_skipped();
                    true
                } else {
                    let votes = playlist.add_skip_vote(voter)?;
                    debug!(votes, participants, "Playlist skip vote from {}", voter);
                    notices.push(Notice::PlaylistSkipVoteAdded {
                        voter: voter.to_string(),
                    });
                    let reached = playlist.quorum_reached(participants, &quorum);
                    if reached {
                        notices.push(Notice::PlaylistSkipped);
                        playlist.mark_skipped();
                    }
                    reached
                }
            }
            SkipTarget::Track => {
                let track = item.current_track_mut();
                if forced {
                    notices.push(Notice::AdminTrackSkip);
                    true
                } else {
                    let votes = track.add_skip_vote(voter)?;
                    debug!(votes, participants, "Skip vote from {}", voter);
                    notices.push(Notice::SkipVoteAdded {
                        voter: voter.to_string(),
                    });
                    let reached = track.quorum_reached(participants, &quorum);
                    if reached {
                        notices.push(Notice::TrackSkipped);
                    }
                    reached
                }
            }
        };

        for notice in &notices {
            self.broadcast(notice);
        }
        if stop {
            self.request_stop()?;
        }
        Ok(())
    }

    /// Report or change the volume
    ///
    /// An empty argument reports the current level. Anything else must parse
    /// into the configured range or the backend is left untouched.
    pub fn set_volume(&mut self, who: &str, argument: &str) -> Result<()> {
        if argument.is_empty() {
            self.broadcast(&Notice::CurrentVolume {
                level: self.backend.volume(),
            });
            return Ok(());
        }

        let level = self.volume_range.parse(argument)?;
        self.backend.set_volume(level);
        info!("{} set volume to {:.2}", who, level);
        self.broadcast(&Notice::VolumeChanged {
            who: who.to_string(),
            level: self.backend.volume(),
        });
        Ok(())
    }

    /// Stop playback, clear the queue and purge cached media
    ///
    /// # Errors
    /// Backend and cleanup failures are fatal.
    pub fn reset(&mut self, who: &str) -> Result<()> {
        info!("Queue reset by {}", who);
        self.halt()?;
        self.broadcast(&Notice::QueueReset {
            who: who.to_string(),
        });
        Ok(())
    }

    /// Same as reset, silently, ahead of shutdown
    pub fn kill(&mut self) -> Result<()> {
        info!("Session killed, purging media");
        self.halt()
    }

    // ===== Transitions =====

    /// Hand out a fetch for the head item, or go idle
    fn start_current(&mut self) -> Option<FetchRequest> {
        let Some(item) = self.queue.current() else {
            info!("Queue is empty");
            self.state = PlaybackState::Idle;
            self.pending_fetch = None;
            return None;
        };

        let track_id = item.current_track().id().to_string();
        self.next_ticket += 1;
        let ticket = FetchTicket(self.next_ticket);

        self.pending_fetch = Some(ticket);
        self.state = PlaybackState::Fetching;
        info!("Fetching {} ({})", track_id, ticket);

        Some(FetchRequest { ticket, track_id })
    }

    fn start_playback(&mut self, fetched: FetchedMedia) -> Result<()> {
        let Some(item) = self.queue.current_mut() else {
            self.discard_media(&fetched.media);
            self.state = PlaybackState::Idle;
            return Ok(());
        };

        let track = item.current_track_mut();
        if let Some(title) = fetched.title {
            track.set_title(title);
        }
        track.set_media(fetched.media.clone());
        let notice = Notice::NowPlaying {
            title: track.title().to_string(),
            submitter: track.submitter().to_string(),
        };

        self.next_token += 1;
        let token = PlayToken(self.next_token);
        self.backend
            .play(token, &fetched.media)
            .map_err(backend_failure)?;

        self.now_playing = Some(token);
        self.state = PlaybackState::Playing;
        info!("Playing {} ({})", fetched.media.path.display(), token);
        self.broadcast(&notice);
        Ok(())
    }

    /// Drop the head track after a failed fetch and tell its submitter
    fn fail_current(&mut self, err: &ChorusError) {
        if let Some(item) = self.queue.current() {
            let track = item.current_track();
            warn!("Fetch failed for {}: {}", track.id(), err);
            let submitter = track.submitter().to_string();
            let notice = Notice::AudioFailed {
                title: track.title().to_string(),
            };
            self.tell(&submitter, &notice);
        }
        self.retire_current_track();
    }

    /// Move past the head track
    ///
    /// A bare track leaves the queue. A playlist moves its cursor, and leaves
    /// the queue once exhausted or flagged skipped.
    fn retire_current_track(&mut self) {
        let Some(item) = self.queue.current_mut() else {
            return;
        };

        let finished = item.current_track_mut().take_media();
        let exhausted = match item {
            PlayableItem::Track(_) => true,
            PlayableItem::Playlist(playlist) => playlist.is_skipped() || !playlist.advance_cursor(),
        };

        if let Some(media) = finished {
            self.discard_media(&media);
        }

        if exhausted {
            if let Some(mut removed) = self.queue.advance() {
                debug!("Removed {} {} from queue", removed.kind(), removed.id());
                for media in removed.take_all_media() {
                    self.discard_media(&media);
                }
            }
        }
    }

    fn request_stop(&mut self) -> Result<()> {
        self.backend.stop().map_err(backend_failure)?;
        self.state = PlaybackState::Stopping;
        info!("Stop requested");
        Ok(())
    }

    fn halt(&mut self) -> Result<()> {
        let streaming = matches!(
            self.state,
            PlaybackState::Playing | PlaybackState::Stopping
        ) || self.backend.is_playing();

        self.queue.clear();
        self.pending_fetch = None;
        self.now_playing = None;
        self.state = PlaybackState::Idle;
        self.generation += 1;

        if streaming {
            self.backend.stop().map_err(backend_failure)?;
        }
        self.cache.purge().map_err(cleanup_failure)
    }

    // ===== Helpers =====

    /// Whether the head track is using `media`
    fn holds_media(&self, media: &MediaHandle) -> bool {
        self.queue
            .current()
            .and_then(|item| item.current_track().media())
            .is_some_and(|held| held == media)
    }

    fn discard_media(&self, media: &MediaHandle) {
        if let Err(e) = self.cache.remove(media) {
            warn!("Failed to remove {}: {}", media.path.display(), e);
        }
    }

    fn broadcast(&self, notice: &Notice) {
        self.transport.send_to_channel(&notice.to_string());
    }

    fn tell(&self, participant: &str, notice: &Notice) {
        self.transport.send_to_user(participant, &notice.to_string());
    }
}

fn backend_failure(err: ChorusError) -> ChorusError {
    match err {
        ChorusError::BackendFailure(_) => err,
        other => ChorusError::BackendFailure(other.to_string()),
    }
}

fn cleanup_failure(err: ChorusError) -> ChorusError {
    match err {
        ChorusError::Cleanup(_) => err,
        other => ChorusError::Cleanup(other.to_string()),
    }
}
