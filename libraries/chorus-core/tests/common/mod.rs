//! Recording mock collaborators shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use chorus_core::{
    AudioBackend, ChorusError, FetchRequest, FetchTicket, FetchedMedia, MediaCache, MediaFetcher,
    MediaHandle, PlayToken, PlaybackCoordinator, Playlist, PlaylistEntry, ResolvedPlaylist, Result,
    SessionSettings, SettingsSource, Track, Transport,
};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ===== Transport =====

#[derive(Default)]
pub struct MockTransport {
    participants: AtomicUsize,
    broadcasts: Mutex<Vec<String>>,
    whispers: Mutex<Vec<(String, String)>>,
    channels: Vec<String>,
    moves: Mutex<Vec<String>>,
    fail_move: AtomicBool,
    disconnected: AtomicBool,
}

impl MockTransport {
    pub fn new(participants: usize) -> Arc<Self> {
        Arc::new(Self {
            participants: AtomicUsize::new(participants),
            channels: vec!["Lobby".to_string(), "Music".to_string()],
            ..Self::default()
        })
    }

    pub fn set_participants(&self, count: usize) {
        self.participants.store(count, Ordering::SeqCst);
    }

    pub fn broadcasts(&self) -> Vec<String> {
        self.broadcasts.lock().unwrap().clone()
    }

    pub fn whispers_to(&self, participant: &str) -> Vec<String> {
        self.whispers
            .lock()
            .unwrap()
            .iter()
            .filter(|(who, _)| who == participant)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn moves(&self) -> Vec<String> {
        self.moves.lock().unwrap().clone()
    }

    pub fn fail_move(&self) {
        self.fail_move.store(true, Ordering::SeqCst);
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::SeqCst)
    }
}

impl Transport for MockTransport {
    fn send_to_channel(&self, text: &str) {
        self.broadcasts.lock().unwrap().push(text.to_string());
    }

    fn send_to_user(&self, participant: &str, text: &str) {
        self.whispers
            .lock()
            .unwrap()
            .push((participant.to_string(), text.to_string()));
    }

    fn participant_count(&self) -> usize {
        self.participants.load(Ordering::SeqCst)
    }

    fn channel_exists(&self, channel: &str) -> bool {
        self.channels.iter().any(|c| c == channel)
    }

    fn move_to(&self, channel: &str) -> Result<()> {
        if self.fail_move.load(Ordering::SeqCst) {
            return Err(ChorusError::Transport("server refused the move".to_string()));
        }
        self.moves.lock().unwrap().push(channel.to_string());
        Ok(())
    }

    fn disconnect(&self) -> Result<()> {
        self.disconnected.store(true, Ordering::SeqCst);
        Ok(())
    }
}

// ===== Audio backend =====

pub struct MockBackend {
    current: Mutex<Option<PlayToken>>,
    last_stopped: Mutex<Option<PlayToken>>,
    plays: Mutex<Vec<MediaHandle>>,
    stops: AtomicUsize,
    volume: Mutex<f32>,
    fail_stop: AtomicBool,
    fail_play: AtomicBool,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            current: Mutex::new(None),
            last_stopped: Mutex::new(None),
            plays: Mutex::new(Vec::new()),
            stops: AtomicUsize::new(0),
            volume: Mutex::new(0.2),
            fail_stop: AtomicBool::new(false),
            fail_play: AtomicBool::new(false),
        })
    }

    pub fn fail_stop(&self) {
        self.fail_stop.store(true, Ordering::SeqCst);
    }

    pub fn fail_play(&self) {
        self.fail_play.store(true, Ordering::SeqCst);
    }

    pub fn current_token(&self) -> Option<PlayToken> {
        *self.current.lock().unwrap()
    }

    /// Token of the playback most recently stopped on request
    pub fn last_stopped(&self) -> Option<PlayToken> {
        *self.last_stopped.lock().unwrap()
    }

    pub fn plays(&self) -> Vec<MediaHandle> {
        self.plays.lock().unwrap().clone()
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl AudioBackend for MockBackend {
    fn play(&self, token: PlayToken, media: &MediaHandle) -> Result<()> {
        if self.fail_play.load(Ordering::SeqCst) {
            return Err(ChorusError::BackendFailure("device unavailable".to_string()));
        }
        *self.current.lock().unwrap() = Some(token);
        self.plays.lock().unwrap().push(media.clone());
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        if self.fail_stop.load(Ordering::SeqCst) {
            return Err(ChorusError::BackendFailure("stop refused".to_string()));
        }
        self.stops.fetch_add(1, Ordering::SeqCst);
        let stopped = self.current.lock().unwrap().take();
        *self.last_stopped.lock().unwrap() = stopped;
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.current.lock().unwrap().is_some()
    }

    fn set_volume(&self, level: f32) {
        *self.volume.lock().unwrap() = level;
    }

    fn volume(&self) -> f32 {
        *self.volume.lock().unwrap()
    }
}

// ===== Media cache =====

#[derive(Default)]
pub struct MockCache {
    files: Mutex<HashSet<PathBuf>>,
    purges: AtomicUsize,
    fail_purge: AtomicBool,
}

impl MockCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Pretend a file was downloaded for `track_id`
    pub fn store(&self, track_id: &str) -> MediaHandle {
        let path = PathBuf::from(format!("/cache/{}.m4a", track_id));
        self.files.lock().unwrap().insert(path.clone());
        MediaHandle::new(path)
    }

    pub fn file_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    pub fn contains(&self, track_id: &str) -> bool {
        self.files
            .lock()
            .unwrap()
            .contains(&PathBuf::from(format!("/cache/{}.m4a", track_id)))
    }

    pub fn purge_count(&self) -> usize {
        self.purges.load(Ordering::SeqCst)
    }

    pub fn fail_purge(&self) {
        self.fail_purge.store(true, Ordering::SeqCst);
    }
}

impl MediaCache for MockCache {
    fn remove(&self, media: &MediaHandle) -> Result<()> {
        self.files.lock().unwrap().remove(&media.path);
        Ok(())
    }

    fn purge(&self) -> Result<()> {
        if self.fail_purge.load(Ordering::SeqCst) {
            return Err(ChorusError::Cleanup("permission denied".to_string()));
        }
        self.purges.fetch_add(1, Ordering::SeqCst);
        self.files.lock().unwrap().clear();
        Ok(())
    }
}

// ===== Fetcher =====

/// Fetcher backed by fixed tables; unknown ids fail
pub struct MockFetcher {
    cache: Arc<MockCache>,
    failing: HashSet<String>,
    playlists: HashMap<String, Vec<String>>,
    playlist_delay: Option<Duration>,
}

impl MockFetcher {
    pub fn new(cache: Arc<MockCache>) -> Self {
        Self {
            cache,
            failing: HashSet::new(),
            playlists: HashMap::new(),
            playlist_delay: None,
        }
    }

    pub fn failing(mut self, track_id: &str) -> Self {
        self.failing.insert(track_id.to_string());
        self
    }

    /// Hold playlist resolution back by `delay`
    pub fn resolve_after(mut self, delay: Duration) -> Self {
        self.playlist_delay = Some(delay);
        self
    }

    pub fn playlist(mut self, playlist_id: &str, members: &[&str]) -> Self {
        self.playlists.insert(
            playlist_id.to_string(),
            members.iter().map(|m| (*m).to_string()).collect(),
        );
        self
    }
}

#[async_trait]
impl MediaFetcher for MockFetcher {
    async fn fetch_track(&self, _ticket: FetchTicket, track_id: &str) -> Result<FetchedMedia> {
        if self.failing.contains(track_id) {
            return Err(ChorusError::FetchFailed(format!("{} is unavailable", track_id)));
        }
        Ok(FetchedMedia {
            media: self.cache.store(track_id),
            title: Some(format!("Title of {}", track_id)),
        })
    }

    async fn fetch_playlist(&self, playlist_id: &str) -> Result<ResolvedPlaylist> {
        if let Some(delay) = self.playlist_delay {
            tokio::time::sleep(delay).await;
        }
        let members = self
            .playlists
            .get(playlist_id)
            .ok_or_else(|| ChorusError::FetchFailed(format!("no playlist {}", playlist_id)))?;
        Ok(resolved(members))
    }
}

// ===== Settings =====

pub struct MockSettings {
    next: Mutex<Result<SessionSettings>>,
}

impl MockSettings {
    pub fn new(next: Result<SessionSettings>) -> Arc<Self> {
        Arc::new(Self {
            next: Mutex::new(next),
        })
    }
}

impl SettingsSource for MockSettings {
    fn reload(&self) -> Result<SessionSettings> {
        match &*self.next.lock().unwrap() {
            Ok(settings) => Ok(settings.clone()),
            Err(err) => Err(ChorusError::Config(err.to_string())),
        }
    }
}

// ===== Helpers =====

pub fn resolved<S: AsRef<str>>(members: &[S]) -> ResolvedPlaylist {
    ResolvedPlaylist {
        title: Some("Test Playlist".to_string()),
        entries: members
            .iter()
            .map(|m| PlaylistEntry {
                id: m.as_ref().to_string(),
                title: None,
            })
            .collect(),
    }
}

pub fn playlist(submitter: &str, id: &str, members: &[&str]) -> Playlist {
    Playlist::new(submitter, id, resolved(members)).unwrap()
}

/// Coordinator wired to recording mocks
pub struct Harness {
    pub transport: Arc<MockTransport>,
    pub backend: Arc<MockBackend>,
    pub cache: Arc<MockCache>,
    pub coordinator: PlaybackCoordinator,
}

impl Harness {
    pub fn new(participants: usize) -> Self {
        let transport = MockTransport::new(participants);
        let backend = MockBackend::new();
        let cache = MockCache::new();
        let coordinator = PlaybackCoordinator::new(
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::clone(&backend) as Arc<dyn AudioBackend>,
            Arc::clone(&cache) as Arc<dyn MediaCache>,
        );
        Self {
            transport,
            backend,
            cache,
            coordinator,
        }
    }

    /// Complete a fetch successfully with a freshly cached file
    pub fn fetch_ok(&mut self, request: &FetchRequest) -> Option<FetchRequest> {
        let fetched = FetchedMedia {
            media: self.cache.store(&request.track_id),
            title: None,
        };
        self.coordinator
            .complete_fetch(request.ticket, Ok(fetched))
            .unwrap()
    }

    pub fn fetch_failed(&mut self, request: &FetchRequest) -> Option<FetchRequest> {
        self.coordinator
            .complete_fetch(
                request.ticket,
                Err(ChorusError::FetchFailed("HTTP 403".to_string())),
            )
            .unwrap()
    }

    /// Backend reports the current (or just stopped) playback as finished
    pub fn finish(&mut self) -> Option<FetchRequest> {
        let token = self
            .backend
            .current_token()
            .or_else(|| self.backend.last_stopped())
            .expect("something was playing");
        *self.backend.current.lock().unwrap() = None;
        self.coordinator.playback_finished(token)
    }

    /// Enqueue a track and bring it to `Playing` when the session was idle
    pub fn add_track(&mut self, submitter: &str, id: &str) {
        if let Some(request) = self.coordinator.enqueue(Track::new(submitter, id).into()) {
            assert!(self.fetch_ok(&request).is_none());
        }
    }

    pub fn current_track_id(&self) -> Option<String> {
        self.coordinator
            .queue()
            .current()
            .map(|item| item.current_track().id().to_string())
    }
}
