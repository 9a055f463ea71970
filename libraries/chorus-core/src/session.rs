//! Session runtime
//!
//! The single serialized event loop. Chat messages, backend finish reports
//! and background job results all arrive on one channel and are handled to
//! completion one at a time. Slow work (fetching media, resolving playlists)
//! runs on spawned tasks and re-enters the loop as events.

use crate::{
    coordinator::PlaybackCoordinator,
    dispatcher::Dispatcher,
    error::{ChorusError, Result},
    item::Playlist,
    notice::Notice,
    permissions::PermissionCheck,
    settings::SessionSettings,
    traits::{AudioBackend, MediaCache, MediaFetcher, SettingsSource, Transport},
    types::{
        Directive, FetchRequest, FetchTicket, FetchedMedia, PlayToken, PlaylistRequest,
        ResolvedPlaylist,
    },
    url::UrlMatcher,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Input to the session loop
#[derive(Debug)]
pub enum SessionEvent {
    /// Chat message from a participant
    Message { sender: String, text: String },

    /// Backend finished (or stopped) a playback
    PlaybackFinished(PlayToken),

    /// Background fetch finished
    FetchCompleted {
        ticket: FetchTicket,
        outcome: Result<FetchedMedia>,
    },

    /// Background playlist resolution finished
    PlaylistResolved {
        request: PlaylistRequest,
        outcome: Result<ResolvedPlaylist>,
    },

    /// Transport went away
    Closed,
}

/// Cloneable handle for posting events into a session
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl EventSender {
    pub fn message(&self, sender: impl Into<String>, text: impl Into<String>) -> bool {
        self.send(SessionEvent::Message {
            sender: sender.into(),
            text: text.into(),
        })
    }

    pub fn playback_finished(&self, token: PlayToken) -> bool {
        self.send(SessionEvent::PlaybackFinished(token))
    }

    pub fn close(&self) -> bool {
        self.send(SessionEvent::Closed)
    }

    /// Post an event; returns `false` once the session has ended
    pub fn send(&self, event: SessionEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Receiving end, consumed by [`Session::new`]
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl EventReceiver {
    /// Next event, for platforms that drive a loop of their own
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        self.rx.recv().await
    }
}

/// Create the event channel
///
/// The sender is needed before the session exists, since backends and
/// transports report into it.
pub fn channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, EventReceiver { rx })
}

/// Platform implementations the session drives
#[derive(Clone)]
pub struct Collaborators {
    pub transport: Arc<dyn Transport>,
    pub backend: Arc<dyn AudioBackend>,
    pub cache: Arc<dyn MediaCache>,
    pub fetcher: Arc<dyn MediaFetcher>,
    pub settings: Arc<dyn SettingsSource>,

    /// Permission lookup; `None` uses the admin list from the settings
    pub permissions: Option<Arc<dyn PermissionCheck>>,
}

/// Why the session loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionExit {
    /// A participant issued `kill`
    Killed,

    /// The transport closed the event stream
    Closed,
}

/// One listening session
pub struct Session {
    coordinator: PlaybackCoordinator,
    dispatcher: Dispatcher,
    transport: Arc<dyn Transport>,
    fetcher: Arc<dyn MediaFetcher>,
    settings: Arc<dyn SettingsSource>,
    sender: EventSender,
    events: EventReceiver,
}

impl Session {
    pub fn new(
        settings: &SessionSettings,
        urls: UrlMatcher,
        collaborators: Collaborators,
        (sender, events): (EventSender, EventReceiver),
    ) -> Self {
        let Collaborators {
            transport,
            backend,
            cache,
            fetcher,
            settings: settings_source,
            permissions,
        } = collaborators;

        let mut coordinator = PlaybackCoordinator::new(Arc::clone(&transport), backend, cache);
        coordinator.apply_settings(settings.quorum, settings.volume);
        let mut dispatcher = Dispatcher::new(settings, urls, Arc::clone(&transport));
        if let Some(permissions) = permissions {
            dispatcher = dispatcher.with_permissions(permissions);
        }

        Self {
            coordinator,
            dispatcher,
            transport,
            fetcher,
            settings: settings_source,
            sender,
            events,
        }
    }

    /// Handle for posting events into this session
    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    pub fn coordinator(&self) -> &PlaybackCoordinator {
        &self.coordinator
    }

    /// Process events until the session is killed or closed
    ///
    /// # Errors
    /// Returns the first fatal error. The caller decides how to clean up and
    /// terminate.
    pub async fn run(mut self) -> Result<SessionExit> {
        info!("Session started");
        while let Some(event) = self.events.rx.recv().await {
            match self.handle_event(event) {
                Ok(Some(exit)) => {
                    info!("Session ended: {:?}", exit);
                    return Ok(exit);
                }
                Ok(None) => {}
                Err(err) => {
                    error!("Session aborted: {}", err);
                    return Err(err);
                }
            }
        }
        Ok(SessionExit::Closed)
    }

    fn handle_event(&mut self, event: SessionEvent) -> Result<Option<SessionExit>> {
        let directive = match event {
            SessionEvent::Message { sender, text } => {
                self.dispatcher.handle(&mut self.coordinator, &sender, &text)?
            }
            SessionEvent::PlaybackFinished(token) => self
                .coordinator
                .playback_finished(token)
                .map(Directive::Fetch),
            SessionEvent::FetchCompleted { ticket, outcome } => self
                .coordinator
                .complete_fetch(ticket, outcome)?
                .map(Directive::Fetch),
            SessionEvent::PlaylistResolved { request, outcome } => {
                self.enqueue_playlist(request, outcome)
            }
            SessionEvent::Closed => return Ok(Some(SessionExit::Closed)),
        };

        match directive {
            Some(directive) => self.execute(directive),
            None => Ok(None),
        }
    }

    fn execute(&mut self, directive: Directive) -> Result<Option<SessionExit>> {
        match directive {
            Directive::Fetch(request) => self.spawn_fetch(request),
            Directive::ResolvePlaylist(request) => self.spawn_resolve(request),
            Directive::Reload { requester } => self.reload(&requester)?,
            Directive::Shutdown => {
                self.transport.disconnect()?;
                return Ok(Some(SessionExit::Killed));
            }
        }
        Ok(None)
    }

    fn spawn_fetch(&self, request: FetchRequest) {
        let fetcher = Arc::clone(&self.fetcher);
        let sender = self.sender.clone();

        tokio::spawn(async move {
            let FetchRequest { ticket, track_id } = request;
            debug!("Fetching {} for {}", track_id, ticket);
            let outcome = fetcher.fetch_track(ticket, &track_id).await;
            sender.send(SessionEvent::FetchCompleted { ticket, outcome });
        });
    }

    fn spawn_resolve(&self, request: PlaylistRequest) {
        let fetcher = Arc::clone(&self.fetcher);
        let sender = self.sender.clone();

        tokio::spawn(async move {
            debug!("Resolving playlist {}", request.playlist_id);
            let outcome = fetcher.fetch_playlist(&request.playlist_id).await;
            sender.send(SessionEvent::PlaylistResolved { request, outcome });
        });
    }

    fn enqueue_playlist(
        &mut self,
        request: PlaylistRequest,
        outcome: Result<ResolvedPlaylist>,
    ) -> Option<Directive> {
        if !self.coordinator.accepts_playlist(&request) {
            debug!("Dropping playlist {} resolved across a reset", request.playlist_id);
            return None;
        }

        let playlist = outcome.and_then(|resolved| {
            Playlist::new(&request.submitter, &request.playlist_id, resolved)
        });

        match playlist {
            Ok(playlist) => self.coordinator.enqueue(playlist.into()).map(Directive::Fetch),
            Err(err) => {
                warn!("Playlist {} rejected: {}", request.playlist_id, err);
                let notice = Notice::PlaylistFailed {
                    id: request.playlist_id,
                };
                self.transport.send_to_user(&request.submitter, &notice.to_string());
                None
            }
        }
    }

    fn reload(&mut self, requester: &str) -> Result<()> {
        let settings = self.settings.reload().map_err(|err| match err {
            ChorusError::Config(_) => err,
            other => ChorusError::Config(other.to_string()),
        })?;

        self.dispatcher.apply_settings(&settings);
        self.coordinator.apply_settings(settings.quorum, settings.volume);
        info!("Settings reloaded by {}", requester);

        self.transport.send_to_user(requester, &Notice::ConfigReloaded.to_string());
        Ok(())
    }
}
