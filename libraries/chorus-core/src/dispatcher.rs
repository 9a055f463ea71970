//! Command dispatch
//!
//! Turns one chat message into at most one coordinator call. Permission
//! checks and participant-facing error replies happen here, so the
//! coordinator only sees authorized, well-formed requests.

use crate::{
    command::{self, CommandKind, CommandSettings, Parsed},
    coordinator::{PlaybackCoordinator, SkipTarget},
    error::{ChorusError, Result},
    item::Track,
    notice::Notice,
    permissions::{AdminList, CommandAccess, PermissionCheck},
    settings::SessionSettings,
    traits::Transport,
    types::Directive,
    url::{ParsedUrl, UrlMatcher},
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where permission answers come from
enum Permissions {
    /// Admin names from the settings, replaced on every reload
    Configured(AdminList),

    /// Lookup supplied by the platform, kept across reloads
    External(Arc<dyn PermissionCheck>),
}

impl Permissions {
    fn check(&self) -> &dyn PermissionCheck {
        match self {
            Permissions::Configured(admins) => admins,
            Permissions::External(lookup) => lookup.as_ref(),
        }
    }
}

pub struct Dispatcher {
    commands: CommandSettings,
    access: CommandAccess,
    permissions: Permissions,
    urls: UrlMatcher,
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    /// Build a dispatcher whose admins come from `settings`
    pub fn new(
        settings: &SessionSettings,
        urls: UrlMatcher,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            commands: settings.commands.clone(),
            access: settings.access.clone(),
            permissions: Permissions::Configured(admin_list(settings)),
            urls,
            transport,
        }
    }

    /// Replace the permission lookup
    ///
    /// The lookup survives [`apply_settings`](Self::apply_settings); commands
    /// and access levels still follow the new settings.
    pub fn with_permissions(mut self, permissions: Arc<dyn PermissionCheck>) -> Self {
        self.permissions = Permissions::External(permissions);
        self
    }

    pub fn apply_settings(&mut self, settings: &SessionSettings) {
        self.commands = settings.commands.clone();
        self.access = settings.access.clone();
        if let Permissions::Configured(admins) = &mut self.permissions {
            *admins = admin_list(settings);
        }
    }

    pub fn commands(&self) -> &CommandSettings {
        &self.commands
    }

    /// Handle one chat message from `sender`
    ///
    /// Local failures are reported to the sender and swallowed.
    ///
    /// # Errors
    /// Only fatal errors, which end the session.
    pub fn handle(
        &self,
        coordinator: &mut PlaybackCoordinator,
        sender: &str,
        message: &str,
    ) -> Result<Option<Directive>> {
        let (kind, argument) = match command::parse(&self.commands, message) {
            Parsed::Chat => return Ok(None),
            Parsed::Unknown(keyword) => {
                debug!("{} sent unknown command {:?}", sender, keyword);
                self.tell(sender, &Notice::CommandDoesNotExist);
                return Ok(None);
            }
            Parsed::Command { kind, argument } => (kind, argument),
        };

        if !self
            .permissions
            .check()
            .has_permission(sender, self.access.required(kind))
        {
            info!("{} denied {:?}", sender, kind);
            self.tell(sender, &Notice::NoPermission);
            return Ok(None);
        }

        match self.execute(coordinator, sender, kind, &argument) {
            Ok(directive) => Ok(directive),
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                self.report(sender, &err);
                Ok(None)
            }
        }
    }

    fn execute(
        &self,
        coordinator: &mut PlaybackCoordinator,
        sender: &str,
        kind: CommandKind,
        argument: &str,
    ) -> Result<Option<Directive>> {
        match kind {
            CommandKind::Add => self.add(coordinator, sender, argument),
            CommandKind::Skip => skip(coordinator, sender, SkipTarget::Track, false),
            CommandKind::SkipPlaylist => skip(coordinator, sender, SkipTarget::Playlist, false),
            CommandKind::ForceSkip => skip(coordinator, sender, SkipTarget::Track, true),
            CommandKind::ForceSkipPlaylist => skip(coordinator, sender, SkipTarget::Playlist, true),
            CommandKind::Volume => coordinator.set_volume(sender, argument).map(|()| None),
            CommandKind::Move => self.move_to(argument).map(|()| None),
            CommandKind::Reload => Ok(Some(Directive::Reload {
                requester: sender.to_string(),
            })),
            CommandKind::Reset => coordinator.reset(sender).map(|()| None),
            CommandKind::Kill => coordinator.kill().map(|()| Some(Directive::Shutdown)),
        }
    }

    fn add(
        &self,
        coordinator: &mut PlaybackCoordinator,
        sender: &str,
        url: &str,
    ) -> Result<Option<Directive>> {
        if url.is_empty() {
            return Err(ChorusError::MissingArgument("add"));
        }

        match self.urls.parse(url)? {
            ParsedUrl::Track(id) => {
                let request = coordinator.enqueue(Track::new(sender, id).into());
                Ok(request.map(Directive::Fetch))
            }
            ParsedUrl::Playlist(playlist_id) => {
                if !self
                    .permissions
                    .check()
                    .has_permission(sender, self.access.playlists())
                {
                    return Err(ChorusError::PlaylistPermissionDenied);
                }
                let request = coordinator.playlist_request(sender, playlist_id);
                Ok(Some(Directive::ResolvePlaylist(request)))
            }
        }
    }

    fn move_to(&self, channel: &str) -> Result<()> {
        if channel.is_empty() {
            return Err(ChorusError::MissingArgument("move"));
        }
        if !self.transport.channel_exists(channel) {
            return Err(ChorusError::UnknownChannel(channel.to_string()));
        }
        info!("Moving to channel {}", channel);
        self.transport.move_to(channel).map_err(|err| {
            warn!("Move to {} failed: {}", channel, err);
            ChorusError::MoveFailed(channel.to_string())
        })
    }

    fn report(&self, sender: &str, err: &ChorusError) {
        match Notice::for_error(err) {
            Some(notice) => {
                debug!("Rejected command from {}: {}", sender, err);
                self.tell(sender, &notice);
            }
            None => warn!("Command from {} failed: {}", sender, err),
        }
    }

    fn tell(&self, participant: &str, notice: &Notice) {
        self.transport.send_to_user(participant, &notice.to_string());
    }
}

fn admin_list(settings: &SessionSettings) -> AdminList {
    AdminList::new(settings.admins.iter().cloned())
}

fn skip(
    coordinator: &mut PlaybackCoordinator,
    voter: &str,
    target: SkipTarget,
    forced: bool,
) -> Result<Option<Directive>> {
    coordinator.skip(voter, target, forced).map(|()| None)
}
