//! Command access levels

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::command::CommandKind;

/// Level a participant needs to run a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Everyone,
    Admin,
}

impl AccessLevel {
    fn from_admin_flag(admin_only: bool) -> Self {
        if admin_only {
            AccessLevel::Admin
        } else {
            AccessLevel::Everyone
        }
    }
}

/// Permission lookup
pub trait PermissionCheck: Send + Sync {
    fn has_permission(&self, participant: &str, required: AccessLevel) -> bool;
}

/// Fixed set of admin names
#[derive(Debug, Clone, Default)]
pub struct AdminList {
    admins: HashSet<String>,
}

impl AdminList {
    pub fn new<I, S>(admins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            admins: admins.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_admin(&self, participant: &str) -> bool {
        self.admins.contains(participant)
    }
}

impl PermissionCheck for AdminList {
    fn has_permission(&self, participant: &str, required: AccessLevel) -> bool {
        match required {
            AccessLevel::Everyone => true,
            AccessLevel::Admin => self.is_admin(participant),
        }
    }
}

/// Which commands are restricted to admins
///
/// Forced skips are always admin-only and have no flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandAccess {
    pub admin_add: bool,
    pub admin_add_playlists: bool,
    pub admin_skip: bool,
    pub admin_skip_playlists: bool,
    pub admin_volume: bool,
    pub admin_move: bool,
    pub admin_reload: bool,
    pub admin_reset: bool,
    pub admin_kill: bool,
}

impl CommandAccess {
    pub fn required(&self, command: CommandKind) -> AccessLevel {
        let admin_only = match command {
            CommandKind::Add => self.admin_add,
            CommandKind::Skip => self.admin_skip,
            CommandKind::SkipPlaylist => self.admin_skip_playlists,
            CommandKind::ForceSkip | CommandKind::ForceSkipPlaylist => true,
            CommandKind::Volume => self.admin_volume,
            CommandKind::Move => self.admin_move,
            CommandKind::Reload => self.admin_reload,
            CommandKind::Reset => self.admin_reset,
            CommandKind::Kill => self.admin_kill,
        };
        AccessLevel::from_admin_flag(admin_only)
    }

    /// Level needed to enqueue a playlist, on top of `add`
    pub fn playlists(&self) -> AccessLevel {
        AccessLevel::from_admin_flag(self.admin_add_playlists)
    }
}

impl Default for CommandAccess {
    fn default() -> Self {
        Self {
            admin_add: false,
            admin_add_playlists: false,
            admin_skip: false,
            admin_skip_playlists: false,
            admin_volume: false,
            admin_move: true,
            admin_reload: true,
            admin_reset: true,
            admin_kill: true,
        }
    }
}
