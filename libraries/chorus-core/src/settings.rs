//! Runtime-adjustable session settings

use crate::command::CommandSettings;
use crate::permissions::CommandAccess;
use crate::skip::QuorumPolicy;
use crate::volume::VolumeRange;

/// Everything `reload` can change without restarting the session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub commands: CommandSettings,
    pub access: CommandAccess,
    pub admins: Vec<String>,
    pub quorum: QuorumPolicy,
    pub volume: VolumeRange,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            commands: CommandSettings::default(),
            access: CommandAccess::default(),
            admins: Vec::new(),
            quorum: QuorumPolicy::default(),
            volume: VolumeRange::default(),
        }
    }
}
