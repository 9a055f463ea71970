//! Chat command parsing
//!
//! A command is `<prefix><alias>` optionally followed by one argument. Chat
//! clients often deliver HTML, so markup is stripped first.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

/// Every command the session understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Add,
    Skip,
    SkipPlaylist,
    ForceSkip,
    ForceSkipPlaylist,
    Volume,
    Move,
    Reload,
    Reset,
    Kill,
}

/// Keyword for each command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Aliases {
    pub add: String,
    pub skip: String,
    pub skip_playlist: String,
    pub force_skip: String,
    pub force_skip_playlist: String,
    pub volume: String,
    pub move_channel: String,
    pub reload: String,
    pub reset: String,
    pub kill: String,
}

impl Aliases {
    /// Resolve a keyword; matching is case-sensitive
    pub fn lookup(&self, keyword: &str) -> Option<CommandKind> {
        let table = [
            (&self.add, CommandKind::Add),
            (&self.skip, CommandKind::Skip),
            (&self.skip_playlist, CommandKind::SkipPlaylist),
            (&self.force_skip, CommandKind::ForceSkip),
            (&self.force_skip_playlist, CommandKind::ForceSkipPlaylist),
            (&self.volume, CommandKind::Volume),
            (&self.move_channel, CommandKind::Move),
            (&self.reload, CommandKind::Reload),
            (&self.reset, CommandKind::Reset),
            (&self.kill, CommandKind::Kill),
        ];
        table
            .into_iter()
            .find(|(alias, _)| alias.as_str() == keyword)
            .map(|(_, kind)| kind)
    }
}

impl Default for Aliases {
    fn default() -> Self {
        Self {
            add: "add".to_string(),
            skip: "skip".to_string(),
            skip_playlist: "skipplaylist".to_string(),
            force_skip: "forceskip".to_string(),
            force_skip_playlist: "forceskipplaylist".to_string(),
            volume: "volume".to_string(),
            move_channel: "move".to_string(),
            reload: "reload".to_string(),
            reset: "reset".to_string(),
            kill: "kill".to_string(),
        }
    }
}

/// Prefix and aliases
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandSettings {
    pub prefix: String,
    pub aliases: Aliases,
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self {
            prefix: "!".to_string(),
            aliases: Aliases::default(),
        }
    }
}

/// Outcome of parsing one chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    /// Ordinary chat, not addressed to the session
    Chat,

    /// Prefixed keyword that matches no alias
    Unknown(String),

    Command {
        kind: CommandKind,

        /// First whitespace-separated argument, empty if none
        argument: String,
    },
}

pub fn parse(settings: &CommandSettings, message: &str) -> Parsed {
    let text = sanitize(message);
    let Some(rest) = text.trim().strip_prefix(settings.prefix.as_str()) else {
        return Parsed::Chat;
    };

    let mut words = rest.split_whitespace();
    let keyword = words.next().unwrap_or_default();
    let argument = words.next().unwrap_or_default().to_string();

    match settings.aliases.lookup(keyword) {
        Some(kind) => Parsed::Command { kind, argument },
        None => Parsed::Unknown(keyword.to_string()),
    }
}

/// Strip markup and decode HTML entities
///
/// Text with a malformed entity is kept as it is, minus the tags.
pub fn sanitize(message: &str) -> String {
    let stripped = TAG.replace_all(message, "");
    htmlescape::decode_html(&stripped).unwrap_or_else(|_| stripped.into_owned())
}
