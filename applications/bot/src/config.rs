//! Bot configuration
//!
//! Loaded from an optional TOML file layered with `CHORUS_` environment
//! variables. Nested keys use a double underscore, e.g.
//! `CHORUS_SKIP__RATIO=0.6` or `CHORUS_PERMISSIONS__ADMINS=alice,bob`.
use crate::error::{BotError, Result};
use chorus_core::{
    CommandAccess, CommandSettings, QuorumPolicy, SessionSettings, UrlMatcher, VolumeRange,
    DEFAULT_PLAYLIST_PATTERN, DEFAULT_TRACK_PATTERNS,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Config file read when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "chorus.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotConfig {
    #[serde(default = "default_session")]
    pub session: SessionSection,

    #[serde(default)]
    pub commands: CommandSettings,

    #[serde(default)]
    pub permissions: PermissionSettings,

    #[serde(default = "default_skip")]
    pub skip: SkipSettings,

    #[serde(default = "default_volume")]
    pub volume: VolumeSettings,

    #[serde(default = "default_urls")]
    pub urls: UrlSettings,

    #[serde(default = "default_cache")]
    pub cache: CacheSettings,

    #[serde(default = "default_tools")]
    pub tools: ToolSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionSection {
    /// Name the bot announces itself with
    #[serde(default = "default_name")]
    pub name: String,

    /// Channels `move` may target
    #[serde(default = "default_channels")]
    pub channels: Vec<String>,

    #[serde(default = "default_channel")]
    pub default_channel: String,
}

/// Admin list and per-command restrictions
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PermissionSettings {
    #[serde(default)]
    pub admins: Vec<String>,

    #[serde(flatten)]
    pub access: CommandAccess,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SkipSettings {
    /// Fraction of participants needed to skip (0, 1]
    #[serde(default = "default_ratio")]
    pub ratio: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VolumeSettings {
    /// Level applied at startup
    #[serde(rename = "default", default = "default_level")]
    pub initial: f32,

    #[serde(default = "default_lowest")]
    pub lowest: f32,

    #[serde(default = "default_highest")]
    pub highest: f32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UrlSettings {
    /// Single-track patterns, first match wins
    #[serde(default = "default_track_patterns")]
    pub track_patterns: Vec<String>,

    #[serde(default = "default_playlist_pattern")]
    pub playlist_pattern: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheSettings {
    /// Downloaded media lives here; a leading `~/` expands to `$HOME`
    #[serde(default = "default_cache_directory")]
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolSettings {
    #[serde(default = "default_downloader")]
    pub downloader: PathBuf,

    #[serde(default = "default_player")]
    pub player: PathBuf,
}

impl BotConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `chorus.toml` in the working
    /// directory is read when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path).required(true));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Override with environment variables (prefixed with CHORUS_)
        settings = settings.add_source(
            config::Environment::with_prefix("CHORUS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("permissions.admins")
                .with_list_parse_key("session.channels"),
        );

        let config = settings.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.session.name.trim().is_empty() {
            return Err(BotError::Config("session.name must not be empty".to_string()));
        }

        if !self.session.channels.is_empty()
            && !self.session.channels.contains(&self.session.default_channel)
        {
            return Err(BotError::Config(format!(
                "default channel {:?} is not listed in session.channels",
                self.session.default_channel
            )));
        }

        if self.commands.prefix.is_empty() {
            return Err(BotError::Config("commands.prefix must not be empty".to_string()));
        }

        let aliases = &self.commands.aliases;
        let keywords = [
            &aliases.add,
            &aliases.skip,
            &aliases.skip_playlist,
            &aliases.force_skip,
            &aliases.force_skip_playlist,
            &aliases.volume,
            &aliases.move_channel,
            &aliases.reload,
            &aliases.reset,
            &aliases.kill,
        ];
        let mut seen = HashSet::new();
        for keyword in keywords {
            if keyword.is_empty() || keyword.contains(char::is_whitespace) {
                return Err(BotError::Config(format!(
                    "command alias {:?} must be a single word",
                    keyword
                )));
            }
            if !seen.insert(keyword.as_str()) {
                return Err(BotError::Config(format!(
                    "command alias {:?} is used twice",
                    keyword
                )));
            }
        }

        if !(self.skip.ratio > 0.0 && self.skip.ratio <= 1.0) {
            return Err(BotError::Config(format!(
                "skip.ratio must be in (0, 1], got {}",
                self.skip.ratio
            )));
        }

        let volume = &self.volume;
        if !(0.0..=1.0).contains(&volume.lowest)
            || !(0.0..=1.0).contains(&volume.highest)
            || volume.lowest > volume.highest
        {
            return Err(BotError::Config(format!(
                "volume range {} - {} is invalid",
                volume.lowest, volume.highest
            )));
        }
        if !self.volume_range().contains(volume.initial) {
            return Err(BotError::Config(format!(
                "volume.default {} is outside {} - {}",
                volume.initial, volume.lowest, volume.highest
            )));
        }

        self.url_matcher()?;

        if self.cache.directory.as_os_str().is_empty() {
            return Err(BotError::Config("cache.directory must not be empty".to_string()));
        }

        Ok(())
    }

    /// The part of the configuration a running session can reload
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            commands: self.commands.clone(),
            access: self.permissions.access.clone(),
            admins: self.permissions.admins.clone(),
            quorum: QuorumPolicy::new(self.skip.ratio),
            volume: self.volume_range(),
        }
    }

    pub fn volume_range(&self) -> VolumeRange {
        VolumeRange::new(self.volume.lowest, self.volume.highest)
    }

    pub fn url_matcher(&self) -> Result<UrlMatcher> {
        UrlMatcher::new(&self.urls.track_patterns, &self.urls.playlist_pattern)
            .map_err(|e| BotError::Config(e.to_string()))
    }

    /// Cache directory with `~/` expanded
    pub fn cache_directory(&self) -> PathBuf {
        expand_home(&self.cache.directory)
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

// Default values
fn default_session() -> SessionSection {
    SessionSection {
        name: default_name(),
        channels: default_channels(),
        default_channel: default_channel(),
    }
}

fn default_name() -> String {
    "chorus".to_string()
}

fn default_channels() -> Vec<String> {
    vec![default_channel()]
}

fn default_channel() -> String {
    "Lobby".to_string()
}

fn default_skip() -> SkipSettings {
    SkipSettings {
        ratio: default_ratio(),
    }
}

fn default_ratio() -> f64 {
    0.5
}

fn default_volume() -> VolumeSettings {
    VolumeSettings {
        initial: default_level(),
        lowest: default_lowest(),
        highest: default_highest(),
    }
}

fn default_level() -> f32 {
    0.2
}

fn default_lowest() -> f32 {
    0.01
}

fn default_highest() -> f32 {
    0.8
}

fn default_urls() -> UrlSettings {
    UrlSettings {
        track_patterns: default_track_patterns(),
        playlist_pattern: default_playlist_pattern(),
    }
}

fn default_track_patterns() -> Vec<String> {
    DEFAULT_TRACK_PATTERNS.iter().map(|p| (*p).to_string()).collect()
}

fn default_playlist_pattern() -> String {
    DEFAULT_PLAYLIST_PATTERN.to_string()
}

fn default_cache() -> CacheSettings {
    CacheSettings {
        directory: default_cache_directory(),
    }
}

fn default_cache_directory() -> PathBuf {
    PathBuf::from("~/.chorus/media")
}

fn default_tools() -> ToolSettings {
    ToolSettings {
        downloader: default_downloader(),
        player: default_player(),
    }
}

fn default_downloader() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_player() -> PathBuf {
    PathBuf::from("ffplay")
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            session: default_session(),
            commands: CommandSettings::default(),
            permissions: PermissionSettings::default(),
            skip: default_skip(),
            volume: default_volume(),
            urls: default_urls(),
            cache: default_cache(),
            tools: default_tools(),
        }
    }
}
