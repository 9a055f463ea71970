//! Reload support - re-reads the configuration on request
use crate::config::BotConfig;
use chorus_core::{Result, SessionSettings, SettingsSource};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct FileSettings {
    path: Option<PathBuf>,
}

impl FileSettings {
    /// `None` follows the same lookup as startup
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

impl SettingsSource for FileSettings {
    fn reload(&self) -> Result<SessionSettings> {
        let config = BotConfig::load(self.path.as_deref())?;
        config.validate()?;
        info!("Configuration re-read");
        Ok(config.session_settings())
    }
}
