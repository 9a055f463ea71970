//! Session assembly - wires the platform services into a chorus session
use crate::{
    config::BotConfig,
    error::Result,
    services::{CacheDirectory, ConsoleTransport, FileSettings, ProcessPlayer, YtDlpFetcher},
};
use chorus_core::{
    session, AudioBackend, Collaborators, MediaCache, MediaFetcher, Session, SessionExit,
    SettingsSource, Transport,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, BufReader};
use tracing::{error, info, warn};

pub struct Bot {
    config: BotConfig,
    config_path: Option<PathBuf>,
}

impl Bot {
    /// `config_path` is re-read on `reload`
    pub fn new(config: BotConfig, config_path: Option<PathBuf>) -> Self {
        Self {
            config,
            config_path,
        }
    }

    /// Run on the process console
    pub async fn run(self) -> Result<SessionExit> {
        let input = BufReader::new(tokio::io::stdin());
        self.run_with(input, Box::new(std::io::stdout())).await
    }

    /// Run with explicit console streams
    ///
    /// On a fatal session error playback is stopped and the cache purged
    /// before the error is returned.
    pub async fn run_with<R>(self, input: R, output: Box<dyn Write + Send>) -> Result<SessionExit>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let config = self.config;
        let urls = config.url_matcher()?;

        let cache = CacheDirectory::new(config.cache_directory());
        cache.initialize()?;

        let (events, receiver) = session::channel();

        let transport = Arc::new(ConsoleTransport::with_writer(
            config.session.name.clone(),
            config.session.channels.clone(),
            config.session.default_channel.clone(),
            output,
        ));
        let player = Arc::new(ProcessPlayer::new(
            config.tools.player.clone(),
            config.volume.initial,
            events.clone(),
        ));
        let cache = Arc::new(cache);
        let fetcher = YtDlpFetcher::new(config.tools.downloader.clone(), cache.as_ref().clone());

        let collaborators = Collaborators {
            transport: Arc::clone(&transport) as Arc<dyn Transport>,
            backend: Arc::clone(&player) as Arc<dyn AudioBackend>,
            cache: Arc::clone(&cache) as Arc<dyn MediaCache>,
            fetcher: Arc::new(fetcher) as Arc<dyn MediaFetcher>,
            settings: Arc::new(FileSettings::new(self.config_path)) as Arc<dyn SettingsSource>,
            permissions: None,
        };

        let session = Session::new(
            &config.session_settings(),
            urls,
            collaborators,
            (events, receiver),
        );
        tokio::spawn(Arc::clone(&transport).pump(input, session.sender()));

        info!(
            "{} joined {} ({} known channels)",
            config.session.name,
            config.session.default_channel,
            config.session.channels.len()
        );

        match session.run().await {
            Ok(exit) => Ok(exit),
            Err(err) => {
                error!("Fatal session error: {}", err);
                if let Err(e) = player.stop() {
                    warn!("Cleanup: failed to stop playback: {}", e);
                }
                if let Err(e) = cache.purge() {
                    warn!("Cleanup: failed to purge media cache: {}", e);
                }
                if let Err(e) = transport.disconnect() {
                    warn!("Cleanup: failed to disconnect: {}", e);
                }
                Err(err.into())
            }
        }
    }
}
