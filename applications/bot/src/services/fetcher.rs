//! yt-dlp wrapper - resolves ids into cached audio files
use crate::services::cache::CacheDirectory;
use async_trait::async_trait;
use chorus_core::{
    ChorusError, FetchTicket, FetchedMedia, MediaFetcher, MediaHandle, PlaylistEntry,
    ResolvedPlaylist, Result,
};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";
const PLAYLIST_URL: &str = "https://www.youtube.com/playlist?list=";

/// Fields printed per playlist entry, tab separated
const PLAYLIST_FORMAT: &str = "%(playlist_title)s\t%(id)s\t%(title)s";

#[derive(Debug, Clone)]
pub struct YtDlpFetcher {
    downloader: PathBuf,
    cache: CacheDirectory,
}

impl YtDlpFetcher {
    pub fn new(downloader: PathBuf, cache: CacheDirectory) -> Self {
        Self { downloader, cache }
    }

    async fn run(&self, cmd: &mut Command) -> Result<String> {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = cmd.output().await.map_err(|e| {
            ChorusError::FetchFailed(format!(
                "failed to run {}: {}",
                self.downloader.display(),
                e
            ))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ChorusError::FetchFailed(format!(
                "{} failed: {}",
                self.downloader.display(),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn fetch_track(&self, ticket: FetchTicket, track_id: &str) -> Result<FetchedMedia> {
        let path = self.cache.path_for(track_id, ticket);
        debug!("Downloading {} to {} ({})", track_id, path.display(), ticket);

        let mut cmd = Command::new(&self.downloader);
        cmd.arg("--no-playlist")
            .arg("--quiet")
            .arg("--format")
            .arg("bestaudio[ext=m4a]/bestaudio")
            .arg("--output")
            .arg(&path)
            .arg("--print")
            .arg("title")
            .arg("--no-simulate")
            .arg(format!("{}{}", WATCH_URL, track_id));

        let stdout = self.run(&mut cmd).await?;

        if !path.exists() {
            return Err(ChorusError::FetchFailed(format!(
                "{} reported success but {} is missing",
                self.downloader.display(),
                path.display()
            )));
        }

        let title = stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string);
        info!("Downloaded {} ({:?})", track_id, title);

        Ok(FetchedMedia {
            media: MediaHandle::new(path),
            title,
        })
    }

    async fn fetch_playlist(&self, playlist_id: &str) -> Result<ResolvedPlaylist> {
        let mut cmd = Command::new(&self.downloader);
        cmd.arg("--flat-playlist")
            .arg("--quiet")
            .arg("--print")
            .arg(PLAYLIST_FORMAT)
            .arg(format!("{}{}", PLAYLIST_URL, playlist_id));

        let stdout = self.run(&mut cmd).await?;
        let playlist = parse_listing(&stdout);
        info!(
            "Resolved playlist {} with {} entries",
            playlist_id,
            playlist.entries.len()
        );
        Ok(playlist)
    }
}

/// Parse `--flat-playlist` output printed with [`PLAYLIST_FORMAT`]
pub fn parse_listing(stdout: &str) -> ResolvedPlaylist {
    let mut title = None;
    let mut entries = Vec::new();

    for line in stdout.lines() {
        let mut fields = line.splitn(3, '\t');
        let (Some(playlist_title), Some(id), entry_title) =
            (fields.next(), fields.next(), fields.next())
        else {
            continue;
        };

        let id = id.trim();
        if id.is_empty() || id == "NA" {
            continue;
        }

        if title.is_none() {
            title = known(playlist_title);
        }
        entries.push(PlaylistEntry {
            id: id.to_string(),
            title: entry_title.and_then(known),
        });
    }

    ResolvedPlaylist { title, entries }
}

/// yt-dlp prints `NA` for missing fields
fn known(field: &str) -> Option<String> {
    let field = field.trim();
    (!field.is_empty() && field != "NA").then(|| field.to_string())
}
