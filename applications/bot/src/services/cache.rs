//! Cache directory - downloaded media on disk
use crate::error::Result;
use chorus_core::{ChorusError, FetchTicket, MediaCache, MediaHandle};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Extension of downloaded audio files
pub const MEDIA_EXTENSION: &str = "m4a";

#[derive(Debug, Clone)]
pub struct CacheDirectory {
    base_path: PathBuf,
}

impl CacheDirectory {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Create the directory if it is missing
    pub fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.base_path)?;
        info!("Media cache at {}", self.base_path.display());
        Ok(())
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Where one fetch of `track_id` is downloaded to
    ///
    /// Each ticket gets its own file, so a late download of the same id never
    /// overwrites or deletes the file that is playing.
    pub fn path_for(&self, track_id: &str, ticket: FetchTicket) -> PathBuf {
        self.base_path.join(format!("{}-{}.{}", track_id, ticket.0, MEDIA_EXTENSION))
    }
}

impl MediaCache for CacheDirectory {
    fn remove(&self, media: &MediaHandle) -> chorus_core::Result<()> {
        match fs::remove_file(&media.path) {
            Ok(()) => {
                debug!("Removed {}", media.path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ChorusError::Cleanup(format!(
                "{}: {}",
                media.path.display(),
                e
            ))),
        }
    }

    fn purge(&self) -> chorus_core::Result<()> {
        match fs::remove_dir_all(&self.base_path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ChorusError::Cleanup(format!(
                    "{}: {}",
                    self.base_path.display(),
                    e
                )))
            }
        }

        fs::create_dir_all(&self.base_path).map_err(|e| {
            ChorusError::Cleanup(format!("{}: {}", self.base_path.display(), e))
        })?;
        info!("Purged media cache");
        Ok(())
    }
}
