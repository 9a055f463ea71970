//! External player process as the audio backend
//!
//! Each track runs in its own player process. A watcher task waits for the
//! process to exit, either on its own or because `stop` asked it to, and
//! then reports `PlaybackFinished` with the token the track was started with.
use chorus_core::{
    session::EventSender, AudioBackend, ChorusError, MediaHandle, PlayToken, Result,
};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Mutex;
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

struct Playing {
    token: PlayToken,
    stop: oneshot::Sender<()>,
}

pub struct ProcessPlayer {
    player: PathBuf,
    volume: Mutex<f32>,
    current: Mutex<Option<Playing>>,
    events: EventSender,
}

impl ProcessPlayer {
    pub fn new(player: PathBuf, volume: f32, events: EventSender) -> Self {
        Self {
            player,
            volume: Mutex::new(volume),
            current: Mutex::new(None),
            events,
        }
    }

    fn command(&self, media: &MediaHandle) -> Command {
        // ffplay takes an integer volume from 0 to 100
        let level = (self.volume() * 100.0).round().clamp(0.0, 100.0) as u32;

        let mut cmd = Command::new(&self.player);
        cmd.arg("-nodisp")
            .arg("-autoexit")
            .arg("-loglevel")
            .arg("error")
            .arg("-volume")
            .arg(level.to_string())
            .arg(&media.path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        cmd
    }

    fn lock_current(&self) -> Result<std::sync::MutexGuard<'_, Option<Playing>>> {
        self.current
            .lock()
            .map_err(|_| ChorusError::BackendFailure("player state poisoned".to_string()))
    }
}

impl AudioBackend for ProcessPlayer {
    fn play(&self, token: PlayToken, media: &MediaHandle) -> Result<()> {
        let child = self.command(media).spawn().map_err(|e| {
            ChorusError::BackendFailure(format!("failed to start {}: {}", self.player.display(), e))
        })?;

        let (stop_tx, stop_rx) = oneshot::channel();
        let previous = self.lock_current()?.replace(Playing {
            token,
            stop: stop_tx,
        });
        if let Some(previous) = previous {
            warn!("{} still running when {} started", previous.token, token);
            let _ = previous.stop.send(());
        }

        info!("Started {} for {}", self.player.display(), token);
        tokio::spawn(watch(child, token, stop_rx, self.events.clone()));
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        match self.lock_current()?.take() {
            Some(playing) => {
                debug!("Stopping {}", playing.token);
                // The watcher may already be gone if the process just exited
                let _ = playing.stop.send(());
            }
            None => debug!("Stop requested with nothing playing"),
        }
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.current
            .lock()
            .map(|current| current.as_ref().is_some_and(|p| !p.stop.is_closed()))
            .unwrap_or(false)
    }

    fn set_volume(&self, level: f32) {
        if let Ok(mut volume) = self.volume.lock() {
            *volume = level;
        }
        debug!("Volume {:.2} applies from the next track", level);
    }

    fn volume(&self) -> f32 {
        self.volume.lock().map(|v| *v).unwrap_or_default()
    }
}

async fn watch(
    mut child: Child,
    token: PlayToken,
    stop: oneshot::Receiver<()>,
    events: EventSender,
) {
    tokio::select! {
        status = child.wait() => match status {
            Ok(status) if status.success() => debug!("{} finished", token),
            Ok(status) => warn!("Player exited with {} for {}", status, token),
            Err(e) => warn!("Failed to wait for player of {}: {}", token, e),
        },
        _ = stop => {
            if let Err(e) = child.kill().await {
                warn!("Failed to kill player of {}: {}", token, e);
            }
            debug!("{} stopped", token);
        }
    }

    events.playback_finished(token);
}
