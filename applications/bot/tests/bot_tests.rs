//! End-to-end bot tests
//! Drives a full session over an in-memory console with stand-in shell
//! scripts for the downloader and the player
#![cfg(unix)]

use chorus_bot::{Bot, BotConfig};
use chorus_core::SessionExit;
use std::fs;
use std::io::{self, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncWriteExt, BufReader, DuplexStream};
use tokio::task::JoinHandle;

/// Writes the media file and prints a title derived from the id
const DOWNLOADER: &str = r#"#!/bin/sh
out=""
flat=0
url=""
while [ $# -gt 0 ]; do
  case "$1" in
    --output) out="$2"; shift ;;
    --flat-playlist) flat=1 ;;
    *) url="$1" ;;
  esac
  shift
done
if [ "$flat" = 1 ]; then
  printf 'Mix\tone\tFirst\nMix\ttwo\tSecond\n'
  exit 0
fi
id="${url##*=}"
case "$id" in
  broken*) echo "ERROR: video unavailable" >&2; exit 1 ;;
esac
printf 'audio' > "$out"
echo "Title $id"
"#;

/// Plays "forever" until killed
const SLOW_PLAYER: &str = "#!/bin/sh\nexec sleep 30\n";

/// Finishes instantly
const QUICK_PLAYER: &str = "#!/bin/sh\nexit 0\n";

#[derive(Clone, Default)]
struct SharedOutput(Arc<Mutex<Vec<u8>>>);

impl SharedOutput {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct Running {
    _dir: TempDir,
    cache: PathBuf,
    input: DuplexStream,
    output: SharedOutput,
    handle: JoinHandle<chorus_bot::Result<SessionExit>>,
}

impl Running {
    async fn say(&mut self, line: &str) {
        self.input
            .write_all(format!("{}\n", line).as_bytes())
            .await
            .unwrap();
    }

    async fn wait_for(&self, needle: &str) {
        for _ in 0..500 {
            if self.output.text().contains(needle) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("never saw {:?} in output:\n{}", needle, self.output.text());
    }

    fn cached_files(&self) -> usize {
        fs::read_dir(&self.cache).map(|d| d.count()).unwrap_or(0)
    }
}

fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn start(player: &str) -> Running {
    let dir = TempDir::new().unwrap();
    let cache = dir.path().join("media");

    let mut config = BotConfig::default();
    config.cache.directory = cache.clone();
    config.tools.downloader = script(dir.path(), "downloader.sh", DOWNLOADER);
    config.tools.player = script(dir.path(), "player.sh", player);
    config.permissions.admins = vec!["root".to_string()];
    config.validate().unwrap();

    let (input, console) = tokio::io::duplex(4096);
    let output = SharedOutput::default();
    let bot = Bot::new(config, None);
    let handle = tokio::spawn(bot.run_with(BufReader::new(console), Box::new(output.clone())));

    Running {
        _dir: dir,
        cache,
        input,
        output,
        handle,
    }
}

/// Test a track is downloaded, played, and cleaned up when it ends
#[tokio::test]
async fn test_track_plays_and_is_removed() {
    let mut bot = start(QUICK_PLAYER);

    bot.say("alice: !add https://youtu.be/abc123").await;
    bot.wait_for("alice has added \"abc123\" to the queue.").await;
    bot.wait_for("Now playing \"Title abc123\", added by alice.").await;

    // The quick player exits immediately, so the file is dropped again
    for _ in 0..500 {
        if bot.cached_files() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(bot.cached_files(), 0);

    bot.say("root: !kill").await;
    assert_eq!(bot.handle.await.unwrap().unwrap(), SessionExit::Killed);
}

/// Test forceskip moves to the next queued track
#[tokio::test]
async fn test_forceskip_advances() {
    let mut bot = start(SLOW_PLAYER);

    bot.say("alice: !add https://youtu.be/first").await;
    bot.wait_for("Now playing \"Title first\"").await;
    bot.say("bob: !add https://www.youtube.com/watch?v=second").await;
    bot.wait_for("bob has added \"second\" to the queue.").await;

    bot.say("bob: !forceskip").await;
    bot.wait_for("[to bob] chorus: You do not have permission to use that command.").await;

    bot.say("root: !forceskip").await;
    bot.wait_for("An admin has decided to skip the current track.").await;
    bot.wait_for("Now playing \"Title second\", added by bob.").await;

    bot.say("root: !kill").await;
    assert_eq!((&mut bot.handle).await.unwrap().unwrap(), SessionExit::Killed);
    assert_eq!(bot.cached_files(), 0);
}

/// Test a failed download is reported to the submitter only
#[tokio::test]
async fn test_failed_download_is_reported() {
    let mut bot = start(SLOW_PLAYER);

    bot.say("alice: !add https://youtu.be/broken1").await;
    bot.wait_for("[to alice] chorus: The audio download for \"broken1\" failed.").await;

    // The session keeps going
    bot.say("alice: !add https://youtu.be/good").await;
    bot.wait_for("Now playing \"Title good\"").await;

    bot.say("root: !kill").await;
    bot.handle.await.unwrap().unwrap();
}

/// Test a playlist is resolved and its members play in order
#[tokio::test]
async fn test_playlist_members_play_in_order() {
    let mut bot = start(SLOW_PLAYER);

    bot.say("alice: !add https://www.youtube.com/playlist?list=PLmix").await;
    bot.wait_for("alice has added the playlist \"Mix\" (2 tracks) to the queue.").await;
    bot.wait_for("Now playing \"Title one\"").await;

    bot.say("alice: !skip").await;
    bot.wait_for("Now playing \"Title two\"").await;

    bot.say("root: !kill").await;
    bot.handle.await.unwrap().unwrap();
}

/// Test closing the console ends the session
#[tokio::test]
async fn test_closed_input_ends_session() {
    let bot = start(SLOW_PLAYER);

    drop(bot.input);
    assert_eq!(bot.handle.await.unwrap().unwrap(), SessionExit::Closed);
}
