//! Console transport
//!
//! Stands in for a voice server: participants are simulated on stdin, and
//! everything the session says is written to stdout.
//!
//! Input lines:
//! - `alice: !add https://youtu.be/...` posts a chat message as `alice`
//!   (adding them to the roster if needed)
//! - `/join bob` and `/leave bob` adjust the roster
use chorus_core::{session::EventSender, ChorusError, Result, Transport};
use std::collections::BTreeSet;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

/// One parsed stdin line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    Join(String),
    Leave(String),
    Message { sender: String, text: String },
}

impl ConsoleInput {
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if let Some(name) = line.strip_prefix("/join ") {
            return non_empty(name).map(ConsoleInput::Join);
        }
        if let Some(name) = line.strip_prefix("/leave ") {
            return non_empty(name).map(ConsoleInput::Leave);
        }

        let (sender, text) = line.split_once(':')?;
        let sender = non_empty(sender)?;
        Some(ConsoleInput::Message {
            sender,
            text: text.trim().to_string(),
        })
    }
}

fn non_empty(name: &str) -> Option<String> {
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

pub struct ConsoleTransport {
    name: String,
    channels: Vec<String>,
    channel: Mutex<String>,
    roster: Mutex<BTreeSet<String>>,
    out: Mutex<Box<dyn Write + Send>>,
    connected: AtomicBool,
}

impl ConsoleTransport {
    /// Transport printing to stdout
    pub fn new(name: impl Into<String>, channels: Vec<String>, channel: impl Into<String>) -> Self {
        Self::with_writer(name, channels, channel, Box::new(io::stdout()))
    }

    pub fn with_writer(
        name: impl Into<String>,
        channels: Vec<String>,
        channel: impl Into<String>,
        out: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            name: name.into(),
            channels,
            channel: Mutex::new(channel.into()),
            roster: Mutex::new(BTreeSet::new()),
            out: Mutex::new(out),
            connected: AtomicBool::new(true),
        }
    }

    pub fn current_channel(&self) -> String {
        self.channel
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn join(&self, participant: &str) {
        if let Ok(mut roster) = self.roster.lock() {
            if roster.insert(participant.to_string()) {
                info!("{} joined ({} present)", participant, roster.len());
            }
        }
    }

    pub fn leave(&self, participant: &str) {
        if let Ok(mut roster) = self.roster.lock() {
            if roster.remove(participant) {
                info!("{} left ({} present)", participant, roster.len());
            }
        }
    }

    /// Feed stdin-style lines into the session until input ends or the
    /// session goes away
    pub async fn pump<R>(self: Arc<Self>, reader: R, events: EventSender)
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    warn!("Failed to read input: {}", e);
                    break;
                }
            };
            if !self.is_connected() {
                return;
            }

            let delivered = match ConsoleInput::parse(&line) {
                Some(ConsoleInput::Join(name)) => {
                    self.join(&name);
                    true
                }
                Some(ConsoleInput::Leave(name)) => {
                    self.leave(&name);
                    true
                }
                Some(ConsoleInput::Message { sender, text }) => {
                    self.join(&sender);
                    events.message(sender, text)
                }
                None => {
                    debug!("Ignoring input line {:?}", line);
                    true
                }
            };
            if !delivered {
                return;
            }
        }

        debug!("Input closed");
        events.close();
    }

    fn print(&self, line: &str) {
        let Ok(mut out) = self.out.lock() else {
            return;
        };
        if let Err(e) = writeln!(out, "{}", line).and_then(|()| out.flush()) {
            warn!("Failed to write output: {}", e);
        }
    }
}

impl Transport for ConsoleTransport {
    fn send_to_channel(&self, text: &str) {
        self.print(&format!("[{}] {}: {}", self.current_channel(), self.name, text));
    }

    fn send_to_user(&self, participant: &str, text: &str) {
        self.print(&format!("[to {}] {}: {}", participant, self.name, text));
    }

    fn participant_count(&self) -> usize {
        self.roster.lock().map(|r| r.len()).unwrap_or_default()
    }

    fn channel_exists(&self, channel: &str) -> bool {
        self.channels.iter().any(|c| c == channel)
    }

    fn move_to(&self, channel: &str) -> Result<()> {
        let mut current = self
            .channel
            .lock()
            .map_err(|_| ChorusError::Transport("channel state poisoned".to_string()))?;
        *current = channel.to_string();
        drop(current);

        info!("Moved to {}", channel);
        self.send_to_channel(&format!("{} has joined {}.", self.name, channel));
        Ok(())
    }

    fn disconnect(&self) -> Result<()> {
        if self.connected.swap(false, Ordering::SeqCst) {
            info!("Disconnected from {}", self.current_channel());
        }
        Ok(())
    }
}
