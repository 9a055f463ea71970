//! Submission URL recognition
//!
//! Single-track patterns are tried in order and the first match wins. The
//! playlist pattern is a separate check, only consulted when no track
//! pattern matched.

use crate::error::{ChorusError, Result};
use regex::Regex;

/// Accepted single-track URL shapes, in priority order
pub const DEFAULT_TRACK_PATTERNS: &[&str] = &[
    r"https?://www\.youtube\.com/watch\?v=([\w-]+)",
    r"https?://youtube\.com/watch\?v=([\w-]+)",
    r"https?://youtu.be/([\w-]+)",
    r"https?://youtube.com/v/([\w-]+)",
    r"https?://www.youtube.com/v/([\w-]+)",
];

/// Accepted playlist URL shape
pub const DEFAULT_PLAYLIST_PATTERN: &str = r"https?://www\.youtube\.com/playlist\?list=(\w+)";

/// What a submitted URL refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedUrl {
    Track(String),
    Playlist(String),
}

/// Ordered URL pattern list
#[derive(Debug, Clone)]
pub struct UrlMatcher {
    track_patterns: Vec<Regex>,
    playlist_pattern: Regex,
}

impl UrlMatcher {
    /// Compile a matcher; every pattern needs one capture group for the id
    pub fn new<S: AsRef<str>>(track_patterns: &[S], playlist_pattern: &str) -> Result<Self> {
        let track_patterns = track_patterns
            .iter()
            .map(|p| compile(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            track_patterns,
            playlist_pattern: compile(playlist_pattern)?,
        })
    }

    /// Extract a track id, trying patterns in order
    pub fn match_track(&self, url: &str) -> Option<String> {
        self.track_patterns.iter().find_map(|re| capture(re, url))
    }

    pub fn match_playlist(&self, url: &str) -> Option<String> {
        capture(&self.playlist_pattern, url)
    }

    /// Classify a URL: track patterns first, then the playlist pattern
    pub fn parse(&self, url: &str) -> Result<ParsedUrl> {
        if let Some(id) = self.match_track(url) {
            return Ok(ParsedUrl::Track(id));
        }
        if let Some(id) = self.match_playlist(url) {
            return Ok(ParsedUrl::Playlist(id));
        }
        Err(ChorusError::InvalidUrl(url.to_string()))
    }
}

impl Default for UrlMatcher {
    fn default() -> Self {
        let track_patterns = DEFAULT_TRACK_PATTERNS
            .iter()
            .map(|p| Regex::new(p).expect("built-in track pattern is valid"))
            .collect();

        Self {
            track_patterns,
            playlist_pattern: Regex::new(DEFAULT_PLAYLIST_PATTERN)
                .expect("built-in playlist pattern is valid"),
        }
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    let re = Regex::new(pattern)
        .map_err(|e| ChorusError::Config(format!("bad URL pattern {:?}: {}", pattern, e)))?;
    if re.captures_len() < 2 {
        return Err(ChorusError::Config(format!(
            "URL pattern {:?} has no capture group",
            pattern
        )));
    }
    Ok(re)
}

fn capture(re: &Regex, url: &str) -> Option<String> {
    re.captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|id| !id.is_empty())
}
