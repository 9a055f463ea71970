//! Chorus Bot Library
//!
//! Console front end for a chorus listening session: configuration loading,
//! the yt-dlp fetcher, the external player backend and the media cache.
//!
//! This library exposes the components for testing purposes.

pub mod bot;
pub mod config;
pub mod error;
pub mod services;

// Re-export commonly used types for convenience
pub use bot::Bot;
pub use config::BotConfig;
pub use error::{BotError, Result};
pub use services::{CacheDirectory, ConsoleTransport, FileSettings, ProcessPlayer, YtDlpFetcher};
