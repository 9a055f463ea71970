//! Platform collaborators for the session

pub mod cache;
pub mod fetcher;
pub mod player;
pub mod settings;
pub mod transport;

pub use cache::CacheDirectory;
pub use fetcher::YtDlpFetcher;
pub use player::ProcessPlayer;
pub use settings::FileSettings;
pub use transport::{ConsoleInput, ConsoleTransport};
