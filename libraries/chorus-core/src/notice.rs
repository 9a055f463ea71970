//! Participant-facing notices
//!
//! Every response the session sends is one of these short templates, either
//! whispered to one participant or broadcast to the channel.

use crate::error::ChorusError;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    // Private replies
    NoPermission,
    NoPlaylistPermission,
    CommandDoesNotExist,
    NoArgument,
    InvalidUrl,
    AudioFailed { title: String },
    PlaylistFailed { id: String },
    NothingPlaying,
    NoPlaylistPlaying,
    AlreadyVoted,
    ChannelDoesNotExist,
    MoveFailed { channel: String },
    ConfigReloaded,
    VolumeOutOfRange { lowest: f32, highest: f32 },

    // Broadcasts
    TrackAdded { submitter: String, title: String },
    PlaylistAdded { submitter: String, title: String, tracks: usize },
    NowPlaying { title: String, submitter: String },
    SkipVoteAdded { voter: String },
    PlaylistSkipVoteAdded { voter: String },
    TrackSkipped,
    PlaylistSkipped,
    AdminTrackSkip,
    AdminPlaylistSkip,
    CurrentVolume { level: f32 },
    VolumeChanged { who: String, level: f32 },
    QueueReset { who: String },
}

impl Notice {
    /// Reply for an error that is reported back to the participant
    ///
    /// Returns `None` for errors that are logged rather than reported.
    pub fn for_error(err: &ChorusError) -> Option<Notice> {
        let notice = match err {
            ChorusError::InvalidUrl(_) => Notice::InvalidUrl,
            ChorusError::MissingArgument(_) => Notice::NoArgument,
            ChorusError::VolumeOutOfRange { lowest, highest } => Notice::VolumeOutOfRange {
                lowest: *lowest,
                highest: *highest,
            },
            ChorusError::UnknownChannel(_) => Notice::ChannelDoesNotExist,
            ChorusError::MoveFailed(channel) => Notice::MoveFailed {
                channel: channel.clone(),
            },
            ChorusError::PermissionDenied => Notice::NoPermission,
            ChorusError::PlaylistPermissionDenied => Notice::NoPlaylistPermission,
            ChorusError::AlreadyVoted(_) => Notice::AlreadyVoted,
            ChorusError::NothingPlaying => Notice::NothingPlaying,
            ChorusError::NoPlaylistPlaying => Notice::NoPlaylistPlaying,
            _ => return None,
        };
        Some(notice)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::NoPermission => write!(f, "You do not have permission to use that command."),
            Notice::NoPlaylistPermission => {
                write!(f, "You do not have permission to add playlists.")
            }
            Notice::CommandDoesNotExist => write!(f, "The command you entered does not exist."),
            Notice::NoArgument => write!(f, "The command you issued requires an argument."),
            Notice::InvalidUrl => write!(f, "The URL you submitted does not match a known format."),
            Notice::AudioFailed { title } => {
                write!(f, "The audio download for \"{}\" failed.", title)
            }
            Notice::PlaylistFailed { id } => write!(f, "The playlist {} could not be loaded.", id),
            Notice::NothingPlaying => write!(f, "There is no audio playing at the moment."),
            Notice::NoPlaylistPlaying => write!(f, "The current item is not a playlist."),
            Notice::AlreadyVoted => write!(f, "You have already voted to skip this."),
            Notice::ChannelDoesNotExist => {
                write!(f, "The channel you specified does not exist.")
            }
            Notice::MoveFailed { channel } => {
                write!(f, "The bot could not move to the channel {}.", channel)
            }
            Notice::ConfigReloaded => write!(f, "The configuration has been reloaded."),
            Notice::VolumeOutOfRange { lowest, highest } => write!(
                f,
                "The volume you supplied is not in the allowed range ({:.2} - {:.2}).",
                lowest, highest
            ),
            Notice::TrackAdded { submitter, title } => {
                write!(f, "{} has added \"{}\" to the queue.", submitter, title)
            }
            Notice::PlaylistAdded {
                submitter,
                title,
                tracks,
            } => write!(
                f,
                "{} has added the playlist \"{}\" ({} tracks) to the queue.",
                submitter, title, tracks
            ),
            Notice::NowPlaying { title, submitter } => {
                write!(f, "Now playing \"{}\", added by {}.", title, submitter)
            }
            Notice::SkipVoteAdded { voter } => write!(f, "{} has voted to skip this track.", voter),
            Notice::PlaylistSkipVoteAdded { voter } => {
                write!(f, "{} has voted to skip the current playlist.", voter)
            }
            Notice::TrackSkipped => write!(
                f,
                "The number of votes required for a skip has been met. Skipping track!"
            ),
            Notice::PlaylistSkipped => write!(
                f,
                "The number of votes required for a skip has been met. Skipping playlist!"
            ),
            Notice::AdminTrackSkip => write!(f, "An admin has decided to skip the current track."),
            Notice::AdminPlaylistSkip => {
                write!(f, "An admin has decided to skip the current playlist.")
            }
            Notice::CurrentVolume { level } => write!(f, "The current volume is {:.2}.", level),
            Notice::VolumeChanged { who, level } => {
                write!(f, "{} has changed the volume to {:.2}.", who, level)
            }
            Notice::QueueReset { who } => write!(f, "{} has cleared the queue.", who),
        }
    }
}
