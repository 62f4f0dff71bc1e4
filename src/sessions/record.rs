use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use super::state::PlaybackState;

const MEDIA_TYPE_EPISODE: &str = "episode";
const MEDIA_TYPE_TRACK: &str = "track";

/// Identity of the account driving a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: String,
    pub display_name: String,
}

/// Last-known description of what a session is playing and how it is streamed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInfo {
    /// Upstream media type (`movie`, `episode`, `track`, ...).
    pub media_type: String,
    pub title: String,
    /// Season for episodes, album for tracks.
    pub parent_title: String,
    /// Series for episodes, artist for tracks.
    pub grandparent_title: String,
    pub library_section_id: String,
    /// Bitrate of the delivered stream in kilobits per second.
    pub bitrate_kbps: u64,
    pub stream_resolution: String,
    pub file_resolution: String,
    /// Delivery method: `directplay`, `copy` or `transcode`.
    pub stream_decision: String,
    pub device_name: String,
    pub device_type: String,
}

/// Title hierarchy used as metric labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleLabels {
    pub title: String,
    pub child_title: String,
    pub grandchild_title: String,
}

impl MediaInfo {
    /// Episodes and tracks are reported top-down (series/season/episode,
    /// artist/album/track); everything else is a single title.
    pub fn title_labels(&self) -> TitleLabels {
        match self.media_type.as_str() {
            MEDIA_TYPE_EPISODE | MEDIA_TYPE_TRACK => TitleLabels {
                title: self.grandparent_title.clone(),
                child_title: self.parent_title.clone(),
                grandchild_title: self.title.clone(),
            },
            _ => TitleLabels {
                title: self.title.clone(),
                ..Default::default()
            },
        }
    }
}

/// One decoded playback state change, as fed to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackEvent {
    pub session_id: String,
    pub state: PlaybackState,
    pub user: Option<UserInfo>,
    pub media: Option<MediaInfo>,
}

/// Registry entry for one playback session.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub id: String,
    pub state: PlaybackState,
    pub user: Option<UserInfo>,
    pub media: Option<MediaInfo>,
    pub last_update_at: Instant,
    /// Start of the open PLAYING interval. `Some` iff `state` is PLAYING.
    pub play_started_at: Option<Instant>,
    /// First time this session ever entered PLAYING.
    pub first_played_at: Option<Instant>,
    /// Sum of all completed PLAYING intervals.
    pub accumulated_play: Duration,
}

impl SessionRecord {
    pub fn new(id: impl Into<String>, now: Instant) -> Self {
        Self {
            id: id.into(),
            state: PlaybackState::default(),
            user: None,
            media: None,
            last_update_at: now,
            play_started_at: None,
            first_played_at: None,
            accumulated_play: Duration::ZERO,
        }
    }

    pub fn bitrate_kbps(&self) -> u64 {
        self.media.as_ref().map(|m| m.bitrate_kbps).unwrap_or(0)
    }

    pub fn has_played(&self) -> bool {
        self.first_played_at.is_some()
    }

    /// Elapsed time of the open PLAYING interval, zero when not playing.
    pub fn open_interval(&self, now: Instant) -> Duration {
        self.play_started_at
            .map(|started| now.saturating_duration_since(started))
            .unwrap_or_default()
    }

    /// Completed intervals plus the open one.
    pub fn total_play(&self, now: Instant) -> Duration {
        self.accumulated_play + self.open_interval(now)
    }

    pub fn is_expired(&self, now: Instant, timeout: Duration) -> bool {
        self.state == PlaybackState::Stopped
            && now.saturating_duration_since(self.last_update_at) > timeout
    }
}
