use std::time::{Duration, Instant};

use super::{
    record::{MediaInfo, SessionRecord, UserInfo},
    state::PlaybackState,
};

/// Owned copy of one record, taken under the registry lock.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub id: String,
    pub state: PlaybackState,
    pub user: Option<UserInfo>,
    pub media: Option<MediaInfo>,
    pub has_played: bool,
    /// Completed intervals plus the open one at snapshot time.
    pub play_duration: Duration,
}

impl SessionView {
    pub(crate) fn from_record(record: &SessionRecord, now: Instant) -> Self {
        Self {
            id: record.id.clone(),
            state: record.state,
            user: record.user.clone(),
            media: record.media.clone(),
            has_played: record.has_played(),
            play_duration: record.total_play(now),
        }
    }
}

/// Point-in-time view of the registry. Detached from the lock, so callers can
/// format it and call other components freely.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    pub sessions: Vec<SessionView>,
    pub estimated_transmitted_bytes: f64,
    /// Sessions that have ever entered PLAYING.
    pub plays_total: u64,
}

impl RegistrySnapshot {
    pub fn session(&self, id: &str) -> Option<&SessionView> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Sessions that should produce play observations.
    pub fn played(&self) -> impl Iterator<Item = &SessionView> {
        self.sessions.iter().filter(|s| s.has_played)
    }
}
