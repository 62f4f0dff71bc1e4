use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Playback phase of a session as reported by the media server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Playing,
    Paused,
    Buffering,
    /// Zero value for a freshly created record.
    #[default]
    Stopped,
}

impl PlaybackState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Buffering => "buffering",
            Self::Stopped => "stopped",
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlaybackState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "playing" => Ok(Self::Playing),
            "paused" => Ok(Self::Paused),
            "buffering" => Ok(Self::Buffering),
            "stopped" => Ok(Self::Stopped),
            other => Err(other.to_string()),
        }
    }
}

/// Accounting effect of moving from one state to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// An open PLAYING interval ends and must be flattened.
    LeavePlaying,
    /// A new PLAYING interval opens.
    EnterPlaying,
    /// No interval boundary is crossed.
    Unchanged,
}

impl Transition {
    pub fn between(previous: PlaybackState, next: PlaybackState) -> Self {
        match (previous.is_playing(), next.is_playing()) {
            (true, false) => Self::LeavePlaying,
            (false, true) => Self::EnterPlaying,
            _ => Self::Unchanged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_upstream_strings() {
        assert_eq!("playing".parse(), Ok(PlaybackState::Playing));
        assert_eq!("paused".parse(), Ok(PlaybackState::Paused));
        assert_eq!("buffering".parse(), Ok(PlaybackState::Buffering));
        assert_eq!("stopped".parse(), Ok(PlaybackState::Stopped));
        assert_eq!(
            "rewinding".parse::<PlaybackState>(),
            Err("rewinding".to_string())
        );
    }

    #[test]
    fn transition_table() {
        use PlaybackState::*;

        for prev in [Paused, Buffering, Stopped] {
            assert_eq!(Transition::between(prev, Playing), Transition::EnterPlaying);
            assert_eq!(Transition::between(Playing, prev), Transition::LeavePlaying);
            for next in [Paused, Buffering, Stopped] {
                assert_eq!(Transition::between(prev, next), Transition::Unchanged);
            }
        }
        assert_eq!(Transition::between(Playing, Playing), Transition::Unchanged);
    }

    #[test]
    fn default_is_stopped() {
        assert_eq!(PlaybackState::default(), PlaybackState::Stopped);
    }
}
