use thiserror::Error;

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Failures talking to the upstream media server.
#[derive(Debug, Error)]
pub enum PlexError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status} for {path}")]
    Status { status: u16, path: String },
    #[error("not found")]
    NotFound,
    #[error("invalid response body: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid url: {0}")]
    Url(String),
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("already listening")]
    AlreadyListening,
    #[error("error fetching sessions: {0}")]
    SessionsUnavailable(String),
    #[error("no active session with key {0}")]
    MissingSession(String),
    #[error("no metadata for rating key {0}")]
    MissingMetadata(String),
    #[error("unknown playback state '{0}'")]
    UnknownState(String),
}

pub type PlexResult<T> = Result<T, PlexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_value() {
        assert_eq!(
            PlexError::UnknownState("rewinding".into()).to_string(),
            "unknown playback state 'rewinding'"
        );
        assert_eq!(
            PlexError::Status {
                status: 500,
                path: "/status/sessions".into()
            }
            .to_string(),
            "unexpected status 500 for /status/sessions"
        );
        assert_eq!(
            ConfigError::Missing("plex.token").to_string(),
            "missing required setting plex.token"
        );
    }
}
