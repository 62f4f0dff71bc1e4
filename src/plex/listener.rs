use std::sync::Arc;

use futures::StreamExt;
use reqwest::Url;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{
    backoff::Backoff,
    decoder::NotificationDecoder,
    models::{NotificationEnvelope, PlaySessionStateNotification},
    server::PlexServer,
};
use crate::{common::PlexResult, sessions::SessionRegistry};

const PLAYING_NOTIFICATION: &str = "playing";

enum StreamOutcome {
    Shutdown,
    Reconnect,
}

/// Subscribes to the server's notification websocket and feeds decoded
/// playback events into the session registry.
pub struct PlexListener {
    server: Arc<PlexServer>,
    registry: Arc<SessionRegistry>,
    decoder: NotificationDecoder,
}

impl PlexListener {
    pub fn new(server: Arc<PlexServer>, registry: Arc<SessionRegistry>) -> Self {
        let decoder = NotificationDecoder::new(server.client().clone());
        Self {
            server,
            registry,
            decoder,
        }
    }

    /// Listens until `cancel_token` fires, reconnecting on connection loss.
    /// Only one listener may run per server at a time.
    pub async fn run(&self, cancel_token: CancellationToken) -> PlexResult<()> {
        self.server.claim_listener()?;

        let result = match self.server.client().notifications_url() {
            Ok(url) => {
                self.listen(&url, &cancel_token).await;
                Ok(())
            }
            Err(e) => Err(e),
        };

        self.server.release_listener();
        result
    }

    async fn listen(&self, url: &Url, cancel_token: &CancellationToken) {
        let host = url.host_str().unwrap_or_default().to_string();
        let mut backoff = Backoff::new();

        loop {
            if cancel_token.is_cancelled() {
                break;
            }

            match self.connect(url, &host, cancel_token, &mut backoff).await {
                Ok(StreamOutcome::Shutdown) => break,
                Ok(StreamOutcome::Reconnect) => {}
                Err(e) => warn!("[{}] Notification stream error: {}", host, e),
            }

            let delay = backoff.next();
            info!(
                "[{}] Reconnecting to notification stream in {:?} (attempt {})",
                host,
                delay,
                backoff.attempt()
            );

            tokio::select! {
                _ = cancel_token.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!("[{}] Notification listener stopped", host);
    }

    async fn connect(
        &self,
        url: &Url,
        host: &str,
        cancel_token: &CancellationToken,
        backoff: &mut Backoff,
    ) -> PlexResult<StreamOutcome> {
        debug!("[{}] Connecting to notification stream", host);
        let (mut ws_stream, _) = tokio::select! {
            _ = cancel_token.cancelled() => return Ok(StreamOutcome::Shutdown),
            result = tokio_tungstenite::connect_async(url.as_str()) => result?,
        };

        info!("[{}] Listening for playback notifications", host);
        backoff.reset();

        let outcome = loop {
            tokio::select! {
                _ = cancel_token.cancelled() => break StreamOutcome::Shutdown,
                msg = ws_stream.next() => {
                    let msg = match msg {
                        Some(Ok(msg)) => msg,
                        Some(Err(e)) => {
                            warn!("[{}] WS read error: {}", host, e);
                            break StreamOutcome::Reconnect;
                        }
                        None => {
                            debug!("[{}] WS stream ended", host);
                            break StreamOutcome::Reconnect;
                        }
                    };

                    match msg {
                        Message::Text(text) => self.handle_frame(text.as_str()).await,
                        Message::Close(frame) => {
                            let reason = frame
                                .map(|cf| {
                                    format!("code={}, reason='{}'", u16::from(cf.code), cf.reason)
                                })
                                .unwrap_or_else(|| "no reason".into());
                            info!("[{}] WS closed: {}", host, reason);
                            break StreamOutcome::Reconnect;
                        }
                        _ => {}
                    }
                }
            }
        };

        Ok(outcome)
    }

    async fn handle_frame(&self, text: &str) {
        let notifications = match parse_play_notifications(text) {
            Ok(notifications) => notifications,
            Err(e) => {
                warn!("Ignoring malformed notification: {}", e);
                return;
            }
        };
        if notifications.is_empty() {
            return;
        }

        for event in self.decoder.decode_all(&notifications).await {
            match event {
                Ok(event) => {
                    self.registry.apply(event);
                }
                Err(e) => warn!("Failed to decode playback notification: {}", e),
            }
        }
    }
}

/// Extracts play-state notifications from one websocket frame. Frames of any
/// other notification type yield an empty list.
pub fn parse_play_notifications(
    text: &str,
) -> Result<Vec<PlaySessionStateNotification>, serde_json::Error> {
    let envelope: NotificationEnvelope = serde_json::from_str(text)?;
    let container = envelope.notification_container;

    if container.notification_type != PLAYING_NOTIFICATION {
        return Ok(Vec::new());
    }
    Ok(container.play_session_state_notifications)
}
