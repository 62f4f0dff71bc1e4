use tracing::info;

use super::{
    client::PlexClient,
    models::{Envelope, Metadata, MetadataContainer, PlaySessionStateNotification},
};
use crate::{
    common::{PlexError, PlexResult},
    sessions::{MediaInfo, PlaybackEvent, PlaybackState, UserInfo},
};

const SESSIONS_PATH: &str = "/status/sessions";

/// Resolves raw play-state notifications into [`PlaybackEvent`]s by looking
/// up the acting user and the item being played.
pub struct NotificationDecoder {
    client: PlexClient,
}

impl NotificationDecoder {
    pub fn new(client: PlexClient) -> Self {
        Self { client }
    }

    /// Decodes a batch of notifications from one websocket frame. Active
    /// sessions are fetched at most once per batch. Each entry succeeds or
    /// fails on its own.
    pub async fn decode_all(
        &self,
        notifications: &[PlaySessionStateNotification],
    ) -> Vec<PlexResult<PlaybackEvent>> {
        let needs_sessions = notifications
            .iter()
            .any(|n| n.state != PlaybackState::Stopped.as_str());

        let sessions = if needs_sessions {
            Some(self.fetch_sessions().await)
        } else {
            None
        };

        let mut events = Vec::with_capacity(notifications.len());
        for notification in notifications {
            let event = match &sessions {
                Some(Err(e)) if notification.state != PlaybackState::Stopped.as_str() => {
                    Err(PlexError::SessionsUnavailable(e.to_string()))
                }
                Some(Ok(active)) => self.decode(notification, active).await,
                _ => self.decode(notification, &[]).await,
            };
            events.push(event);
        }
        events
    }

    async fn fetch_sessions(&self) -> PlexResult<Vec<Metadata>> {
        let sessions: Envelope<MetadataContainer> = self.client.get(SESSIONS_PATH).await?;
        Ok(sessions.media_container.metadata)
    }

    async fn fetch_metadata(&self, rating_key: &str) -> PlexResult<Metadata> {
        let path = format!("/library/metadata/{}", rating_key);
        let metadata: Envelope<MetadataContainer> = match self.client.get(&path).await {
            Err(PlexError::NotFound) => {
                return Err(PlexError::MissingMetadata(rating_key.to_string()));
            }
            other => other?,
        };

        metadata
            .media_container
            .metadata
            .into_iter()
            .next()
            .ok_or_else(|| PlexError::MissingMetadata(rating_key.to_string()))
    }

    async fn decode(
        &self,
        notification: &PlaySessionStateNotification,
        active_sessions: &[Metadata],
    ) -> PlexResult<PlaybackEvent> {
        let state: PlaybackState = notification
            .state
            .parse()
            .map_err(PlexError::UnknownState)?;

        // A stopped session is gone from the server, nothing left to look up.
        if state == PlaybackState::Stopped {
            return Ok(PlaybackEvent {
                session_id: notification.session_key.clone(),
                state,
                user: None,
                media: None,
            });
        }

        let session = active_sessions
            .iter()
            .find(|s| s.session_key == notification.session_key)
            .ok_or_else(|| PlexError::MissingSession(notification.session_key.clone()))?;
        let item = self.fetch_metadata(&notification.rating_key).await?;

        let event = build_event(notification, state, session, &item);
        info!(
            "[{}] {} user='{}' media='{}' offset={}ms",
            event.session_id,
            state,
            session.user.as_ref().map(|u| u.title.as_str()).unwrap_or(""),
            item.title,
            notification.view_offset
        );
        Ok(event)
    }
}

/// Combines the live session (stream details, user, device) with the library
/// item (titles, source file) into one event.
pub fn build_event(
    notification: &PlaySessionStateNotification,
    state: PlaybackState,
    session: &Metadata,
    item: &Metadata,
) -> PlaybackEvent {
    let stream = session.first_media();

    let user = session.user.as_ref().map(|u| UserInfo {
        id: u.id.clone(),
        display_name: u.title.clone(),
    });

    let media = MediaInfo {
        media_type: item.media_type.clone(),
        title: item.title.clone(),
        parent_title: item.parent_title.clone(),
        grandparent_title: item.grandparent_title.clone(),
        library_section_id: if item.library_section_id.is_empty() {
            session.library_section_id.clone()
        } else {
            item.library_section_id.clone()
        },
        bitrate_kbps: stream.map(|m| m.bitrate).unwrap_or(0),
        stream_resolution: stream.map(|m| m.video_resolution.clone()).unwrap_or_default(),
        file_resolution: item
            .first_media()
            .map(|m| m.video_resolution.clone())
            .unwrap_or_default(),
        stream_decision: stream
            .and_then(|m| m.parts.first())
            .map(|p| p.decision.clone())
            .unwrap_or_default(),
        device_name: session.player.as_ref().map(|p| p.device.clone()).unwrap_or_default(),
        device_type: session.player.as_ref().map(|p| p.product.clone()).unwrap_or_default(),
    };

    PlaybackEvent {
        session_id: notification.session_key.clone(),
        state,
        user,
        media: Some(media),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plex::models::{MediaPart, MediaVersion, SessionPlayer, SessionUser};

    fn notification(state: &str) -> PlaySessionStateNotification {
        PlaySessionStateNotification {
            session_key: "7".into(),
            rating_key: "1234".into(),
            state: state.into(),
            view_offset: 0,
        }
    }

    fn session() -> Metadata {
        Metadata {
            session_key: "7".into(),
            library_section_id: "2".into(),
            user: Some(SessionUser {
                id: "1".into(),
                title: "alice".into(),
            }),
            player: Some(SessionPlayer {
                device: "iPhone".into(),
                product: "Plex for iOS".into(),
            }),
            media: vec![MediaVersion {
                bitrate: 4000,
                video_resolution: "720".into(),
                parts: vec![MediaPart {
                    decision: "transcode".into(),
                }],
            }],
            ..Default::default()
        }
    }

    fn item() -> Metadata {
        Metadata {
            rating_key: "1234".into(),
            media_type: "episode".into(),
            title: "Pilot".into(),
            parent_title: "Season 1".into(),
            grandparent_title: "Breaking Bad".into(),
            media: vec![MediaVersion {
                bitrate: 10000,
                video_resolution: "1080".into(),
                parts: Vec::new(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn merges_session_and_item() {
        let event = build_event(&notification("playing"), PlaybackState::Playing, &session(), &item());

        assert_eq!(event.session_id, "7");
        assert_eq!(event.state, PlaybackState::Playing);
        assert_eq!(
            event.user,
            Some(UserInfo {
                id: "1".into(),
                display_name: "alice".into()
            })
        );

        let media = event.media.unwrap();
        assert_eq!(media.title, "Pilot");
        assert_eq!(media.grandparent_title, "Breaking Bad");
        assert_eq!(media.library_section_id, "2");
        assert_eq!(media.bitrate_kbps, 4000);
        assert_eq!(media.stream_resolution, "720");
        assert_eq!(media.file_resolution, "1080");
        assert_eq!(media.stream_decision, "transcode");
        assert_eq!(media.device_name, "iPhone");
        assert_eq!(media.device_type, "Plex for iOS");
    }

    #[test]
    fn tolerates_missing_stream_details() {
        let bare = Metadata {
            session_key: "7".into(),
            ..Default::default()
        };

        let event = build_event(&notification("paused"), PlaybackState::Paused, &bare, &Metadata::default());

        assert_eq!(event.user, None);
        let media = event.media.unwrap();
        assert_eq!(media.bitrate_kbps, 0);
        assert!(media.stream_decision.is_empty());
        assert!(media.device_name.is_empty());
    }
}
