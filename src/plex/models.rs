//! Shapes of the JSON payloads returned by the media server. Only the fields
//! the exporter reads are modelled; everything else is ignored.

use serde::{Deserialize, Deserializer};

/// Accepts a JSON string or number and yields it as a string. The server is
/// inconsistent about how it encodes numeric identifiers.
pub fn deserialize_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value: serde_json::Value = Deserialize::deserialize(deserializer)?;
    match value {
        serde_json::Value::Null => Ok(String::new()),
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        _ => Err(serde::de::Error::custom("expected string or number")),
    }
}

#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(rename = "MediaContainer")]
    pub media_container: T,
}

// --- /media/providers ---

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvidersContainer {
    #[serde(default)]
    pub friendly_name: String,
    #[serde(default)]
    pub machine_identifier: String,
    #[serde(default)]
    pub version: String,
    #[serde(rename = "MediaProvider", default)]
    pub media_providers: Vec<MediaProvider>,
}

#[derive(Debug, Deserialize)]
pub struct MediaProvider {
    #[serde(default)]
    pub identifier: String,
    #[serde(rename = "Feature", default)]
    pub features: Vec<ProviderFeature>,
}

#[derive(Debug, Deserialize)]
pub struct ProviderFeature {
    #[serde(rename = "type", default)]
    pub feature_type: String,
    #[serde(rename = "Directory", default)]
    pub directories: Vec<ProviderDirectory>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDirectory {
    #[serde(rename = "id", default, deserialize_with = "deserialize_string_or_number")]
    pub identifier: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub directory_type: String,
    #[serde(default)]
    pub duration_total: i64,
    #[serde(default)]
    pub storage_total: i64,
}

// --- /statistics/* ---

#[derive(Debug, Default, Deserialize)]
pub struct ResourcesContainer {
    #[serde(rename = "StatisticsResources", default)]
    pub statistics_resources: Vec<StatisticsResources>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsResources {
    pub at: i64,
    #[serde(rename = "hostCpuUtilization", default)]
    pub host_cpu_util: f64,
    #[serde(rename = "hostMemoryUtilization", default)]
    pub host_mem_util: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct BandwidthContainer {
    #[serde(rename = "StatisticsBandwidth", default)]
    pub statistics_bandwidth: Vec<StatisticsBandwidth>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatisticsBandwidth {
    pub at: i64,
    #[serde(default)]
    pub lan: bool,
    #[serde(default)]
    pub bytes: i64,
}

// --- /status/sessions and /library/metadata/{key} ---

#[derive(Debug, Default, Deserialize)]
pub struct MetadataContainer {
    #[serde(rename = "Metadata", default)]
    pub metadata: Vec<Metadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default, deserialize_with = "deserialize_string_or_number")]
    pub session_key: String,
    #[serde(default, deserialize_with = "deserialize_string_or_number")]
    pub rating_key: String,
    #[serde(rename = "type", default)]
    pub media_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub parent_title: String,
    #[serde(default)]
    pub grandparent_title: String,
    #[serde(
        rename = "librarySectionID",
        default,
        deserialize_with = "deserialize_string_or_number"
    )]
    pub library_section_id: String,
    #[serde(rename = "User")]
    pub user: Option<SessionUser>,
    #[serde(rename = "Player")]
    pub player: Option<SessionPlayer>,
    #[serde(rename = "Media", default)]
    pub media: Vec<MediaVersion>,
}

impl Metadata {
    pub fn first_media(&self) -> Option<&MediaVersion> {
        self.media.first()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionUser {
    #[serde(default, deserialize_with = "deserialize_string_or_number")]
    pub id: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionPlayer {
    #[serde(default)]
    pub device: String,
    #[serde(default)]
    pub product: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaVersion {
    #[serde(default)]
    pub bitrate: u64,
    #[serde(default, deserialize_with = "deserialize_string_or_number")]
    pub video_resolution: String,
    #[serde(rename = "Part", default)]
    pub parts: Vec<MediaPart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaPart {
    #[serde(default)]
    pub decision: String,
}

// --- websocket notifications ---

#[derive(Debug, Deserialize)]
pub struct NotificationEnvelope {
    #[serde(rename = "NotificationContainer")]
    pub notification_container: NotificationContainer,
}

#[derive(Debug, Default, Deserialize)]
pub struct NotificationContainer {
    #[serde(rename = "type", default)]
    pub notification_type: String,
    #[serde(rename = "PlaySessionStateNotification", default)]
    pub play_session_state_notifications: Vec<PlaySessionStateNotification>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaySessionStateNotification {
    #[serde(default, deserialize_with = "deserialize_string_or_number")]
    pub session_key: String,
    #[serde(default, deserialize_with = "deserialize_string_or_number")]
    pub rating_key: String,
    #[serde(default)]
    pub state: String,
    /// Playback position in milliseconds.
    #[serde(default)]
    pub view_offset: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_session_with_numeric_ids() {
        let json = r#"{
            "MediaContainer": {
                "size": 1,
                "Metadata": [{
                    "sessionKey": "7",
                    "ratingKey": 1234,
                    "type": "episode",
                    "title": "Pilot",
                    "parentTitle": "Season 1",
                    "grandparentTitle": "Breaking Bad",
                    "librarySectionID": 2,
                    "User": { "id": "1", "title": "alice" },
                    "Player": { "device": "iPhone", "product": "Plex for iOS" },
                    "Media": [{ "bitrate": 4000, "videoResolution": 1080, "Part": [{ "decision": "transcode" }] }]
                }]
            }
        }"#;

        let envelope: Envelope<MetadataContainer> = serde_json::from_str(json).unwrap();
        let item = &envelope.media_container.metadata[0];

        assert_eq!(item.session_key, "7");
        assert_eq!(item.rating_key, "1234");
        assert_eq!(item.library_section_id, "2");
        assert_eq!(item.user.as_ref().unwrap().title, "alice");
        let media = item.first_media().unwrap();
        assert_eq!(media.bitrate, 4000);
        assert_eq!(media.video_resolution, "1080");
        assert_eq!(media.parts[0].decision, "transcode");
    }

    #[test]
    fn decodes_notification() {
        let json = r#"{
            "NotificationContainer": {
                "type": "playing",
                "size": 1,
                "PlaySessionStateNotification": [{
                    "sessionKey": "7",
                    "ratingKey": "1234",
                    "state": "paused",
                    "viewOffset": 60000
                }]
            }
        }"#;

        let envelope: NotificationEnvelope = serde_json::from_str(json).unwrap();
        let container = envelope.notification_container;

        assert_eq!(container.notification_type, "playing");
        assert_eq!(container.play_session_state_notifications[0].state, "paused");
        assert_eq!(container.play_session_state_notifications[0].view_offset, 60000);
    }

    #[test]
    fn other_notification_types_have_no_play_states() {
        let json = r#"{"NotificationContainer": {"type": "activity", "size": 1, "ActivityNotification": []}}"#;

        let envelope: NotificationEnvelope = serde_json::from_str(json).unwrap();
        assert!(envelope.notification_container.play_session_state_notifications.is_empty());
    }
}
