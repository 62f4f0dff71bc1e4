use std::sync::Arc;

use prometheus::{
    core::{Collector, Desc},
    proto::{MetricFamily, MetricType},
};
use tracing::debug;

use super::family::{self, Labels};
use crate::{
    plex::{Library, LibraryCatalog, ServerIdentity},
    sessions::{MediaInfo, RegistrySnapshot, SessionRegistry, SessionView},
};

const PLAYS: &str = "plays";
const PLAYS_HELP: &str = "Active or recent playback sessions";
const PLAY_SECONDS: &str = "play_seconds_total";
const PLAY_SECONDS_HELP: &str = "Total seconds spent playing, per session";
const ESTIMATED_TRANSMIT: &str = "estimated_transmit_bytes_total";
const ESTIMATED_TRANSMIT_HELP: &str = "Bytes sent to clients, estimated from stream bitrates";
const PLAYS_TOTAL: &str = "plays_total";
const PLAYS_TOTAL_HELP: &str = "Sessions that started playing since the exporter started";

const PLAY_LABELS: [&str; 15] = [
    "library",
    "library_id",
    "library_type",
    "media_type",
    "title",
    "child_title",
    "grandchild_title",
    "stream_type",
    "stream_resolution",
    "stream_file_resolution",
    "stream_bitrate",
    "device",
    "device_type",
    "user",
    "session",
];

/// Exposes the session registry as Prometheus families at scrape time.
///
/// The registry lock is held only while the snapshot is copied out. Library
/// lookups happen afterwards, against the snapshot.
pub struct SessionCollector {
    registry: Arc<SessionRegistry>,
    catalog: Arc<dyn LibraryCatalog>,
    descs: Vec<Desc>,
}

impl SessionCollector {
    pub fn new(
        registry: Arc<SessionRegistry>,
        catalog: Arc<dyn LibraryCatalog>,
    ) -> prometheus::Result<Self> {
        let descs = vec![
            family::desc(PLAYS, PLAYS_HELP, &PLAY_LABELS)?,
            family::desc(PLAY_SECONDS, PLAY_SECONDS_HELP, &PLAY_LABELS)?,
            family::desc(ESTIMATED_TRANSMIT, ESTIMATED_TRANSMIT_HELP, &[])?,
            family::desc(PLAYS_TOTAL, PLAYS_TOTAL_HELP, &[])?,
        ];

        Ok(Self {
            registry,
            catalog,
            descs,
        })
    }

    /// Builds every family from an already taken snapshot.
    pub fn families(&self, snapshot: &RegistrySnapshot) -> Vec<MetricFamily> {
        let identity = self.catalog.identity();
        let server = family::server_labels(&identity);

        let mut plays = Vec::new();
        let mut play_seconds = Vec::new();

        for view in snapshot.played() {
            let Some(media) = &view.media else {
                continue;
            };
            let Some(library) = self.catalog.lookup_library(&media.library_section_id) else {
                debug!(
                    "[{}] Skipping session, library {} not found",
                    view.id, media.library_section_id
                );
                continue;
            };

            let labels = play_labels(&identity, view, media, &library);
            plays.push(family::gauge(1.0, labels.clone()));
            play_seconds.push(family::counter(view.play_duration.as_secs_f64(), labels));
        }

        vec![
            family::family(PLAYS, PLAYS_HELP, MetricType::GAUGE, plays),
            family::family(PLAY_SECONDS, PLAY_SECONDS_HELP, MetricType::COUNTER, play_seconds),
            family::family(
                ESTIMATED_TRANSMIT,
                ESTIMATED_TRANSMIT_HELP,
                MetricType::COUNTER,
                vec![family::counter(snapshot.estimated_transmitted_bytes, server.clone())],
            ),
            family::family(
                PLAYS_TOTAL,
                PLAYS_TOTAL_HELP,
                MetricType::COUNTER,
                vec![family::counter(snapshot.plays_total as f64, server)],
            ),
        ]
    }
}

fn play_labels(
    identity: &ServerIdentity,
    view: &SessionView,
    media: &MediaInfo,
    library: &Library,
) -> Labels {
    let titles = media.title_labels();
    let user = view
        .user
        .as_ref()
        .map(|u| u.display_name.clone())
        .unwrap_or_default();

    let mut labels = family::server_labels(identity);
    labels.extend([
        ("library", library.name.clone()),
        ("library_id", library.id.clone()),
        ("library_type", library.library_type.clone()),
        ("media_type", media.media_type.clone()),
        ("title", titles.title),
        ("child_title", titles.child_title),
        ("grandchild_title", titles.grandchild_title),
        ("stream_type", media.stream_decision.clone()),
        ("stream_resolution", media.stream_resolution.clone()),
        ("stream_file_resolution", media.file_resolution.clone()),
        ("stream_bitrate", media.bitrate_kbps.to_string()),
        ("device", media.device_name.clone()),
        ("device_type", media.device_type.clone()),
        ("user", user),
        ("session", view.id.clone()),
    ]);
    labels
}

impl Collector for SessionCollector {
    fn desc(&self) -> Vec<&Desc> {
        self.descs.iter().collect()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let snapshot = self.registry.snapshot();
        self.families(&snapshot)
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::sessions::{PlaybackState, UserInfo};

    struct StaticCatalog(Vec<Library>);

    impl LibraryCatalog for StaticCatalog {
        fn identity(&self) -> ServerIdentity {
            ServerIdentity {
                id: "abc123".into(),
                name: "basement".into(),
                version: "1.40.0".into(),
            }
        }

        fn libraries(&self) -> Vec<Library> {
            self.0.clone()
        }
    }

    fn tv_library() -> Library {
        Library {
            id: "2".into(),
            name: "TV Shows".into(),
            library_type: "show".into(),
            duration_total: 0,
            storage_total: 0,
        }
    }

    fn episode(section: &str) -> MediaInfo {
        MediaInfo {
            media_type: "episode".into(),
            title: "Pilot".into(),
            parent_title: "Season 1".into(),
            grandparent_title: "Breaking Bad".into(),
            library_section_id: section.into(),
            bitrate_kbps: 4000,
            stream_decision: "transcode".into(),
            ..Default::default()
        }
    }

    fn label<'a>(family: &'a MetricFamily, index: usize, name: &str) -> &'a str {
        family.get_metric()[index]
            .get_label()
            .iter()
            .find(|l| l.get_name() == name)
            .map(|l| l.get_value())
            .unwrap_or_default()
    }

    fn collector(registry: Arc<SessionRegistry>) -> SessionCollector {
        SessionCollector::new(registry, Arc::new(StaticCatalog(vec![tv_library()]))).unwrap()
    }

    #[test]
    fn emits_played_sessions_with_labels() {
        let registry = Arc::new(SessionRegistry::new(Duration::from_secs(60)));
        let t0 = Instant::now();
        let user = UserInfo {
            id: "1".into(),
            display_name: "alice".into(),
        };
        registry.update_at("s1", PlaybackState::Playing, Some(user), Some(episode("2")), t0);

        let collector = collector(registry.clone());
        let families = collector.families(&registry.snapshot_at(t0 + Duration::from_secs(30)));

        let plays = &families[0];
        assert_eq!(plays.get_name(), "plays");
        assert_eq!(plays.get_metric().len(), 1);
        assert_eq!(plays.get_metric()[0].get_gauge().get_value(), 1.0);
        assert_eq!(label(plays, 0, "server_type"), "plex");
        assert_eq!(label(plays, 0, "server_id"), "abc123");
        assert_eq!(label(plays, 0, "library"), "TV Shows");
        assert_eq!(label(plays, 0, "title"), "Breaking Bad");
        assert_eq!(label(plays, 0, "grandchild_title"), "Pilot");
        assert_eq!(label(plays, 0, "stream_type"), "transcode");
        assert_eq!(label(plays, 0, "stream_bitrate"), "4000");
        assert_eq!(label(plays, 0, "user"), "alice");
        assert_eq!(label(plays, 0, "session"), "s1");

        let seconds = &families[1];
        assert_eq!(seconds.get_metric()[0].get_counter().get_value(), 30.0);

        let plays_total = &families[3];
        assert_eq!(plays_total.get_metric()[0].get_counter().get_value(), 1.0);
    }

    #[test]
    fn skips_unknown_library_and_never_played() {
        let registry = Arc::new(SessionRegistry::new(Duration::from_secs(60)));
        let t0 = Instant::now();
        registry.update_at("orphan", PlaybackState::Playing, None, Some(episode("99")), t0);
        registry.update_at("waiting", PlaybackState::Buffering, None, Some(episode("2")), t0);

        let collector = collector(registry.clone());
        let families = collector.families(&registry.snapshot_at(t0));

        assert!(families[0].get_metric().is_empty());
        assert!(families[1].get_metric().is_empty());
        // The orphan still counts as a play and stays in the registry.
        assert_eq!(families[3].get_metric()[0].get_counter().get_value(), 1.0);
        assert_eq!(registry.len(), 2);
    }
}
