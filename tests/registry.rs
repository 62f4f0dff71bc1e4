use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use plexporter::{
    configs::SessionsConfig,
    sessions::{KBITS_TO_BYTES, MediaInfo, PlaybackEvent, PlaybackState, SessionRegistry},
};
use tokio_util::sync::CancellationToken;

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

fn media(title: &str, bitrate_kbps: u64) -> MediaInfo {
    MediaInfo {
        media_type: "episode".into(),
        title: title.into(),
        library_section_id: "2".into(),
        bitrate_kbps,
        ..Default::default()
    }
}

#[test]
fn pause_resume_stop_scenario() {
    let registry = SessionRegistry::new(secs(60));
    let t0 = Instant::now();

    let first = registry.update_at("s1", PlaybackState::Playing, None, Some(media("Ep1", 4000)), t0);
    registry.update_at("s1", PlaybackState::Paused, None, None, t0 + secs(30));
    let resumed = registry.update_at("s1", PlaybackState::Playing, None, None, t0 + secs(45));
    registry.update_at("s1", PlaybackState::Stopped, None, None, t0 + secs(100));

    assert!(first.first_play);
    assert!(!resumed.first_play);

    let snapshot = registry.snapshot_at(t0 + secs(100));
    let view = snapshot.session("s1").unwrap();
    assert_eq!(view.play_duration, secs(85));
    assert_eq!(snapshot.plays_total, 1);
    assert_eq!(snapshot.estimated_transmitted_bytes, 85.0 * 4000.0 * KBITS_TO_BYTES);
}

#[test]
fn stopped_event_without_media_keeps_last_known() {
    let registry = SessionRegistry::new(secs(60));

    registry.apply(PlaybackEvent {
        session_id: "s1".into(),
        state: PlaybackState::Playing,
        user: None,
        media: Some(media("Ep1", 4000)),
    });
    registry.apply(PlaybackEvent {
        session_id: "s1".into(),
        state: PlaybackState::Stopped,
        user: None,
        media: None,
    });

    let record = registry.get("s1").unwrap();
    assert_eq!(record.state, PlaybackState::Stopped);
    assert_eq!(record.media.unwrap().title, "Ep1");
}

#[test]
fn estimate_grows_while_playing() {
    let registry = SessionRegistry::new(secs(60));
    let t0 = Instant::now();
    registry.update_at("s1", PlaybackState::Playing, None, Some(media("Ep1", 2000)), t0);

    let early = registry.estimate_total_at(t0 + secs(10));
    let late = registry.estimate_total_at(t0 + secs(40));

    assert_eq!(late - early, 30.0 * 2000.0 * KBITS_TO_BYTES);
}

#[test]
fn concurrent_updates_and_snapshots() {
    const WRITERS: usize = 8;
    const SESSIONS_PER_WRITER: usize = 50;

    let registry = Arc::new(SessionRegistry::new(secs(60)));

    thread::scope(|scope| {
        for writer in 0..WRITERS {
            let registry = registry.clone();
            scope.spawn(move || {
                for n in 0..SESSIONS_PER_WRITER {
                    let id = format!("w{}-{}", writer, n);
                    registry.update(&id, PlaybackState::Playing, None, Some(media("Ep", 1000)));
                    registry.update(&id, PlaybackState::Paused, None, None);
                }
            });
        }

        for _ in 0..4 {
            let registry = registry.clone();
            scope.spawn(move || {
                for _ in 0..100 {
                    let snapshot = registry.snapshot();
                    // Every session is written Playing then Paused, so the
                    // counter can never trail the number of records seen.
                    assert!(snapshot.plays_total as usize >= snapshot.sessions.len());
                    assert!(snapshot.played().count() == snapshot.sessions.len());
                }
            });
        }
    });

    let snapshot = registry.snapshot();
    assert_eq!(snapshot.sessions.len(), WRITERS * SESSIONS_PER_WRITER);
    assert_eq!(snapshot.plays_total as usize, WRITERS * SESSIONS_PER_WRITER);
    assert!(
        snapshot
            .sessions
            .iter()
            .all(|s| s.state == PlaybackState::Paused)
    );
}

#[tokio::test]
async fn background_pruner_evicts_stale_sessions() {
    let cancel = CancellationToken::new();
    let config = SessionsConfig {
        timeout_secs: 0,
        prune_interval_secs: 1,
    };
    let registry = SessionRegistry::start(&config, &cancel);

    registry.update("gone", PlaybackState::Stopped, None, None);
    registry.update("active", PlaybackState::Paused, None, None);

    tokio::time::sleep(Duration::from_millis(1500)).await;

    assert!(registry.get("gone").is_none());
    assert!(registry.get("active").is_some());

    cancel.cancel();
    registry.shutdown().await;
}
