use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{
    bandwidth::BandwidthEstimator,
    pruner::Pruner,
    record::{MediaInfo, PlaybackEvent, SessionRecord, UserInfo},
    snapshot::{RegistrySnapshot, SessionView},
    state::{PlaybackState, Transition},
};
use crate::configs::SessionsConfig;

/// What a single [`SessionRegistry::update`] did to its record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// The session had no record before this event.
    pub created: bool,
    /// This event was the session's first ever entry into PLAYING.
    pub first_play: bool,
    /// Length of the PLAYING interval closed by this event, if any.
    pub flattened: Option<Duration>,
}

#[derive(Debug, Default)]
struct RegistryState {
    sessions: HashMap<String, SessionRecord>,
    bandwidth: BandwidthEstimator,
    plays_total: u64,
}

/// Authoritative map of playback sessions.
///
/// Every operation takes the single state lock for its whole critical section
/// and never calls into another component while holding it.
pub struct SessionRegistry {
    state: Mutex<RegistryState>,
    session_timeout: Duration,
    pruner: Mutex<Option<Pruner>>,
}

impl SessionRegistry {
    /// Creates a registry without a background pruner.
    pub fn new(session_timeout: Duration) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            session_timeout,
            pruner: Mutex::new(None),
        }
    }

    /// Creates a registry and starts its pruner. The pruner stops when
    /// `cancel` fires, when [`SessionRegistry::shutdown`] is called, or when
    /// the registry is dropped.
    pub fn start(config: &SessionsConfig, cancel: &CancellationToken) -> Arc<Self> {
        let registry = Arc::new(Self::new(config.timeout()));
        let pruner = Pruner::spawn(
            Arc::downgrade(&registry),
            config.prune_interval(),
            cancel.child_token(),
        );
        *registry.pruner.lock() = Some(pruner);
        registry
    }

    /// Stops the pruner, letting an in-flight sweep complete.
    pub async fn shutdown(&self) {
        let pruner = self.pruner.lock().take();
        if let Some(pruner) = pruner {
            pruner.stop().await;
        }
    }

    pub fn update(
        &self,
        session_id: &str,
        new_state: PlaybackState,
        user: Option<UserInfo>,
        media: Option<MediaInfo>,
    ) -> UpdateOutcome {
        self.update_at(session_id, new_state, user, media, Instant::now())
    }

    /// Applies one playback event as of `now`.
    pub fn update_at(
        &self,
        session_id: &str,
        new_state: PlaybackState,
        user: Option<UserInfo>,
        media: Option<MediaInfo>,
        now: Instant,
    ) -> UpdateOutcome {
        if session_id.is_empty() {
            warn!("Ignoring {} event without a session id", new_state);
            return UpdateOutcome::default();
        }

        let mut guard = self.state.lock();
        let state = &mut *guard;
        let mut outcome = UpdateOutcome::default();

        let record = state
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                outcome.created = true;
                SessionRecord::new(session_id, now)
            });

        if let Some(user) = user {
            record.user = Some(user);
        }
        if let Some(media) = media {
            record.media = Some(media);
        }

        match Transition::between(record.state, new_state) {
            Transition::LeavePlaying => {
                let elapsed = record.open_interval(now);
                record.accumulated_play += elapsed;
                state.bandwidth.flatten(elapsed, record.bitrate_kbps());
                record.play_started_at = None;
                outcome.flattened = Some(elapsed);
            }
            Transition::EnterPlaying => {
                record.play_started_at = Some(now);
                if record.first_played_at.is_none() {
                    record.first_played_at = Some(now);
                    state.plays_total += 1;
                    outcome.first_play = true;
                }
            }
            Transition::Unchanged => {}
        }

        record.state = new_state;
        record.last_update_at = now;

        outcome
    }

    pub fn apply(&self, event: PlaybackEvent) -> UpdateOutcome {
        self.update(&event.session_id, event.state, event.user, event.media)
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        self.snapshot_at(Instant::now())
    }

    pub fn snapshot_at(&self, now: Instant) -> RegistrySnapshot {
        let state = self.state.lock();

        RegistrySnapshot {
            sessions: state
                .sessions
                .values()
                .map(|record| SessionView::from_record(record, now))
                .collect(),
            estimated_transmitted_bytes: state
                .bandwidth
                .estimate_total(state.sessions.values(), now),
            plays_total: state.plays_total,
        }
    }

    /// Estimated bytes sent to clients so far, in bytes.
    pub fn estimate_total(&self) -> f64 {
        self.estimate_total_at(Instant::now())
    }

    pub fn estimate_total_at(&self, now: Instant) -> f64 {
        let state = self.state.lock();
        state.bandwidth.estimate_total(state.sessions.values(), now)
    }

    /// Removes stopped sessions idle for longer than the session timeout.
    /// Returns how many were removed.
    pub fn prune(&self) -> usize {
        self.prune_at(Instant::now())
    }

    pub fn prune_at(&self, now: Instant) -> usize {
        let mut state = self.state.lock();
        let before = state.sessions.len();
        let timeout = self.session_timeout;

        state.sessions.retain(|id, record| {
            let expired = record.is_expired(now, timeout);
            if expired {
                debug!("[{}] Pruning stopped session", id);
            }
            !expired
        });

        before - state.sessions.len()
    }

    pub fn get(&self, session_id: &str) -> Option<SessionRecord> {
        self.state.lock().sessions.get(session_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
