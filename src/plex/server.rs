use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use parking_lot::RwLock;
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{
    client::PlexClient,
    library::{Library, LibraryCatalog, ServerIdentity, is_library_directory_type},
    models::{
        BandwidthContainer, Envelope, ProvidersContainer, ResourcesContainer, StatisticsBandwidth,
        StatisticsResources,
    },
};
use crate::{
    common::{PlexError, PlexResult},
    configs::PlexConfig,
};

const LIBRARY_PROVIDER: &str = "com.plexapp.plugins.library";
const CONTENT_FEATURE: &str = "content";

const PROVIDERS_PATH: &str = "/media/providers?includeStorage=1";
const RESOURCES_PATH: &str = "/statistics/resources?timespan=6";
const BANDWIDTH_PATH: &str = "/statistics/bandwidth?timespan=6";

/// Server-wide statistics exported next to the session metrics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerStats {
    pub identity: ServerIdentity,
    pub libraries: Vec<Library>,
    pub host_cpu_util: Option<f64>,
    pub host_mem_util: Option<f64>,
    /// Bytes reported by the server's own bandwidth statistics since startup.
    pub transmitted_bytes_total: u64,
}

#[derive(Debug, Default)]
struct ServerState {
    stats: ServerStats,
    /// Newest bandwidth sample already counted, in unix seconds.
    last_bandwidth_at: i64,
}

impl ServerState {
    fn apply_providers(&mut self, container: ProvidersContainer) {
        self.stats.identity = ServerIdentity {
            id: container.machine_identifier,
            name: container.friendly_name,
            version: container.version,
        };

        self.stats.libraries = container
            .media_providers
            .into_iter()
            .filter(|p| p.identifier == LIBRARY_PROVIDER)
            .flat_map(|p| p.features)
            .filter(|f| f.feature_type == CONTENT_FEATURE)
            .flat_map(|f| f.directories)
            .filter(|d| is_library_directory_type(&d.directory_type))
            .map(|d| Library {
                id: d.identifier,
                name: d.title,
                library_type: d.directory_type,
                duration_total: d.duration_total,
                storage_total: d.storage_total,
            })
            .collect();
    }

    fn apply_resources(&mut self, samples: &[StatisticsResources]) {
        // Most recent sample is last.
        if let Some(latest) = samples.last() {
            self.stats.host_cpu_util = Some(latest.host_cpu_util);
            self.stats.host_mem_util = Some(latest.host_mem_util);
        }
    }

    /// Counts samples newer than the last one seen. Returns the bytes added.
    fn apply_bandwidth(&mut self, mut samples: Vec<StatisticsBandwidth>) -> u64 {
        samples.sort_by_key(|s| s.at);

        let mut added = 0u64;
        let mut newest = self.last_bandwidth_at;
        for sample in samples.iter().filter(|s| s.at > self.last_bandwidth_at) {
            added += sample.bytes.max(0) as u64;
            newest = newest.max(sample.at);
        }

        self.last_bandwidth_at = newest;
        self.stats.transmitted_bytes_total += added;
        added
    }
}

/// Upstream media server: identity, libraries and server statistics, kept
/// fresh by a background refresh loop.
pub struct PlexServer {
    client: PlexClient,
    state: RwLock<ServerState>,
    listening: AtomicBool,
}

impl PlexServer {
    /// Creates the server handle and performs the initial refresh, which
    /// must succeed.
    pub async fn connect(config: &PlexConfig) -> PlexResult<Self> {
        let server = Self::new(PlexClient::new(config)?);
        server.refresh().await?;
        Ok(server)
    }

    pub fn new(client: PlexClient) -> Self {
        Self {
            client,
            state: RwLock::new(ServerState {
                last_bandwidth_at: crate::common::now_ms() as i64 / 1000,
                ..Default::default()
            }),
            listening: AtomicBool::new(false),
        }
    }

    pub fn client(&self) -> &PlexClient {
        &self.client
    }

    pub fn stats(&self) -> ServerStats {
        self.state.read().stats.clone()
    }

    /// Marks the notification listener as started. Fails if it already was.
    pub(crate) fn claim_listener(&self) -> PlexResult<()> {
        if self.listening.swap(true, Ordering::SeqCst) {
            return Err(PlexError::AlreadyListening);
        }
        Ok(())
    }

    pub(crate) fn release_listener(&self) {
        self.listening.store(false, Ordering::SeqCst);
    }

    /// Fetches identity, libraries and statistics. The state lock is only
    /// taken after each response has arrived.
    pub async fn refresh(&self) -> PlexResult<()> {
        let providers: Envelope<ProvidersContainer> = self.client.get(PROVIDERS_PATH).await?;
        self.state.write().apply_providers(providers.media_container);

        self.refresh_resources().await?;
        self.refresh_bandwidth().await?;
        Ok(())
    }

    async fn refresh_resources(&self) -> PlexResult<()> {
        // Statistics endpoints are a paid feature and may not exist.
        let resources: Envelope<ResourcesContainer> = match self.client.get(RESOURCES_PATH).await {
            Err(PlexError::NotFound) => return Ok(()),
            other => other?,
        };

        self.state
            .write()
            .apply_resources(&resources.media_container.statistics_resources);
        Ok(())
    }

    async fn refresh_bandwidth(&self) -> PlexResult<()> {
        let bandwidth: Envelope<BandwidthContainer> = match self.client.get(BANDWIDTH_PATH).await {
            Err(PlexError::NotFound) => return Ok(()),
            other => other?,
        };

        let added = self
            .state
            .write()
            .apply_bandwidth(bandwidth.media_container.statistics_bandwidth);
        if added > 0 {
            debug!("Recorded {} transmitted bytes from server statistics", added);
        }
        Ok(())
    }

    /// Refreshes every `interval` until `cancel_token` fires. Failures are
    /// logged and retried on the next tick.
    pub fn spawn_refresh(
        self: Arc<Self>,
        interval: Duration,
        cancel_token: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.tick().await;

            loop {
                tokio::select! {
                    biased;
                    _ = cancel_token.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = self.refresh().await {
                            warn!("Failed to refresh server statistics: {}", e);
                        }
                    }
                }
            }

            info!("Server refresh loop stopped");
        })
    }
}

impl LibraryCatalog for PlexServer {
    fn identity(&self) -> ServerIdentity {
        self.state.read().stats.identity.clone()
    }

    fn libraries(&self) -> Vec<Library> {
        self.state.read().stats.libraries.clone()
    }

    fn lookup_library(&self, section_id: &str) -> Option<Library> {
        self.state
            .read()
            .stats
            .libraries
            .iter()
            .find(|l| l.id == section_id)
            .cloned()
    }
}
