use std::sync::Arc;

use prometheus::{
    core::{Collector, Desc},
    proto::{MetricFamily, MetricType},
};

use super::family;
use crate::plex::{PlexServer, ServerStats};

const LIBRARY_DURATION: &str = "library_duration_total";
const LIBRARY_DURATION_HELP: &str = "Total runtime of a library, in milliseconds";
const LIBRARY_STORAGE: &str = "library_storage_total";
const LIBRARY_STORAGE_HELP: &str = "Total size of a library, in bytes";
const HOST_CPU: &str = "host_cpu_util";
const HOST_CPU_HELP: &str = "Host CPU utilisation reported by the server";
const HOST_MEM: &str = "host_mem_util";
const HOST_MEM_HELP: &str = "Host memory utilisation reported by the server";
const TRANSMIT: &str = "transmit_bytes_total";
const TRANSMIT_HELP: &str = "Bytes sent by the server, from its bandwidth statistics";

const LIBRARY_LABELS: [&str; 3] = ["library_type", "library", "library_id"];

/// Server-wide families: library sizes, host utilisation and the server's
/// own transmit counter.
pub struct ServerCollector {
    server: Arc<PlexServer>,
    descs: Vec<Desc>,
}

impl ServerCollector {
    pub fn new(server: Arc<PlexServer>) -> prometheus::Result<Self> {
        let descs = vec![
            family::desc(LIBRARY_DURATION, LIBRARY_DURATION_HELP, &LIBRARY_LABELS)?,
            family::desc(LIBRARY_STORAGE, LIBRARY_STORAGE_HELP, &LIBRARY_LABELS)?,
            family::desc(HOST_CPU, HOST_CPU_HELP, &[])?,
            family::desc(HOST_MEM, HOST_MEM_HELP, &[])?,
            family::desc(TRANSMIT, TRANSMIT_HELP, &[])?,
        ];

        Ok(Self { server, descs })
    }
}

impl Collector for ServerCollector {
    fn desc(&self) -> Vec<&Desc> {
        self.descs.iter().collect()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        server_families(&self.server.stats())
    }
}

/// Host gauges are omitted until the server has reported a sample.
pub fn server_families(stats: &ServerStats) -> Vec<MetricFamily> {
    let server = family::server_labels(&stats.identity);

    let mut durations = Vec::with_capacity(stats.libraries.len());
    let mut storage = Vec::with_capacity(stats.libraries.len());
    for library in &stats.libraries {
        let mut labels = server.clone();
        labels.extend([
            ("library_type", library.library_type.clone()),
            ("library", library.name.clone()),
            ("library_id", library.id.clone()),
        ]);
        durations.push(family::gauge(library.duration_total as f64, labels.clone()));
        storage.push(family::gauge(library.storage_total as f64, labels));
    }

    let host_gauge = |value: Option<f64>| {
        value
            .map(|v| vec![family::gauge(v, server.clone())])
            .unwrap_or_default()
    };

    vec![
        family::family(LIBRARY_DURATION, LIBRARY_DURATION_HELP, MetricType::GAUGE, durations),
        family::family(LIBRARY_STORAGE, LIBRARY_STORAGE_HELP, MetricType::GAUGE, storage),
        family::family(HOST_CPU, HOST_CPU_HELP, MetricType::GAUGE, host_gauge(stats.host_cpu_util)),
        family::family(HOST_MEM, HOST_MEM_HELP, MetricType::GAUGE, host_gauge(stats.host_mem_util)),
        family::family(
            TRANSMIT,
            TRANSMIT_HELP,
            MetricType::COUNTER,
            vec![family::counter(stats.transmitted_bytes_total as f64, server.clone())],
        ),
    ]
}
