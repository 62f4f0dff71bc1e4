use std::{sync::Arc, time::Instant};

use crate::{monitoring::ExporterMetrics, plex::LibraryCatalog, sessions::SessionRegistry};

/// Top-level application state shared by the HTTP routes.
pub struct AppState {
    pub metrics: ExporterMetrics,
    pub registry: Arc<SessionRegistry>,
    pub catalog: Arc<dyn LibraryCatalog>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        metrics: ExporterMetrics,
        registry: Arc<SessionRegistry>,
        catalog: Arc<dyn LibraryCatalog>,
    ) -> Self {
        Self {
            metrics,
            registry,
            catalog,
            start_time: Instant::now(),
        }
    }
}
