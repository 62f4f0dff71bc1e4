//! Prometheus exposition of session and server state.

pub mod collector;
pub mod family;
pub mod metrics;
pub mod server;

pub use collector::SessionCollector;
pub use metrics::ExporterMetrics;
pub use server::ServerCollector;
