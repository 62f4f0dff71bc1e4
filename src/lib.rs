//! Prometheus exporter for media server playback activity.

pub mod common;
pub mod configs;
pub mod monitoring;
pub mod plex;
pub mod server;
pub mod sessions;
pub mod transport;
