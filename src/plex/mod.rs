//! Media server integration: HTTP API client, server statistics refresh and
//! the playback notification listener.

mod backoff;
pub mod client;
pub mod decoder;
pub mod library;
pub mod listener;
pub mod models;
pub mod server;

pub use client::PlexClient;
pub use decoder::NotificationDecoder;
pub use library::{Library, LibraryCatalog, ServerIdentity};
pub use listener::PlexListener;
pub use server::{PlexServer, ServerStats};
