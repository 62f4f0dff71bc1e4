//! In-memory playback session tracking.
//!
//! The [`SessionRegistry`] turns a stream of playback state changes into
//! per-session play time and an estimate of bytes sent, and serves
//! torn-free [`RegistrySnapshot`]s to the metrics layer.

pub mod bandwidth;
pub mod pruner;
pub mod record;
pub mod registry;
pub mod snapshot;
pub mod state;

pub use bandwidth::{BandwidthEstimator, KBITS_TO_BYTES};
pub use pruner::Pruner;
pub use record::{MediaInfo, PlaybackEvent, SessionRecord, TitleLabels, UserInfo};
pub use registry::{SessionRegistry, UpdateOutcome};
pub use snapshot::{RegistrySnapshot, SessionView};
pub use state::{PlaybackState, Transition};
