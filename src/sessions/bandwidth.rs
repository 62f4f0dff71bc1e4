use std::time::{Duration, Instant};

use super::record::SessionRecord;

/// Kilobits to bytes. Kept at 1024/8 to stay compatible with dashboards built
/// against existing `estimated_transmit_bytes_total` series.
pub const KBITS_TO_BYTES: f64 = 128.0;

/// Running estimate of bytes sent to clients, derived from stream bitrate and
/// time spent playing.
#[derive(Debug, Default, Clone)]
pub struct BandwidthEstimator {
    /// Kilobits from PLAYING intervals that have already closed.
    flattened_kbits: f64,
}

impl BandwidthEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds a closed PLAYING interval into the running total.
    pub fn flatten(&mut self, elapsed: Duration, bitrate_kbps: u64) {
        self.flattened_kbits += elapsed.as_secs_f64() * bitrate_kbps as f64;
    }

    pub fn flattened_bytes(&self) -> f64 {
        self.flattened_kbits * KBITS_TO_BYTES
    }

    /// Flattened total plus the still-open intervals of every playing record.
    pub fn estimate_total<'a, I>(&self, records: I, now: Instant) -> f64
    where
        I: IntoIterator<Item = &'a SessionRecord>,
    {
        let open_kbits: f64 = records
            .into_iter()
            .filter(|r| r.state.is_playing())
            .map(|r| r.open_interval(now).as_secs_f64() * r.bitrate_kbps() as f64)
            .sum();

        (self.flattened_kbits + open_kbits) * KBITS_TO_BYTES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::{MediaInfo, PlaybackState};

    fn playing(started: Instant, bitrate_kbps: u64) -> SessionRecord {
        let mut record = SessionRecord::new("s", started);
        record.state = PlaybackState::Playing;
        record.play_started_at = Some(started);
        record.media = Some(MediaInfo {
            bitrate_kbps,
            ..Default::default()
        });
        record
    }

    #[test]
    fn flatten_accumulates() {
        let mut estimator = BandwidthEstimator::new();
        estimator.flatten(Duration::from_secs(10), 1000);
        estimator.flatten(Duration::from_secs(5), 2000);

        assert_eq!(estimator.flattened_bytes(), 20_000.0 * KBITS_TO_BYTES);
    }

    #[test]
    fn open_intervals_are_extrapolated() {
        let t0 = Instant::now();
        let mut estimator = BandwidthEstimator::new();
        estimator.flatten(Duration::from_secs(1), 100);

        let mut paused = playing(t0, 9999);
        paused.state = PlaybackState::Paused;
        paused.play_started_at = None;
        let records = [playing(t0, 4000), paused];

        let total = estimator.estimate_total(&records, t0 + Duration::from_secs(2));
        assert_eq!(total, (100.0 + 8000.0) * KBITS_TO_BYTES);
    }

    #[test]
    fn missing_media_contributes_nothing() {
        let t0 = Instant::now();
        let mut record = playing(t0, 0);
        record.media = None;

        let total = BandwidthEstimator::new().estimate_total([&record], t0 + Duration::from_secs(30));
        assert_eq!(total, 0.0);
    }
}
