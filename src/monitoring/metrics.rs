use prometheus::{Encoder, Registry, TextEncoder, core::Collector};

/// Owns the Prometheus registry the `/metrics` route gathers from.
pub struct ExporterMetrics {
    registry: Registry,
}

impl ExporterMetrics {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
        }
    }

    pub fn register(&self, collector: impl Collector + 'static) -> prometheus::Result<()> {
        self.registry.register(Box::new(collector))
    }

    pub fn format_type(&self) -> &'static str {
        prometheus::TEXT_FORMAT
    }

    /// Gathers every collector and encodes the result in the text format.
    pub fn render(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();

        let mut buffer = Vec::new();
        encoder.encode(&families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl Default for ExporterMetrics {
    fn default() -> Self {
        Self::new()
    }
}
