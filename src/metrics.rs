//! Metric Registry (SPEC_FULL §2): a thin wrapper around `prometheus`'s
//! registry, the real exposition-format crate standing in for the
//! original's `prometheus_client`. Individual handlers (see
//! `demo_handlers.rs`) register their own counters/gauges against the same
//! `prometheus::Registry` so the HTTP server exposes everything from one
//! endpoint.

use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

pub struct MetricsRegistry {
    registry: Registry,
    pollcount: IntCounter,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        let registry = Registry::new();
        let pollcount = IntCounter::new(
            "pollcount",
            "The number of poll events processed by logtail-exporter.",
        )
        .expect("pollcount counter description is valid");
        registry
            .register(Box::new(pollcount.clone()))
            .expect("pollcount is registered exactly once");

        MetricsRegistry { registry, pollcount }
    }

    /// The underlying registry, for handlers to register their own metrics
    /// against (spec.md treats the registry itself as an external
    /// collaborator; this is the seam demo handlers use).
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Incremented once per event-loop tick (spec.md §4.5).
    pub fn inc_pollcount(&self) {
        self.pollcount.inc();
    }

    /// The text exposition of every registered metric, with the standard
    /// `text/plain; version=0.0.4` framing (spec.md §6).
    pub fn gather_text(&self) -> String {
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&families, &mut buffer)
            .expect("encoding a gathered metric family never fails");
        String::from_utf8(buffer).expect("prometheus text exposition is always valid UTF-8")
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}
