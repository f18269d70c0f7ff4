//! Process-wide metrics recording for the chainwatch monitor, plus the
//! optional `/metrics` sidecar server.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_pub_crate)]

mod error;
mod server;

pub use error::Error;
pub use server::MetricsServer;

use prometheus::{IntGauge, IntGaugeVec, Opts, Registry};

/// Sink for the monitor's lifecycle metrics.
///
/// Exposing a registry is an optional capability: only recorders that can
/// back a metrics server override [`Recorder::registry`]. The monitor checks
/// the capability once, at init time, when the metrics sidecar is enabled.
pub trait Recorder: Send + Sync + 'static {
    /// Records the running build's version information.
    fn record_build_info(&self, version: &str);

    /// Records that the monitor process has come up.
    fn record_up(&self);

    /// The underlying registry, for recorders able to back a metrics server.
    fn registry(&self) -> Option<&Registry> {
        None
    }
}

/// Prometheus-backed [`Recorder`] owning a private registry.
#[derive(Debug)]
pub struct ServiceMetrics {
    registry: Registry,
    info: IntGaugeVec,
    up: IntGauge,
}

impl ServiceMetrics {
    /// Creates the recorder and registers its collectors.
    ///
    /// # Errors
    ///
    /// Returns an error if a collector cannot be created or registered.
    pub fn new() -> Result<Self, Error> {
        let registry = Registry::new();

        let info = IntGaugeVec::new(
            Opts::new("chainwatch_info", "Build information of the running monitor"),
            &["version"],
        )?;
        registry.register(Box::new(info.clone()))?;

        let up = IntGauge::new("chainwatch_up", "1 if the monitor process is up")?;
        registry.register(Box::new(up.clone()))?;

        Ok(Self { registry, info, up })
    }
}

impl Recorder for ServiceMetrics {
    fn record_build_info(&self, version: &str) {
        self.info.with_label_values(&[version]).set(1);
    }

    fn record_up(&self) {
        self.up.set(1);
    }

    fn registry(&self) -> Option<&Registry> {
        Some(&self.registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(metrics: &ServiceMetrics) -> String {
        let mut buf = String::new();
        prometheus::TextEncoder::new()
            .encode_utf8(&metrics.registry().unwrap().gather(), &mut buf)
            .unwrap();
        buf
    }

    #[test]
    fn test_record_build_info_sets_version_label() {
        let metrics = ServiceMetrics::new().unwrap();
        metrics.record_build_info("0.1.0+dev");

        let encoded = encode(&metrics);
        assert!(encoded.contains("chainwatch_info{version=\"0.1.0+dev\"} 1"));
    }

    #[test]
    fn test_record_up_sets_liveness_gauge() {
        let metrics = ServiceMetrics::new().unwrap();
        assert!(encode(&metrics).contains("chainwatch_up 0"));

        metrics.record_up();
        assert!(encode(&metrics).contains("chainwatch_up 1"));
    }

    #[test]
    fn test_registry_capability_is_exposed() {
        let metrics = ServiceMetrics::new().unwrap();
        assert!(metrics.registry().is_some());
    }
}
