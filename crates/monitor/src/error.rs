use std::fmt;

use thiserror::Error;

/// Result alias used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in this crate. Init-step failures are distinct
/// variants so the failing step is identifiable without string matching.
#[derive(Debug, Error)]
pub enum Error {
    /// Dialing the upstream chain RPC endpoint failed.
    #[error("failed to dial upstream chain rpc: {0}")]
    DialUpstream(#[from] chainwatch_upstream::Error),

    /// The pprof sidecar failed to start.
    #[error("failed to start pprof server: {0}")]
    StartPprof(#[source] chainwatch_pprof::Error),

    /// The metrics sidecar failed to start.
    #[error("failed to start metrics server: {0}")]
    StartMetricsServer(#[source] chainwatch_metrics::Error),

    /// The metrics recorder could not be built.
    #[error("failed to build metrics recorder: {0}")]
    Metrics(#[from] chainwatch_metrics::Error),

    /// Metrics were enabled but the recorder cannot back a metrics server.
    #[error("metrics were enabled, but recorder `{0}` does not expose a registry for the metrics server")]
    RegistryUnavailable(&'static str),

    /// A sidecar's shutdown attempt failed during teardown.
    #[error("failed to close {name} server: {source}")]
    ShutdownSidecar {
        /// Name of the sidecar whose shutdown failed.
        name: &'static str,
        /// The underlying shutdown error.
        #[source]
        source: chainwatch_bootable::BoxedError,
    },

    /// Several failures occurred; every cause is preserved.
    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    /// The global tracing subscriber could not be installed.
    #[error("could not set global default subscriber: {0}")]
    SetTracing(#[from] tracing::dispatcher::SetGlobalDefaultError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Combines multiple failures into one error value: `None` for no
    /// failures, the failure itself for exactly one, an [`AggregateError`]
    /// otherwise. Never drops a cause.
    #[must_use]
    pub fn join(mut causes: Vec<Self>) -> Option<Self> {
        match causes.len() {
            0 => None,
            1 => Some(causes.remove(0)),
            _ => Some(Self::Aggregate(AggregateError::new(causes))),
        }
    }
}

/// An error composed of two or more underlying causes, kept in the order
/// they occurred so callers can inspect them programmatically.
#[derive(Debug)]
pub struct AggregateError {
    causes: Vec<Error>,
}

impl AggregateError {
    /// Creates an aggregate from the given causes, in order.
    #[must_use]
    pub const fn new(causes: Vec<Error>) -> Self {
        Self { causes }
    }

    /// The underlying causes, in the order they occurred.
    #[must_use]
    pub fn causes(&self) -> &[Error] {
        &self.causes
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cause) in self.causes.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{cause}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn shutdown_error(name: &'static str) -> Error {
        Error::ShutdownSidecar {
            name,
            source: format!("{name} refused to close").into(),
        }
    }

    #[test]
    fn test_join_of_nothing_is_none() {
        assert!(Error::join(vec![]).is_none());
    }

    #[test]
    fn test_join_of_one_is_the_cause_itself() {
        let joined = Error::join(vec![shutdown_error("pprof")]).unwrap();
        assert!(matches!(joined, Error::ShutdownSidecar { name: "pprof", .. }));
    }

    #[test]
    fn test_join_of_many_preserves_order() {
        let joined = Error::join(vec![shutdown_error("pprof"), shutdown_error("metrics")]).unwrap();

        let Error::Aggregate(aggregate) = joined else {
            panic!("expected an aggregate error");
        };
        let names: Vec<_> = aggregate
            .causes()
            .iter()
            .map(|cause| match cause {
                Error::ShutdownSidecar { name, .. } => *name,
                other => panic!("unexpected cause: {other}"),
            })
            .collect();
        assert_eq!(names, vec!["pprof", "metrics"]);
    }

    #[test]
    fn test_aggregate_display_mentions_every_cause() {
        let joined = Error::join(vec![shutdown_error("pprof"), shutdown_error("metrics")]).unwrap();
        let message = joined.to_string();
        assert!(message.contains("pprof"));
        assert!(message.contains("metrics"));
    }
}
