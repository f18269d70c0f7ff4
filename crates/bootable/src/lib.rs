//! Lifecycle contract for the monitor's optional sidecar servers, plus the
//! best-effort teardown combinator shared by shutdown paths.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use async_trait::async_trait;
use tracing::{debug, error};

/// Boxed error surfaced by sidecar lifecycle operations.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Trait for sidecar servers that can be brought up and torn down.
#[async_trait]
pub trait Bootable: Send + Sync {
    /// Short name of the sidecar, used in logs and teardown reports.
    fn name(&self) -> &'static str;

    /// Start the sidecar. Errors on bind conflicts or if already started.
    async fn start(&self) -> Result<(), BoxedError>;

    /// Shut the sidecar down. Safe to call again after it has stopped.
    async fn shutdown(&self) -> Result<(), BoxedError>;
}

/// A single sidecar's failed shutdown attempt.
#[derive(Debug)]
pub struct ShutdownFailure {
    /// Name of the sidecar whose shutdown failed.
    pub name: &'static str,

    /// The underlying shutdown error.
    pub source: BoxedError,
}

/// Shuts down every given sidecar, collecting failures instead of
/// short-circuiting: one sidecar's broken shutdown must never prevent the
/// others from being attempted. Failures are returned in attempt order.
pub async fn shutdown_all<'a, I>(sidecars: I) -> Vec<ShutdownFailure>
where
    I: IntoIterator<Item = &'a dyn Bootable>,
{
    let mut failures = Vec::new();

    for sidecar in sidecars {
        debug!("shutting down {} server", sidecar.name());
        if let Err(source) = sidecar.shutdown().await {
            error!("failed to shut down {} server: {}", sidecar.name(), source);
            failures.push(ShutdownFailure {
                name: sidecar.name(),
                source,
            });
        }
    }

    failures
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeSidecar {
        name: &'static str,
        fail_shutdown: bool,
        shutdown_calls: AtomicUsize,
    }

    impl FakeSidecar {
        const fn new(name: &'static str, fail_shutdown: bool) -> Self {
            Self {
                name,
                fail_shutdown,
                shutdown_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Bootable for FakeSidecar {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn start(&self) -> Result<(), BoxedError> {
            Ok(())
        }

        async fn shutdown(&self) -> Result<(), BoxedError> {
            self.shutdown_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_shutdown {
                Err(format!("{} refused to close", self.name).into())
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn test_shutdown_all_attempts_every_sidecar() {
        let broken = FakeSidecar::new("pprof", true);
        let healthy = FakeSidecar::new("metrics", false);

        let failures = shutdown_all([&broken as &dyn Bootable, &healthy]).await;

        assert_eq!(broken.shutdown_calls.load(Ordering::SeqCst), 1);
        assert_eq!(healthy.shutdown_calls.load(Ordering::SeqCst), 1);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].name, "pprof");
    }

    #[tokio::test]
    async fn test_shutdown_all_preserves_attempt_order() {
        let first = FakeSidecar::new("first", true);
        let second = FakeSidecar::new("second", true);

        let failures = shutdown_all([&first as &dyn Bootable, &second]).await;

        let names: Vec<_> = failures.iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_shutdown_all_with_no_sidecars() {
        let failures = shutdown_all(Vec::<&dyn Bootable>::new()).await;
        assert!(failures.is_empty());
    }
}
