use crate::config::{Config, MetricsConfig, PprofConfig};
use crate::error::{AggregateError, Error, Result};
use crate::version;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};

use chainwatch_bootable::{Bootable, shutdown_all};
use chainwatch_metrics::{MetricsServer, Recorder, ServiceMetrics};
use chainwatch_pprof::{PprofServer, PprofServerOptions};
use chainwatch_upstream::{UpstreamClient, dial_upstream_with_timeout};
use tracing::{debug, error, info};

/// The chainwatch monitor service: owns the upstream handle, the optional
/// sidecar servers, and the stopped flag.
///
/// A sidecar handle is present only if its start call succeeded; the
/// teardown loop in [`Service::stop`] skips absent handles and attempts
/// every present one.
#[derive(Debug)]
pub struct Service<M: Recorder = ServiceMetrics> {
    recorder: M,
    upstream: Option<UpstreamClient>,
    pprof_server: Option<PprofServer>,
    metrics_server: Option<MetricsServer>,
    stopped: AtomicBool,
}

impl Service {
    /// Creates a new service with the default prometheus-backed recorder,
    /// bringing every configured subsystem online in order.
    ///
    /// # Errors
    ///
    /// Returns an error if any init step fails. Anything already started by
    /// this attempt is torn down before the error is surfaced; a teardown
    /// failure is joined with the init failure rather than dropped.
    pub async fn new(cfg: &Config) -> Result<Self> {
        Self::with_recorder(cfg, ServiceMetrics::new()?).await
    }
}

impl<M: Recorder> Service<M> {
    /// Like [`Service::new`], but with a caller-provided recorder.
    ///
    /// # Errors
    ///
    /// See [`Service::new`].
    pub async fn with_recorder(cfg: &Config, recorder: M) -> Result<Self> {
        let mut service = Self {
            recorder,
            upstream: None,
            pprof_server: None,
            metrics_server: None,
            stopped: AtomicBool::new(false),
        };

        if let Err(err) = service.init_from_config(cfg).await {
            return Err(match service.stop().await {
                Ok(()) => err,
                Err(stop_err) => Error::Aggregate(AggregateError::new(vec![err, stop_err])),
            });
        }

        Ok(service)
    }

    async fn init_from_config(&mut self, cfg: &Config) -> Result<()> {
        self.init_upstream(cfg).await?;
        self.init_pprof(&cfg.pprof).await?;
        self.init_metrics_server(&cfg.metrics).await?;

        self.recorder.record_build_info(&version::simple_with_meta());
        self.recorder.record_up();

        Ok(())
    }

    async fn init_upstream(&mut self, cfg: &Config) -> Result<()> {
        let upstream = dial_upstream_with_timeout(cfg.dial_timeout, &cfg.upstream_rpc).await?;
        self.upstream = Some(upstream);
        Ok(())
    }

    async fn init_pprof(&mut self, cfg: &PprofConfig) -> Result<()> {
        if !cfg.enabled {
            return Ok(());
        }

        let server = PprofServer::new(PprofServerOptions {
            listen_addr: SocketAddr::new(cfg.listen_addr, cfg.listen_port),
            profile_type: cfg.profile_type,
            profile_dir: cfg.profile_dir.clone(),
            profile_filename: cfg.profile_filename.clone(),
        });

        server.start().await.map_err(Error::StartPprof)?;

        info!("started pprof server on {}", server.address());
        self.pprof_server = Some(server);

        Ok(())
    }

    async fn init_metrics_server(&mut self, cfg: &MetricsConfig) -> Result<()> {
        if !cfg.enabled {
            return Ok(());
        }

        debug!(
            "starting metrics server on {}:{}",
            cfg.listen_addr, cfg.listen_port
        );
        let registry = self
            .recorder
            .registry()
            .ok_or_else(|| Error::RegistryUnavailable(std::any::type_name::<M>()))?
            .clone();

        let server = MetricsServer::new(SocketAddr::new(cfg.listen_addr, cfg.listen_port), registry);
        server.start().await.map_err(Error::StartMetricsServer)?;

        info!("started metrics server on {}", server.address());
        self.metrics_server = Some(server);

        Ok(())
    }

    /// Marks the beginning of the running phase. The monitoring workload
    /// itself is driven elsewhere; this only announces the transition.
    ///
    /// # Errors
    ///
    /// None in this core; the signature matches the rest of the lifecycle.
    pub fn start(&self) -> Result<()> {
        info!("starting chain monitoring");
        info!("chain monitor service start completed");
        Ok(())
    }

    /// Tears down every started sidecar, best-effort and total: a failing
    /// sidecar never prevents the others from being attempted, and all
    /// failures are combined into one aggregate error. The stopped flag is
    /// set unconditionally, so a returned error does not mean shutdown did
    /// not happen. Safe to call sequentially multiple times.
    ///
    /// # Errors
    ///
    /// Returns the combined teardown failures, if any occurred.
    pub async fn stop(&self) -> Result<()> {
        info!("stopping chain monitor service");

        let sidecars = self
            .pprof_server
            .iter()
            .map(|server| server as &dyn Bootable)
            .chain(
                self.metrics_server
                    .iter()
                    .map(|server| server as &dyn Bootable),
            );

        let failures = shutdown_all(sidecars).await;

        self.stopped.store(true, Ordering::SeqCst);

        let causes = failures
            .into_iter()
            .map(|failure| Error::ShutdownSidecar {
                name: failure.name,
                source: failure.source,
            })
            .collect();

        match Error::join(causes) {
            None => {
                info!("stopped chain monitor service");
                Ok(())
            }
            Some(err) => {
                error!("stopped chain monitor service with failures: {}", err);
                Err(err)
            }
        }
    }

    /// Whether the service has begun (or finished) stopping. Wait-free and
    /// safe to call from any thread, including while `stop` is in progress.
    #[must_use]
    pub fn stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// The upstream handle, present after successful construction.
    #[must_use]
    pub const fn upstream(&self) -> Option<&UpstreamClient> {
        self.upstream.as_ref()
    }

    /// The pprof sidecar, present iff enabled and started.
    #[must_use]
    pub const fn pprof_server(&self) -> Option<&PprofServer> {
        self.pprof_server.as_ref()
    }

    /// The metrics sidecar, present iff enabled and started.
    #[must_use]
    pub const fn metrics_server(&self) -> Option<&MetricsServer> {
        self.metrics_server.as_ref()
    }
}
