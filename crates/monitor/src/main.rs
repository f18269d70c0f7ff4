//! The chainwatch daemon: parses arguments, brings the monitor service up,
//! and tears it down on interrupt.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use chainwatch_monitor::{Config, MetricsConfig, PprofConfig, Result, Service};
use chainwatch_pprof::ProfileType;
use clap::Parser;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;
use url::Url;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Upstream chain JSON-RPC endpoint to monitor.
    #[arg(long, env = "CHAINWATCH_UPSTREAM_RPC")]
    upstream_rpc: Url,

    /// Bound (in seconds) on the single upstream dial attempt.
    #[arg(long, default_value_t = 60)]
    dial_timeout_secs: u64,

    /// Enable the pprof sidecar server.
    #[arg(long)]
    pprof_enabled: bool,

    #[arg(long, default_value = "127.0.0.1")]
    pprof_addr: IpAddr,

    #[arg(long, default_value_t = 6060)]
    pprof_port: u16,

    /// Kind of profile being captured (cpu or heap).
    #[arg(long, default_value = "cpu")]
    pprof_type: ProfileType,

    #[arg(long, default_value = "/tmp/chainwatch/pprof")]
    pprof_dir: PathBuf,

    #[arg(long, default_value = "profile.pb.gz")]
    pprof_filename: String,

    /// Enable the metrics sidecar server.
    #[arg(long)]
    metrics_enabled: bool,

    #[arg(long, default_value = "0.0.0.0")]
    metrics_addr: IpAddr,

    #[arg(long, default_value_t = 7300)]
    metrics_port: u16,
}

impl Args {
    fn into_config(self) -> Config {
        Config {
            upstream_rpc: self.upstream_rpc,
            dial_timeout: Duration::from_secs(self.dial_timeout_secs),
            pprof: PprofConfig {
                enabled: self.pprof_enabled,
                listen_addr: self.pprof_addr,
                listen_port: self.pprof_port,
                profile_type: self.pprof_type,
                profile_dir: self.pprof_dir,
                profile_filename: self.pprof_filename,
            },
            metrics: MetricsConfig {
                enabled: self.metrics_enabled,
                listen_addr: self.metrics_addr,
                listen_port: self.metrics_port,
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing::subscriber::set_global_default(
        FmtSubscriber::builder().with_max_level(Level::INFO).finish(),
    )?;

    let cfg = Args::parse().into_config();

    let service = Service::new(&cfg).await?;
    service.start()?;

    tokio::signal::ctrl_c().await?;
    info!("interrupt received, shutting down");

    if let Err(err) = service.stop().await {
        error!("shutdown completed with failures: {}", err);
    }

    Ok(())
}
