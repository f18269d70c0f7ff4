use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use chainwatch_pprof::ProfileType;
use chainwatch_upstream::DEFAULT_DIAL_TIMEOUT;
use url::Url;

/// Configuration for the monitor service.
#[derive(Debug, Clone)]
pub struct Config {
    /// The upstream chain JSON-RPC endpoint to monitor.
    pub upstream_rpc: Url,

    /// Bound on the single upstream dial attempt.
    pub dial_timeout: Duration,

    /// The pprof sidecar settings.
    pub pprof: PprofConfig,

    /// The metrics sidecar settings.
    pub metrics: MetricsConfig,
}

impl Config {
    /// Creates a configuration for the given upstream endpoint with both
    /// sidecars disabled and the default dial timeout.
    #[must_use]
    pub fn new(upstream_rpc: Url) -> Self {
        Self {
            upstream_rpc,
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
            pprof: PprofConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

/// Settings for the optional pprof sidecar.
#[derive(Debug, Clone)]
pub struct PprofConfig {
    /// Whether the sidecar is started at all.
    pub enabled: bool,

    /// The address to listen on.
    pub listen_addr: IpAddr,

    /// The port to listen on.
    pub listen_port: u16,

    /// The kind of profile being captured.
    pub profile_type: ProfileType,

    /// The directory profiles are captured into.
    pub profile_dir: PathBuf,

    /// The filename of the captured profile.
    pub profile_filename: String,
}

impl Default for PprofConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            listen_port: 6060,
            profile_type: ProfileType::default(),
            profile_dir: PathBuf::from("/tmp/chainwatch/pprof"),
            profile_filename: "profile.pb.gz".to_string(),
        }
    }
}

/// Settings for the optional metrics sidecar.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether the sidecar is started at all.
    pub enabled: bool,

    /// The address to listen on.
    pub listen_addr: IpAddr,

    /// The port to listen on.
    pub listen_port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            listen_port: 7300,
        }
    }
}
