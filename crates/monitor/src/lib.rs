//! Service lifecycle core of the chainwatch daemon: ordered bring-up of the
//! upstream handle and the optional sidecar servers, best-effort total
//! teardown, and a race-free stopped flag.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_pub_crate)]

mod config;
mod error;
mod service;
pub mod version;

pub use config::{Config, MetricsConfig, PprofConfig};
pub use error::{AggregateError, Error, Result};
pub use service::Service;
