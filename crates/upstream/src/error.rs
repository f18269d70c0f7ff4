use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The upstream endpoint did not answer within the dial timeout.
    #[error("upstream {endpoint} did not answer within {timeout:?}")]
    Timeout {
        /// The endpoint being dialed.
        endpoint: Url,
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The upstream endpoint answered with an error or was unreachable.
    #[error("upstream rpc request failed: {0}")]
    Rpc(#[from] alloy::transports::TransportError),
}
