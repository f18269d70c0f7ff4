use thiserror::Error;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The server has already been started.
    #[error("the metrics server has already been started")]
    AlreadyStarted,

    /// Failed to bind the listen address.
    #[error("failed to bind metrics listen address: {0}")]
    Bind(#[from] std::io::Error),

    /// A prometheus collector could not be created or registered.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}
