use thiserror::Error;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The server has already been started.
    #[error("the pprof server has already been started")]
    AlreadyStarted,

    /// Failed to bind the listen address.
    #[error("failed to bind pprof listen address: {0}")]
    Bind(#[from] std::io::Error),

    /// An unrecognized profile type name.
    #[error("unknown profile type: {0}")]
    UnknownProfileType(String),
}
