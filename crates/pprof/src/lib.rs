//! Optional profiling sidecar for the chainwatch monitor: an HTTP listener
//! exposing a debug index and the most recent captured profile. Profile
//! capture itself is a collaborator concern; this crate owns only the
//! listener lifecycle.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_pub_crate)]

mod error;

pub use error::Error;

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use chainwatch_bootable::{Bootable, BoxedError};
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::info;

/// Kind of profile the collaborator captures into the profile directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProfileType {
    /// CPU profile.
    #[default]
    Cpu,
    /// Heap profile.
    Heap,
}

impl ProfileType {
    /// Returns the profile type name as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Heap => "heap",
        }
    }
}

impl FromStr for ProfileType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cpu" => Ok(Self::Cpu),
            "heap" => Ok(Self::Heap),
            other => Err(Error::UnknownProfileType(other.to_string())),
        }
    }
}

/// Options for configuring a [`PprofServer`].
pub struct PprofServerOptions {
    /// The address to listen on.
    pub listen_addr: SocketAddr,

    /// The kind of profile being captured.
    pub profile_type: ProfileType,

    /// The directory profiles are captured into.
    pub profile_dir: PathBuf,

    /// The filename of the captured profile within the profile directory.
    pub profile_filename: String,
}

#[derive(Debug)]
struct PprofState {
    profile_type: ProfileType,
    profile_path: PathBuf,
}

/// Sidecar HTTP server exposing profiling endpoints under `/debug/pprof`.
#[derive(Debug)]
pub struct PprofServer {
    listen_addr: SocketAddr,
    state: Arc<PprofState>,
    bound_addr: Arc<RwLock<Option<SocketAddr>>>,
    shutdown_token: CancellationToken,
    task_tracker: TaskTracker,
}

impl PprofServer {
    /// Creates a new server. Nothing is bound until [`PprofServer::start`]
    /// is called.
    #[must_use]
    pub fn new(options: PprofServerOptions) -> Self {
        Self {
            listen_addr: options.listen_addr,
            state: Arc::new(PprofState {
                profile_type: options.profile_type,
                profile_path: options.profile_dir.join(options.profile_filename),
            }),
            bound_addr: Arc::new(RwLock::new(None)),
            shutdown_token: CancellationToken::new(),
            task_tracker: TaskTracker::new(),
        }
    }

    /// Binds the listen address and starts serving the debug endpoints.
    ///
    /// # Errors
    ///
    /// Returns an error if the server was already started or the listen
    /// address cannot be bound.
    pub async fn start(&self) -> Result<(), Error> {
        if self.task_tracker.is_closed() {
            return Err(Error::AlreadyStarted);
        }

        let router = Router::new()
            .route("/debug/pprof", get(serve_index))
            .route("/debug/pprof/profile", get(serve_profile))
            .with_state(self.state.clone());

        let listener = tokio::net::TcpListener::bind(self.listen_addr)
            .await
            .map_err(Error::Bind)?;
        *self.bound_addr.write() = Some(listener.local_addr().map_err(Error::Bind)?);

        let shutdown_token = self.shutdown_token.clone();
        self.task_tracker.spawn(async move {
            tokio::select! {
                e = axum::serve(listener, router.into_make_service()).into_future() => {
                    info!("pprof server exited {:?}", e);
                }
                () = shutdown_token.cancelled() => {}
            }
        });

        self.task_tracker.close();

        Ok(())
    }

    /// Stops serving and waits for the listener task to finish. Harmless to
    /// call again once stopped.
    pub async fn shutdown(&self) -> Result<(), Error> {
        self.shutdown_token.cancel();
        self.task_tracker.wait().await;
        Ok(())
    }

    /// The actual bound address once started, the configured one before.
    #[must_use]
    pub fn address(&self) -> String {
        self.bound_addr
            .read()
            .map_or_else(|| self.listen_addr.to_string(), |addr| addr.to_string())
    }
}

#[async_trait]
impl Bootable for PprofServer {
    fn name(&self) -> &'static str {
        "pprof"
    }

    async fn start(&self) -> Result<(), BoxedError> {
        Self::start(self).await.map_err(Into::into)
    }

    async fn shutdown(&self) -> Result<(), BoxedError> {
        Self::shutdown(self).await.map_err(Into::into)
    }
}

async fn serve_index(State(state): State<Arc<PprofState>>) -> String {
    format!(
        "chainwatch pprof\n\nprofile type: {}\nprofile file: {}\n\nGET /debug/pprof/profile\n",
        state.profile_type.as_str(),
        state.profile_path.display(),
    )
}

async fn serve_profile(State(state): State<Arc<PprofState>>) -> Response {
    match tokio::fs::read(&state.profile_path).await {
        Ok(bytes) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/octet-stream")],
            bytes,
        )
            .into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "no profile captured yet\n").into_response(),
    }
}
