use crate::error::Error;

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use chainwatch_bootable::{Bootable, BoxedError};
use parking_lot::RwLock;
use prometheus::{Registry, TextEncoder};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::info;

/// Sidecar HTTP server exposing a prometheus registry at `/metrics`.
#[derive(Debug)]
pub struct MetricsServer {
    listen_addr: SocketAddr,
    registry: Registry,
    bound_addr: Arc<RwLock<Option<SocketAddr>>>,
    shutdown_token: CancellationToken,
    task_tracker: TaskTracker,
}

impl MetricsServer {
    /// Creates a new server for the given registry. Nothing is bound until
    /// [`MetricsServer::start`] is called.
    #[must_use]
    pub fn new(listen_addr: SocketAddr, registry: Registry) -> Self {
        Self {
            listen_addr,
            registry,
            bound_addr: Arc::new(RwLock::new(None)),
            shutdown_token: CancellationToken::new(),
            task_tracker: TaskTracker::new(),
        }
    }

    /// Binds the listen address and starts serving `/metrics`.
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
            .route("/metrics", get(serve_metrics))
            .with_state(self.registry.clone());

        let listener = tokio::net::TcpListener::bind(self.listen_addr)
            .await
            .map_err(Error::Bind)?;
        *self.bound_addr.write() = Some(listener.local_addr().map_err(Error::Bind)?);

        let shutdown_token = self.shutdown_token.clone();
        self.task_tracker.spawn(async move {
            tokio::select! {
                e = axum::serve(listener, router.into_make_service()).into_future() => {
                    info!("metrics server exited {:?}", e);
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
impl Bootable for MetricsServer {
    fn name(&self) -> &'static str {
        "metrics"
    }

    async fn start(&self) -> Result<(), BoxedError> {
        Self::start(self).await.map_err(Into::into)
    }

    async fn shutdown(&self) -> Result<(), BoxedError> {
        Self::shutdown(self).await.map_err(Into::into)
    }
}

async fn serve_metrics(State(registry): State<Registry>) -> Response {
    let mut body = String::new();
    match TextEncoder::new().encode_utf8(&registry.gather(), &mut body) {
        Ok(()) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}
