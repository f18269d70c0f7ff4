//! Timeout-bounded dial of the upstream chain JSON-RPC endpoint the monitor
//! depends on.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::Error;

use std::time::Duration;

use alloy::providers::{Provider, RootProvider};
use tracing::{debug, info};
use url::Url;

/// Default timeout for dialing the upstream endpoint, matching the one-minute
/// default the monitor has always shipped with.
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(60);

/// Handle to the upstream chain RPC endpoint, held by the monitor for its
/// whole lifetime. There is no explicit close; dropping the handle releases
/// the underlying HTTP client.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    provider: RootProvider,
    endpoint: Url,
    chain_id: u64,
}

impl UpstreamClient {
    /// The provider backing this handle.
    #[must_use]
    pub const fn provider(&self) -> &RootProvider {
        &self.provider
    }

    /// The endpoint this handle was dialed against.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The chain id reported by the upstream during the dial.
    #[must_use]
    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }
}

/// Dials the upstream chain RPC endpoint, verifying reachability with a
/// single `eth_chainId` request bounded by `timeout`. No retries are made;
/// callers wanting a cancellable dial bound it via the timeout.
///
/// # Errors
///
/// Returns an error if the endpoint is unreachable, answers with an RPC
/// error, or does not answer within the timeout.
pub async fn dial_upstream_with_timeout(
    timeout: Duration,
    endpoint: &Url,
) -> Result<UpstreamClient, Error> {
    debug!("dialing upstream chain rpc at {}", endpoint);

    let provider = RootProvider::new_http(endpoint.clone());
    let chain_id = tokio::time::timeout(timeout, provider.get_chain_id())
        .await
        .map_err(|_| Error::Timeout {
            endpoint: endpoint.clone(),
            timeout,
        })?
        .map_err(Error::Rpc)?;

    info!("connected to upstream chain rpc (chain id {})", chain_id);

    Ok(UpstreamClient {
        provider,
        endpoint: endpoint.clone(),
        chain_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::Json;
    use axum::Router;
    use axum::routing::post;
    use serde_json::{Value, json};

    async fn chain_id_handler(Json(request): Json<Value>) -> Json<Value> {
        Json(json!({
            "jsonrpc": "2.0",
            "id": request["id"],
            "result": "0x1",
        }))
    }

    async fn spawn_fake_upstream() -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = Router::new().route("/", post(chain_id_handler));
        tokio::spawn(async move {
            axum::serve(listener, router.into_make_service())
                .await
                .unwrap();
        });
        format!("http://{addr}").parse().unwrap()
    }

    #[tokio::test]
    async fn test_dial_reports_chain_id() {
        let endpoint = spawn_fake_upstream().await;

        let client = dial_upstream_with_timeout(DEFAULT_DIAL_TIMEOUT, &endpoint)
            .await
            .unwrap();

        assert_eq!(client.chain_id(), 1);
        assert_eq!(client.endpoint(), &endpoint);
    }

    #[tokio::test]
    async fn test_dial_unreachable_endpoint_fails() {
        // Bind then drop to get a port nothing is listening on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let endpoint: Url = format!("http://{addr}").parse().unwrap();

        let err = dial_upstream_with_timeout(Duration::from_secs(5), &endpoint)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Rpc(_)));
    }

    #[tokio::test]
    async fn test_dial_times_out_on_stalled_endpoint() {
        // A listener that never accepts: connects land in the backlog and
        // the request stalls until the dial timeout fires.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let endpoint: Url = format!("http://{addr}").parse().unwrap();

        let err = dial_upstream_with_timeout(Duration::from_millis(200), &endpoint)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));

        drop(listener);
    }
}
