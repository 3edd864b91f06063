//! Axum-based HTTP server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, Method};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use attest_node::{Pipeline, PipelineError};

use crate::error::RpcError;
use crate::handlers;

/// Shared state of every handler.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub development_mode: bool,
}

impl AppState {
    pub fn new(pipeline: Arc<Pipeline>, development_mode: bool) -> Self {
        Self {
            pipeline,
            development_mode,
        }
    }

    /// Turn a pipeline failure into a response error.
    pub fn reject(&self, error: impl Into<PipelineError>) -> RpcError {
        RpcError::pipeline(error, self.development_mode)
    }
}

/// The caller identity admission budgets are keyed on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientKey(pub String);

impl ClientKey {
    /// First `X-Forwarded-For` hop, else the peer address.
    fn from_request(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        match (forwarded, peer) {
            (Some(ip), _) => ClientKey(ip.to_string()),
            (None, Some(addr)) => ClientKey(addr.ip().to_string()),
            (None, None) => ClientKey("unknown".to_string()),
        }
    }
}

/// Charge the default budget and tag the request with its client key.
async fn admit(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = ClientKey::from_request(req.headers(), peer);
    if let Err(e) = state.pipeline.admission().check_default(&client.0) {
        return state.reject(e).into_response();
    }
    req.extensions_mut().insert(client);
    next.run(req).await
}

/// Build the full router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/verify/:provider", post(handlers::submit_verification))
        .route("/verify/status/:id", get(handlers::verification_status))
        .route("/badge/request-issuance", post(handlers::request_issuance))
        .route("/badge/status/:address", get(handlers::badge_status))
        .route("/badge/renew", post(handlers::renew))
        .route("/vote/cast", post(handlers::cast_vote))
        .route("/vote/results/:proposal_id", get(handlers::vote_results))
        .layer(middleware::from_fn_with_state(state.clone(), admit));

    let ops = Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    api.merge(ops)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub struct RpcServer {
    pub port: u16,
    state: AppState,
}

impl RpcServer {
    pub fn new(port: u16, state: AppState) -> Self {
        Self { port, state }
    }

    /// Bind and serve until `shutdown` resolves.
    pub async fn start(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), RpcError> {
        let listener = tokio::net::TcpListener::bind(("0.0.0.0", self.port)).await?;
        tracing::info!(addr = %listener.local_addr()?, "HTTP API listening");
        axum::serve(
            listener,
            router(self.state).into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await?;
        tracing::info!("HTTP API stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_key_prefers_forwarded_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        let peer: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        assert_eq!(
            ClientKey::from_request(&headers, Some(peer)),
            ClientKey("203.0.113.7".into())
        );
        assert_eq!(
            ClientKey::from_request(&HeaderMap::new(), Some(peer)),
            ClientKey("127.0.0.1".into())
        );
        assert_eq!(
            ClientKey::from_request(&HeaderMap::new(), None),
            ClientKey("unknown".into())
        );
    }
}
