// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server implementation module
//!
//! This module provides the main server struct and implementation for the analyze server,
//! including server lifecycle management, router configuration, and coordinated graceful
//! shutdown using `CancellationToken`.

use std::{future::IntoFuture, net::SocketAddr, sync::Arc, time::Duration};

use axum::{BoxError, Router, error_handling::HandleErrorLayer, http::HeaderName};
use external_apis::{MoralisClient, ScoringClient};
use hyper::Request;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::{ServiceBuilder, timeout::TimeoutLayer};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info, info_span, warn};

use crate::{
    analyze::Analyzer,
    config::ServerConfig,
    error::{ServerError, ServerResult},
    middleware::cors_layer,
    routes::create_routes,
    state::{ServerState, WalletAnalyzer},
};

// Server constants
const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");
const DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT_SECONDS: u64 = 30;

/// Configuration for server shutdown behavior
#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    /// Maximum time in-flight requests get to finish once shutdown starts
    pub graceful_timeout: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            graceful_timeout: Duration::from_secs(DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT_SECONDS),
        }
    }
}

/// Main server struct
#[derive(Debug)]
pub struct Server {
    /// Server configuration
    config: ServerConfig,
    /// Application router
    router: Router,
    /// Server state
    state: ServerState,
    /// Cancellation token for coordinated shutdown
    cancellation_token: CancellationToken,
    /// Configuration for coordinated shutdown
    graceful_shutdown_config: ShutdownConfig,
}

impl Server {
    /// Create new server instance
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if the configuration is invalid or an
    /// upstream client cannot be constructed from it.
    pub fn new(config: ServerConfig, shutdown_config: ShutdownConfig) -> ServerResult<Self> {
        let analyzer = Self::create_analyzer_from_config(&config)?;
        Self::with_analyzer(config, shutdown_config, Arc::new(analyzer))
    }

    /// Build the Moralis client and, when enabled, the scoring client
    fn create_analyzer_from_config(config: &ServerConfig) -> ServerResult<WalletAnalyzer> {
        config.validate().map_err(|e| ServerError::Config {
            message: e.to_string(),
        })?;

        let moralis =
            MoralisClient::new(config.moralis.client_config()).map_err(|e| ServerError::Config {
                message: format!("failed to create Moralis client: {e}"),
            })?;

        let scoring = config
            .scoring
            .client_config()
            .map(ScoringClient::new)
            .transpose()
            .map_err(|e| ServerError::Config {
                message: format!("failed to create scoring client: {e}"),
            })?;

        match &scoring {
            Some(client) => info!(endpoint = %client.endpoint(), "ML scoring enabled"),
            None => warn!("ML scoring disabled, responses will not carry ml_result"),
        }

        Ok(Analyzer::new(moralis, scoring))
    }

    /// Create server with a prebuilt analyzer
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if the CORS policy is invalid.
    pub fn with_analyzer(
        config: ServerConfig,
        graceful_shutdown_config: ShutdownConfig,
        analyzer: Arc<WalletAnalyzer>,
    ) -> ServerResult<Self> {
        let cancellation_token = CancellationToken::new();
        let state = ServerState::new(config.clone(), analyzer);
        let router = Self::create_router(state.clone())?;

        Ok(Self {
            config,
            router,
            state,
            cancellation_token,
            graceful_shutdown_config,
        })
    }

    /// Create application router with middleware
    fn create_router(state: ServerState) -> ServerResult<Router> {
        let timeout_duration = state.config().timeout_seconds.value();
        let cors = cors_layer(&state.config().cors)?;

        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http().make_span_with(|req: &Request<_>| {
                    let method = req.method();
                    let uri = req.uri();
                    if let Some(request_id) = req.headers().get(REQUEST_ID_HEADER) {
                        info_span!("http_request", ?request_id, %method, %uri)
                    } else {
                        error!("failed to extract id from request");
                        info_span!("http_request", request_id = "unknown", %method, %uri)
                    }
                }),
            )
            .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
            .layer(cors);

        Ok(with_request_timeout(create_routes(), timeout_duration)
            .layer(middleware)
            .with_state(state))
    }

    /// Run the server with coordinated graceful shutdown
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` if unable to bind to the configured address,
    /// or `ServerError::Startup` if the server fails to start.
    pub async fn run(self) -> ServerResult<()> {
        let addr = self.config.socket_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                address: addr,
                source,
            })?;

        let actual_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Startup { source })?;

        info!(
            address = %actual_addr,
            environment = %self.config.environment,
            "wallet analyze server starting",
        );

        let cancellation_token = self.cancellation_token.clone();
        let shutdown_token = cancellation_token.clone();
        tokio::spawn(async move {
            info!("spawning the graceful shutdown task");
            Self::shutdown_signal_handler(shutdown_token).await;
        });

        let drain_token = cancellation_token.clone();
        let server = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                cancellation_token.cancelled().await;
                info!("draining in-flight requests");
            })
            .into_future();

        // In-flight requests get `graceful_timeout` once shutdown starts
        let graceful_timeout = self.graceful_shutdown_config.graceful_timeout;
        let drain_deadline = async move {
            drain_token.cancelled().await;
            tokio::time::sleep(graceful_timeout).await;
        };

        tokio::select! {
            server_result = server => {
                if let Err(e) = server_result {
                    error!(error = ?e, "Server error during shutdown");
                    return Err(ServerError::Shutdown { source: e });
                }
                info!("wallet analyze server shut down gracefully");
                Ok(())
            }
            () = drain_deadline => {
                warn!(?graceful_timeout, "graceful shutdown timed out, dropping open connections");
                Err(ServerError::Timeout {
                    timeout_seconds: graceful_timeout.as_secs(),
                })
            }
        }
    }

    /// Cancel `cancellation_token` on SIGINT or SIGTERM
    async fn shutdown_signal_handler(cancellation_token: CancellationToken) {
        let sigint = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for SIGINT");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let sigterm = async {
            use tokio::signal::unix::{SignalKind, signal};

            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    error!(error = %e, "failed to listen for SIGTERM");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let sigterm = std::future::pending::<()>();

        tokio::select! {
            () = sigint => warn!("received SIGINT, shutting down"),
            () = sigterm => warn!("received SIGTERM, shutting down"),
            () = cancellation_token.cancelled() => return,
        }
        cancellation_token.cancel();
    }

    /// Returns a clone of the cancellation token for coordinated shutdown
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Initiates graceful shutdown by cancelling the server's cancellation token
    pub fn shutdown(&self) {
        info!("programmatic shutdown requested");
        self.cancellation_token.cancel();
    }

    /// Run server for testing, returns the bound address
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` if unable to bind to the configured address.
    pub async fn run_for_testing(self) -> ServerResult<(SocketAddr, CancellationToken)> {
        let addr = self.config.socket_addr();

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                address: addr,
                source,
            })?;

        let actual_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Startup { source })?;

        let token = self.cancellation_token.child_token();
        let task = token.child_token();
        tokio::spawn(async move {
            let _ = axum::serve(listener, self.router)
                .with_graceful_shutdown(async move { task.cancelled().await })
                .await;
        });

        Ok((actual_addr, token))
    }

    /// Get server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get server state for testing
    pub fn state(&self) -> &ServerState {
        &self.state
    }
}

/// Bound every request by `timeout`
///
/// An elapsed request answers 408 with the regular error body.
fn with_request_timeout<S>(router: Router<S>, timeout: Duration) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let timeout_seconds = timeout.as_secs();
    router.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(move |err: BoxError| async move {
                middleware_error(&err, timeout_seconds)
            }))
            .layer(TimeoutLayer::new(timeout)),
    )
}

fn middleware_error(err: &BoxError, timeout_seconds: u64) -> ServerError {
    if err.is::<tower::timeout::error::Elapsed>() {
        warn!(timeout_seconds, "request timed out");
        ServerError::Timeout { timeout_seconds }
    } else {
        ServerError::Middleware {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{body::to_bytes, http::StatusCode, routing::get};
    use tower::ServiceExt;
    use url::Url;

    use super::*;
    use crate::config::Environment;

    fn testing_config() -> ServerConfig {
        ServerConfig::for_testing(Url::parse("http://127.0.0.1:9").expect("url"))
    }

    #[tokio::test]
    async fn server_creation() -> ServerResult<()> {
        let server = Server::new(testing_config(), ShutdownConfig::default())?;
        assert_eq!(server.config().environment, Environment::Testing);
        assert!(!server.cancellation_token().is_cancelled());
        assert!(server.state().analyzer().enrichment().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn server_creation_with_scoring() -> ServerResult<()> {
        let config = testing_config()
            .with_scoring(Url::parse("http://127.0.0.1:8000/analyze").expect("url"));
        let server = Server::new(config, ShutdownConfig::default())?;
        let scoring = server.state().analyzer().enrichment().expect("scoring enabled");
        assert_eq!(scoring.endpoint().as_str(), "http://127.0.0.1:8000/analyze");
        Ok(())
    }

    #[test]
    fn server_creation_requires_api_key() {
        let mut config = testing_config();
        config.moralis.api_key = String::new();
        assert!(matches!(
            Server::new(config, ShutdownConfig::default()),
            Err(ServerError::Config { .. })
        ));
    }

    #[tokio::test]
    async fn programmatic_shutdown() -> ServerResult<()> {
        let server = Server::new(testing_config(), ShutdownConfig::default())?;

        assert!(!server.cancellation_token().is_cancelled());

        server.shutdown();

        assert!(server.cancellation_token().is_cancelled());
        Ok(())
    }

    #[tokio::test]
    async fn shutdown_config_default() {
        let config = ShutdownConfig::default();
        assert_eq!(
            config.graceful_timeout,
            Duration::from_secs(DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT_SECONDS)
        );
    }

    #[tokio::test]
    async fn elapsed_request_answers_with_error_body() {
        let router: Router = with_request_timeout(
            Router::new().route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    "done"
                }),
            ),
            Duration::from_secs(1),
        );

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/slow")
                    .body(axum::body::Body::empty())
                    .expect("request"),
            )
            .await
            .expect("infallible");

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("body should be JSON");
        assert_eq!(
            body,
            serde_json::json!({"error": "Operation timed out after 1 seconds", "status": 408})
        );
    }

    #[test]
    fn non_timeout_middleware_errors_are_internal() {
        let err: BoxError = "broken layer".into();
        let mapped = middleware_error(&err, 5);
        assert_eq!(mapped.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
