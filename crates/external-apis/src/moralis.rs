// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Moralis Web3 API integration
//!
//! This module provides an implementation of the `TransactionProvider` trait for
//! the Moralis wallet-history endpoint (`GET /{address}?chain=eth`).

use std::time::{Duration, Instant};

use api_client::{ApiError, HealthStatus, TransactionPage, TransactionProvider};
use reqwest::{Client, StatusCode};
use shared_types::EthAddress;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Default Moralis REST endpoint
pub const DEFAULT_MORALIS_BASE_URL: &str = "https://deep-index.moralis.io/api/v2";

const MORALIS_CHAIN: &str = "eth";

/// Configuration for the Moralis API client
#[derive(Debug, Clone)]
pub struct MoralisConfig {
    /// Base URL for the Moralis API
    pub base_url: String,
    /// API key for authentication
    pub api_key: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Health check timeout in seconds
    pub health_check_timeout_seconds: u64,
}

impl Default for MoralisConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_MORALIS_BASE_URL.to_string(),
            api_key: String::new(),
            timeout_seconds: 30,
            health_check_timeout_seconds: 5,
        }
    }
}

/// Moralis API client implementation
#[derive(Debug)]
pub struct MoralisClient {
    client: Client,
    config: MoralisConfig,
}

/// Errors specific to the Moralis API client
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum MoralisError {
    /// Transport failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// 200 response whose body is not a transaction page
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Non-200 response, body kept verbatim
    #[error("moralis api error: {status}, body: {body}")]
    ApiError { status: u16, body: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Timeout error
    #[error("Request timeout after {seconds} seconds")]
    Timeout { seconds: u64 },
}

impl From<MoralisError> for ApiError {
    fn from(value: MoralisError) -> Self {
        match value {
            MoralisError::Http(error) => ApiError::Http {
                message: error.to_string(),
            },
            MoralisError::Decode(error) => ApiError::InvalidResponse {
                message: error.to_string(),
            },
            MoralisError::ApiError { status, body } => ApiError::Status { status, body },
            MoralisError::Config(message) => ApiError::Configuration { message },
            MoralisError::Timeout { seconds } => ApiError::Timeout {
                timeout_seconds: seconds,
            },
        }
    }
}

impl MoralisClient {
    /// Create a new Moralis API client
    ///
    /// # Errors
    ///
    /// Returns an error if the API key or base URL is blank, or the HTTP
    /// client cannot be built
    pub fn new(config: MoralisConfig) -> Result<Self, MoralisError> {
        if config.api_key.trim().is_empty() {
            return Err(MoralisError::Config("API key cannot be empty".to_string()));
        }

        if config.base_url.trim().is_empty() {
            return Err(MoralisError::Config("Base URL cannot be empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("wallet-analyze/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(MoralisError::Http)?;

        Ok(Self { client, config })
    }

    /// Client configuration
    pub fn config(&self) -> &MoralisConfig {
        &self.config
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Fetch one page of wallet history for `address` on Ethereum mainnet
    ///
    /// Issues a single request. The returned cursor is not followed.
    ///
    /// # Errors
    ///
    /// - [`MoralisError::Http`] / [`MoralisError::Timeout`] on transport failure
    /// - [`MoralisError::ApiError`] with the raw body on any non-200 status
    /// - [`MoralisError::Decode`] if a 200 body is not a valid page
    pub async fn get_wallet_history(
        &self,
        address: &EthAddress,
    ) -> Result<TransactionPage, MoralisError> {
        let url = self.url_for(address.as_str());

        debug!(url, chain = MORALIS_CHAIN, "fetching wallet history from Moralis");

        let request = self
            .client
            .get(&url)
            .query(&[("chain", MORALIS_CHAIN)])
            .header("X-API-Key", &self.config.api_key)
            .header("Accept", "application/json");

        let response = timeout(
            Duration::from_secs(self.config.timeout_seconds),
            request.send(),
        )
        .await
        .map_err(|_| MoralisError::Timeout {
            seconds: self.config.timeout_seconds,
        })?
        .map_err(|e| self.classify_transport_error(e))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
            warn!(status = status.as_u16(), body = %body, "Moralis API returned an error");
            return Err(MoralisError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.classify_transport_error(e))?;
        let page: TransactionPage = serde_json::from_slice(&bytes)?;

        debug!(
            transactions = page.result.len(),
            page_size = page.page_size,
            "received wallet history page"
        );

        Ok(page)
    }

    fn classify_transport_error(&self, error: reqwest::Error) -> MoralisError {
        if error.is_timeout() {
            MoralisError::Timeout {
                seconds: self.config.timeout_seconds,
            }
        } else {
            MoralisError::Http(error)
        }
    }
}

impl TransactionProvider for MoralisClient {
    async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        let url = self.url_for("info/endpointWeights");

        debug!(url, "performing health check on Moralis API");

        let request = self
            .client
            .get(&url)
            .header("X-API-Key", &self.config.api_key)
            .header("Accept", "application/json");

        let start_time = Instant::now();
        let response = timeout(
            Duration::from_secs(self.config.health_check_timeout_seconds),
            request.send(),
        )
        .await
        .map_err(|_| MoralisError::Timeout {
            seconds: self.config.health_check_timeout_seconds,
        })?;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                warn!("Moralis API health check failed: {e}");
                return Ok(HealthStatus::Down {
                    reason: format!("request failed: {e}"),
                });
            }
        };

        let status = HealthStatus::from_probe_status(response.status().as_u16());
        if status == HealthStatus::Up {
            info!("Moralis API health check passed in {:?}", start_time.elapsed());
        } else {
            warn!(reason = status.description(), "Moralis API health check failed");
        }
        Ok(status)
    }

    async fn get_transactions(&self, address: &EthAddress) -> Result<TransactionPage, ApiError> {
        self.get_wallet_history(address).await.map_err(|e| {
            warn!(%address, error = %e, "failed to fetch wallet history from Moralis");
            ApiError::from(e)
        })
    }

    fn name(&self) -> &'static str {
        "moralis"
    }
}
