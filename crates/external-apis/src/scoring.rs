// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! ML scoring service integration
//!
//! [`ScoringClient`] forwards a [`ScoringRequest`] to the configured scoring
//! endpoint and hands back whatever JSON object the service answers with. The
//! response schema belongs to the scoring service and is not validated here
//! beyond "is a JSON object".

use std::time::{Duration, Instant};

use api_client::{ApiError, EnrichmentResult, EnrichmentService, HealthStatus, ScoringRequest};
use reqwest::{Client, StatusCode, header::CONTENT_TYPE};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use url::Url;

const DEFAULT_SCORING_TIMEOUT_SECONDS: u64 = 10;
const HEALTH_CHECK_TIMEOUT_SECONDS: u64 = 5;

/// Configuration for the scoring service client
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    /// Endpoint receiving `POST` scoring requests
    pub url: String,
    /// Health probe URL; defaults to `health` next to the scoring endpoint
    pub health_url: Option<String>,
    /// Request timeout in seconds, independent of the provider timeout
    pub timeout_seconds: u64,
}

impl ScoringConfig {
    /// Configuration for `url` with the default timeout
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            health_url: None,
            timeout_seconds: DEFAULT_SCORING_TIMEOUT_SECONDS,
        }
    }
}

/// Errors specific to the scoring client
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum ScoringError {
    /// The request could not be encoded as JSON
    #[error("failed to marshal ML request: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Transport failure
    #[error("failed to send request to ML service: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-200 response
    #[error("ML service returned status: {status}")]
    Status { status: u16, body: String },

    /// Body is not a JSON object
    #[error("failed to decode ML response: {0}")]
    Decode(#[source] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Timeout error
    #[error("Request timeout after {seconds} seconds")]
    Timeout { seconds: u64 },
}

impl From<ScoringError> for ApiError {
    fn from(value: ScoringError) -> Self {
        match value {
            ScoringError::Serialize(error) => ApiError::Serialization {
                message: error.to_string(),
            },
            ScoringError::Http(error) => ApiError::Http {
                message: error.to_string(),
            },
            ScoringError::Status { status, body } => ApiError::Status { status, body },
            ScoringError::Decode(error) => ApiError::InvalidResponse {
                message: error.to_string(),
            },
            ScoringError::Config(message) => ApiError::Configuration { message },
            ScoringError::Timeout { seconds } => ApiError::Timeout {
                timeout_seconds: seconds,
            },
        }
    }
}

/// Scoring service client implementation
#[derive(Debug)]
pub struct ScoringClient {
    client: Client,
    endpoint: Url,
    health_url: Url,
    timeout_seconds: u64,
}

impl ScoringClient {
    /// Create a new scoring client
    ///
    /// # Errors
    ///
    /// Returns an error if either URL does not parse or the HTTP client
    /// cannot be built
    pub fn new(config: ScoringConfig) -> Result<Self, ScoringError> {
        let endpoint = Url::parse(config.url.trim())
            .map_err(|e| ScoringError::Config(format!("invalid scoring URL: {e}")))?;

        let health_url = match config.health_url.as_deref() {
            Some(raw) => Url::parse(raw.trim())
                .map_err(|e| ScoringError::Config(format!("invalid scoring health URL: {e}")))?,
            None => endpoint.join("health").map_err(|e| {
                ScoringError::Config(format!("cannot derive scoring health URL: {e}"))
            })?,
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("wallet-analyze/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ScoringError::Http)?;

        Ok(Self {
            client,
            endpoint,
            health_url,
            timeout_seconds: config.timeout_seconds,
        })
    }

    /// Endpoint scoring requests are posted to
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// URL probed by the health check
    pub fn health_url(&self) -> &Url {
        &self.health_url
    }

    /// Post `request` to the scoring endpoint
    ///
    /// # Errors
    ///
    /// Returns a [`ScoringError`] for each distinct failure mode; callers
    /// decide whether a failure is fatal.
    pub async fn submit(&self, request: &ScoringRequest) -> Result<EnrichmentResult, ScoringError> {
        let body = serde_json::to_vec(request).map_err(ScoringError::Serialize)?;

        debug!(
            url = %self.endpoint,
            transactions = request.transactions.len(),
            "sending transactions to scoring service"
        );

        let started = Instant::now();
        let response = timeout(
            Duration::from_secs(self.timeout_seconds),
            self.client
                .post(self.endpoint.clone())
                .header(CONTENT_TYPE, "application/json")
                .body(body)
                .send(),
        )
        .await
        .map_err(|_| ScoringError::Timeout {
            seconds: self.timeout_seconds,
        })?
        .map_err(|e| self.classify_transport_error(e))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(ScoringError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.classify_transport_error(e))?;
        let result: EnrichmentResult =
            serde_json::from_slice(&bytes).map_err(ScoringError::Decode)?;

        debug!(elapsed = ?started.elapsed(), "scoring service answered");
        Ok(result)
    }

    fn classify_transport_error(&self, error: reqwest::Error) -> ScoringError {
        if error.is_timeout() {
            ScoringError::Timeout {
                seconds: self.timeout_seconds,
            }
        } else {
            ScoringError::Http(error)
        }
    }
}

impl EnrichmentService for ScoringClient {
    async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        debug!(url = %self.health_url, "performing health check on scoring service");

        let response = timeout(
            Duration::from_secs(HEALTH_CHECK_TIMEOUT_SECONDS),
            self.client.get(self.health_url.clone()).send(),
        )
        .await
        .map_err(|_| ScoringError::Timeout {
            seconds: HEALTH_CHECK_TIMEOUT_SECONDS,
        })?;

        match response {
            Ok(response) if response.status() == StatusCode::OK => {
                info!("scoring service health check passed");
                Ok(HealthStatus::Up)
            }
            Ok(response) => {
                let status = HealthStatus::from_probe_status(response.status().as_u16());
                warn!(reason = status.description(), "scoring service health check failed");
                Ok(status)
            }
            Err(e) => {
                warn!("scoring service health check failed: {e}");
                Ok(HealthStatus::Down {
                    reason: format!("request failed: {e}"),
                })
            }
        }
    }

    async fn score(&self, request: &ScoringRequest) -> Result<EnrichmentResult, ApiError> {
        self.submit(request).await.map_err(ApiError::from)
    }

    fn name(&self) -> &'static str {
        "scoring"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_url_defaults_next_to_endpoint() {
        let client = ScoringClient::new(ScoringConfig::new("http://ml:8000/analyze"))
            .expect("valid config");
        assert_eq!(client.health_url().as_str(), "http://ml:8000/health");

        let nested = ScoringClient::new(ScoringConfig::new("http://ml:8000/api/v1/analyze"))
            .expect("valid config");
        assert_eq!(nested.health_url().as_str(), "http://ml:8000/api/v1/health");
    }

    #[test]
    fn explicit_health_url_wins() {
        let client = ScoringClient::new(ScoringConfig {
            health_url: Some("http://ml:9000/ready".to_string()),
            ..ScoringConfig::new("http://ml:8000/analyze")
        })
        .expect("valid config");
        assert_eq!(client.health_url().as_str(), "http://ml:9000/ready");
    }

    #[test]
    fn rejects_unparsable_url() {
        let result = ScoringClient::new(ScoringConfig::new("not a url"));
        assert!(matches!(result, Err(ScoringError::Config(_))));
    }

    #[test]
    fn status_error_message() {
        let err = ScoringError::Status {
            status: 503,
            body: String::new(),
        };
        assert_eq!(err.to_string(), "ML service returned status: 503");
        assert_eq!(ApiError::from(err).status(), Some(503));
    }
}
