// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Upstream client traits and data model for the wallet analyze service
//!
//! This crate defines the two seams the analyze pipeline depends on, without
//! committing to any particular HTTP implementation.
//!
//! # Core Abstractions
//!
//! - **`TransactionProvider`**: fetches one page of transaction history for an address
//! - **`EnrichmentService`**: scores a projected transaction history
//! - **Health Check System**: standardized `Up` / `Degraded` / `Down` reporting
//! - **Error Handling**: a single [`ApiError`] shared by every upstream client
//! - **Data Types**: [`types`] for provider payloads, [`scoring`] for the enrichment request

use serde_json::{Map, Value};
use shared_types::EthAddress;
use thiserror::Error;

pub mod health;
pub mod scoring;
pub mod types;

pub use health::*;
pub use scoring::*;
pub use types::*;

/// Untyped JSON object returned by the enrichment service
pub type EnrichmentResult = Map<String, Value>;

/// Source of transaction history for an address
///
/// Implementations issue exactly one upstream request per call. Pagination
/// cursors are surfaced in the returned page but never followed.
pub trait TransactionProvider: Send + Sync {
    /// Check the health of the upstream provider
    ///
    /// # Errors
    ///
    /// Returns an error if the health probe itself cannot be performed
    fn health_check(&self) -> impl Future<Output = Result<HealthStatus, ApiError>> + Send;

    /// Fetch the first page of transactions for `address`
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-200 status, or an
    /// undecodable body
    fn get_transactions(
        &self,
        address: &EthAddress,
    ) -> impl Future<Output = Result<TransactionPage, ApiError>> + Send;

    /// Get the name/identifier of this provider
    fn name(&self) -> &'static str;
}

/// Optional scoring stage applied to a transaction history
pub trait EnrichmentService: Send + Sync {
    /// Check the health of the scoring service
    ///
    /// # Errors
    ///
    /// Returns an error if the health probe itself cannot be performed
    fn health_check(&self) -> impl Future<Output = Result<HealthStatus, ApiError>> + Send;

    /// Submit `request` for scoring and return the service's JSON object verbatim
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be encoded or sent, the service
    /// answers with a non-200 status, or the body is not a JSON object
    fn score(
        &self,
        request: &ScoringRequest,
    ) -> impl Future<Output = Result<EnrichmentResult, ApiError>> + Send;

    /// Get the name/identifier of this service
    fn name(&self) -> &'static str;
}

/// Common errors that can occur when talking to an upstream service
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum ApiError {
    /// Transport-level failure (DNS, refused connection, TLS)
    #[error("HTTP request failed: {message}")]
    Http { message: String },

    /// The upstream answered with a status other than 200
    #[error("upstream returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The upstream body could not be decoded
    #[error("Invalid response format: {message}")]
    InvalidResponse { message: String },

    /// The outbound request could not be encoded
    #[error("Failed to encode request: {message}")]
    Serialization { message: String },

    /// Client was constructed with unusable settings
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The request exceeded the client's deadline
    #[error("Request timeout after {timeout_seconds} seconds")]
    Timeout { timeout_seconds: u64 },
}

impl ApiError {
    /// Status code carried by a non-200 upstream answer
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_keeps_body_verbatim() {
        let err = ApiError::Status {
            status: 502,
            body: "{\"message\":\"bad gateway\"}".to_string(),
        };
        assert_eq!(err.status(), Some(502));
        assert_eq!(
            err.to_string(),
            "upstream returned status 502: {\"message\":\"bad gateway\"}"
        );
    }

    #[test]
    fn non_status_errors_have_no_status() {
        let err = ApiError::Timeout { timeout_seconds: 30 };
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "Request timeout after 30 seconds");
    }
}
