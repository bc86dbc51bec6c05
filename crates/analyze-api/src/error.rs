// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error handling module
//!
//! This module provides the server error type and its mapping onto HTTP
//! responses. Every error body has the shape `{"error": "<message>", "status": <code>}`.

use std::net::SocketAddr;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

use crate::analyze::AnalyzeError;

/// Comprehensive error types for server operations
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration validation errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Network binding errors
    #[error("Failed to bind to {address}: {source}")]
    Bind {
        /// Socket address that failed to bind
        address: SocketAddr,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Server startup errors
    #[error("Server startup failed: {source}")]
    Startup {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Server shutdown errors
    #[error("Server shutdown failed: {source}")]
    Shutdown {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// A middleware layer failed for a reason other than a timeout
    #[error("internal server error")]
    Middleware {
        /// Layer error, logged but not returned
        message: String,
    },

    /// Timeout errors for operations that exceed time limits
    #[error("Operation timed out after {timeout_seconds} seconds")]
    Timeout {
        /// Timeout duration in seconds
        timeout_seconds: u64,
    },

    /// The request carried no body
    #[error("empty request")]
    EmptyBody,

    /// The request body could not be decoded
    #[error("failed to decode request")]
    JsonError {
        /// Detailed decoder message, logged but not returned
        message: String,
    },

    /// The address does not look like an Ethereum address
    #[error("invalid Ethereum address")]
    InvalidAddress,

    /// The transaction provider call failed
    #[error("failed to get transactions")]
    Upstream {
        /// Upstream failure detail, logged but not returned
        message: String,
    },
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

/// JSON body of every error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Human-readable error message
    #[schema(example = "invalid Ethereum address")]
    pub error: String,
    /// HTTP status code, repeated in the body
    #[schema(example = 400)]
    pub status: u16,
}

impl ServerError {
    /// HTTP status this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Config { .. }
            | ServerError::Bind { .. }
            | ServerError::Startup { .. }
            | ServerError::Shutdown { .. }
            | ServerError::Middleware { .. }
            | ServerError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Timeout { .. } => StatusCode::REQUEST_TIMEOUT,
            ServerError::EmptyBody
            | ServerError::JsonError { .. }
            | ServerError::InvalidAddress => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = ?self, "request failed");
        }

        let body = Json(ErrorBody {
            error: self.to_string(),
            status: status.as_u16(),
        });
        (status, body).into_response()
    }
}

impl From<AnalyzeError> for ServerError {
    fn from(value: AnalyzeError) -> Self {
        match value {
            AnalyzeError::InvalidAddress(_) => Self::InvalidAddress,
            AnalyzeError::Provider(source) => Self::Upstream {
                message: source.to_string(),
            },
        }
    }
}
