// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP request handlers module
//!
//! This module provides the analyze, liveness and health handlers.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::{
    analyze::{AnalyzeError, AnalyzeRequest, AnalyzeResponse},
    error::{ErrorBody, ServerError},
    extractors::JsonExtractor,
    metrics,
    state::{HealthCheck, ServerState},
};

/// Health check endpoint handler
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    summary = "Health check endpoint",
    description = "Returns the health of the service including version, environment information, and the status of the Moralis and scoring clients. Answers 200 even when an upstream is unhealthy; the service status is `Degraded` in that case.",
    responses(
        (status = 200, description = "Health report", body = HealthCheck)
    )
)]
pub async fn health_handler(State(state): State<ServerState>) -> Json<HealthCheck> {
    Json(state.health_check().await)
}

/// Liveness response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AliveResponse {
    /// Always `alive`
    #[schema(example = "alive")]
    pub status: String,
}

/// Liveness endpoint handler
#[utoipa::path(
    get,
    path = "/api/v1/alive",
    tag = "health",
    summary = "Liveness probe",
    description = "Answers as long as the process is serving requests. Does not contact any upstream.",
    responses(
        (status = 200, description = "Process is alive", body = AliveResponse)
    )
)]
pub async fn alive_handler() -> Json<AliveResponse> {
    Json(AliveResponse {
        status: "alive".to_string(),
    })
}

/// Wallet analysis
///
/// Fetches the first page of Ethereum mainnet transaction history for the
/// address from Moralis, flattens native transfers, and attaches the ML scoring
/// result when scoring is enabled. A scoring failure still answers 200 with
/// `ml_result` set to `{"error": "ML analysis failed"}`.
///
/// # Errors
///
/// Returns `ServerError` for an empty or malformed body, an invalid address,
/// or a Moralis failure.
#[utoipa::path(
    post,
    path = "/api/v1/analyze",
    tag = "analyze",
    summary = "Analyze Ethereum address",
    description = "Get transactions for an Ethereum address using the Moralis API and analyze them with the ML service.",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Transactions retrieved and analyzed", body = AnalyzeResponse),
        (status = 400, description = "Empty or malformed body, or invalid Ethereum address", body = ErrorBody),
        (status = 408, description = "Request exceeded the server timeout", body = ErrorBody),
        (status = 500, description = "Transactions could not be retrieved", body = ErrorBody)
    )
)]
pub async fn analyze_handler(
    State(state): State<ServerState>,
    request: Result<JsonExtractor<AnalyzeRequest>, ServerError>,
) -> Result<Json<AnalyzeResponse>, ServerError> {
    let JsonExtractor(request) = request.inspect_err(|_| {
        metrics::inc_analyze_requests("invalid_request");
    })?;

    info!(address = %request.address, "analyzing address");

    match state.analyzer().analyze(&request.address).await {
        Ok(response) => {
            metrics::inc_analyze_requests("success");
            Ok(Json(response))
        }
        Err(e) => {
            let outcome = match &e {
                AnalyzeError::InvalidAddress(_) => "invalid_request",
                AnalyzeError::Provider(_) => "upstream_error",
            };
            metrics::inc_analyze_requests(outcome);
            Err(e.into())
        }
    }
}
