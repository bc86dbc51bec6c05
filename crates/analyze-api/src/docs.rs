// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! `OpenAPI` document definition

use api_client::{NativeTransfer, Transaction};
use utoipa::OpenApi;

use crate::{
    analyze::{AnalyzeRequest, AnalyzeResponse},
    config::Environment,
    error::ErrorBody,
    routes::handlers::{self, AliveResponse},
    state::{HealthCheck, HealthStatus},
};

/// `OpenAPI` document for every public route
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "Wallet Analyze API",
        description = "Ethereum wallet transaction history from Moralis combined with ML scoring"
    ),
    paths(
        handlers::analyze_handler,
        handlers::alive_handler,
        handlers::health_handler,
    ),
    components(schemas(
        AnalyzeRequest,
        AnalyzeResponse,
        Transaction,
        NativeTransfer,
        ErrorBody,
        AliveResponse,
        HealthCheck,
        HealthStatus,
        Environment,
    )),
    tags(
        (name = "analyze", description = "Wallet analysis"),
        (name = "health", description = "Liveness and upstream health")
    )
)]
pub struct ApiDoc;
