// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server state management module
//!
//! This module provides shared application state for the analyze server:
//! configuration and the analysis pipeline.

use std::{collections::HashMap, sync::Arc};

use api_client::{ApiError, EnrichmentService, TransactionProvider};
use external_apis::{MoralisClient, ScoringClient};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    analyze::Analyzer,
    config::{Environment, ServerConfig},
};

/// Analysis pipeline wired to the production clients
pub type WalletAnalyzer = Analyzer<MoralisClient, ScoringClient>;

/// Shared application state
#[derive(Debug, Clone)]
pub struct ServerState {
    /// Server configuration
    config: ServerConfig,
    /// Analysis pipeline shared by every request
    analyzer: Arc<WalletAnalyzer>,
}

impl ServerState {
    /// Create new server state
    pub fn new(config: ServerConfig, analyzer: Arc<WalletAnalyzer>) -> Self {
        Self { config, analyzer }
    }

    /// Server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Analysis pipeline
    pub fn analyzer(&self) -> &WalletAnalyzer {
        &self.analyzer
    }

    /// Probe every upstream client and summarize
    ///
    /// The service itself stays `Up` only while every client is `Up`; any other
    /// client state reports the service as `Degraded`.
    pub async fn health_check(&self) -> HealthCheck {
        let provider = self.analyzer.provider();
        let mut api_clients = HashMap::new();

        api_clients.insert(
            provider.name().to_string(),
            Self::convert_health_status(provider.health_check().await),
        );

        if let Some(scoring) = self.analyzer.enrichment() {
            api_clients.insert(
                scoring.name().to_string(),
                Self::convert_health_status(scoring.health_check().await),
            );
        }

        HealthCheck {
            status: Self::overall_status(&api_clients),
            version: Box::from(env!("CARGO_PKG_VERSION")),
            environment: self.config.environment,
            timestamp: chrono::Utc::now().to_rfc3339(),
            api_clients,
        }
    }

    fn overall_status(api_clients: &HashMap<String, HealthStatus>) -> HealthStatus {
        let mut unhealthy: Vec<&str> = api_clients
            .iter()
            .filter(|(_, status)| **status != HealthStatus::Up)
            .map(|(name, _)| name.as_str())
            .collect();

        if unhealthy.is_empty() {
            return HealthStatus::Up;
        }

        unhealthy.sort_unstable();
        HealthStatus::Degraded {
            reason: format!("unhealthy upstream: {}", unhealthy.join(", ")).into_boxed_str(),
        }
    }

    /// Convert external API health status to internal health status
    fn convert_health_status(
        external_status: Result<api_client::HealthStatus, ApiError>,
    ) -> HealthStatus {
        match external_status {
            Ok(api_client::HealthStatus::Up) => HealthStatus::Up,
            Ok(api_client::HealthStatus::Degraded { reason }) => HealthStatus::Degraded {
                reason: reason.into_boxed_str(),
            },
            Ok(api_client::HealthStatus::Down { reason }) => HealthStatus::Down {
                reason: reason.into_boxed_str(),
            },
            Err(e) => HealthStatus::Down {
                reason: e.to_string().into_boxed_str(),
            },
        }
    }
}

/// Health status of a service or dependency
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum HealthStatus {
    /// Service is fully operational and responding normally
    Up,

    /// Service is not operational or has critical failures
    Down {
        /// Human-readable explanation of why the service is down
        reason: Box<str>,
    },

    /// Service is operational but experiencing performance issues or partial failures
    Degraded {
        /// Human-readable explanation of the degradation condition
        reason: Box<str>,
    },
}

/// Health check status
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthCheck {
    /// Service status
    pub status: HealthStatus,
    /// Service version
    #[schema(value_type = String)]
    pub version: Box<str>,
    /// Environment
    pub environment: Environment,
    /// Timestamp
    pub timestamp: String,
    /// Status of individual API clients
    #[schema(value_type = Object)]
    pub api_clients: HashMap<String, HealthStatus>,
}
