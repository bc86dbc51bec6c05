// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Wallet Analyze Server Implementation
//!
//! This crate provides the HTTP server that turns an Ethereum address into its
//! Moralis transaction history plus an ML risk score, built with Axum and designed
//! for production use with hierarchical configuration, middleware, and graceful
//! shutdown.
//!
//! # Module Structure
//!
//! - [`analyze`]: The analysis pipeline (validate, fetch, flatten, score) and its envelope
//! - [`config`]: Server configuration and environment management with hierarchical loading
//! - [`error`]: Error types and HTTP response handling with proper status codes
//! - [`extractors`]: JSON body extraction that separates empty from malformed bodies
//! - [`state`]: Shared application state and aggregated upstream health
//! - [`server`]: Main server implementation, lifecycle, and coordinated shutdown
//! - [`routes`]: Route configuration and HTTP request handlers
//! - [`middleware`]: CORS policy built from configuration
//! - [`metrics`]: Prometheus counters and histograms
//! - [`openapi`]: `OpenAPI` specification and Swagger UI endpoints for API documentation
//!
//! # Key Features
//!
//! - **Fail-soft scoring**: a scoring outage degrades `ml_result`, never the request
//! - **Graceful Shutdown**: Coordinated termination using `CancellationToken` with timeouts
//! - **Health Monitoring**: Aggregated health checks across Moralis and the scoring service
//! - **Request tracing**: every request carries an `x-request-id` through its span

pub mod analyze;
pub mod config;
pub mod docs;
pub mod error;
pub mod extractors;
pub mod metrics;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod state;

pub use analyze::{AnalyzeError, AnalyzeRequest, AnalyzeResponse, Analyzer};
pub use config::{Environment, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use server::{Server, ShutdownConfig};
pub use state::{HealthCheck, ServerState};
