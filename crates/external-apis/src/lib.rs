// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Upstream integrations for the wallet analyze service
//!
//! This crate provides the HTTP implementations of the `api_client` traits.
//!
//! # Architecture
//!
//! - [`moralis`]: [`MoralisClient`] implements `TransactionProvider` against the
//!   Moralis wallet-history endpoint
//! - [`scoring`]: [`ScoringClient`] implements `EnrichmentService` against the
//!   ML scoring service
//!
//! Both clients are immutable after construction and wrap a single reusable
//! `reqwest::Client`. Neither retries; each enforces its own timeout.

pub mod moralis;
pub mod scoring;

pub use moralis::*;
pub use scoring::*;
