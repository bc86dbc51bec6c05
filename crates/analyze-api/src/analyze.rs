// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Wallet analysis pipeline
//!
//! [`Analyzer`] runs one request end to end: validate the address, fetch a page
//! of history from the [`TransactionProvider`], flatten native transfers, and,
//! when an [`EnrichmentService`] is configured, attach its score. A scoring
//! failure never fails the request; the response carries
//! [`enrichment_failure_sentinel`] instead.

use std::time::Instant;

use api_client::{
    ApiError, EnrichmentResult, EnrichmentService, NativeTransfer, ScoringRequest, Transaction,
    TransactionPage, TransactionProvider,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::EthAddress;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use utoipa::ToSchema;

use crate::metrics;

/// Status tag of every successful response
pub const SUCCESS_STATUS: &str = "success";

/// Message placed in `ml_result` when scoring fails
pub const ENRICHMENT_FAILURE_MESSAGE: &str = "ML analysis failed";

/// Placeholder returned in place of a scoring result that could not be obtained
pub fn enrichment_failure_sentinel() -> EnrichmentResult {
    let mut sentinel = EnrichmentResult::new();
    sentinel.insert(
        "error".to_string(),
        Value::String(ENRICHMENT_FAILURE_MESSAGE.to_string()),
    );
    sentinel
}

/// Body of `POST /api/v1/analyze`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnalyzeRequest {
    /// Ethereum address to analyze; a missing field is treated as empty
    #[serde(default)]
    #[schema(example = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e")]
    pub address: String,
}

/// Combined transaction history and scoring result for one address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnalyzeResponse {
    /// Always `success`
    #[schema(example = "success")]
    pub status: String,
    /// `Found N transactions`
    #[schema(example = "Found 2 transactions")]
    pub message: String,
    /// Provider pagination cursor, passed through unmodified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    /// Provider page size, passed through unmodified
    pub page_size: u32,
    /// Transactions in provider order
    pub transactions: Vec<Transaction>,
    /// Native transfers of every transaction, concatenated in order
    pub native_transfers: Vec<NativeTransfer>,
    /// Scoring service answer, or `{"error": "ML analysis failed"}`;
    /// absent when scoring is not configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub ml_result: Option<EnrichmentResult>,
}

impl AnalyzeResponse {
    fn new(page: TransactionPage, ml_result: Option<EnrichmentResult>) -> Self {
        let native_transfers = page.native_transfers();
        Self {
            status: SUCCESS_STATUS.to_string(),
            message: format!("Found {} transactions", page.result.len()),
            cursor: page.cursor.filter(|cursor| !cursor.is_empty()),
            page_size: page.page_size,
            transactions: page.result,
            native_transfers,
            ml_result,
        }
    }
}

/// Failures that abort an analyze request
#[derive(Debug, Error)]
pub enum AnalyzeError {
    /// Address did not pass validation; the provider was not called
    #[error("invalid Ethereum address: {0:?}")]
    InvalidAddress(String),

    /// The transaction provider failed; scoring was not attempted
    #[error("failed to get transactions: {0}")]
    Provider(#[source] ApiError),
}

/// Validate, fetch, flatten and optionally score
#[derive(Debug)]
pub struct Analyzer<P, E> {
    provider: P,
    enrichment: Option<E>,
}

impl<P, E> Analyzer<P, E>
where
    P: TransactionProvider,
    E: EnrichmentService,
{
    /// Create an analyzer; `enrichment` of `None` skips scoring entirely
    pub fn new(provider: P, enrichment: Option<E>) -> Self {
        Self {
            provider,
            enrichment,
        }
    }

    /// Transaction provider
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Scoring service, if configured
    pub fn enrichment(&self) -> Option<&E> {
        self.enrichment.as_ref()
    }

    /// Analyze `raw_address`
    ///
    /// # Errors
    ///
    /// - [`AnalyzeError::InvalidAddress`] before any upstream call
    /// - [`AnalyzeError::Provider`] if the transaction history cannot be fetched
    ///
    /// Scoring failures are not errors.
    pub async fn analyze(&self, raw_address: &str) -> Result<AnalyzeResponse, AnalyzeError> {
        let address = EthAddress::parse(raw_address).map_err(|rejected| {
            warn!(address = %rejected.input, "invalid Ethereum address");
            AnalyzeError::InvalidAddress(rejected.input)
        })?;

        let page = self.fetch(&address).await?;

        info!(
            %address,
            count = page.result.len(),
            native_transfers = page
                .result
                .iter()
                .map(|tx| tx.native_transfers.len())
                .sum::<usize>(),
            "successfully retrieved transactions"
        );

        let ml_result = match &self.enrichment {
            Some(service) => Some(Self::score(service, &address, &page.result).await),
            None => None,
        };

        Ok(AnalyzeResponse::new(page, ml_result))
    }

    async fn fetch(&self, address: &EthAddress) -> Result<TransactionPage, AnalyzeError> {
        let started = Instant::now();
        let result = self.provider.get_transactions(address).await;
        let elapsed = started.elapsed().as_secs_f64();

        match result {
            Ok(page) => {
                metrics::observe_provider_duration(self.provider.name(), "ok", elapsed);
                Ok(page)
            }
            Err(e) => {
                metrics::observe_provider_duration(self.provider.name(), "error", elapsed);
                error!(
                    %address,
                    provider = self.provider.name(),
                    error = %e,
                    "failed to get transactions"
                );
                Err(AnalyzeError::Provider(e))
            }
        }
    }

    async fn score(
        service: &E,
        address: &EthAddress,
        transactions: &[Transaction],
    ) -> EnrichmentResult {
        let request = ScoringRequest::from_transactions(address, transactions);
        debug!(
            service = service.name(),
            transactions = request.transactions.len(),
            "requesting score"
        );

        let started = Instant::now();
        let result = service.score(&request).await;
        let elapsed = started.elapsed().as_secs_f64();

        match result {
            Ok(score) => {
                metrics::observe_scoring_duration("ok", elapsed);
                score
            }
            Err(e) => {
                metrics::observe_scoring_duration("error", elapsed);
                metrics::inc_enrichment_fallbacks();
                error!(
                    %address,
                    service = service.name(),
                    error = %e,
                    "failed to get ML analysis"
                );
                enrichment_failure_sentinel()
            }
        }
    }
}
