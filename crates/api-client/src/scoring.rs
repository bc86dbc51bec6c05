// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Scoring request projection
//!
//! The scoring service does not consume provider transactions directly. Each
//! transaction is reduced to a flat record of timestamp, numeric value, method
//! label and destination, in the same order the provider returned them.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use shared_types::EthAddress;
use utoipa::ToSchema;

use crate::types::Transaction;

// Leading decimal number, optionally signed, optionally with an exponent.
static DECIMAL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?")
        .expect("decimal prefix pattern should compile")
});

/// Request body sent to the scoring service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScoringRequest {
    /// Address whose history is being scored
    pub address: EthAddress,
    /// One record per provider transaction, in provider order
    pub transactions: Vec<ScoringTransaction>,
}

/// Flattened transaction record consumed by the scoring model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScoringTransaction {
    /// Block time in seconds since the Unix epoch
    pub timestamp: i64,
    /// Transaction value parsed as a float, `0` when unparsable
    pub value: f64,
    /// Method label, empty when the provider did not decode one
    pub method: String,
    /// Destination address, empty for contract creation
    pub to: String,
}

impl ScoringRequest {
    /// Project provider transactions into a scoring request
    pub fn from_transactions(address: &EthAddress, transactions: &[Transaction]) -> Self {
        Self {
            address: address.clone(),
            transactions: transactions.iter().map(ScoringTransaction::from).collect(),
        }
    }
}

impl From<&Transaction> for ScoringTransaction {
    fn from(tx: &Transaction) -> Self {
        Self {
            timestamp: tx.timestamp_seconds(),
            value: parse_value(&tx.value),
            method: tx.method_label.clone().unwrap_or_default(),
            to: tx.to_address.clone().unwrap_or_default(),
        }
    }
}

/// Best-effort decimal parse of a provider value string
///
/// Leading whitespace is skipped and the longest leading decimal number is
/// used, so `"12abc"` yields `12.0`. Empty, non-numeric or non-finite input
/// yields `0.0`. Never fails.
pub fn parse_value(raw: &str) -> f64 {
    DECIMAL_PREFIX
        .find(raw.trim_start())
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;

    #[test]
    fn parse_value_decimal() {
        assert!((parse_value("123.45") - 123.45).abs() < f64::EPSILON);
        assert!((parse_value("115580000000000000") - 1.1558e17).abs() < 1.0);
        assert!((parse_value("-2.5") + 2.5).abs() < f64::EPSILON);
        assert!((parse_value(".5") - 0.5).abs() < f64::EPSILON);
        assert!((parse_value("1e3") - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn parse_value_defaults_to_zero() {
        assert!(parse_value("").abs() < f64::EPSILON);
        assert!(parse_value("abc").abs() < f64::EPSILON);
        assert!(parse_value("   ").abs() < f64::EPSILON);
        assert!(parse_value("-").abs() < f64::EPSILON);
        assert!(parse_value("1e999").abs() < f64::EPSILON);
    }

    #[test]
    fn parse_value_uses_leading_number() {
        assert!((parse_value("12abc") - 12.0).abs() < f64::EPSILON);
        assert!((parse_value("  7.25 wei") - 7.25).abs() < f64::EPSILON);
    }

    fn tx(value: &str, method: Option<&str>, to: Option<&str>, ts: i64) -> Transaction {
        serde_json::from_value(serde_json::json!({
            "hash": "0x01",
            "from_address": "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
            "to_address": to,
            "value": value,
            "method_label": method,
            "block_timestamp": DateTime::from_timestamp(ts, 0).unwrap_or_default(),
            "block_number": "1"
        }))
        .expect("valid transaction")
    }

    #[test]
    fn projects_transactions_in_order() {
        let address: EthAddress = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e"
            .parse()
            .expect("valid address");
        let txs = vec![
            tx("1.5", Some("transfer"), Some("0xbbbb"), 1_700_000_000),
            tx("garbage", None, None, 1_700_000_100),
        ];

        let request = ScoringRequest::from_transactions(&address, &txs);

        assert_eq!(request.address, address);
        assert_eq!(
            request.transactions,
            vec![
                ScoringTransaction {
                    timestamp: 1_700_000_000,
                    value: 1.5,
                    method: "transfer".to_string(),
                    to: "0xbbbb".to_string(),
                },
                ScoringTransaction {
                    timestamp: 1_700_000_100,
                    value: 0.0,
                    method: String::new(),
                    to: String::new(),
                },
            ]
        );
    }

    #[test]
    fn serializes_wire_shape() {
        let address: EthAddress = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e"
            .parse()
            .expect("valid address");
        let request = ScoringRequest::from_transactions(
            &address,
            &[tx("2", Some("approve"), Some("0xcccc"), 10)],
        );

        let value = serde_json::to_value(&request).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({
                "address": "0x742d35Cc6634C0532925a3b844Bc454e4438f44e",
                "transactions": [
                    {"timestamp": 10, "value": 2.0, "method": "approve", "to": "0xcccc"}
                ]
            })
        );
    }
}
