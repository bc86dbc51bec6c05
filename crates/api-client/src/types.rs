// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Transaction history data model
//!
//! These types mirror the wallet-history payload of the transaction provider.
//! Numeric amounts stay decimal strings so that wei values never lose precision.
//! Fields the provider may omit deserialize to their defaults and are omitted
//! again on output when empty.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One page of transaction history for an address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TransactionPage {
    /// Opaque pagination cursor for the next page, passed through unmodified
    #[serde(default)]
    pub cursor: Option<String>,
    /// Number of results the provider put in this page
    #[serde(default)]
    pub page_size: u32,
    /// Page limit echoed by the provider
    #[serde(default)]
    pub limit: String,
    /// Transactions in provider order
    #[serde(default)]
    pub result: Vec<Transaction>,
}

impl TransactionPage {
    /// Concatenate the native transfers of every transaction
    ///
    /// Order is preserved across transactions and within each transaction.
    pub fn native_transfers(&self) -> Vec<NativeTransfer> {
        self.result
            .iter()
            .flat_map(|tx| tx.native_transfers.iter().cloned())
            .collect()
    }
}

/// A single on-chain transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Transaction {
    /// Transaction hash
    pub hash: String,
    /// Sender nonce
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub nonce: String,
    /// Position of the transaction within its block
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub transaction_index: String,
    /// Sender address
    pub from_address: String,
    /// Known entity label for the sender
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_address_label: Option<String>,
    /// Recipient address, `None` for contract creation
    #[serde(default)]
    pub to_address: Option<String>,
    /// Known entity label for the recipient
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_address_label: Option<String>,
    /// Transferred value in wei as a decimal string
    #[serde(default)]
    pub value: String,
    /// Gas limit
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub gas: String,
    /// Gas price in wei
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub gas_price: String,
    /// Receipt status, `"1"` for success
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub receipt_status: String,
    /// Time the including block was produced
    #[schema(value_type = String, format = DateTime)]
    pub block_timestamp: DateTime<Utc>,
    /// Including block number
    pub block_number: String,
    /// Including block hash
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub block_hash: String,
    /// Fee paid, in ether as a decimal string
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub transaction_fee: String,
    /// Decoded method name, if the provider recognised the call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method_label: Option<String>,
    /// Native currency movements caused by this transaction
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub native_transfers: Vec<NativeTransfer>,
    /// Human-readable summary
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub summary: String,
    /// Provider spam heuristic
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub possible_spam: bool,
    /// Provider category (e.g. `send`, `receive`, `contract interaction`)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub category: String,
}

impl Transaction {
    /// Block timestamp as seconds since the Unix epoch
    pub fn timestamp_seconds(&self) -> i64 {
        self.block_timestamp.timestamp()
    }
}

/// A native-currency movement inside a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NativeTransfer {
    /// Sender address
    pub from_address: String,
    /// Known entity label for the sender
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_address_label: Option<String>,
    /// Recipient address
    pub to_address: String,
    /// Known entity label for the recipient
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_address_label: Option<String>,
    /// Amount in wei as a decimal string
    pub value: String,
    /// Amount formatted in whole units
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value_formatted: String,
    /// `incoming` or `outgoing` relative to the queried address
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub direction: String,
    /// Currency symbol
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_symbol: Option<String>,
    /// Currency logo URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_logo: Option<String>,
}
