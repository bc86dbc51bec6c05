// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0
#![allow(dead_code)]

//! Test fixtures for end-to-end analyze tests
//!
//! Canned Moralis payloads and helpers that start the server against wiremock
//! stand-ins for Moralis and the scoring service.

use std::net::SocketAddr;

use analyze_api::{Server, ServerConfig, ShutdownConfig};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::MockServer;

/// Address used by most tests
pub const TEST_ADDRESS: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";

/// API key `ServerConfig::for_testing` configures
pub const TEST_API_KEY: &str = "test-api-key";

/// Path of the scoring endpoint on the scoring mock
pub const SCORING_PATH: &str = "/analyze";

/// Transaction with a single native transfer
pub fn transaction_with_transfer() -> Value {
    json!({
        "hash": "0x1ed85b3757a6d31d01a4d6677fc52fd3911d649a0af21fe5ca3f886b153773ed",
        "nonce": "1848059",
        "transaction_index": "108",
        "from_address": TEST_ADDRESS,
        "to_address": "0x003dde3494f30d861d063232c6a8c04394b686ff",
        "to_address_label": "Binance 2",
        "value": "115580000000000000",
        "gas": "30000",
        "gas_price": "52500000000",
        "receipt_status": "1",
        "block_timestamp": "2021-05-07T11:08:35.000Z",
        "block_number": "12386788",
        "block_hash": "0x9b559aef7ea858608c2e554246fe4a24287e7aeeb976848df2b9a2531f4b9171",
        "transaction_fee": "0.001575",
        "method_label": "transfer",
        "native_transfers": [{
            "from_address": TEST_ADDRESS,
            "to_address": "0x003dde3494f30d861d063232c6a8c04394b686ff",
            "to_address_label": "Binance 2",
            "value": "115580000000000000",
            "value_formatted": "0.11558",
            "direction": "outgoing",
            "token_symbol": "ETH"
        }],
        "summary": "Sent 0.11558 ETH to Binance 2",
        "possible_spam": false,
        "category": "send"
    })
}

/// Contract interaction without native transfers
pub fn transaction_without_transfer() -> Value {
    json!({
        "hash": "0x2f2bd0cbd4e2f1b0a2f8a6cd0e7b0a6ff3d1c62a2c3f4c33a4cfa3f3e1b5f0a1",
        "from_address": TEST_ADDRESS,
        "to_address": "0xdac17f958d2ee523a2206206994597c13d831ec7",
        "value": "0",
        "block_timestamp": "2021-05-08T09:00:00.000Z",
        "block_number": "12392000",
        "method_label": "approve",
        "native_transfers": [],
        "category": "token approval"
    })
}

/// Wallet history page with one transfer-bearing and one plain transaction
pub fn two_transaction_history() -> Value {
    json!({
        "page": "0",
        "page_size": 2,
        "limit": "100",
        "cursor": "eyJhbGciOiJIUzI1NiJ9.next",
        "result": [transaction_with_transfer(), transaction_without_transfer()]
    })
}

/// Start the server against `moralis` and, if given, `scoring`
pub async fn start_server(
    moralis: &MockServer,
    scoring: Option<&MockServer>,
) -> (SocketAddr, CancellationToken) {
    let moralis_url = Url::parse(&moralis.uri()).expect("mock Moralis URL");
    let mut config = ServerConfig::for_testing(moralis_url);
    if let Some(scoring) = scoring {
        let scoring_url =
            Url::parse(&format!("{}{SCORING_PATH}", scoring.uri())).expect("mock scoring URL");
        config = config.with_scoring(scoring_url);
    }

    Server::new(config, ShutdownConfig::default())
        .expect("Failed to create server")
        .run_for_testing()
        .await
        .expect("Failed to start test server")
}

/// `http://{addr}{path}`
pub fn url(addr: SocketAddr, path: &str) -> String {
    format!("http://{addr}{path}")
}

/// Base URL of a local port nothing listens on
pub fn unreachable_url() -> Url {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    Url::parse(&format!("http://{addr}")).expect("loopback URL")
}
