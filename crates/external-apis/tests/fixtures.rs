// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0
#![allow(missing_docs, dead_code)]

//! Canned upstream payloads shared by the integration tests

use serde_json::{Value, json};

/// Address used by most tests
pub const TEST_ADDRESS: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";

/// API key the mock Moralis server expects
pub const TEST_API_KEY: &str = "test-api-key";

/// Transaction with a single outgoing native transfer
pub fn transaction_with_transfer() -> Value {
    json!({
        "hash": "0x1ed85b3757a6d31d01a4d6677fc52fd3911d649a0af21fe5ca3f886b153773ed",
        "nonce": "1848059",
        "transaction_index": "108",
        "from_address": TEST_ADDRESS,
        "from_address_label": null,
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
            "from_address_label": null,
            "to_address": "0x003dde3494f30d861d063232c6a8c04394b686ff",
            "to_address_label": "Binance 2",
            "value": "115580000000000000",
            "value_formatted": "0.11558",
            "direction": "outgoing",
            "internal_transaction": false,
            "token_symbol": "ETH",
            "token_logo": "https://cdn.moralis.io/eth/0x.png"
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
        "possible_spam": false,
        "category": "token approval"
    })
}

/// Wallet history page holding `transactions`
pub fn wallet_history(transactions: Vec<Value>) -> Value {
    json!({
        "page": "0",
        "page_size": transactions.len(),
        "limit": "100",
        "cursor": "eyJhbGciOiJIUzI1NiJ9.next",
        "result": transactions
    })
}

/// Base URL of a local port nothing listens on
pub fn unreachable_uri() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}
