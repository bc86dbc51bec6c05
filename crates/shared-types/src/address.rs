// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Ethereum address validation
//!
//! [`EthAddress`] is a string wrapper that can only be constructed from input
//! matching the canonical Ethereum account shape: a lowercase `0x` prefix
//! followed by exactly 40 hexadecimal digits of either case.
//!
//! The input text is kept verbatim. No checksum normalization is applied,
//! so the address that reaches upstream services is exactly what the caller sent.
//!
//! ```rust
//! use shared_types::{EthAddress, is_valid_eth_address};
//!
//! assert!(is_valid_eth_address("0x742d35Cc6634C0532925a3b844Bc454e4438f44e"));
//! assert!(!is_valid_eth_address("0x123"));
//!
//! let address: EthAddress = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e".parse().unwrap();
//! assert_eq!(address.as_str(), "0x742d35Cc6634C0532925a3b844Bc454e4438f44e");
//! ```

use core::fmt;
use std::{str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

const ETH_ADDRESS_PATTERN: &str = "^0x[0-9a-fA-F]{40}$";

static ETH_ADDRESS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(ETH_ADDRESS_PATTERN).expect("Ethereum address pattern should compile")
});

/// Returns `true` iff `candidate` is `0x` followed by exactly 40 hex digits
///
/// The match covers the whole string. Surrounding whitespace, an uppercase
/// `0X` prefix, or any other deviation is rejected.
pub fn is_valid_eth_address(candidate: &str) -> bool {
    ETH_ADDRESS_REGEX.is_match(candidate)
}

/// Error returned when a string is not a well-formed Ethereum address
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid Ethereum address: {input:?}")]
pub struct AddressError {
    /// The rejected input
    pub input: String,
}

/// A validated Ethereum account address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e")]
pub struct EthAddress(String);

impl EthAddress {
    /// Validate and wrap an address
    ///
    /// # Errors
    ///
    /// Returns [`AddressError`] if the input does not match `^0x[0-9a-fA-F]{40}$`.
    pub fn parse(input: impl Into<String>) -> Result<Self, AddressError> {
        let input = input.into();
        if is_valid_eth_address(&input) {
            Ok(Self(input))
        } else {
            Err(AddressError { input })
        }
    }

    /// The address exactly as it was supplied
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EthAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EthAddress {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<EthAddress> for String {
    fn from(value: EthAddress) -> Self {
        value.0
    }
}

impl AsRef<str> for EthAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_LOWER: &str = "0x742d35cc6634c0532925a3b844bc454e4438f44e";
    const VALID_MIXED: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";
    const VALID_UPPER: &str = "0xABCDEFABCDEFABCDEFABCDEFABCDEFABCDEFABCD";

    #[test]
    fn accepts_canonical_addresses() {
        assert!(is_valid_eth_address(VALID_LOWER));
        assert!(is_valid_eth_address(VALID_MIXED));
        assert!(is_valid_eth_address(VALID_UPPER));
        assert!(is_valid_eth_address(
            "0x0000000000000000000000000000000000000000"
        ));
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(!is_valid_eth_address("0x123"));
        // 39 digits
        assert!(!is_valid_eth_address(
            "0x742d35cc6634c0532925a3b844bc454e4438f44"
        ));
        // 41 digits
        assert!(!is_valid_eth_address(
            "0x742d35cc6634c0532925a3b844bc454e4438f44ea"
        ));
    }

    #[test]
    fn rejects_bad_prefix() {
        assert!(!is_valid_eth_address(
            "742d35cc6634c0532925a3b844bc454e4438f44e"
        ));
        assert!(!is_valid_eth_address(
            "0X742d35cc6634c0532925a3b844bc454e4438f44e"
        ));
        assert!(!is_valid_eth_address(
            "1x742d35cc6634c0532925a3b844bc454e4438f44e"
        ));
    }

    #[test]
    fn rejects_non_hex_and_whitespace() {
        assert!(!is_valid_eth_address(""));
        assert!(!is_valid_eth_address(
            "0xghijklmnopqrstuvwxyz123456789012345678ab"
        ));
        assert!(!is_valid_eth_address(&format!(" {VALID_LOWER}")));
        assert!(!is_valid_eth_address(&format!("{VALID_LOWER} ")));
        assert!(!is_valid_eth_address(&format!("{VALID_LOWER}\n")));
    }

    #[test]
    fn parse_keeps_input_verbatim() {
        let address = EthAddress::parse(VALID_MIXED).expect("valid address");
        assert_eq!(address.as_str(), VALID_MIXED);
        assert_eq!(address.to_string(), VALID_MIXED);
    }

    #[test]
    fn parse_reports_rejected_input() {
        let err = "0x123".parse::<EthAddress>().expect_err("short address");
        assert_eq!(err.input, "0x123");
    }

    #[test]
    fn serde_round_trip_validates() {
        let json = format!("\"{VALID_UPPER}\"");
        let address: EthAddress = serde_json::from_str(&json).expect("valid address");
        assert_eq!(serde_json::to_string(&address).expect("serialize"), json);

        let invalid: Result<EthAddress, _> = serde_json::from_str("\"not_an_address\"");
        assert!(invalid.is_err());
    }
}
