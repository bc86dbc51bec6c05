// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Shared types for the wallet analyze service
//!
//! This crate provides common types that are shared across multiple crates
//! in the wallet analyze workspace, avoiding circular dependencies.

pub mod address;

pub use address::{AddressError, EthAddress, is_valid_eth_address};
