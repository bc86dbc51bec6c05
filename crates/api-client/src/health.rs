// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Health check types for upstream clients

use serde::{Deserialize, Serialize};

/// Health status of an upstream client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum HealthStatus {
    /// Service is healthy and operational
    Up,
    /// Service is degraded but still functional
    Degraded { reason: String },
    /// Service is down and not functional
    Down { reason: String },
}

impl HealthStatus {
    /// Check if this health status indicates the service is available
    pub fn is_available(&self) -> bool {
        matches!(self, HealthStatus::Up | HealthStatus::Degraded { .. })
    }

    /// Check if this health status indicates the service is completely down
    pub fn is_down(&self) -> bool {
        matches!(self, HealthStatus::Down { .. })
    }

    /// Get a human-readable description of the status
    pub fn description(&self) -> &str {
        match self {
            HealthStatus::Up => "Service is healthy",
            HealthStatus::Degraded { reason } | HealthStatus::Down { reason } => reason,
        }
    }

    /// Map an HTTP status code from a health probe to a health status
    ///
    /// 200 is `Up`, 401/403 mean the credentials are wrong and the service is
    /// unusable (`Down`), anything else is `Degraded`.
    pub fn from_probe_status(status: u16) -> Self {
        match status {
            200 => HealthStatus::Up,
            401 | 403 => HealthStatus::Down {
                reason: "Authentication failed".to_string(),
            },
            429 => HealthStatus::Degraded {
                reason: "Rate limited".to_string(),
            },
            other => HealthStatus::Degraded {
                reason: format!("API returned status {other}"),
            },
        }
    }
}
