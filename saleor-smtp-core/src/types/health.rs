//! Readiness and configuration status types

use serde::Serialize;

use crate::error::AplError;

/// Outcome of checking whether auth data exists for a Saleor API URL.
///
/// `NotInstalled` is the normal state for an instance that never installed
/// the app. `Unavailable` means the check itself could not be performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum ConfigurationStatus {
    Configured,
    NotInstalled,
    Unavailable(AplError),
}

impl ConfigurationStatus {
    #[must_use]
    pub fn is_configured(&self) -> bool {
        matches!(self, Self::Configured)
    }
}

/// Report produced by the readiness check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    /// Backing store answered a liveness check
    pub ready: bool,
    /// Saleor API URL the configuration check ran for
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saleor_api_url: Option<String>,
    /// Auth data exists for `saleor_api_url`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configured: Option<bool>,
}
