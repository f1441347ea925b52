//! Auth data issued by Saleor when the app is installed

use std::fmt;

use serde::{Deserialize, Serialize};

/// Credentials for one Saleor instance.
///
/// Stored as a single JSON document keyed by `saleor_api_url`. Fields this
/// type does not know about are kept in `extra` and written back unchanged,
/// so records written by other Saleor app SDKs survive a read/write cycle.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthData {
    /// GraphQL API URL of the Saleor instance (primary key)
    pub saleor_api_url: String,
    /// ID of the installed app within that instance
    pub app_id: String,
    /// App token used for calls back into Saleor
    pub token: String,
    /// Cached JWKS used to verify webhook signatures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwks: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AuthData {
    pub fn new(
        saleor_api_url: impl Into<String>,
        app_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            saleor_api_url: saleor_api_url.into(),
            app_id: app_id.into(),
            token: token.into(),
            jwks: None,
            extra: serde_json::Map::new(),
        }
    }

    #[must_use]
    pub fn with_jwks(mut self, jwks: impl Into<String>) -> Self {
        self.jwks = Some(jwks.into());
        self
    }

    /// Canonical JSON encoding used by every backend.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Decode a stored value as read from the backing store. Bytes that are not
    /// UTF-8 are a decode error like any other malformed JSON.
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

impl fmt::Debug for AuthData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthData")
            .field("saleor_api_url", &self.saleor_api_url)
            .field("app_id", &self.app_id)
            .field("token", &"<redacted>")
            .field("jwks", &self.jwks.as_ref().map(|_| "<present>"))
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}
