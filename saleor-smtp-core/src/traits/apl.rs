//! Auth persistence layer abstraction

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::AplResult;
use crate::types::{AuthData, ConfigurationStatus};

/// Auth Persistence Layer
///
/// Stores one [`AuthData`] per Saleor API URL. Implementations:
/// - `RedisApl` (saleor-smtp-app): self-hosted Redis, lazily connected
/// - `LazyApl` (saleor-smtp-app): defers building another store until first use
/// - [`InMemoryApl`]: process-local map
#[async_trait]
pub trait Apl: Send + Sync {
    /// Get auth data for a Saleor instance
    ///
    /// # Returns
    /// * `Ok(Some(auth_data))` - app is installed
    /// * `Ok(None)` - nothing stored for this URL
    async fn get(&self, saleor_api_url: &str) -> AplResult<Option<AuthData>>;

    /// Store auth data, replacing any existing record for the same URL
    async fn set(&self, auth_data: &AuthData) -> AplResult<()>;

    /// Remove auth data. Removing a URL with nothing stored succeeds.
    async fn delete(&self, saleor_api_url: &str) -> AplResult<()>;

    /// All stored auth data, in no particular order
    async fn get_all(&self) -> AplResult<Vec<AuthData>>;

    /// Whether the backing store answers a liveness check
    async fn is_ready(&self) -> bool;

    /// Whether auth data exists for the URL.
    ///
    /// Never fails: an unreachable backend reports `false`.
    async fn is_configured(&self, saleor_api_url: &str) -> bool;

    /// Like [`Apl::is_configured`], but keeps "backend unavailable" apart from
    /// "nothing stored". Backends that can fail should override this.
    async fn configuration_status(&self, saleor_api_url: &str) -> ConfigurationStatus {
        if self.is_configured(saleor_api_url).await {
            ConfigurationStatus::Configured
        } else {
            ConfigurationStatus::NotInstalled
        }
    }
}

/// In-memory APL
///
/// Holds records for the lifetime of the process only.
#[derive(Clone, Default)]
pub struct InMemoryApl {
    records: Arc<RwLock<HashMap<String, AuthData>>>,
}

impl InMemoryApl {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Apl for InMemoryApl {
    async fn get(&self, saleor_api_url: &str) -> AplResult<Option<AuthData>> {
        Ok(self.records.read().await.get(saleor_api_url).cloned())
    }

    async fn set(&self, auth_data: &AuthData) -> AplResult<()> {
        self.records
            .write()
            .await
            .insert(auth_data.saleor_api_url.clone(), auth_data.clone());
        Ok(())
    }

    async fn delete(&self, saleor_api_url: &str) -> AplResult<()> {
        self.records.write().await.remove(saleor_api_url);
        Ok(())
    }

    async fn get_all(&self) -> AplResult<Vec<AuthData>> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn is_ready(&self) -> bool {
        true
    }

    async fn is_configured(&self, saleor_api_url: &str) -> bool {
        self.records.read().await.contains_key(saleor_api_url)
    }
}
