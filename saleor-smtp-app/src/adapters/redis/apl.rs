//! Redis-backed APL

use async_trait::async_trait;

use saleor_smtp_core::error::{AplError, AplResult};
use saleor_smtp_core::traits::Apl;
use saleor_smtp_core::types::{AuthData, ConfigurationStatus};

use super::connection::ConnectionManager;
use super::layout::KeyLayout;
use super::transport::{KvConnection, KvConnector, RedisConnector};

/// APL storing auth data in a self-hosted Redis.
///
/// Connects on first use. Every operation goes through the connection
/// manager, so operations racing the first connection share one attempt.
pub struct RedisApl<K: KvConnector = RedisConnector> {
    connection: ConnectionManager<K>,
    layout: KeyLayout,
}

impl<K: KvConnector> RedisApl<K> {
    #[must_use]
    pub fn new(connector: K, layout: KeyLayout) -> Self {
        Self {
            connection: ConnectionManager::new(connector),
            layout,
        }
    }

    pub fn layout(&self) -> &KeyLayout {
        &self.layout
    }

    /// Whether an open connection is currently held (no I/O)
    pub async fn is_connected(&self) -> bool {
        self.connection.is_connected().await
    }

    async fn fetch(&self, saleor_api_url: &str) -> AplResult<Option<AuthData>> {
        let conn = self.connection.ensure_connected().await?;

        let raw = match &self.layout {
            KeyLayout::Prefixed { prefix } => conn.get(&format!("{prefix}{saleor_api_url}")).await?,
            KeyLayout::Hash { collection_key } => conn.hget(collection_key, saleor_api_url).await?,
        };

        match raw {
            Some(bytes) if !bytes.is_empty() => Ok(Some(AuthData::from_slice(&bytes)?)),
            _ => Ok(None),
        }
    }

    async fn store(&self, auth_data: &AuthData) -> AplResult<()> {
        let conn = self.connection.ensure_connected().await?;
        let json = auth_data.to_json()?;

        match &self.layout {
            KeyLayout::Prefixed { prefix } => {
                conn.set(&format!("{prefix}{}", auth_data.saleor_api_url), &json)
                    .await
            }
            KeyLayout::Hash { collection_key } => {
                conn.hset(collection_key, &auth_data.saleor_api_url, &json)
                    .await
            }
        }
    }

    async fn remove(&self, saleor_api_url: &str) -> AplResult<()> {
        let conn = self.connection.ensure_connected().await?;

        match &self.layout {
            KeyLayout::Prefixed { prefix } => conn.del(&format!("{prefix}{saleor_api_url}")).await,
            KeyLayout::Hash { collection_key } => conn.hdel(collection_key, saleor_api_url).await,
        }
    }

    /// `(key, value)` of every record; `None` values are keys that vanished
    /// between enumeration and fetch.
    async fn fetch_all_raw(&self) -> AplResult<Vec<(String, Option<Vec<u8>>)>> {
        let conn = self.connection.ensure_connected().await?;

        match &self.layout {
            KeyLayout::Prefixed { prefix } => {
                let keys = conn.keys(&KeyLayout::scan_pattern(prefix)).await?;
                if keys.is_empty() {
                    return Ok(Vec::new());
                }
                let values = conn.mget(&keys).await?;
                Ok(keys.into_iter().zip(values).collect())
            }
            KeyLayout::Hash { collection_key } => Ok(conn
                .hgetall(collection_key)
                .await?
                .into_iter()
                .map(|(field, value)| (field, Some(value)))
                .collect()),
        }
    }

    async fn key_exists(&self, saleor_api_url: &str) -> AplResult<bool> {
        let conn = self.connection.ensure_connected().await?;

        match &self.layout {
            KeyLayout::Prefixed { prefix } => {
                conn.exists(&format!("{prefix}{saleor_api_url}")).await
            }
            KeyLayout::Hash { collection_key } => {
                conn.hexists(collection_key, saleor_api_url).await
            }
        }
    }

    async fn ping(&self) -> AplResult<()> {
        self.connection.ensure_connected().await?.ping().await
    }
}

#[async_trait]
impl<K: KvConnector> Apl for RedisApl<K> {
    async fn get(&self, saleor_api_url: &str) -> AplResult<Option<AuthData>> {
        self.fetch(saleor_api_url).await.inspect_err(|e| {
            tracing::error!(saleor_api_url, error = %e, "Error getting auth data from Redis");
        })
    }

    async fn set(&self, auth_data: &AuthData) -> AplResult<()> {
        self.store(auth_data).await.inspect_err(|e| {
            tracing::error!(
                saleor_api_url = %auth_data.saleor_api_url,
                error = %e,
                "Error setting auth data in Redis"
            );
        })
    }

    async fn delete(&self, saleor_api_url: &str) -> AplResult<()> {
        self.remove(saleor_api_url).await.inspect_err(|e| {
            tracing::error!(saleor_api_url, error = %e, "Error deleting auth data from Redis");
        })
    }

    async fn get_all(&self) -> AplResult<Vec<AuthData>> {
        let entries = self.fetch_all_raw().await.inspect_err(|e| {
            tracing::error!(error = %e, "Error getting all auth data from Redis");
        })?;

        let mut auth_data = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let Some(bytes) = value else { continue };
            match AuthData::from_slice(&bytes) {
                Ok(data) => auth_data.push(data),
                Err(e) => {
                    tracing::warn!(
                        key = %key,
                        error = %AplError::from(e),
                        "Failed to parse auth data from Redis"
                    );
                }
            }
        }
        Ok(auth_data)
    }

    async fn is_ready(&self) -> bool {
        match self.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Redis APL is not ready");
                false
            }
        }
    }

    async fn is_configured(&self, saleor_api_url: &str) -> bool {
        self.configuration_status(saleor_api_url)
            .await
            .is_configured()
    }

    async fn configuration_status(&self, saleor_api_url: &str) -> ConfigurationStatus {
        match self.key_exists(saleor_api_url).await {
            Ok(true) => ConfigurationStatus::Configured,
            Ok(false) => {
                tracing::debug!(saleor_api_url, "No auth data stored for this Saleor API URL");
                ConfigurationStatus::NotInstalled
            }
            Err(e) => {
                tracing::error!(
                    saleor_api_url,
                    error = %e,
                    "Redis APL is unavailable, treating app as not configured"
                );
                ConfigurationStatus::Unavailable(e)
            }
        }
    }
}
