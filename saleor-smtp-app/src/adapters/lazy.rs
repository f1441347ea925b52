//! Deferred APL construction
//!
//! `LazyApl` implements the APL contract without building the real store.
//! The first operation runs the [`AplFactory`] and every later operation
//! reuses the result, so loading certificates and opening sockets happen on
//! the first request rather than at startup.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use saleor_smtp_core::error::AplResult;
use saleor_smtp_core::traits::Apl;
use saleor_smtp_core::types::{AuthData, ConfigurationStatus};

/// Builds the real APL on first use
#[async_trait]
pub trait AplFactory: Send + Sync + 'static {
    async fn build(&self) -> AplResult<Arc<dyn Apl>>;
}

enum LazyState {
    Uninitialized,
    Ready(Arc<dyn Apl>),
}

pub struct LazyApl<F: AplFactory> {
    factory: F,
    state: Mutex<LazyState>,
}

impl<F: AplFactory> LazyApl<F> {
    #[must_use]
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            state: Mutex::new(LazyState::Uninitialized),
        }
    }

    /// Whether the inner APL has been built
    pub async fn is_initialized(&self) -> bool {
        matches!(*self.state.lock().await, LazyState::Ready(_))
    }

    /// The inner APL, built on first call.
    ///
    /// Concurrent first callers wait for one build. A failed build is not
    /// memoized; the next call tries again.
    pub async fn inner(&self) -> AplResult<Arc<dyn Apl>> {
        let mut state = self.state.lock().await;
        if let LazyState::Ready(apl) = &*state {
            return Ok(Arc::clone(apl));
        }

        let apl = self.factory.build().await.inspect_err(|e| {
            tracing::error!(error = %e, "Failed to initialize APL");
        })?;
        *state = LazyState::Ready(Arc::clone(&apl));
        Ok(apl)
    }
}

#[async_trait]
impl<F: AplFactory> Apl for LazyApl<F> {
    async fn get(&self, saleor_api_url: &str) -> AplResult<Option<AuthData>> {
        self.inner().await?.get(saleor_api_url).await
    }

    async fn set(&self, auth_data: &AuthData) -> AplResult<()> {
        self.inner().await?.set(auth_data).await
    }

    async fn delete(&self, saleor_api_url: &str) -> AplResult<()> {
        self.inner().await?.delete(saleor_api_url).await
    }

    async fn get_all(&self) -> AplResult<Vec<AuthData>> {
        self.inner().await?.get_all().await
    }

    async fn is_ready(&self) -> bool {
        match self.inner().await {
            Ok(apl) => apl.is_ready().await,
            Err(_) => false,
        }
    }

    async fn is_configured(&self, saleor_api_url: &str) -> bool {
        self.configuration_status(saleor_api_url)
            .await
            .is_configured()
    }

    async fn configuration_status(&self, saleor_api_url: &str) -> ConfigurationStatus {
        match self.inner().await {
            Ok(apl) => apl.configuration_status(saleor_api_url).await,
            Err(e) => ConfigurationStatus::Unavailable(e),
        }
    }
}
