//! Installation lifecycle service
//!
//! Called by the install handshake (register), every outbound Saleor API call
//! (credentials lookup) and the app-deleted webhook (uninstall).

use std::sync::Arc;

use crate::error::{AplError, AplResult};
use crate::types::AuthData;

use super::ServiceContext;

pub struct InstallationService {
    ctx: Arc<ServiceContext>,
}

impl InstallationService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Persist auth data received during the install handshake.
    ///
    /// Re-installing into the same Saleor instance replaces the previous token.
    pub async fn register(&self, auth_data: &AuthData) -> AplResult<()> {
        validate(auth_data)?;

        self.ctx.apl().set(auth_data).await?;
        tracing::info!(
            saleor_api_url = %auth_data.saleor_api_url,
            app_id = %auth_data.app_id,
            "App installed"
        );
        Ok(())
    }

    /// Auth data required to call back into a Saleor instance.
    pub async fn credentials_for(&self, saleor_api_url: &str) -> AplResult<AuthData> {
        self.ctx
            .apl()
            .get(saleor_api_url)
            .await?
            .ok_or_else(|| AplError::NotInstalled(saleor_api_url.to_string()))
    }

    /// Forget a Saleor instance. Safe to call repeatedly.
    pub async fn uninstall(&self, saleor_api_url: &str) -> AplResult<()> {
        self.ctx.apl().delete(saleor_api_url).await?;
        tracing::info!(saleor_api_url, "App uninstalled");
        Ok(())
    }

    /// Every Saleor instance the app is installed in
    pub async fn installations(&self) -> AplResult<Vec<AuthData>> {
        self.ctx.apl().get_all().await
    }
}

fn validate(auth_data: &AuthData) -> AplResult<()> {
    let empty = [
        ("saleorApiUrl", auth_data.saleor_api_url.as_str()),
        ("appId", auth_data.app_id.as_str()),
        ("token", auth_data.token.as_str()),
    ]
    .into_iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(name, _)| name)
    .collect::<Vec<_>>();

    if empty.is_empty() {
        Ok(())
    } else {
        Err(AplError::Validation(format!(
            "auth data is missing: {}",
            empty.join(", ")
        )))
    }
}
