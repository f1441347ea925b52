//! Readiness / configuration status check for operational tooling

use std::sync::Arc;

use crate::types::HealthReport;

use super::ServiceContext;

pub struct HealthService {
    ctx: Arc<ServiceContext>,
}

impl HealthService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Probe the APL, and optionally whether one Saleor instance has the app installed.
    ///
    /// The configuration check is skipped when the store is not ready, so an
    /// outage is never reported as "not installed".
    pub async fn check(&self, saleor_api_url: Option<&str>) -> HealthReport {
        let ready = self.ctx.apl().is_ready().await;

        let configured = match saleor_api_url {
            Some(url) if ready => Some(self.ctx.apl().is_configured(url).await),
            _ => None,
        };

        if !ready {
            tracing::warn!("APL is not ready");
        }

        HealthReport {
            ready,
            saleor_api_url: saleor_api_url.map(str::to_string),
            configured,
        }
    }
}
