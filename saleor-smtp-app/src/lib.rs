//! Platform bootstrap for the Saleor SMTP app.
//!
//! Provides `AplConfig` (environment configuration), the APL backends,
//! `create_apl` (backend selection) and `AppState` / `AppStateBuilder`
//! (the application context handed to every handler).

pub mod adapters;
pub mod config;
pub mod factory;

use std::sync::Arc;

use saleor_smtp_core::error::{AplError, AplResult};
use saleor_smtp_core::services::{HealthService, InstallationService, ServiceContext};
use saleor_smtp_core::traits::Apl;

pub use config::{AplConfig, AplKind, RedisConfig, RedisEndpoint};
pub use factory::create_apl;

/// Application state.
///
/// Holds the APL and the services built on it. Constructed once at startup
/// via `AppStateBuilder` and shared by reference afterwards.
pub struct AppState {
    /// Service context (holds the APL)
    pub ctx: Arc<ServiceContext>,
    /// Install / uninstall / credential lookup
    pub installation_service: InstallationService,
    /// Readiness and configuration checks
    pub health_service: HealthService,
}

impl AppState {
    /// Build from the process environment.
    ///
    /// # Errors
    /// Any configuration error; the process should not serve traffic.
    pub fn from_env() -> AplResult<Self> {
        AppStateBuilder::new().config(AplConfig::from_env()?).build()
    }

    #[must_use]
    pub fn apl(&self) -> &Arc<dyn Apl> {
        self.ctx.apl()
    }
}

/// Builder for constructing `AppState`.
///
/// Either inject an APL directly (`apl`) or let `build` create one from
/// `config`. An injected APL wins over `config`.
#[derive(Default)]
pub struct AppStateBuilder {
    apl: Option<Arc<dyn Apl>>,
    config: Option<AplConfig>,
}

impl AppStateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn apl(mut self, apl: Arc<dyn Apl>) -> Self {
        self.apl = Some(apl);
        self
    }

    #[must_use]
    pub fn config(mut self, config: AplConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the `AppState`.
    ///
    /// # Errors
    /// Returns `AplError::Configuration` if neither an APL nor a config was
    /// supplied, or whatever `create_apl` reports for the config.
    pub fn build(self) -> AplResult<AppState> {
        let apl = match (self.apl, self.config) {
            (Some(apl), _) => apl,
            (None, Some(config)) => create_apl(&config)?,
            (None, None) => {
                return Err(AplError::Configuration(
                    "an APL or an APL configuration is required".to_string(),
                ))
            }
        };

        let ctx = Arc::new(ServiceContext::new(apl));

        Ok(AppState {
            installation_service: InstallationService::new(Arc::clone(&ctx)),
            health_service: HealthService::new(Arc::clone(&ctx)),
            ctx,
        })
    }
}
