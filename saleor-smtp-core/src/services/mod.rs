//! Services built on the auth persistence layer

mod health_service;
mod installation_service;

pub use health_service::HealthService;
pub use installation_service::InstallationService;

use std::sync::Arc;

use crate::traits::Apl;

/// Service context - holds all dependencies
///
/// Constructed once at startup by the platform layer, which injects the
/// concrete APL, then shared by every handler.
pub struct ServiceContext {
    /// Auth persistence layer
    pub apl: Arc<dyn Apl>,
}

impl ServiceContext {
    #[must_use]
    pub fn new(apl: Arc<dyn Apl>) -> Self {
        Self { apl }
    }

    #[must_use]
    pub fn apl(&self) -> &Arc<dyn Apl> {
        &self.apl
    }
}
