//! APL factory: backend kind -> concrete store

use std::sync::Arc;

use saleor_smtp_core::error::{AplError, AplResult};
use saleor_smtp_core::traits::Apl;

use crate::adapters::{LazyApl, RedisAplFactory};
use crate::config::AplConfig;

/// Creates the [`Apl`] selected by `config`.
///
/// Performs no I/O. The Redis backend is wrapped in a [`LazyApl`], so the CA
/// bundle is read and the connection opened by the first operation.
///
/// # Errors
/// - `AplError::Configuration` if the Redis endpoint cannot be parsed
/// - `AplError::UnsupportedBackend` for backends this build does not provide
pub fn create_apl(config: &AplConfig) -> AplResult<Arc<dyn Apl>> {
    match config {
        AplConfig::Redis(redis) => {
            let factory = RedisAplFactory::new(redis.clone())?;
            tracing::info!("Using Redis APL (connects on first use)");
            Ok(Arc::new(LazyApl::new(factory)))
        }
        AplConfig::File
        | AplConfig::Upstash(_)
        | AplConfig::SaleorCloud(_)
        | AplConfig::DynamoDb(_) => Err(AplError::UnsupportedBackend(
            config.kind().as_str().to_string(),
        )),
    }
}
