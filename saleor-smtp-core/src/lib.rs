//! Saleor SMTP App Core Library
//!
//! Provides the auth persistence contract of the Saleor SMTP app:
//! - `AuthData`, the credentials Saleor issues on install
//! - `Apl`, the pluggable store for them
//! - services used by the install, uninstall and health-check paths
//!
//! Concrete backends and bootstrap live in `saleor-smtp-app`.

pub mod error;
pub mod services;
pub mod traits;
pub mod types;

// Re-export common types
pub use error::{AplError, AplResult};
pub use services::ServiceContext;
pub use traits::{Apl, InMemoryApl};
pub use types::AuthData;
