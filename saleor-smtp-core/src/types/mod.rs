//! Type definitions

mod auth_data;
mod health;

pub use auth_data::AuthData;
pub use health::{ConfigurationStatus, HealthReport};
