//! Self-hosted Redis APL backend

mod apl;
mod connection;
mod factory;
mod layout;
mod transport;

pub use apl::RedisApl;
pub use connection::ConnectionManager;
pub use factory::RedisAplFactory;
pub use layout::KeyLayout;
pub use transport::{KvConnection, KvConnector, RedisConnection, RedisConnector};
