//! APL backends and decorators

pub mod lazy;
pub mod redis;

pub use self::lazy::{AplFactory, LazyApl};
pub use self::redis::{KeyLayout, RedisApl, RedisAplFactory};
