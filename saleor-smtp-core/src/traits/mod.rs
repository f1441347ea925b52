//! Storage layer abstraction trait definition

mod apl;

pub use apl::{Apl, InMemoryApl};
