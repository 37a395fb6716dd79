//! Database layer - connection pool, schema and repositories
//!
//! - One shared pool, no per-request connections
//! - List operations use JOINs or correlated counts, never N+1
//! - Repeat actions upsert with ON CONFLICT
//! - Transactions for multi-step writes

pub mod migrations;
pub mod pool;
pub mod repos;

#[cfg(test)]
pub(crate) mod testing;

pub use pool::{create_pool, create_pool_with_options};
pub use repos::*;
