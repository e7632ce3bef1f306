//! SQLite backend for the NVG catalog mirror.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. A single connection is shared, which
//! is what lets a transaction opened by one call span the calls after it.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
