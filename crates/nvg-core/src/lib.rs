//! Core types and the store abstraction for the NVG catalog mirror.
//!
//! This crate is deliberately free of database, CSV and HTTP dependencies.
//! The codec, the SQLite backend and the sync engine all depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod catalog;
pub mod error;
pub mod language;
pub mod record;
pub mod store;

pub use error::{Error, Result};
