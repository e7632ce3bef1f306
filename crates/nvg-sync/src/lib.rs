//! Catalog mirror synchroniser for the NVG archive.
//!
//! Reads the archive's catalog table plus the author-alias and
//! cross-reference side tables, normalises every record against the stored
//! vocabularies, diffs the result with what the store holds and applies the
//! difference one table batch per transaction. Running it twice with the
//! same inputs leaves the store unchanged the second time.
//!
//! The pipeline is split so that everything up to the [`diff::SyncPlan`] is
//! pure and testable without a database; only [`sync::run`] and
//! [`snapshot::Snapshot::load`] talk to a [`CatalogStore`].
//!
//! [`CatalogStore`]: nvg_core::store::CatalogStore

pub mod alias;
pub mod config;
pub mod diff;
pub mod error;
pub mod languages;
pub mod normalize;
pub mod resolve;
pub mod snapshot;
pub mod source;
pub mod sync;

pub use error::{Error, Result};
pub use resolve::SyncMode;
pub use sync::{SyncReport, run};
