//! Error type for the sync engine.

use std::{io, path::PathBuf};

use nvg_core::catalog::CategoryKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] nvg_core::Error),

  #[error("input error: {0}")]
  Csv(#[from] nvg_csv::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("failed to build HTTP client: {0}")]
  Client(#[source] reqwest::Error),

  #[error("failed to download {url}: {source}")]
  Fetch {
    url:    String,
    #[source]
    source: reqwest::Error,
  },

  #[error("failed to write {path}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },

  /// A category reached normalisation without having been registered.
  #[error("{kind} {description:?} has no id")]
  UnregisteredCategory {
    kind:        CategoryKind,
    description: String,
  },

  /// A file row needs an id that was neither stored nor assigned on insert.
  #[error("no file id for {0}")]
  MissingFileId(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Box a backend error into [`Error::Store`].
pub fn store_err<E>(e: E) -> Error
where
  E: std::error::Error + Send + Sync + 'static,
{
  Error::Store(Box::new(e))
}
