//! Error types for the nvg-csv codec.

use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("cannot open {path}: {source}")]
  Open {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("CSV error: {0}")]
  Csv(#[from] csv::Error),

  #[error("line {line}: column {column} is not valid {encoding}")]
  Encoding {
    line:     u64,
    column:   usize,
    encoding: &'static str,
  },

  #[error("line {line}: invalid size {value:?} for {path}")]
  InvalidSize {
    line:  u64,
    path:  String,
    value: String,
  },
}

impl Error {
  /// True when the input file does not exist, which callers treat as
  /// "input not supplied" for optional sources.
  pub fn is_not_found(&self) -> bool {
    matches!(self, Self::Open { source, .. } if source.kind() == io::ErrorKind::NotFound)
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
