//! Error type for `nvg-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] nvg_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date parse error: {0}")]
  DateParse(String),

  /// A stored column holds a value the domain types cannot represent.
  #[error("invalid {column} value: {value}")]
  InvalidValue { column: &'static str, value: String },

  #[error("{table} row {id} not found")]
  NotFound { table: &'static str, id: String },

  /// Narrowing the language constraint would orphan codes still used by
  /// at least one file.
  #[error("language codes still in use: {}", .0.join(", "))]
  LanguageInUse(Vec<String>),

  /// The language constraint is altered atomically on its own and cannot
  /// be nested inside another transaction.
  #[error("cannot alter the language constraint inside a transaction")]
  TransactionOpen,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
