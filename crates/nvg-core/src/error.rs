//! Error types for `nvg-core`.

use thiserror::Error;

use crate::catalog::AuthorRole;

#[derive(Debug, Error)]
pub enum Error {
  /// An author-role field names someone who is neither in the catalog
  /// extraction nor in the alias file. The operator must fix the inputs.
  #[error("{path}: {role} names unknown author {name:?}")]
  UnmappedAuthor {
    path: String,
    role: AuthorRole,
    name: String,
  },

  #[error(
    "cannot register {count} language codes; a maximum of {max} can be \
     defined"
  )]
  LanguageLimit { count: usize, max: usize },

  #[error("{kind} id {value} is out of range")]
  IdOutOfRange { kind: &'static str, value: i64 },

  #[error("unknown author role: {0:?}")]
  UnknownAuthorRole(String),

  #[error("invalid memory requirement: {0}K")]
  InvalidMemory(u16),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
