//! Language vocabulary sync.
//!
//! The permitted-code constraint is altered on its own, outside any
//! transaction. It is widened before vocabulary rows are added and narrowed
//! only after the file rows no longer use the codes being removed, so every
//! stored language stays permitted throughout.

use std::collections::{BTreeMap, BTreeSet};

use nvg_core::{catalog::Language, language::MAX_LANGUAGE_CODES};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguagePlan {
  /// The constraint to install before the vocabulary changes, if it grows.
  pub widen:    Option<BTreeSet<String>>,
  pub inserts:  Vec<Language>,
  pub renames:  Vec<Language>,
  /// Codes to delete from the vocabulary once the files are synced.
  pub removals: Vec<String>,
  /// The final constraint, if it must shrink after the file sync.
  pub narrow:   Option<BTreeSet<String>>,
}

/// Plan the changes that turn the stored vocabulary and constraint into
/// `configured`.
///
/// Fails before anything is mutated if the widened constraint would exceed
/// [`MAX_LANGUAGE_CODES`].
pub fn plan_languages(
  configured: &[Language],
  stored: &[Language],
  constraint: &BTreeSet<String>,
) -> nvg_core::Result<LanguagePlan> {
  let wanted: BTreeMap<&str, &str> = configured
    .iter()
    .map(|l| (l.code.as_str(), l.name.as_str()))
    .collect();
  let current: BTreeMap<&str, &str> = stored
    .iter()
    .map(|l| (l.code.as_str(), l.name.as_str()))
    .collect();

  let final_codes: BTreeSet<String> = wanted.keys().map(|c| c.to_string()).collect();
  let widened: BTreeSet<String> = constraint.union(&final_codes).cloned().collect();
  if widened.len() > MAX_LANGUAGE_CODES {
    return Err(nvg_core::Error::LanguageLimit {
      count: widened.len(),
      max:   MAX_LANGUAGE_CODES,
    });
  }

  let mut plan = LanguagePlan::default();
  for (code, name) in &wanted {
    let language = Language { code: code.to_string(), name: name.to_string() };
    match current.get(code) {
      None => plan.inserts.push(language),
      Some(stored_name) if stored_name != name => plan.renames.push(language),
      Some(_) => {}
    }
  }
  plan.removals = current
    .keys()
    .filter(|code| !wanted.contains_key(*code))
    .map(|code| code.to_string())
    .collect();

  if widened != *constraint {
    plan.widen = Some(widened.clone());
  }
  if widened != final_codes {
    plan.narrow = Some(final_codes);
  }

  Ok(plan)
}
