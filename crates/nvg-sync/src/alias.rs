//! Author alias links: the alias mapping input → `alias_of` updates.

use std::{collections::BTreeMap, fmt};

use nvg_core::catalog::{Author, AuthorId};
use tracing::warn;

/// One change to an author's alias link, for the change log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasChange {
  Added { alias: String, target: String },
  Retargeted { alias: String, from: String, to: String },
  Removed { alias: String, target: String },
}

impl fmt::Display for AliasChange {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Added { alias, target } => write!(f, "added {alias} as alias of {target}"),
      Self::Retargeted { alias, from, to } => {
        write!(f, "changed {alias} from alias of {from} to alias of {to}")
      }
      Self::Removed { alias, target } => {
        write!(f, "removed {alias} as alias of {target}")
      }
    }
  }
}

/// A link write together with the change it records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasUpdate {
  pub author_id: AuthorId,
  pub alias_of:  Option<AuthorId>,
  pub change:    AliasChange,
}

/// Compare the stored links of `authors` with the `alias → real name`
/// mapping.
///
/// Every name in the mapping must already be registered; names that are
/// not are skipped with a warning. A name mapped to itself is not a link
/// and is treated as absent from the mapping. Removals come first, then
/// additions and retargets, each in alias name order.
pub fn plan_aliases(authors: &[Author], mapping: &BTreeMap<String, String>) -> Vec<AliasUpdate> {
  let mapping: BTreeMap<&str, &str> = mapping
    .iter()
    .filter(|(alias, real)| {
      if alias == real {
        warn!(alias = %alias, "ignoring author listed as an alias of itself");
      }
      alias != real
    })
    .map(|(alias, real)| (alias.as_str(), real.as_str()))
    .collect();

  let by_name: BTreeMap<&str, &Author> = authors.iter().map(|a| (a.name.as_str(), a)).collect();
  let by_id: BTreeMap<AuthorId, &str> = authors.iter().map(|a| (a.id, a.name.as_str())).collect();
  let name_of = |id: AuthorId| by_id.get(&id).map_or_else(|| id.to_string(), |n| n.to_string());

  let mut updates = Vec::new();

  let mut linked: Vec<&Author> = authors
    .iter()
    .filter(|a| a.alias_of.is_some() && !mapping.contains_key(a.name.as_str()))
    .collect();
  linked.sort_by(|a, b| a.name.cmp(&b.name));
  for author in linked {
    if let Some(target) = author.alias_of {
      updates.push(AliasUpdate {
        author_id: author.id,
        alias_of:  None,
        change:    AliasChange::Removed { alias: author.name.clone(), target: name_of(target) },
      });
    }
  }

  for (alias, real) in mapping {
    let (Some(author), Some(target)) = (by_name.get(alias), by_name.get(real)) else {
      warn!(alias = %alias, real = %real, "alias refers to an unregistered author");
      continue;
    };

    let change = match author.alias_of {
      Some(current) if current == target.id => continue,
      Some(current) => AliasChange::Retargeted {
        alias: alias.to_owned(),
        from:  name_of(current),
        to:    real.to_owned(),
      },
      None => AliasChange::Added { alias: alias.to_owned(), target: real.to_owned() },
    };
    updates.push(AliasUpdate { author_id: author.id, alias_of: Some(target.id), change });
  }

  updates
}

#[cfg(test)]
mod tests {
  use super::*;

  fn author(id: AuthorId, name: &str, alias_of: Option<AuthorId>) -> Author {
    Author { id, name: name.to_string(), alias_of }
  }

  fn mapping(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(a, r)| (a.to_string(), r.to_string())).collect()
  }

  #[test]
  fn new_link_is_added() {
    let authors = [author(1, "Alice", None), author(2, "Bob", None), author(3, "Al", None)];
    let updates = plan_aliases(&authors, &mapping(&[("Al", "Alice")]));
    assert_eq!(updates, [AliasUpdate {
      author_id: 3,
      alias_of:  Some(1),
      change:    AliasChange::Added { alias: "Al".into(), target: "Alice".into() },
    }]);
    assert_eq!(updates[0].change.to_string(), "added Al as alias of Alice");
  }

  #[test]
  fn unchanged_link_is_a_no_op() {
    let authors = [author(1, "Alice", None), author(3, "Al", Some(1))];
    assert!(plan_aliases(&authors, &mapping(&[("Al", "Alice")])).is_empty());
  }

  #[test]
  fn dropped_mapping_clears_the_link() {
    let authors = [author(1, "Alice", None), author(3, "Al", Some(1))];
    let updates = plan_aliases(&authors, &BTreeMap::new());
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].alias_of, None);
    assert_eq!(updates[0].change.to_string(), "removed Al as alias of Alice");
  }

  #[test]
  fn link_is_retargeted() {
    let authors = [author(1, "Alice", None), author(2, "Bob", None), author(3, "Al", Some(1))];
    let updates = plan_aliases(&authors, &mapping(&[("Al", "Bob")]));
    assert_eq!(updates[0].alias_of, Some(2));
    assert_eq!(
      updates[0].change.to_string(),
      "changed Al from alias of Alice to alias of Bob"
    );
  }

  #[test]
  fn self_mapping_clears_a_stored_link() {
    let authors = [author(1, "Alice", None), author(3, "Al", Some(1))];
    let updates = plan_aliases(&authors, &mapping(&[("Al", "Al")]));
    assert_eq!(updates, [AliasUpdate {
      author_id: 3,
      alias_of:  None,
      change:    AliasChange::Removed { alias: "Al".into(), target: "Alice".into() },
    }]);
  }

  #[test]
  fn self_alias_and_unknown_names_are_skipped() {
    let authors = [author(1, "Alice", None)];
    let updates = plan_aliases(&authors, &mapping(&[("Alice", "Alice"), ("Zed", "Alice")]));
    assert!(updates.is_empty());
  }
}
