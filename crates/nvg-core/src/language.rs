//! The built-in language vocabulary.

/// The most language codes the `languages` attribute may permit at once.
pub const MAX_LANGUAGE_CODES: usize = 64;

/// Language names as they appear in the catalog's `LANGUAGE` column, and
/// the IETF tags they map to.
pub const DEFAULT_LANGUAGES: &[(&str, &str)] = &[
  ("Catalan", "ca"),
  ("Danish", "da"),
  ("Dutch", "nl"),
  ("English", "en"),
  ("English (American)", "en-US"),
  ("French", "fr"),
  ("German", "de"),
  ("Greek", "el"),
  ("Irish", "ga"),
  ("Italian", "it"),
  ("Portuguese (Brazilian)", "pt-BR"),
  ("Spanish", "es"),
  ("Swedish", "sv"),
];
