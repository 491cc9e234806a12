//! Participant name normalization
//!
//! Videoconference exports annotate display names with parenthetical
//! suffixes (original name, rename history, device tags). Stripping them
//! yields the identity key every later stage groups on.

use regex::Regex;
use std::sync::OnceLock;

/// Matches one parenthesized group together with the whitespace before it
fn parenthetical() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s*\([^)]*\)").expect("static pattern compiles"))
}

/// Canonical participant identity derived from a display name
///
/// Removes every `(...)` group and trims surrounding whitespace. An
/// unmatched `(` is left in place. Never fails.
///
/// # Example
///
/// ```
/// use rollcall::name::normalize;
///
/// assert_eq!(normalize("Kim (00:12/Kim)"), "Kim");
/// assert_eq!(normalize("  Lee  "), "Lee");
/// ```
pub fn normalize(raw: &str) -> String {
    parenthetical().replace_all(raw, "").trim().to_string()
}

/// Same as [`normalize`], coercing a missing field to the empty identity
pub fn normalize_field(raw: Option<&str>) -> String {
    raw.map(normalize).unwrap_or_default()
}
