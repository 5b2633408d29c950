//! UUID resolution for federation identifiers.
//!
//! Peers refer to authors and posts by URL (`https://host/service/author/<uuid>/`).
//! Nodes disagree on whether the UUID carries hyphens, so every helper here
//! accepts both the hyphenated 8-4-4-4-12 form and the bare 32 hex digit form.
//!
//! All functions are pure. A `None` result means "malformed identifier" and
//! callers treat it as not-found.

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

/// A UUID with optional hyphens at the canonical positions.
const UUID_PATTERN: &str = r"[0-9a-fA-F]{8}-?[0-9a-fA-F]{4}-?[0-9a-fA-F]{4}-?[0-9a-fA-F]{4}-?[0-9a-fA-F]{12}";

static AUTHOR_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"authors?/({UUID_PATTERN})(?:[/?#]|$)")).expect("valid author regex")
});

static POST_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"authors?/{UUID_PATTERN}/posts/({UUID_PATTERN})(?:[/?#]|$)"
    ))
    .expect("valid post regex")
});

static HYPHENATED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"([0-9a-fA-F]{8})-([0-9a-fA-F]{4})-([0-9a-fA-F]{4})-([0-9a-fA-F]{4})-([0-9a-fA-F]{12})",
    )
    .expect("valid hyphenated regex")
});

/// Extract the author UUID from a `.../author(s)/<uuid>[/...]` identifier.
#[must_use]
pub fn extract_author_uuid(identifier_url: &str) -> Option<Uuid> {
    let captures = AUTHOR_ID.captures(identifier_url)?;
    Uuid::parse_str(captures.get(1)?.as_str()).ok()
}

/// Extract the post UUID from a `.../author(s)/<uuid>/posts/<uuid>[/...]` identifier.
#[must_use]
pub fn extract_post_uuid(identifier_url: &str) -> Option<Uuid> {
    let captures = POST_ID.captures(identifier_url)?;
    Uuid::parse_str(captures.get(1)?.as_str()).ok()
}

/// Remove the separators from every hyphenated UUID in `value`.
///
/// Works on bare UUIDs as well as on URLs that embed them.
#[must_use]
pub fn canonicalize(value: &str) -> String {
    HYPHENATED.replace_all(value, "$1$2$3$4$5").into_owned()
}

/// Parse a UUID path segment, tolerating any number of hyphens.
#[must_use]
pub fn parse_uuid(segment: &str) -> Option<Uuid> {
    let compact: String = segment.chars().filter(|c| *c != '-').collect();
    if compact.len() != 32 || !compact.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Uuid::parse_str(&compact).ok()
}
