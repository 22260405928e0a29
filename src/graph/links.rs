//! Reference normalization and link keys
//!
//! Documents point at their predecessor with a reference string, usually a
//! wiki link (`"[[threads/day one|Day one]]"`). A reference resolves when its
//! normalized, lower-cased form matches one of a resolved node's link keys:
//! the full id, the id without extension, the basename, or an alias.

use super::node::{NodeAttrs, NodeId};

/// Strip wiki-link syntax from a reference
///
/// Removes surrounding `[[`/`]]`, a trailing `|display` part and a
/// `#heading` / `#^block` suffix, then trims. Returns `None` for references
/// that are empty after normalization.
pub fn normalize_reference(reference: &str) -> Option<String> {
    let mut text = reference.trim();
    if let Some(inner) = text.strip_prefix("[[") {
        text = inner.strip_suffix("]]").unwrap_or(inner);
    }
    if let Some(pipe) = text.find('|') {
        text = &text[..pipe];
    }
    if let Some(hash) = text.find('#') {
        text = &text[..hash];
    }
    let text = text.trim().trim_start_matches("./");
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Lookup key for a reference (normalized and lower-cased)
pub(crate) fn reference_key(reference: &str) -> Option<String> {
    normalize_reference(reference).map(|r| r.to_lowercase())
}

/// Keys under which a resolved node can be referenced
///
/// Placeholders have no keys: they are never a resolution target.
pub(crate) fn link_keys(id: &NodeId, attrs: &NodeAttrs) -> Vec<String> {
    if !attrs.resolved {
        return Vec::new();
    }

    let mut keys = vec![
        id.as_str().to_lowercase(),
        id.without_extension().to_lowercase(),
        id.basename().to_lowercase(),
    ];
    for alias in attrs.aliases.iter().flatten() {
        if let Some(key) = reference_key(alias) {
            keys.push(key);
        }
    }
    keys.sort();
    keys.dedup();
    keys
}

pub(crate) fn wiki_link(target: &str) -> String {
    format!("[[{}]]", target)
}
