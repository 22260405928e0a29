//! Document nodes in the chain graph

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Stable identifier of a document node
///
/// For real documents this is the storage key (a vault-relative path such as
/// `"threads/2024-05-01.md"`). For placeholders it is the normalized
/// reference text that failed to resolve.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a NodeId from a string key
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The id with its file extension removed, if it has one
    ///
    /// `"threads/a.md"` becomes `"threads/a"`. Dots inside directory names are kept.
    pub fn without_extension(&self) -> &str {
        let name_start = self.0.rfind('/').map(|i| i + 1).unwrap_or(0);
        match self.0[name_start..].rfind('.') {
            Some(dot) if dot > 0 => &self.0[..name_start + dot],
            _ => &self.0,
        }
    }

    /// Final path component without extension
    pub fn basename(&self) -> &str {
        let stem = self.without_extension();
        stem.rsplit('/').next().unwrap_or(stem)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Attributes carried by a node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAttrs {
    /// True when the id corresponds to a real, readable document
    pub resolved: bool,
    /// Alternate names the document may be referenced by (resolved only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aliases: Option<BTreeSet<String>>,
    /// Creation instant of the document (resolved only); branch tie-break key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,
}

impl NodeAttrs {
    /// Attributes for a real document
    pub fn resolved(
        aliases: impl IntoIterator<Item = String>,
        created_time: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            resolved: true,
            aliases: Some(aliases.into_iter().collect()),
            created_time,
        }
    }

    /// Attributes for a placeholder created by a dangling reference
    pub fn placeholder() -> Self {
        Self::default()
    }
}

/// A node in the chain graph
///
/// Values handed out by the graph are copies; the graph owns the originals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier
    pub id: NodeId,
    /// Node attributes
    #[serde(flatten)]
    pub attrs: NodeAttrs,
}

impl Node {
    pub fn new(id: NodeId, attrs: NodeAttrs) -> Self {
        Self { id, attrs }
    }

    pub fn is_resolved(&self) -> bool {
        self.attrs.resolved
    }

    /// Iterate the node's aliases (empty for placeholders)
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.attrs.aliases.iter().flatten().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_strips_extension_from_file_name_only() {
        assert_eq!(NodeId::from("threads/a.md").without_extension(), "threads/a");
        assert_eq!(NodeId::from("v1.2/notes").without_extension(), "v1.2/notes");
        assert_eq!(NodeId::from(".hidden").without_extension(), ".hidden");
        assert_eq!(NodeId::from("plain").without_extension(), "plain");
    }

    #[test]
    fn node_id_basename() {
        assert_eq!(NodeId::from("threads/day one.md").basename(), "day one");
        assert_eq!(NodeId::from("Root").basename(), "Root");
    }

    #[test]
    fn node_id_serializes_as_string() {
        let id = NodeId::from("threads/a.md");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"threads/a.md\"");
    }

    #[test]
    fn placeholder_attrs_carry_nothing() {
        let attrs = NodeAttrs::placeholder();
        assert!(!attrs.resolved);
        assert!(attrs.aliases.is_none());
        assert!(attrs.created_time.is_none());
    }
}
