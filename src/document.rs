//! Document snapshots as read from a document store

use crate::graph::NodeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A document's predecessor declaration
///
/// Declared in front matter either as a single reference or a list of
/// references. Anything else counts as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredecessorDecl {
    #[default]
    Absent,
    Single(String),
    List(Vec<String>),
}

impl PredecessorDecl {
    /// Interpret a YAML front matter value
    ///
    /// Non-string list entries are skipped; null, numbers and maps are absent.
    pub fn from_yaml(value: Option<&serde_yaml::Value>) -> Self {
        match value {
            Some(serde_yaml::Value::String(s)) if !s.trim().is_empty() => Self::Single(s.clone()),
            Some(serde_yaml::Value::Sequence(items)) => {
                let refs: Vec<String> = items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .filter(|s| !s.trim().is_empty())
                    .map(str::to_string)
                    .collect();
                if refs.is_empty() {
                    Self::Absent
                } else {
                    Self::List(refs)
                }
            }
            _ => Self::Absent,
        }
    }

    /// The declared references in order
    pub fn references(&self) -> Vec<&str> {
        match self {
            Self::Absent => Vec::new(),
            Self::Single(r) => vec![r.as_str()],
            Self::List(refs) => refs.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_absent(&self) -> bool {
        self.references().is_empty()
    }
}

/// The attribute snapshot of one existing document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    /// Stable storage key
    pub id: NodeId,
    /// Alternate names
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Creation instant
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    /// Predecessor declaration
    #[serde(default)]
    pub predecessor: PredecessorDecl,
}

impl DocumentSnapshot {
    /// A snapshot with no aliases, creation time or predecessor
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            aliases: Vec::new(),
            created: None,
            predecessor: PredecessorDecl::Absent,
        }
    }

    /// Declare a single predecessor reference
    pub fn with_predecessor(mut self, reference: impl Into<String>) -> Self {
        self.predecessor = PredecessorDecl::Single(reference.into());
        self
    }

    /// Declare a list of predecessor references
    pub fn with_predecessors<I, S>(mut self, references: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.predecessor = PredecessorDecl::List(references.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(text: &str) -> serde_yaml::Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn single_string_is_single_reference() {
        let decl = PredecessorDecl::from_yaml(Some(&yaml("\"[[A]]\"")));
        assert_eq!(decl, PredecessorDecl::Single("[[A]]".to_string()));
        assert_eq!(decl.references(), vec!["[[A]]"]);
    }

    #[test]
    fn sequence_keeps_string_entries_in_order() {
        let decl = PredecessorDecl::from_yaml(Some(&yaml("[\"[[B]]\", 3, \"[[C]]\"]")));
        assert_eq!(decl.references(), vec!["[[B]]", "[[C]]"]);
    }

    #[test]
    fn other_shapes_are_absent() {
        assert!(PredecessorDecl::from_yaml(None).is_absent());
        assert!(PredecessorDecl::from_yaml(Some(&yaml("~"))).is_absent());
        assert!(PredecessorDecl::from_yaml(Some(&yaml("42"))).is_absent());
        assert!(PredecessorDecl::from_yaml(Some(&yaml("{a: 1}"))).is_absent());
        assert!(PredecessorDecl::from_yaml(Some(&yaml("[]"))).is_absent());
        assert!(PredecessorDecl::from_yaml(Some(&yaml("\"  \""))).is_absent());
    }
}
