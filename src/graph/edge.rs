//! Predecessor edges

use super::node::NodeId;
use serde::{Deserialize, Serialize};

/// Identifier of an edge, unique within one graph instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(u64);

impl EdgeId {
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Kind of relation an edge expresses
///
/// Only `Predecessor` is produced today. `Other` keeps the kind open so
/// additional relations can coexist with existing edges.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Predecessor,
    Other(String),
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Predecessor => write!(f, "predecessor"),
            Self::Other(kind) => write!(f, "{}", kind),
        }
    }
}

/// Attributes carried by an edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeAttrs {
    /// Relation kind
    pub relation: Relation,
    /// True when derived directly from a declared attribute
    pub explicit: bool,
}

impl EdgeAttrs {
    /// An explicitly declared predecessor edge
    pub fn predecessor() -> Self {
        Self {
            relation: Relation::Predecessor,
            explicit: true,
        }
    }

    pub fn is_predecessor(&self) -> bool {
        self.relation == Relation::Predecessor
    }
}

/// A directed edge: `source`'s predecessor is `target`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(flatten)]
    pub attrs: EdgeAttrs,
}

impl Edge {
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}
