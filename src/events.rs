//! Change notifications fired after each successful mutation
//!
//! One event per mutation kind, carrying the affected identifier so a
//! consumer can decide whether to re-query.

use crate::graph::{GraphStats, NodeId};
use serde::{Deserialize, Serialize};

/// A graph event fired when a mutation completes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GraphEvent {
    /// The whole graph was rebuilt and swapped in
    Rebuilt { stats: GraphStats },
    /// A document's node and predecessor edges were re-derived
    NodeUpdated { id: NodeId },
    /// A document moved to a new id
    NodeRenamed { old: NodeId, new: NodeId },
    /// A document was deleted and its successors healed
    NodeDeleted {
        id: NodeId,
        /// Successors now pointing at the deleted node's predecessor
        rewired: Vec<NodeId>,
        /// Successors whose rewrite failed
        failed: Vec<NodeId>,
    },
    /// A placeholder's referrers were moved onto a newly created document
    PlaceholderAdopted { placeholder: NodeId, document: NodeId },
}

impl GraphEvent {
    /// The identifier this event is about, when there is one
    pub fn affected(&self) -> Option<&NodeId> {
        match self {
            Self::Rebuilt { .. } => None,
            Self::NodeUpdated { id } | Self::NodeDeleted { id, .. } => Some(id),
            Self::NodeRenamed { new, .. } => Some(new),
            Self::PlaceholderAdopted { document, .. } => Some(document),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn affected_identifier() {
        let event = GraphEvent::NodeRenamed {
            old: NodeId::from("a.md"),
            new: NodeId::from("b.md"),
        };
        assert_eq!(event.affected(), Some(&NodeId::from("b.md")));

        let event = GraphEvent::Rebuilt {
            stats: GraphStats::default(),
        };
        assert_eq!(event.affected(), None);
    }

    #[test]
    fn events_serialize_with_kind_tag() {
        let event = GraphEvent::NodeUpdated {
            id: NodeId::from("a.md"),
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"kind": "node_updated", "id": "a.md"})
        );
    }
}
