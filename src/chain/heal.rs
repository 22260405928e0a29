//! Chain healing after a document is deleted
//!
//! When a document in the middle of a chain disappears, every document that
//! named it as predecessor is rewritten to name the deleted document's own
//! predecessor instead. A branch point therefore moves up one link rather
//! than collapsing. Rewrites are best-effort per successor.

use super::query::{predecessors_of, successors_of};
use crate::graph::{ChainGraph, NodeId};
use crate::storage::{DocumentStore, StoreError};
use tracing::{info, warn};

/// What healing did for one deleted document
#[derive(Debug)]
pub struct HealReport {
    /// The deleted document
    pub deleted: NodeId,
    /// The deleted document's first predecessor, if it had one
    pub grandparent: Option<NodeId>,
    /// Successors whose declaration was rewritten
    pub rewired: Vec<NodeId>,
    /// Successors whose rewrite failed, left pointing at the deleted node
    pub failed: Vec<(NodeId, StoreError)>,
}

impl HealReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Rewrite the predecessor declarations of a deleted node's successors
///
/// Must run before the node is removed from the graph; the graph itself is
/// only read. The written reference is one that resolves to the grandparent
/// in the current graph, so re-deriving a successor lands on the same node.
/// Afterwards the caller re-derives each rewired successor's edges and
/// removes the deleted node. A successor that is also the grandparent (a
/// two-node loop) has its declaration removed rather than pointed at itself.
pub async fn heal_after_delete(
    graph: &ChainGraph,
    store: &dyn DocumentStore,
    deleted: &NodeId,
) -> HealReport {
    let grandparent = predecessors_of(graph, deleted).into_iter().next();
    let successors = successors_of(graph, deleted);

    let mut report = HealReport {
        deleted: deleted.clone(),
        grandparent: grandparent.clone(),
        rewired: Vec::new(),
        failed: Vec::new(),
    };

    let reference = grandparent.as_ref().map(|g| graph.link_text(g));

    for successor in successors {
        let reference = if grandparent.as_ref() == Some(&successor) {
            None
        } else {
            reference.as_deref()
        };
        match store.rewrite_predecessor(&successor, reference).await {
            Ok(()) => report.rewired.push(successor),
            Err(err) => {
                warn!(
                    deleted = %deleted,
                    successor = %successor,
                    error = %err,
                    "failed to rewire successor"
                );
                report.failed.push((successor, err));
            }
        }
    }

    if !report.rewired.is_empty() || !report.failed.is_empty() {
        info!(
            deleted = %deleted,
            grandparent = ?report.grandparent.as_ref().map(NodeId::as_str),
            rewired = report.rewired.len(),
            failed = report.failed.len(),
            "healed chain"
        );
    }
    report
}
