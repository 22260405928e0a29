//! Full and incremental construction of the chain graph
//!
//! [`build`] is the two-pass full scan used at startup and on explicit
//! rebuilds:
//! 1. Add every document as a resolved node
//! 2. Derive every document's predecessor edges with [`update_node`]
//!
//! Running the second pass only after all nodes exist means references
//! between documents resolve regardless of input order.

use super::edge::EdgeAttrs;
use super::links::normalize_reference;
use super::node::{NodeAttrs, NodeId};
use super::store::ChainGraph;
use crate::document::DocumentSnapshot;
use tracing::{debug, info, warn};

fn resolved_attrs(doc: &DocumentSnapshot) -> NodeAttrs {
    NodeAttrs::resolved(doc.aliases.iter().cloned(), doc.created)
}

/// Build a graph from the complete document collection
///
/// O(nodes + edges), and the whole graph is reconstructed: avoid calling
/// this on every change, use [`update_node`] instead. Building twice from
/// the same input yields structurally identical graphs.
pub fn build(documents: &[DocumentSnapshot]) -> ChainGraph {
    let mut graph = ChainGraph::new();

    for doc in documents {
        if !graph.add_node_safe(doc.id.clone(), resolved_attrs(doc)) {
            warn!(id = %doc.id, "document listed twice, keeping first");
        }
    }

    for doc in documents {
        update_node(&mut graph, doc);
    }

    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "built chain graph"
    );
    graph
}

/// Recompute one document's node and outgoing edges from its snapshot
///
/// Creates the node if absent; otherwise refreshes `resolved` and aliases in
/// place. The creation time is only taken when the node has none yet (a
/// promoted placeholder). All outgoing edges are dropped and re-derived.
/// Only the document's own node and newly created placeholders are touched.
///
/// Returns the predecessor targets in declaration order.
pub fn update_node(graph: &mut ChainGraph, doc: &DocumentSnapshot) -> Vec<NodeId> {
    if !graph.add_node_safe(doc.id.clone(), resolved_attrs(doc)) {
        graph.update_attrs(&doc.id, |attrs| {
            attrs.resolved = true;
            attrs.aliases = Some(doc.aliases.iter().cloned().collect());
            if attrs.created_time.is_none() {
                attrs.created_time = doc.created;
            }
        });
    }

    graph.clear_outgoing(&doc.id);

    let mut targets: Vec<NodeId> = Vec::new();
    for reference in doc.predecessor.references() {
        let target = match graph.resolve_reference(reference) {
            Some(id) => id,
            None => {
                let Some(normalized) = normalize_reference(reference) else {
                    debug!(id = %doc.id, reference, "skipping empty predecessor reference");
                    continue;
                };
                let placeholder = NodeId::from_string(normalized);
                if graph.add_node_safe(placeholder.clone(), NodeAttrs::placeholder()) {
                    debug!(id = %doc.id, placeholder = %placeholder, "created placeholder");
                }
                placeholder
            }
        };

        if target == doc.id {
            debug!(id = %doc.id, "ignoring self-referencing predecessor");
            continue;
        }
        if targets.contains(&target) {
            continue;
        }

        match graph.add_edge(&doc.id, &target, EdgeAttrs::predecessor()) {
            Ok(_) => targets.push(target),
            Err(err) => warn!(id = %doc.id, error = %err, "failed to add predecessor edge"),
        }
    }

    debug!(id = %doc.id, predecessors = targets.len(), "updated node");
    targets
}
