//! Read-side chain traversal
//!
//! The graph stores only backward pointers (a document names its
//! predecessor), so successors are deduced from incoming edges. Walks
//! follow a single path: backward along the first predecessor, forward
//! along the canonical successor chosen by [`classify`]. Both stop at the
//! first node that would repeat, so malformed loops terminate.

use super::branch::{classify, classify_successors, is_on_canonical_path};
use crate::graph::{ChainGraph, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Predecessor targets of a node in edge insertion order
pub fn predecessors_of(graph: &ChainGraph, id: &NodeId) -> Vec<NodeId> {
    graph
        .outgoing(id)
        .filter(|e| e.attrs.is_predecessor())
        .map(|e| e.target.clone())
        .collect()
}

/// Documents that name `id` as their predecessor, first seen first
pub fn successors_of(graph: &ChainGraph, id: &NodeId) -> Vec<NodeId> {
    let mut seen = HashSet::new();
    graph
        .incoming(id)
        .filter(|e| e.attrs.is_predecessor())
        .filter(|e| seen.insert(e.source.clone()))
        .map(|e| e.source.clone())
        .collect()
}

/// The chain from its start up to and including `id`
///
/// Empty when `id` is not in the graph.
pub fn walk_backward(graph: &ChainGraph, id: &NodeId) -> Vec<NodeId> {
    if !graph.contains(id) {
        return Vec::new();
    }

    let mut chain = vec![id.clone()];
    let mut visited: HashSet<NodeId> = HashSet::from([id.clone()]);
    let mut current = id.clone();

    while let Some(parent) = predecessors_of(graph, &current).into_iter().next() {
        if !visited.insert(parent.clone()) {
            break;
        }
        chain.push(parent.clone());
        current = parent;
    }

    chain.reverse();
    chain
}

/// The canonical chain from `id` (inclusive) to its end
///
/// Empty when `id` is not in the graph.
pub fn walk_forward(graph: &ChainGraph, id: &NodeId) -> Vec<NodeId> {
    if !graph.contains(id) {
        return Vec::new();
    }
    walk_forward_from(graph, id, HashSet::new())
}

fn walk_forward_from(graph: &ChainGraph, id: &NodeId, mut visited: HashSet<NodeId>) -> Vec<NodeId> {
    visited.insert(id.clone());
    let mut chain = vec![id.clone()];
    let mut current = id.clone();

    while let Some(next) = classify(graph, &successors_of(graph, &current)).main {
        if !visited.insert(next.clone()) {
            break;
        }
        chain.push(next.clone());
        current = next;
    }

    chain
}

/// The whole canonical chain through `id`
///
/// Backward walk joined with the forward walk; `id` appears once, and the
/// forward leg never revisits a node already on the backward leg.
pub fn full_chain(graph: &ChainGraph, id: &NodeId) -> Vec<NodeId> {
    let mut chain = walk_backward(graph, id);
    if chain.is_empty() {
        return chain;
    }

    let visited: HashSet<NodeId> = chain.iter().cloned().collect();
    let forward = walk_forward_from(graph, id, visited);
    chain.extend(forward.into_iter().skip(1));
    chain
}

/// A chain prepared for display around a focused document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainView {
    /// The focused document
    pub focus: NodeId,
    /// Canonical path through the focused document
    pub canonical: Vec<NodeId>,
    /// Reply branches hanging off the focused document
    pub replies: Vec<NodeId>,
    /// Replies to the focused document's predecessor, other than the focus
    ///
    /// Empty when the focused document is itself a reply.
    pub sibling_replies: Vec<NodeId>,
}

/// Build the display chain for `id`
pub fn chain_view(graph: &ChainGraph, id: &NodeId) -> ChainView {
    let canonical = full_chain(graph, id);
    let replies = classify_successors(graph, id).replies;

    let sibling_replies = match predecessors_of(graph, id).first() {
        Some(parent) if is_on_canonical_path(graph, id) => classify_successors(graph, parent)
            .replies
            .into_iter()
            .filter(|r| r != id)
            .collect(),
        _ => Vec::new(),
    };

    ChainView {
        focus: id.clone(),
        canonical,
        replies,
        sibling_replies,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentSnapshot;
    use crate::graph::{build, EdgeAttrs, NodeAttrs};
    use chrono::{TimeZone, Utc};

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    fn ids(items: &[&str]) -> Vec<NodeId> {
        items.iter().map(|s| id(s)).collect()
    }

    /// root <- a <- b <- c, with a reply r1 on a (newer than b)
    fn conversation() -> ChainGraph {
        let t = |s| Utc.timestamp_opt(s, 0).unwrap();
        build(&[
            DocumentSnapshot::new("root").with_created(t(1)),
            DocumentSnapshot::new("a").with_predecessor("root").with_created(t(2)),
            DocumentSnapshot::new("b").with_predecessor("a").with_created(t(3)),
            DocumentSnapshot::new("r1").with_predecessor("a").with_created(t(4)),
            DocumentSnapshot::new("c").with_predecessor("b").with_created(t(5)),
        ])
    }

    #[test]
    fn predecessors_and_successors() {
        let graph = conversation();
        assert_eq!(predecessors_of(&graph, &id("b")), ids(&["a"]));
        assert_eq!(successors_of(&graph, &id("a")), ids(&["b", "r1"]));
        assert!(predecessors_of(&graph, &id("root")).is_empty());
        assert!(successors_of(&graph, &id("missing")).is_empty());
    }

    #[test]
    fn walks_from_the_middle() {
        let graph = conversation();
        assert_eq!(walk_backward(&graph, &id("b")), ids(&["root", "a", "b"]));
        assert_eq!(walk_forward(&graph, &id("b")), ids(&["b", "c"]));
        assert_eq!(full_chain(&graph, &id("b")), ids(&["root", "a", "b", "c"]));
    }

    #[test]
    fn forward_walk_takes_canonical_branch() {
        let graph = conversation();
        assert_eq!(walk_forward(&graph, &id("root")), ids(&["root", "a", "b", "c"]));
        assert_eq!(full_chain(&graph, &id("r1")), ids(&["root", "a", "r1"]));
    }

    #[test]
    fn absent_node_has_empty_chain() {
        let graph = conversation();
        assert!(walk_backward(&graph, &id("nope")).is_empty());
        assert!(walk_forward(&graph, &id("nope")).is_empty());
        assert!(full_chain(&graph, &id("nope")).is_empty());
    }

    #[test]
    fn backward_walk_follows_first_predecessor_only() {
        let graph = build(&[
            DocumentSnapshot::new("p1"),
            DocumentSnapshot::new("p2"),
            DocumentSnapshot::new("child").with_predecessors(["p2", "p1"]),
        ]);
        assert_eq!(walk_backward(&graph, &id("child")), ids(&["p2", "child"]));
        assert_eq!(successors_of(&graph, &id("p1")), ids(&["child"]));
    }

    // === Scenario: X -> Y -> X terminates with each node once ===
    #[test]
    fn cycle_guard_stops_walks() {
        let mut graph = ChainGraph::new();
        graph.add_node(id("X"), NodeAttrs::resolved(Vec::new(), None)).unwrap();
        graph.add_node(id("Y"), NodeAttrs::resolved(Vec::new(), None)).unwrap();
        graph.add_edge(&id("X"), &id("Y"), EdgeAttrs::predecessor()).unwrap();
        graph.add_edge(&id("Y"), &id("X"), EdgeAttrs::predecessor()).unwrap();

        assert_eq!(walk_backward(&graph, &id("X")), ids(&["Y", "X"]));
        assert_eq!(walk_forward(&graph, &id("X")), ids(&["X", "Y"]));
        assert_eq!(full_chain(&graph, &id("X")), ids(&["Y", "X"]));
    }

    #[test]
    fn chain_start_at_placeholder() {
        let graph = build(&[DocumentSnapshot::new("a").with_predecessor("[[Ghost]]")]);
        assert_eq!(full_chain(&graph, &id("a")), ids(&["Ghost", "a"]));
    }

    #[test]
    fn view_on_canonical_node_shows_sibling_replies() {
        let graph = conversation();
        let view = chain_view(&graph, &id("b"));
        assert_eq!(view.canonical, ids(&["root", "a", "b", "c"]));
        assert!(view.replies.is_empty());
        assert_eq!(view.sibling_replies, ids(&["r1"]));
    }

    #[test]
    fn view_on_reply_suppresses_siblings() {
        let graph = conversation();
        let view = chain_view(&graph, &id("r1"));
        assert_eq!(view.canonical, ids(&["root", "a", "r1"]));
        assert!(view.sibling_replies.is_empty());
    }

    #[test]
    fn view_on_branch_point_lists_replies() {
        let graph = conversation();
        let view = chain_view(&graph, &id("a"));
        assert_eq!(view.replies, ids(&["r1"]));
        assert!(view.sibling_replies.is_empty());
    }
}
