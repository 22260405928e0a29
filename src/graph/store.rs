//! ChainGraph: the node arena and adjacency indexes
//!
//! The graph exclusively owns every node and edge. Nodes live in an arena
//! keyed by id; edges live in a map keyed by [`EdgeId`], with per-node
//! outgoing/incoming lists recording insertion order. A secondary link index
//! maps lower-cased link keys to resolved nodes for reference resolution.

use super::edge::{Edge, EdgeAttrs, EdgeId, Relation};
use super::links::{link_keys, reference_key, wiki_link};
use super::node::{Node, NodeAttrs, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised by graph primitives
///
/// None of these is fatal: callers log and carry on with the graph unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("Node already exists: {0}")]
    DuplicateNode(NodeId),

    #[error("Rename target already exists: {0}")]
    RenameTargetExists(NodeId),

    #[error("Edge endpoint missing: {0}")]
    MissingEndpoint(NodeId),

    #[error("Unresolved node cannot declare a predecessor: {0}")]
    UnresolvedSource(NodeId),
}

/// Result type for graph primitives
pub type GraphResult<T> = Result<T, GraphError>;

/// Outcome of [`ChainGraph::remove_node`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The node did not exist
    Absent,
    /// Something still points at the node; it remains as a placeholder
    Demoted,
    /// The node and its outgoing edges are gone
    Dropped,
}

/// Summary counts for a graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub placeholder_count: usize,
    pub branch_points: usize,
}

/// The predecessor graph
#[derive(Debug, Clone, Default)]
pub struct ChainGraph {
    nodes: HashMap<NodeId, NodeAttrs>,
    edges: HashMap<EdgeId, Edge>,
    outgoing: HashMap<NodeId, Vec<EdgeId>>,
    incoming: HashMap<NodeId, Vec<EdgeId>>,
    link_index: HashMap<String, BTreeSet<NodeId>>,
    next_edge: u64,
}

impl ChainGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    // === Nodes ===

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Get a copy of a node
    pub fn node(&self, id: &NodeId) -> Option<Node> {
        self.nodes
            .get(id)
            .map(|attrs| Node::new(id.clone(), attrs.clone()))
    }

    pub(crate) fn attrs(&self, id: &NodeId) -> Option<&NodeAttrs> {
        self.nodes.get(id)
    }

    /// Copies of all nodes, ordered by id
    pub fn nodes(&self) -> Vec<Node> {
        let mut nodes: Vec<Node> = self
            .nodes
            .iter()
            .map(|(id, attrs)| Node::new(id.clone(), attrs.clone()))
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes
    }

    /// Ids of all unresolved placeholder nodes, ordered
    pub fn placeholders(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, attrs)| !attrs.resolved)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Add a node
    ///
    /// Fails with `DuplicateNode` and leaves the graph untouched if the id exists.
    pub fn add_node(&mut self, id: NodeId, attrs: NodeAttrs) -> GraphResult<()> {
        if self.nodes.contains_key(&id) {
            warn!(id = %id, "refusing to add duplicate node");
            return Err(GraphError::DuplicateNode(id));
        }
        self.index_node(&id, &attrs);
        self.outgoing.entry(id.clone()).or_default();
        self.incoming.entry(id.clone()).or_default();
        self.nodes.insert(id, attrs);
        Ok(())
    }

    /// Add a node unless it already exists
    ///
    /// Returns true if the node was created.
    pub fn add_node_safe(&mut self, id: NodeId, attrs: NodeAttrs) -> bool {
        if self.nodes.contains_key(&id) {
            return false;
        }
        self.add_node(id, attrs).is_ok()
    }

    /// Modify a node's attributes in place, keeping the link index current
    ///
    /// Demoting a node through here also drops its outgoing edges.
    pub(crate) fn update_attrs(&mut self, id: &NodeId, f: impl FnOnce(&mut NodeAttrs)) -> bool {
        let Some(current) = self.nodes.get(id).cloned() else {
            return false;
        };
        let mut updated = current.clone();
        f(&mut updated);
        if !updated.resolved {
            updated.aliases = None;
            updated.created_time = None;
            self.clear_outgoing(id);
        }
        self.unindex_node(id, &current);
        self.index_node(id, &updated);
        self.nodes.insert(id.clone(), updated);
        true
    }

    /// Rename a node, carrying every incoming and outgoing edge along
    ///
    /// Returns `Ok(false)` when `old` does not exist and `Ok(true)` without
    /// change when `old == new`. Refuses with `RenameTargetExists` when `new`
    /// is taken by another node; rename never overwrites.
    /// Edges keep their ids, attributes and their position in each
    /// endpoint's adjacency list, so the first predecessor stays first.
    pub fn rename_node(&mut self, old: &NodeId, new: &NodeId) -> GraphResult<bool> {
        if !self.nodes.contains_key(old) {
            return Ok(false);
        }
        if old == new {
            return Ok(true);
        }
        if self.nodes.contains_key(new) {
            warn!(old = %old, new = %new, "rename target already exists");
            return Err(GraphError::RenameTargetExists(new.clone()));
        }

        let attrs = self.nodes.remove(old).unwrap_or_default();
        self.unindex_node(old, &attrs);
        let out = self.outgoing.remove(old).unwrap_or_default();
        let inc = self.incoming.remove(old).unwrap_or_default();

        // A self-loop is listed on both sides; rewriting it twice is a no-op.
        for edge_id in out.iter().chain(inc.iter()) {
            if let Some(edge) = self.edges.get_mut(edge_id) {
                if edge.source == *old {
                    edge.source = new.clone();
                }
                if edge.target == *old {
                    edge.target = new.clone();
                }
            }
        }

        self.outgoing.insert(new.clone(), out);
        self.incoming.insert(new.clone(), inc);
        self.index_node(new, &attrs);
        self.nodes.insert(new.clone(), attrs);
        debug!(old = %old, new = %new, "renamed node");
        Ok(true)
    }

    /// Handle deletion of a node's document
    ///
    /// A node something still points at is demoted to a placeholder;
    /// otherwise it is dropped together with its outgoing edges.
    pub fn remove_node(&mut self, id: &NodeId) -> Removal {
        if !self.nodes.contains_key(id) {
            return Removal::Absent;
        }

        if self.in_degree(id) > 0 {
            self.update_attrs(id, |attrs| *attrs = NodeAttrs::placeholder());
            debug!(id = %id, "demoted node to placeholder");
            return Removal::Demoted;
        }

        self.clear_outgoing(id);
        if let Some(attrs) = self.nodes.remove(id) {
            self.unindex_node(id, &attrs);
        }
        self.outgoing.remove(id);
        self.incoming.remove(id);
        debug!(id = %id, "dropped node");
        Removal::Dropped
    }

    /// Drop every placeholder nothing points at any more
    ///
    /// Returns the dropped ids.
    pub fn prune_placeholders(&mut self) -> Vec<NodeId> {
        let orphans: Vec<NodeId> = self
            .placeholders()
            .into_iter()
            .filter(|id| self.in_degree(id) == 0)
            .collect();
        for id in &orphans {
            self.remove_node(id);
        }
        orphans
    }

    // === Edges ===

    /// Add an edge from `source` to `target`
    ///
    /// Both endpoints must exist and the source must be resolved. A parallel
    /// edge is appended even if an equivalent one exists.
    pub fn add_edge(
        &mut self,
        source: &NodeId,
        target: &NodeId,
        attrs: EdgeAttrs,
    ) -> GraphResult<EdgeId> {
        let source_attrs = self
            .nodes
            .get(source)
            .ok_or_else(|| GraphError::MissingEndpoint(source.clone()))?;
        if !self.nodes.contains_key(target) {
            return Err(GraphError::MissingEndpoint(target.clone()));
        }
        if !source_attrs.resolved {
            return Err(GraphError::UnresolvedSource(source.clone()));
        }

        let id = EdgeId::from_raw(self.next_edge);
        self.next_edge += 1;
        self.edges.insert(
            id,
            Edge {
                id,
                source: source.clone(),
                target: target.clone(),
                attrs,
            },
        );
        self.outgoing.entry(source.clone()).or_default().push(id);
        self.incoming.entry(target.clone()).or_default().push(id);
        Ok(id)
    }

    /// Remove a single edge, returning it
    pub fn remove_edge(&mut self, id: EdgeId) -> Option<Edge> {
        let edge = self.edges.remove(&id)?;
        if let Some(list) = self.outgoing.get_mut(&edge.source) {
            list.retain(|e| *e != id);
        }
        if let Some(list) = self.incoming.get_mut(&edge.target) {
            list.retain(|e| *e != id);
        }
        Some(edge)
    }

    /// Remove every outgoing edge of a node, returning how many were removed
    pub fn clear_outgoing(&mut self, id: &NodeId) -> usize {
        let out = self
            .outgoing
            .get_mut(id)
            .map(std::mem::take)
            .unwrap_or_default();
        for edge_id in &out {
            if let Some(edge) = self.edges.remove(edge_id) {
                if let Some(list) = self.incoming.get_mut(&edge.target) {
                    list.retain(|e| e != edge_id);
                }
            }
        }
        out.len()
    }

    /// Outgoing edges of a node in insertion order
    pub fn outgoing(&self, id: &NodeId) -> impl Iterator<Item = &Edge> + '_ {
        self.outgoing
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(|e| self.edges.get(e))
    }

    /// Incoming edges of a node in insertion order
    pub fn incoming(&self, id: &NodeId) -> impl Iterator<Item = &Edge> + '_ {
        self.incoming
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(|e| self.edges.get(e))
    }

    pub fn out_degree(&self, id: &NodeId) -> usize {
        self.outgoing.get(id).map(Vec::len).unwrap_or(0)
    }

    pub fn in_degree(&self, id: &NodeId) -> usize {
        self.incoming.get(id).map(Vec::len).unwrap_or(0)
    }

    /// All edges, ordered by id
    pub fn edges(&self) -> Vec<Edge> {
        let mut edges: Vec<Edge> = self.edges.values().cloned().collect();
        edges.sort_by_key(|e| e.id);
        edges
    }

    /// Sorted `(source, target, relation, explicit)` tuples
    ///
    /// Two graphs with equal multisets hold the same edges regardless of ids.
    pub fn edge_multiset(&self) -> Vec<(NodeId, NodeId, Relation, bool)> {
        let mut set: Vec<_> = self
            .edges
            .values()
            .map(|e| {
                (
                    e.source.clone(),
                    e.target.clone(),
                    e.attrs.relation.clone(),
                    e.attrs.explicit,
                )
            })
            .collect();
        set.sort();
        set
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn stats(&self) -> GraphStats {
        let placeholder_count = self.nodes.values().filter(|a| !a.resolved).count();
        let branch_points = self
            .nodes
            .keys()
            .filter(|id| {
                let mut sources: Vec<&NodeId> = self
                    .incoming(id)
                    .filter(|e| e.attrs.is_predecessor())
                    .map(|e| &e.source)
                    .collect();
                sources.sort();
                sources.dedup();
                sources.len() > 1
            })
            .count();
        GraphStats {
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            placeholder_count,
            branch_points,
        }
    }

    // === Link resolution ===

    /// Resolve a reference to a resolved node
    ///
    /// When several nodes share the key, the smallest id wins.
    pub fn resolve_reference(&self, reference: &str) -> Option<NodeId> {
        let key = reference_key(reference)?;
        self.link_index
            .get(&key)
            .and_then(|ids| ids.iter().next())
            .cloned()
    }

    /// Wiki link text that resolves back to `target` in this graph
    ///
    /// A resolved node gets its id without extension when that form is
    /// unambiguous, and its full id otherwise. Placeholder ids are reference
    /// text already and are written back verbatim.
    pub fn link_text(&self, target: &NodeId) -> String {
        if self.attrs(target).is_some_and(|attrs| attrs.resolved) {
            let short = target.without_extension();
            if self.resolve_reference(short).as_ref() == Some(target) {
                return wiki_link(short);
            }
        }
        wiki_link(target.as_str())
    }

    /// Placeholders that a resolved node with these attributes would satisfy
    pub fn placeholders_matching(&self, id: &NodeId, attrs: &NodeAttrs) -> Vec<NodeId> {
        let keys: BTreeSet<String> = link_keys(id, attrs).into_iter().collect();
        self.placeholders()
            .into_iter()
            .filter(|p| p != id)
            .filter(|p| reference_key(p.as_str()).is_some_and(|k| keys.contains(&k)))
            .collect()
    }

    fn index_node(&mut self, id: &NodeId, attrs: &NodeAttrs) {
        for key in link_keys(id, attrs) {
            self.link_index.entry(key).or_default().insert(id.clone());
        }
    }

    fn unindex_node(&mut self, id: &NodeId, attrs: &NodeAttrs) {
        for key in link_keys(id, attrs) {
            if let Some(ids) = self.link_index.get_mut(&key) {
                ids.remove(id);
                if ids.is_empty() {
                    self.link_index.remove(&key);
                }
            }
        }
    }
}
