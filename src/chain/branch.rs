//! Branch classification: canonical continuation versus replies
//!
//! At a branch point the oldest successor (by document creation time)
//! continues the chain; every other successor is a reply. Successors
//! without a creation time sort as the earliest possible value, and equal
//! times are ordered by id. The split is recomputed on every call so it
//! always reflects current creation times.

use super::query::{predecessors_of, successors_of};
use crate::graph::{ChainGraph, NodeId};
use serde::{Deserialize, Serialize};

/// Result of classifying the successors at a branch point
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchSplit {
    /// The canonical continuation, if there is any successor
    pub main: Option<NodeId>,
    /// Reply branches, oldest first
    pub replies: Vec<NodeId>,
}

impl BranchSplit {
    pub fn is_branch_point(&self) -> bool {
        !self.replies.is_empty()
    }
}

/// Pick the canonical continuation among `candidates`
///
/// Ordered by `(created_time, id)`, so the split depends only on node
/// attributes and never on the order candidates are given in.
pub fn classify(graph: &ChainGraph, candidates: &[NodeId]) -> BranchSplit {
    match candidates {
        [] => BranchSplit::default(),
        [only] => BranchSplit {
            main: Some(only.clone()),
            replies: Vec::new(),
        },
        _ => {
            let mut ordered: Vec<&NodeId> = candidates.iter().collect();
            let created = |id: &NodeId| graph.attrs(id).and_then(|a| a.created_time);
            ordered.sort_by(|a, b| created(*a).cmp(&created(*b)).then_with(|| a.cmp(b)));
            let mut ordered = ordered.into_iter().cloned();
            BranchSplit {
                main: ordered.next(),
                replies: ordered.collect(),
            }
        }
    }
}

/// Classify the successors of a node
pub fn classify_successors(graph: &ChainGraph, id: &NodeId) -> BranchSplit {
    classify(graph, &successors_of(graph, id))
}

/// Whether a node is the canonical continuation of its own predecessor
///
/// Chain starts (no predecessor) are always canonical. Used to suppress
/// sibling replies when the focused node is itself a reply.
pub fn is_on_canonical_path(graph: &ChainGraph, id: &NodeId) -> bool {
    match predecessors_of(graph, id).first() {
        None => true,
        Some(parent) => classify_successors(graph, parent).main.as_ref() == Some(id),
    }
}
