//! Chain derivation over the predecessor graph
//!
//! Traversal (`query`), branch classification (`branch`) and repair after
//! deletion (`heal`).

mod branch;
mod heal;
mod query;

pub use branch::{classify, classify_successors, is_on_canonical_path, BranchSplit};
pub use heal::{heal_after_delete, HealReport};
pub use query::{
    chain_view, full_chain, predecessors_of, successors_of, walk_backward, walk_forward, ChainView,
};
