//! Chainweave: predecessor-chain graph engine for linked notes
//!
//! Each document may declare a predecessor (`prev: "[[earlier note]]"` in
//! its front matter). From those backward pointers Chainweave derives the
//! conversation chain through any document, decides which of several
//! replies continues the chain, and heals the chain when a document in
//! the middle is deleted.
//!
//! # Core Concepts
//!
//! - **Nodes**: documents, or placeholders for references that do not resolve yet
//! - **Edges**: `A -> B` means "A's predecessor is B"
//! - **Branch points**: nodes with several successors; the oldest successor is canonical
//! - **Healing**: successors of a deleted document are pointed at its predecessor
//!
//! # Example
//!
//! ```
//! use chainweave::{build, full_chain, DocumentSnapshot, NodeId};
//!
//! let graph = build(&[
//!     DocumentSnapshot::new("one.md"),
//!     DocumentSnapshot::new("two.md").with_predecessor("[[one]]"),
//! ]);
//! let chain = full_chain(&graph, &NodeId::from("two.md"));
//! assert_eq!(chain, vec![NodeId::from("one.md"), NodeId::from("two.md")]);
//! ```

pub mod chain;
pub mod config;
pub mod document;
pub mod events;
mod graph;
pub mod service;
pub mod storage;

pub use chain::{
    chain_view, classify, classify_successors, full_chain, heal_after_delete, is_on_canonical_path,
    predecessors_of, successors_of, walk_backward, walk_forward, BranchSplit, ChainView,
    HealReport,
};
pub use config::{ConfigError, EngineConfig};
pub use document::{DocumentSnapshot, PredecessorDecl};
pub use events::GraphEvent;
pub use graph::{
    build, normalize_reference, update_node, ChainGraph, Edge, EdgeAttrs, EdgeId,
    GraphError, GraphResult, GraphStats, Node, NodeAttrs, NodeId, Relation, Removal,
};
pub use service::{ChainQueue, ChainService, DeleteOutcome, Notification, ServiceError, ServiceResult};
pub use storage::{
    DocumentStore, MemoryDocumentStore, OpenStore, StoreError, StoreResult, VaultStore,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
