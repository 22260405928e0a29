//! Core graph data structures

mod builder;
mod edge;
mod links;
mod node;
mod store;


pub use builder::{build, update_node};
pub use edge::{Edge, EdgeAttrs, EdgeId, Relation};
pub use links::normalize_reference;
pub use node::{Node, NodeAttrs, NodeId};
pub use store::{ChainGraph, GraphError, GraphResult, GraphStats, Removal};
