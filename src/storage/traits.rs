//! Document store trait definitions

use crate::document::DocumentSnapshot;
use crate::graph::NodeId;
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during document store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Front matter error in {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Document not found: {0}")]
    NotFound(NodeId),

    #[error("Invalid document path: {0}")]
    InvalidPath(String),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for document store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// The external collection of documents the graph is derived from
///
/// The engine only reads attribute snapshots and, when healing, asks the
/// store to rewrite one attribute: the predecessor declaration.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Snapshots of every existing document
    async fn list(&self) -> StoreResult<Vec<DocumentSnapshot>>;

    /// Current snapshot of one document, `None` if it does not exist
    async fn read(&self, id: &NodeId) -> StoreResult<Option<DocumentSnapshot>>;

    /// Replace a document's predecessor declaration with `reference`
    ///
    /// `reference` is wiki-link text such as `"[[threads/day one]]"`; `None`
    /// removes the declaration entirely, making the document a chain start.
    /// Fails with `NotFound` if the document is gone.
    async fn rewrite_predecessor(&self, id: &NodeId, reference: Option<&str>) -> StoreResult<()>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: DocumentStore + Sized {
    /// Open the store rooted at the given path
    fn open(path: impl AsRef<Path>) -> StoreResult<Self>;
}
