//! In-memory document store

use super::traits::{DocumentStore, StoreError, StoreResult};
use crate::document::{DocumentSnapshot, PredecessorDecl};
use crate::graph::NodeId;
use async_trait::async_trait;
use dashmap::DashMap;

/// Document store held entirely in memory
///
/// Useful for embedding the engine over documents managed elsewhere, and in
/// tests. Rewrites store the predecessor as wiki-link text, like the vault.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: DashMap<NodeId, DocumentSnapshot>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
        }
    }

    /// Create a store holding the given documents
    pub fn with_documents(documents: impl IntoIterator<Item = DocumentSnapshot>) -> Self {
        let store = Self::new();
        for doc in documents {
            store.insert(doc);
        }
        store
    }

    /// Insert or replace a document
    pub fn insert(&self, doc: DocumentSnapshot) {
        self.documents.insert(doc.id.clone(), doc);
    }

    /// Remove a document, returning its last snapshot
    pub fn remove(&self, id: &NodeId) -> Option<DocumentSnapshot> {
        self.documents.remove(id).map(|(_, doc)| doc)
    }

    /// Move a document to a new id
    pub fn rename(&self, old: &NodeId, new: &NodeId) -> bool {
        match self.documents.remove(old) {
            Some((_, mut doc)) => {
                doc.id = new.clone();
                self.documents.insert(new.clone(), doc);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &NodeId) -> Option<DocumentSnapshot> {
        self.documents.get(id).map(|r| r.clone())
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn list(&self) -> StoreResult<Vec<DocumentSnapshot>> {
        let mut docs: Vec<DocumentSnapshot> = self.documents.iter().map(|r| r.clone()).collect();
        docs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(docs)
    }

    async fn read(&self, id: &NodeId) -> StoreResult<Option<DocumentSnapshot>> {
        Ok(self.get(id))
    }

    async fn rewrite_predecessor(&self, id: &NodeId, reference: Option<&str>) -> StoreResult<()> {
        let mut doc = self
            .documents
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        doc.predecessor = match reference {
            Some(text) => PredecessorDecl::Single(text.to_string()),
            None => PredecessorDecl::Absent,
        };
        Ok(())
    }
}
