//! Common test utilities for chainweave integration tests
//!
//! Fixture builders for in-memory services and on-disk vaults.

#![allow(dead_code)]

use chainweave::{
    ChainService, DocumentSnapshot, DocumentStore, EngineConfig, MemoryDocumentStore, NodeId,
};
use chrono::{DateTime, TimeZone, Utc};
use std::path::Path;
use std::sync::Arc;

/// Midnight UTC on the given day of January 2024
pub fn day(n: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, n, 0, 0, 0).unwrap()
}

pub fn id(s: &str) -> NodeId {
    NodeId::from(s)
}

pub fn ids(items: &[&str]) -> Vec<NodeId> {
    items.iter().map(|s| NodeId::from(*s)).collect()
}

/// A document created on `created` with an optional predecessor link
pub fn doc(name: &str, prev: Option<&str>, created: u32) -> DocumentSnapshot {
    let doc = DocumentSnapshot::new(name).with_created(day(created));
    match prev {
        Some(target) => doc.with_predecessor(format!("[[{}]]", target)),
        None => doc,
    }
}

/// An in-memory store plus a service built from it
pub async fn memory_service(
    documents: impl IntoIterator<Item = DocumentSnapshot>,
) -> (Arc<MemoryDocumentStore>, ChainService) {
    let store = Arc::new(MemoryDocumentStore::with_documents(documents));
    let shared: Arc<dyn DocumentStore> = store.clone();
    let service = ChainService::open(shared, &EngineConfig::default())
        .await
        .expect("memory store never fails to list");
    (store, service)
}

/// Write a markdown note with the given front matter lines
pub fn write_note(root: &Path, relative: &str, front: &[&str], body: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let content = if front.is_empty() {
        body.to_string()
    } else {
        format!("---\n{}\n---\n{}", front.join("\n"), body)
    };
    std::fs::write(path, content).unwrap();
}

pub fn read_note(root: &Path, relative: &str) -> String {
    std::fs::read_to_string(root.join(relative)).unwrap()
}
