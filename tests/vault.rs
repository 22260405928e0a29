//! End-to-end behaviour over a markdown vault on disk
//!
//! Run with: `cargo test --test vault`

mod common;

use chainweave::{
    ChainService, DocumentStore, EngineConfig, OpenStore, PredecessorDecl, Removal, VaultStore,
};
use common::{id, ids, read_note, write_note};
use std::sync::Arc;

async fn open(root: &std::path::Path) -> (Arc<VaultStore>, ChainService) {
    let store = Arc::new(VaultStore::open(root).unwrap());
    let shared: Arc<dyn DocumentStore> = store.clone();
    let service = ChainService::open(shared, &EngineConfig::default())
        .await
        .unwrap();
    (store, service)
}

#[tokio::test]
async fn builds_chain_from_front_matter() {
    let dir = tempfile::tempdir().unwrap();
    write_note(dir.path(), "threads/one.md", &["created: 2024-01-01"], "First\n");
    write_note(
        dir.path(),
        "threads/two.md",
        &["prev: \"[[one]]\"", "created: 2024-01-02"],
        "Second\n",
    );
    write_note(
        dir.path(),
        "threads/three.md",
        &["prev: \"[[threads/two|the second]]\"", "created: 2024-01-03"],
        "Third\n",
    );
    write_note(
        dir.path(),
        "threads/aside.md",
        &["prev: \"[[two#Details]]\"", "created: 2024-01-05"],
        "Aside\n",
    );

    let (_store, service) = open(dir.path()).await;

    assert_eq!(
        service.full_chain(&id("threads/three.md")),
        ids(&["threads/one.md", "threads/two.md", "threads/three.md"])
    );
    let view = service.chain_view(&id("threads/two.md"));
    assert_eq!(view.replies, ids(&["threads/aside.md"]));
    assert!(!service.is_on_canonical_path(&id("threads/aside.md")));
}

#[tokio::test]
async fn delete_rewrites_successor_files() {
    let dir = tempfile::tempdir().unwrap();
    write_note(dir.path(), "a.md", &["created: 2024-01-01"], "A\n");
    write_note(
        dir.path(),
        "b.md",
        &["prev: \"[[a]]\"", "created: 2024-01-02"],
        "B\n",
    );
    write_note(
        dir.path(),
        "c.md",
        &["title: Third", "prev: \"[[b]]\"", "created: 2024-01-03"],
        "C body\n",
    );

    let (store, mut service) = open(dir.path()).await;
    store.remove_document(&id("b.md")).await.unwrap();
    let outcome = service.handle_delete(&id("b.md")).await;

    assert!(outcome.heal.is_complete());
    assert_eq!(outcome.removal, Removal::Dropped);
    assert!(!dir.path().join("b.md").exists());
    assert_eq!(service.full_chain(&id("c.md")), ids(&["a.md", "c.md"]));

    let content = read_note(dir.path(), "c.md");
    assert!(content.contains("title: Third"));
    assert!(content.ends_with("C body\n"));
    let doc = store.read(&id("c.md")).await.unwrap().unwrap();
    assert_eq!(doc.predecessor, PredecessorDecl::Single("[[a]]".into()));
}

#[tokio::test]
async fn delete_of_chain_start_clears_successor_declaration() {
    let dir = tempfile::tempdir().unwrap();
    write_note(dir.path(), "a.md", &[], "A\n");
    write_note(dir.path(), "b.md", &["prev: \"[[a]]\""], "B\n");

    let (store, mut service) = open(dir.path()).await;
    store.remove_document(&id("a.md")).await.unwrap();
    service.handle_delete(&id("a.md")).await;

    assert_eq!(read_note(dir.path(), "b.md"), "B\n");
    assert_eq!(service.full_chain(&id("b.md")), ids(&["b.md"]));
    assert_eq!(service.graph().node_count(), 1);
}

#[tokio::test]
async fn custom_field_names_are_honoured() {
    let dir = tempfile::tempdir().unwrap();
    write_note(dir.path(), "root.md", &[], "Root\n");
    write_note(dir.path(), "next.md", &["follows: \"[[root]]\""], "Next\n");

    let config = EngineConfig::from_yaml("predecessor_field: follows\n").unwrap();
    let store: Arc<dyn DocumentStore> =
        Arc::new(VaultStore::with_config(dir.path(), config.clone()).unwrap());
    let service = ChainService::open(store, &config).await.unwrap();

    assert_eq!(service.predecessors_of(&id("next.md")), ids(&["root.md"]));
}
