//! Markdown vault document store
//!
//! A vault is a directory tree of markdown notes. A note's id is its path
//! relative to the vault root with `/` separators; its attributes come from
//! YAML front matter:
//!
//! ```markdown
//! ---
//! prev: "[[threads/day one]]"
//! aliases: [Day two]
//! created: 2024-05-02T08:00:00Z
//! ---
//! ```

use super::frontmatter;
use super::traits::{DocumentStore, OpenStore, StoreError, StoreResult};
use crate::config::EngineConfig;
use crate::document::{DocumentSnapshot, PredecessorDecl};
use crate::graph::NodeId;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_yaml::{Mapping, Value};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Document store over a directory of markdown files
#[derive(Debug, Clone)]
pub struct VaultStore {
    root: PathBuf,
    config: EngineConfig,
}

impl VaultStore {
    /// Open a vault with explicit configuration
    pub fn with_config(root: impl AsRef<Path>, config: EngineConfig) -> StoreResult<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(StoreError::InvalidPath(root.display().to_string()));
        }
        Ok(Self {
            root: root.to_path_buf(),
            config,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Id of a file inside the vault
    pub fn id_for(&self, path: &Path) -> StoreResult<NodeId> {
        let relative = path
            .strip_prefix(&self.root)
            .map_err(|_| StoreError::InvalidPath(path.display().to_string()))?;
        let parts: Vec<&str> = relative
            .components()
            .map(|c| match c {
                Component::Normal(part) => part
                    .to_str()
                    .ok_or_else(|| StoreError::InvalidPath(path.display().to_string())),
                _ => Err(StoreError::InvalidPath(path.display().to_string())),
            })
            .collect::<StoreResult<_>>()?;
        if parts.is_empty() {
            return Err(StoreError::InvalidPath(path.display().to_string()));
        }
        Ok(NodeId::from_string(parts.join("/")))
    }

    /// Filesystem path of a document id
    ///
    /// Rejects ids that would escape the vault.
    pub fn path_for(&self, id: &NodeId) -> StoreResult<PathBuf> {
        let relative = Path::new(id.as_str());
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes || id.as_str().is_empty() {
            return Err(StoreError::InvalidPath(id.to_string()));
        }
        Ok(self.root.join(relative))
    }

    /// Delete a document's file
    pub async fn remove_document(&self, id: &NodeId) -> StoreResult<()> {
        let path = self.path_for(id)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|err| not_found_or_io(err, id))
    }

    async fn load(&self, id: NodeId, path: &Path) -> StoreResult<Option<DocumentSnapshot>> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let metadata = tokio::fs::metadata(path).await?;

        let front = frontmatter::read(&content).unwrap_or_else(|err| {
            warn!(id = %id, error = %err, "ignoring malformed front matter");
            Mapping::new()
        });

        let created = self
            .created_from(&front)
            .or_else(|| metadata.created().ok().map(DateTime::<Utc>::from))
            .or_else(|| metadata.modified().ok().map(DateTime::<Utc>::from));

        Ok(Some(DocumentSnapshot {
            aliases: self.aliases_from(&front),
            created,
            predecessor: PredecessorDecl::from_yaml(front.get(self.config.predecessor_field.as_str())),
            id,
        }))
    }

    fn aliases_from(&self, front: &Mapping) -> Vec<String> {
        match front.get(self.config.aliases_field.as_str()) {
            Some(Value::String(alias)) => vec![alias.clone()],
            Some(Value::Sequence(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    fn created_from(&self, front: &Mapping) -> Option<DateTime<Utc>> {
        let text = front.get(self.config.created_field.as_str())?.as_str()?.trim();
        if let Ok(at) = DateTime::parse_from_rfc3339(text) {
            return Some(at.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }

    fn document_paths(&self) -> StoreResult<Vec<PathBuf>> {
        let mut paths = Vec::new();
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));
        for entry in walker {
            let entry = entry?;
            if entry.file_type().is_file() && self.config.is_document(entry.path()) {
                paths.push(entry.into_path());
            }
        }
        Ok(paths)
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|n| n.starts_with('.'))
}

fn not_found_or_io(err: std::io::Error, id: &NodeId) -> StoreError {
    if err.kind() == std::io::ErrorKind::NotFound {
        StoreError::NotFound(id.clone())
    } else {
        StoreError::Io(err)
    }
}

impl OpenStore for VaultStore {
    fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::with_config(path, EngineConfig::default())
    }
}

#[async_trait]
impl DocumentStore for VaultStore {
    async fn list(&self) -> StoreResult<Vec<DocumentSnapshot>> {
        let mut docs = Vec::new();
        for path in self.document_paths()? {
            let id = self.id_for(&path)?;
            if let Some(doc) = self.load(id, &path).await? {
                docs.push(doc);
            }
        }
        debug!(root = %self.root.display(), documents = docs.len(), "listed vault");
        Ok(docs)
    }

    async fn read(&self, id: &NodeId) -> StoreResult<Option<DocumentSnapshot>> {
        let path = self.path_for(id)?;
        self.load(id.clone(), &path).await
    }

    async fn rewrite_predecessor(&self, id: &NodeId, reference: Option<&str>) -> StoreResult<()> {
        let path = self.path_for(id)?;
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|err| not_found_or_io(err, id))?;

        let value = reference.map(|text| Value::String(text.to_string()));
        let updated = frontmatter::set_field(&content, &self.config.predecessor_field, value)
            .map_err(|source| StoreError::Yaml {
                path: id.to_string(),
                source,
            })?;

        if updated != content {
            tokio::fs::write(&path, updated).await?;
        }
        debug!(id = %id, reference = ?reference, "rewrote predecessor");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn vault_with(files: &[(&str, &str)]) -> (tempfile::TempDir, VaultStore) {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            let path = dir.path().join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }
        let store = VaultStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn list_reads_front_matter_attributes() {
        let (_dir, store) = vault_with(&[
            (
                "threads/two.md",
                "---\nprev: \"[[threads/one]]\"\naliases: [Second]\ncreated: 2024-05-02T08:00:00Z\n---\nbody",
            ),
            ("threads/one.md", "---\naliases: First\ncreated: 2024-05-01\n---\n"),
            ("notes.txt", "not a document"),
            (".obsidian/workspace.md", "hidden"),
        ]);

        let docs = store.list().await.unwrap();
        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["threads/one.md", "threads/two.md"]);

        let one = &docs[0];
        assert_eq!(one.aliases, vec!["First".to_string()]);
        assert_eq!(one.created, Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()));
        assert!(one.predecessor.is_absent());

        let two = &docs[1];
        assert_eq!(two.predecessor, PredecessorDecl::Single("[[threads/one]]".into()));
        assert_eq!(two.created, Some(Utc.with_ymd_and_hms(2024, 5, 2, 8, 0, 0).unwrap()));
    }

    #[tokio::test]
    async fn malformed_front_matter_still_lists_document() {
        let (_dir, store) = vault_with(&[("bad.md", "---\nprev: [unclosed\n---\n")]);
        let docs = store.list().await.unwrap();
        assert_eq!(docs.len(), 1);
        assert!(docs[0].predecessor.is_absent());
        assert!(docs[0].created.is_some());
    }

    #[tokio::test]
    async fn read_missing_document_is_none() {
        let (_dir, store) = vault_with(&[]);
        assert!(store.read(&NodeId::from("gone.md")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rewrite_points_at_new_predecessor() {
        let (dir, store) = vault_with(&[("c.md", "---\ntitle: C\nprev: \"[[b]]\"\n---\nHello\n")]);
        let c = NodeId::from("c.md");

        store
            .rewrite_predecessor(&c, Some("[[threads/a]]"))
            .await
            .unwrap();
        let doc = store.read(&c).await.unwrap().unwrap();
        assert_eq!(doc.predecessor, PredecessorDecl::Single("[[threads/a]]".into()));

        let content = std::fs::read_to_string(dir.path().join("c.md")).unwrap();
        assert!(content.contains("title: C"));
        assert!(content.ends_with("Hello\n"));
    }

    #[tokio::test]
    async fn rewrite_to_none_removes_declaration() {
        let (dir, store) = vault_with(&[("c.md", "---\nprev: \"[[b]]\"\n---\nHello\n")]);
        store
            .rewrite_predecessor(&NodeId::from("c.md"), None)
            .await
            .unwrap();
        let content = std::fs::read_to_string(dir.path().join("c.md")).unwrap();
        assert_eq!(content, "Hello\n");
    }

    #[tokio::test]
    async fn rewrite_missing_document_is_not_found() {
        let (_dir, store) = vault_with(&[]);
        let err = store
            .rewrite_predecessor(&NodeId::from("gone.md"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn ids_cannot_escape_vault() {
        let (_dir, store) = vault_with(&[]);
        assert!(store.path_for(&NodeId::from("../outside.md")).is_err());
        assert!(store.path_for(&NodeId::from("/etc/passwd")).is_err());
        assert!(store.path_for(&NodeId::from("threads/a.md")).is_ok());
    }

    #[test]
    fn id_uses_forward_slashes() {
        let (dir, store) = vault_with(&[]);
        let path = dir.path().join("threads").join("a.md");
        assert_eq!(store.id_for(&path).unwrap(), NodeId::from("threads/a.md"));
    }

    #[test]
    fn open_rejects_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            VaultStore::open(dir.path().join("nope")),
            Err(StoreError::InvalidPath(_))
        ));
    }
}
