//! ChainService: the owner of the live chain graph
//!
//! The service is the only mutator of the graph. Every mutation takes
//! `&mut self` and runs to completion, including any store I/O awaited
//! while healing, before the next one can start. The graph is held as an
//! `Arc` and mutated copy-on-write, so snapshots handed to readers never
//! observe a half-applied change; a rebuild swaps in a fully built graph.
//!
//! [`ChainQueue`] runs a service on a background task and feeds it
//! document notifications one at a time. Copy-on-write means a mutation
//! copies the whole graph only while some reader still holds a snapshot.

use crate::chain::{
    self, heal_after_delete, BranchSplit, ChainView, HealReport,
};
use crate::config::EngineConfig;
use crate::events::GraphEvent;
use crate::graph::{build, update_node, ChainGraph, GraphError, GraphStats, NodeId, Removal};
use crate::storage::{DocumentStore, StoreError};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Errors surfaced by the service
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Document store error: {0}")]
    Store(#[from] StoreError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Notification queue closed")]
    QueueClosed,
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Outcome of [`ChainService::handle_delete`]
#[derive(Debug)]
pub struct DeleteOutcome {
    pub heal: HealReport,
    pub removal: Removal,
}

/// Owner of the live graph, wired to a document store and event listeners
pub struct ChainService {
    graph: Arc<ChainGraph>,
    store: Arc<dyn DocumentStore>,
    events: broadcast::Sender<GraphEvent>,
}

impl std::fmt::Debug for ChainService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainService")
            .field("stats", &self.graph.stats())
            .finish_non_exhaustive()
    }
}

impl ChainService {
    /// Create a service with an empty graph
    pub fn new(store: Arc<dyn DocumentStore>, config: &EngineConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            graph: Arc::new(ChainGraph::new()),
            store,
            events,
        }
    }

    /// Create a service and build the graph from the store
    pub async fn open(store: Arc<dyn DocumentStore>, config: &EngineConfig) -> ServiceResult<Self> {
        let mut service = Self::new(store, config);
        service.rebuild().await?;
        Ok(service)
    }

    /// The live graph
    pub fn graph(&self) -> &ChainGraph {
        &self.graph
    }

    /// A shared snapshot of the live graph
    ///
    /// Later mutations do not affect a snapshot already taken.
    pub fn snapshot(&self) -> Arc<ChainGraph> {
        Arc::clone(&self.graph)
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Receive a [`GraphEvent`] after every successful mutation
    pub fn subscribe(&self) -> broadcast::Receiver<GraphEvent> {
        self.events.subscribe()
    }

    // === Queries ===

    pub fn predecessors_of(&self, id: &NodeId) -> Vec<NodeId> {
        chain::predecessors_of(&self.graph, id)
    }

    pub fn successors_of(&self, id: &NodeId) -> Vec<NodeId> {
        chain::successors_of(&self.graph, id)
    }

    pub fn full_chain(&self, id: &NodeId) -> Vec<NodeId> {
        chain::full_chain(&self.graph, id)
    }

    pub fn chain_view(&self, id: &NodeId) -> ChainView {
        chain::chain_view(&self.graph, id)
    }

    pub fn classify(&self, candidates: &[NodeId]) -> BranchSplit {
        chain::classify(&self.graph, candidates)
    }

    pub fn is_on_canonical_path(&self, id: &NodeId) -> bool {
        chain::is_on_canonical_path(&self.graph, id)
    }

    // === Mutations ===

    /// Rebuild the whole graph from the store and swap it in
    ///
    /// Expensive; meant for startup and explicit rebuild requests.
    pub async fn rebuild(&mut self) -> ServiceResult<GraphStats> {
        let documents = self.store.list().await?;
        let graph = build(&documents);
        let stats = graph.stats();
        self.graph = Arc::new(graph);
        self.emit(GraphEvent::Rebuilt {
            stats: stats.clone(),
        });
        Ok(stats)
    }

    /// Re-derive a document's node after its content or metadata changed
    ///
    /// Returns false when the store no longer has the document.
    pub async fn handle_change(&mut self, id: &NodeId) -> ServiceResult<bool> {
        if !self.refresh(id).await? {
            debug!(id = %id, "changed document no longer exists");
            return Ok(false);
        }
        self.graph_mut().prune_placeholders();
        self.emit(GraphEvent::NodeUpdated { id: id.clone() });
        Ok(true)
    }

    /// Add a newly created document
    ///
    /// Placeholders the new document satisfies are adopted: their referrers
    /// are re-derived so their edges point at the real node, and the orphaned
    /// placeholder is dropped.
    pub async fn handle_create(&mut self, id: &NodeId) -> ServiceResult<bool> {
        if !self.handle_change(id).await? {
            return Ok(false);
        }

        let Some(node) = self.graph.node(id) else {
            return Ok(true);
        };
        for placeholder in self.graph.placeholders_matching(id, &node.attrs) {
            for referrer in chain::successors_of(&self.graph, &placeholder) {
                if let Err(err) = self.refresh(&referrer).await {
                    warn!(referrer = %referrer, error = %err, "failed to re-derive referrer");
                }
            }
            self.graph_mut().prune_placeholders();
            if !self.graph.contains(&placeholder) {
                debug!(placeholder = %placeholder, document = %id, "adopted placeholder");
                self.emit(GraphEvent::PlaceholderAdopted {
                    placeholder,
                    document: id.clone(),
                });
            }
        }
        Ok(true)
    }

    /// Move a document to a new id, keeping every relation
    ///
    /// If the new id is already taken the rename is refused; the new
    /// document is then picked up as a creation and the old node is
    /// removed as a deletion without healing.
    pub async fn handle_rename(&mut self, old: &NodeId, new: &NodeId) -> ServiceResult<()> {
        match self.graph_mut().rename_node(old, new) {
            Ok(true) => {
                // Path-derived link keys and attributes may have changed.
                // The rename itself already happened, so a failed read only
                // leaves the old attributes in place.
                if let Err(err) = self.refresh(new).await {
                    warn!(
                        old = %old,
                        new = %new,
                        error = %err,
                        "failed to re-read renamed document"
                    );
                }
                self.emit(GraphEvent::NodeRenamed {
                    old: old.clone(),
                    new: new.clone(),
                });
            }
            Ok(false) => {
                self.handle_create(new).await?;
            }
            Err(err) => {
                self.handle_create(new).await?;
                self.graph_mut().remove_node(old);
                self.graph_mut().prune_placeholders();
                return Err(err.into());
            }
        }
        Ok(())
    }

    /// Heal around a deleted document, then remove it from the graph
    ///
    /// Successors are pointed at the deleted document's predecessor and
    /// re-derived. A successor whose rewrite failed keeps the deleted node
    /// alive as a placeholder until its next update.
    pub async fn handle_delete(&mut self, id: &NodeId) -> DeleteOutcome {
        let heal = heal_after_delete(&self.graph, self.store.as_ref(), id).await;

        for successor in &heal.rewired {
            match self.refresh(successor).await {
                Ok(true) => {}
                Ok(false) => warn!(successor = %successor, "rewired successor disappeared"),
                Err(err) => warn!(successor = %successor, error = %err, "failed to re-derive successor"),
            }
        }

        let removal = self.graph_mut().remove_node(id);
        if removal != Removal::Absent {
            self.graph_mut().prune_placeholders();
            info!(id = %id, removal = ?removal, "removed deleted document");
            self.emit(GraphEvent::NodeDeleted {
                id: id.clone(),
                rewired: heal.rewired.clone(),
                failed: heal.failed.iter().map(|(s, _)| s.clone()).collect(),
            });
        }
        DeleteOutcome { heal, removal }
    }

    /// Apply a notification, logging failures
    pub async fn apply(&mut self, notification: Notification) {
        let result = match &notification {
            Notification::Changed(id) => self.handle_change(id).await.map(drop),
            Notification::Created(id) => self.handle_create(id).await.map(drop),
            Notification::Renamed { old, new } => self.handle_rename(old, new).await,
            Notification::Deleted(id) => {
                self.handle_delete(id).await;
                Ok(())
            }
            Notification::Rebuild => self.rebuild().await.map(drop),
        };
        if let Err(err) = result {
            warn!(notification = ?notification, error = %err, "notification failed");
        }
    }

    /// Read a document and re-derive its node; false if it is gone
    async fn refresh(&mut self, id: &NodeId) -> ServiceResult<bool> {
        match self.store.read(id).await? {
            Some(doc) => {
                update_node(self.graph_mut(), &doc);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn graph_mut(&mut self) -> &mut ChainGraph {
        Arc::make_mut(&mut self.graph)
    }

    fn emit(&self, event: GraphEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// A document change reported by the surrounding application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Changed(NodeId),
    Created(NodeId),
    Renamed { old: NodeId, new: NodeId },
    Deleted(NodeId),
    Rebuild,
}

/// Work item for the queue worker
enum Command {
    Apply(Notification),
    Snapshot(oneshot::Sender<Arc<ChainGraph>>),
}

/// Handle to a service running on a background task
///
/// Notifications are processed strictly in order, one at a time. Graph
/// snapshots are handed out on request and queued behind every notification
/// sent before them. The worker keeps no snapshot of its own: while no reader
/// holds one, updates mutate the graph in place, and an update made while a
/// reader still holds a snapshot copies the graph once.
#[derive(Clone)]
pub struct ChainQueue {
    tx: mpsc::Sender<Command>,
    applied: watch::Receiver<u64>,
    events: broadcast::Sender<GraphEvent>,
}

impl ChainQueue {
    /// Start a worker owning `service`
    ///
    /// The worker stops once every queue handle is dropped and hands the
    /// service back through the join handle.
    pub fn spawn(mut service: ChainService, capacity: usize) -> (Self, JoinHandle<ChainService>) {
        let (tx, mut rx) = mpsc::channel::<Command>(capacity.max(1));
        let (applied_tx, applied_rx) = watch::channel(0u64);
        let events = service.events.clone();

        let worker = tokio::spawn(async move {
            let mut applied = 0u64;
            while let Some(command) = rx.recv().await {
                match command {
                    Command::Apply(notification) => {
                        debug!(notification = ?notification, "processing notification");
                        service.apply(notification).await;
                        applied += 1;
                        applied_tx.send_replace(applied);
                    }
                    Command::Snapshot(reply) => {
                        // The requester may have stopped waiting.
                        let _ = reply.send(service.snapshot());
                    }
                }
            }
            service
        });

        (
            Self {
                tx,
                applied: applied_rx,
                events,
            },
            worker,
        )
    }

    /// Queue a notification
    pub async fn notify(&self, notification: Notification) -> ServiceResult<()> {
        self.send(Command::Apply(notification)).await
    }

    /// The graph after every notification queued so far
    pub async fn graph(&self) -> ServiceResult<Arc<ChainGraph>> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Snapshot(reply)).await?;
        response.await.map_err(|_| ServiceError::QueueClosed)
    }

    /// Number of notifications the worker has finished
    pub fn applied(&self) -> u64 {
        *self.applied.borrow()
    }

    /// Wait until the worker finishes another notification
    ///
    /// Returns the new [`applied`](Self::applied) count.
    pub async fn changed(&mut self) -> ServiceResult<u64> {
        self.applied
            .changed()
            .await
            .map_err(|_| ServiceError::QueueClosed)?;
        Ok(*self.applied.borrow_and_update())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GraphEvent> {
        self.events.subscribe()
    }

    async fn send(&self, command: Command) -> ServiceResult<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| ServiceError::QueueClosed)
    }
}
