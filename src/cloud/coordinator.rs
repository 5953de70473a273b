use std::time::Duration;

use tracing::{debug, info};

use super::predicate::QueryPredicate;
use super::provider::DocumentProvider;
use super::session::CloudQuerySession;
use crate::model::document::{CloudQueryResult, DocRef, DocumentChanges};

/// Called once, when the first query results arrive
pub type FirstQueryHandler = Box<dyn FnOnce()>;

/// Receives `(added, removed, updated)` for every meaningful change
pub type ChangeListener = Box<dyn FnMut(&[DocRef], &[DocRef], &[DocRef])>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    NotStarted,
    AwaitingFirstResults,
    Live,
}

/// Handle returned by `add_listener`, used to remove it again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Tracks which task documents exist in a namespace and tells listeners
/// what changed.
///
/// Must be driven from one thread: call `process_pending` (or
/// `wait_and_process`) from the owning loop to pull queued batches in.
pub struct TaskCoordinator {
    state: CoordinatorState,
    session: CloudQuerySession,
    first_query_handler: Option<FirstQueryHandler>,
    listeners: Vec<(ListenerId, ChangeListener)>,
    next_listener_id: u64,
    documents: Vec<DocRef>,
    coalesce_batches: bool,
}

impl TaskCoordinator {
    /// Create a coordinator and start its query right away.
    pub fn new(
        predicate: QueryPredicate,
        provider: Box<dyn DocumentProvider>,
        first_query_handler: impl FnOnce() + 'static,
    ) -> Self {
        let mut coordinator = TaskCoordinator {
            state: CoordinatorState::NotStarted,
            session: CloudQuerySession::new(predicate, provider),
            first_query_handler: Some(Box::new(first_query_handler)),
            listeners: Vec::new(),
            next_listener_id: 0,
            documents: Vec::new(),
            coalesce_batches: true,
        };
        coordinator.start();
        coordinator
    }

    /// Track every document with the given extension
    pub fn with_path_extension(
        extension: &str,
        provider: Box<dyn DocumentProvider>,
        first_query_handler: impl FnOnce() + 'static,
    ) -> Self {
        Self::new(
            QueryPredicate::path_extension(extension),
            provider,
            first_query_handler,
        )
    }

    /// Track the single document with exactly this file name
    pub fn with_last_path_component(
        name: &str,
        provider: Box<dyn DocumentProvider>,
        first_query_handler: impl FnOnce() + 'static,
    ) -> Self {
        Self::new(
            QueryPredicate::last_path_component(name),
            provider,
            first_query_handler,
        )
    }

    /// When enabled, several queued batches drained together produce a
    /// single notification against the newest listing.
    pub fn set_coalesce_batches(&mut self, coalesce: bool) {
        self.coalesce_batches = coalesce;
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    pub fn predicate(&self) -> &QueryPredicate {
        self.session.predicate()
    }

    /// Documents known as of the last processed batch. Late listeners use
    /// this as their baseline; they are never backfilled.
    pub fn documents(&self) -> &[DocRef] {
        &self.documents
    }

    pub fn add_listener(
        &mut self,
        listener: impl FnMut(&[DocRef], &[DocRef], &[DocRef]) + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if the listener was already gone
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Start (or restart) the query. Does nothing unless `NotStarted`.
    pub fn start(&mut self) {
        if self.state != CoordinatorState::NotStarted {
            return;
        }
        self.session.start();
        self.state = CoordinatorState::AwaitingFirstResults;
    }

    /// Stop the query. Batches not yet processed are dropped unseen.
    pub fn stop(&mut self) {
        if self.state == CoordinatorState::NotStarted {
            return;
        }
        self.session.stop();
        self.state = CoordinatorState::NotStarted;
        info!("coordinator stopped");
    }

    /// Drain queued batches in delivery order. Returns how many were consumed.
    pub fn process_pending(&mut self) -> usize {
        let results = self.session.poll();
        let consumed = results.len();
        if self.coalesce_batches {
            if let Some(newest) = results.into_iter().last() {
                self.handle_result(newest);
            }
        } else {
            for result in results {
                self.handle_result(result);
            }
        }
        consumed
    }

    /// Block up to `timeout` for the next batch, then drain anything else
    /// queued behind it. Returns false if nothing arrived.
    pub fn wait_and_process(&mut self, timeout: Duration) -> bool {
        if self.state == CoordinatorState::NotStarted {
            return false;
        }
        let Some(first) = self.session.wait_timeout(timeout) else {
            return false;
        };
        let mut results = vec![first];
        results.extend(self.session.poll());
        if self.coalesce_batches {
            if let Some(newest) = results.pop() {
                self.handle_result(newest);
            }
        } else {
            for result in results {
                self.handle_result(result);
            }
        }
        true
    }

    /// Apply one query result: advance the state machine, then notify
    /// listeners of whatever differs from the retained listing.
    pub fn handle_result(&mut self, result: CloudQueryResult) {
        match self.state {
            CoordinatorState::NotStarted => {
                debug!("ignoring query result while stopped");
                return;
            }
            CoordinatorState::AwaitingFirstResults => {
                self.state = CoordinatorState::Live;
                info!("first query results: {} documents", result.documents.len());
                if let Some(handler) = self.first_query_handler.take() {
                    handler();
                }
            }
            CoordinatorState::Live => {}
        }

        let changes = DocumentChanges::between(&self.documents, &result.documents);
        self.documents = result.documents;
        if changes.is_empty() {
            return;
        }
        debug!(
            "notifying {} listeners: +{} -{} ~{}",
            self.listeners.len(),
            changes.added.len(),
            changes.removed.len(),
            changes.updated.len()
        );
        for (_, listener) in &mut self.listeners {
            listener(&changes.added, &changes.removed, &changes.updated);
        }
    }
}
