use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::predicate::QueryPredicate;
use super::provider::{BatchSink, DocumentProvider, ProviderBatch};
use crate::model::document::{CloudQueryResult, DocRef, QueryPhase};

/// One long-lived query against a namespace.
///
/// Providers deliver from their own threads; batches queue on a channel and
/// are handed out FIFO by `poll`/`wait_timeout` on the owning thread. Every
/// batch becomes a result, even when nothing changed.
pub struct CloudQuerySession {
    predicate: QueryPredicate,
    provider: Box<dyn DocumentProvider>,
    rx: Option<mpsc::Receiver<ProviderBatch>>,
    // Held while running so waits block even after the provider hangs up
    tx: Option<mpsc::Sender<ProviderBatch>>,
    last_listing: Vec<DocRef>,
    gathered: bool,
}

impl CloudQuerySession {
    /// Create a stopped session; call `start` to begin querying.
    pub fn new(predicate: QueryPredicate, provider: Box<dyn DocumentProvider>) -> Self {
        CloudQuerySession {
            predicate,
            provider,
            rx: None,
            tx: None,
            last_listing: Vec::new(),
            gathered: false,
        }
    }

    /// Start querying. An unreachable namespace yields one empty initial
    /// result. Starting a running session does nothing.
    pub fn start(&mut self) {
        if self.rx.is_some() {
            return;
        }
        let (tx, rx) = mpsc::channel();
        if let Err(e) = self.provider.start(BatchSink::new(tx.clone())) {
            warn!("{}; continuing with no documents", e);
            // A provider can fail after delivering part of its work
            self.provider.stop();
            let discarded = rx.try_iter().count();
            if discarded > 0 {
                debug!("discarded {} batches from failed start", discarded);
            }
            let _ = tx.send(ProviderBatch::Gathered(Vec::new()));
        }
        info!("query started for {:?}", self.predicate);
        self.rx = Some(rx);
        self.tx = Some(tx);
        self.last_listing.clear();
        self.gathered = false;
    }

    pub fn predicate(&self) -> &QueryPredicate {
        &self.predicate
    }

    pub fn is_running(&self) -> bool {
        self.rx.is_some()
    }

    /// Non-blocking: every queued batch as a result, in delivery order.
    pub fn poll(&mut self) -> Vec<CloudQueryResult> {
        let Some(rx) = &self.rx else {
            return Vec::new();
        };
        let batches: Vec<ProviderBatch> = rx.try_iter().collect();
        batches.into_iter().map(|b| self.process(b)).collect()
    }

    /// Block until the next batch arrives or `timeout` elapses.
    /// Returns `None` on timeout or after `stop`.
    pub fn wait_timeout(&mut self, timeout: Duration) -> Option<CloudQueryResult> {
        let rx = self.rx.as_ref()?;
        match rx.recv_timeout(timeout) {
            Ok(batch) => Some(self.process(batch)),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                debug!("provider hung up");
                None
            }
        }
    }

    /// Stop the provider and drop any batches not yet handed out.
    pub fn stop(&mut self) {
        self.tx = None;
        if self.rx.take().is_some() {
            self.provider.stop();
            info!("query stopped for {:?}", self.predicate);
        }
    }

    fn process(&mut self, batch: ProviderBatch) -> CloudQueryResult {
        let listing = match batch {
            ProviderBatch::Gathered(docs) | ProviderBatch::Updated(docs) => docs,
        };
        let phase = if self.gathered {
            QueryPhase::Update
        } else {
            self.gathered = true;
            QueryPhase::Initial
        };
        let matching: Vec<DocRef> = listing
            .into_iter()
            .filter(|d| self.predicate.matches(&d.path))
            .collect();
        let result = CloudQueryResult::diff(phase, &self.last_listing, matching);
        debug!(
            "batch: {} documents, +{} -{} ~{}",
            result.documents.len(),
            result.added.len(),
            result.removed.len(),
            result.updated.len()
        );
        self.last_listing = result.documents.clone();
        result
    }
}

impl Drop for CloudQuerySession {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::QueryError;
    use crate::cloud::provider::MemoryProvider;
    use std::time::Instant;
    use crate::model::document::DocumentRevision;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn doc(name: &str) -> DocRef {
        let modified = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
        DocRef::new(format!("/cloud/{}", name), DocumentRevision { modified, size: 1 })
    }

    fn started(predicate: QueryPredicate, provider: MemoryProvider) -> CloudQuerySession {
        let mut session = CloudQuerySession::new(predicate, Box::new(provider));
        session.start();
        session
    }

    fn names(docs: &[DocRef]) -> Vec<&str> {
        docs.iter().map(|d| d.name.as_str()).collect()
    }

    #[test]
    fn first_batch_is_initial_and_filtered() {
        let (provider, _handle) = MemoryProvider::new(vec![doc("a.task"), doc("notes.txt")]);
        let mut session = started(QueryPredicate::path_extension("task"), provider);

        let results = session.poll();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].phase, QueryPhase::Initial);
        assert_eq!(names(&results[0].documents), vec!["a.task"]);
        assert_eq!(names(&results[0].added), vec!["a.task"]);
    }

    #[test]
    fn batches_are_delivered_in_order_without_debounce() {
        let (provider, handle) = MemoryProvider::new(vec![doc("a.task")]);
        let mut session = started(QueryPredicate::path_extension("task"), provider);
        handle.publish(vec![doc("a.task"), doc("b.task")]);
        handle.republish();
        handle.publish(vec![doc("b.task")]);

        let results = session.poll();
        assert_eq!(results.len(), 4);
        assert_eq!(names(&results[1].added), vec!["b.task"]);
        assert!(results[2].is_unchanged());
        assert_eq!(results[2].phase, QueryPhase::Update);
        assert_eq!(names(&results[3].removed), vec!["a.task"]);
        assert!(session.poll().is_empty());
    }

    #[test]
    fn exact_name_predicate() {
        let (provider, _handle) = MemoryProvider::new(vec![doc("Today.task"), doc("Other.task")]);
        let mut session = started(QueryPredicate::last_path_component("Today.task"), provider);
        let results = session.poll();
        assert_eq!(names(&results[0].documents), vec!["Today.task"]);
    }

    #[test]
    fn unavailable_namespace_yields_empty_initial_result() {
        let (provider, _handle) = MemoryProvider::unavailable();
        let mut session = started(QueryPredicate::path_extension("task"), provider);
        let result = session.wait_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(result.phase, QueryPhase::Initial);
        assert!(result.documents.is_empty());
        assert!(session.wait_timeout(Duration::from_millis(10)).is_none());
    }

    #[test]
    fn offline_wait_still_honors_timeout() {
        let (provider, _handle) = MemoryProvider::unavailable();
        let mut session = started(QueryPredicate::path_extension("task"), provider);
        assert!(session.wait_timeout(Duration::from_secs(1)).is_some());

        let timeout = Duration::from_millis(50);
        let begun = Instant::now();
        assert!(session.wait_timeout(timeout).is_none());
        assert!(begun.elapsed() >= timeout);
    }

    /// Delivers a full gather, then fails
    struct FailsAfterGather;

    impl DocumentProvider for FailsAfterGather {
        fn start(&mut self, sink: BatchSink) -> Result<(), QueryError> {
            sink.send(ProviderBatch::Gathered(vec![doc("a.task")]));
            Err(QueryError::Unavailable("watch failed".to_string()))
        }

        fn stop(&mut self) {}
    }

    #[test]
    fn failed_start_yields_only_the_empty_initial_result() {
        let mut session = CloudQuerySession::new(
            QueryPredicate::path_extension("task"),
            Box::new(FailsAfterGather),
        );
        session.start();

        let results = session.poll();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].phase, QueryPhase::Initial);
        assert!(results[0].documents.is_empty());
        assert!(results[0].removed.is_empty());
    }

    #[test]
    fn stop_discards_queued_batches() {
        let (provider, handle) = MemoryProvider::new(vec![doc("a.task")]);
        let mut session = started(QueryPredicate::path_extension("task"), provider);
        handle.publish(vec![]);
        session.stop();
        assert!(!session.is_running());
        assert!(!handle.is_running());
        assert!(session.poll().is_empty());
    }
}
