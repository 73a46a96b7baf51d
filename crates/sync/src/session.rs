//! Catalog session: one operator's catalog plus the backend it syncs with.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Notify;
use tracing::{info, warn};
use uuid::Uuid;

use listings_catalog::{Catalog, RowUpdated};
use listings_core::{BranchName, ListingResult, ProductId};

use crate::backend::{CatalogBackend, ChangeBatch};
use crate::config::{ClientConfig, DEFAULT_SUBMIT_TIMEOUT};
use crate::error::SyncError;
use crate::observer::{SessionEvent, SessionObserver};

/// Acknowledgement of an applied batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub batch_id: Uuid,
    pub entries: usize,
    pub submitted_at: DateTime<Utc>,
}

/// Handle for cancelling a submission that is currently in flight.
///
/// Cancelling when nothing is in flight does nothing.
#[derive(Debug, Clone)]
pub struct SubmitCanceller {
    notify: Arc<Notify>,
}

impl SubmitCanceller {
    pub fn cancel(&self) {
        self.notify.notify_waiters();
    }
}

/// The context object for one operator session.
///
/// Constructed once at startup and passed to whatever drives it. Every
/// mutation takes `&mut self`, so toggles, submissions and reloads are
/// strictly serialized.
pub struct CatalogSession<B> {
    backend: B,
    catalog: Catalog,
    observers: Vec<Arc<dyn SessionObserver>>,
    submit_timeout: Duration,
    cancel: Arc<Notify>,
}

impl<B: CatalogBackend> CatalogSession<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            catalog: Catalog::new(),
            observers: Vec::new(),
            submit_timeout: DEFAULT_SUBMIT_TIMEOUT,
            cancel: Arc::new(Notify::new()),
        }
    }

    pub fn with_config(backend: B, config: &ClientConfig) -> Self {
        Self::new(backend).with_submit_timeout(config.submit_timeout)
    }

    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout = timeout;
        self
    }

    pub fn subscribe(&mut self, observer: Arc<dyn SessionObserver>) {
        self.observers.push(observer);
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn canceller(&self) -> SubmitCanceller {
        SubmitCanceller {
            notify: self.cancel.clone(),
        }
    }

    fn emit(&self, event: SessionEvent) {
        for observer in &self.observers {
            observer.notify(&event);
        }
    }

    /// Toggle one cell locally and notify observers.
    pub fn toggle(&mut self, product: &ProductId, branch: &BranchName) -> ListingResult<RowUpdated> {
        let update = self.catalog.toggle(product, branch)?;
        self.emit(SessionEvent::RowUpdated(update.clone()));
        self.emit(SessionEvent::LedgerChanged {
            pending: self.catalog.ledger().len(),
        });
        Ok(update)
    }

    pub fn toggle_hide_common(&mut self) -> bool {
        let hide_common = self.catalog.toggle_hide_common();
        self.emit(SessionEvent::FilterChanged { hide_common });
        hide_common
    }

    /// Initial load; identical to a reconciliation with an empty ledger.
    pub async fn load(&mut self) -> Result<(), SyncError> {
        self.reconcile().await
    }

    /// Send the whole ledger as one batch.
    ///
    /// The ledger is never modified here: on success the caller decides when
    /// to reconcile, on failure every queued change is still there to retry.
    pub async fn submit(&mut self) -> Result<SubmissionReceipt, SyncError> {
        if self.catalog.ledger().is_empty() {
            return Err(SyncError::EmptyQueue);
        }

        // Registered before the request starts, so a cancel issued at any
        // point from here on is seen.
        let cancel = self.cancel.clone();
        let cancelled = cancel.notified();
        tokio::pin!(cancelled);
        cancelled.as_mut().enable();

        let batch = ChangeBatch::new(self.catalog.ledger().batch());
        info!(batch = %batch.id, entries = batch.entries.len(), "submitting change batch");

        let outcome = tokio::select! {
            biased;
            _ = &mut cancelled => Err(SyncError::Cancelled),
            res = tokio::time::timeout(self.submit_timeout, self.backend.submit_changes(&batch)) => {
                res.unwrap_or(Err(SyncError::Timeout(self.submit_timeout)))
            }
        };

        match outcome {
            Ok(()) => {
                info!(batch = %batch.id, "change batch accepted");
                Ok(SubmissionReceipt {
                    batch_id: batch.id,
                    entries: batch.entries.len(),
                    submitted_at: Utc::now(),
                })
            }
            Err(err) => {
                warn!(
                    batch = %batch.id,
                    error = %err,
                    pending = self.catalog.ledger().len(),
                    "change batch failed; queue kept"
                );
                self.emit(SessionEvent::SubmissionFailed {
                    error: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Submit, then reconcile. Reconciliation only runs if the backend
    /// accepted the batch.
    ///
    /// Errors come in two kinds:
    /// - a submission failure: nothing was applied and the ledger is intact
    /// - [`SyncError::ReloadAfterSubmit`]: the batch was applied and the
    ///   queue cleared, but reloading failed; it carries the receipt, and
    ///   [`CatalogSession::reconcile`] is the way to catch up
    pub async fn submit_and_reconcile(&mut self) -> Result<SubmissionReceipt, SyncError> {
        if self.catalog.ledger().is_empty() {
            return Err(SyncError::EmptyQueue);
        }
        self.emit(SessionEvent::CatalogsChanging);
        let receipt = self.submit().await?;
        self.discard_queue();

        match self.refresh().await {
            Ok(()) => Ok(receipt),
            Err(source) => {
                warn!(
                    batch = %receipt.batch_id,
                    error = %source,
                    "batch applied but reload failed"
                );
                Err(SyncError::ReloadAfterSubmit {
                    receipt,
                    source: Box::new(source),
                })
            }
        }
    }

    /// Discard queued state and reload products and branches.
    pub async fn reconcile(&mut self) -> Result<(), SyncError> {
        self.emit(SessionEvent::CatalogsChanging);
        self.discard_queue();
        self.refresh().await
    }

    /// Create a branch on the backend, then reconcile.
    pub async fn create_branch(&mut self, name: &str) -> Result<(), SyncError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SyncError::InvalidBranchName(name.to_string()));
        }

        self.emit(SessionEvent::CatalogsChanging);
        self.backend.create_branch(name).await?;
        info!(branch = name, "branch created");
        self.discard_queue();
        self.refresh().await
    }

    fn discard_queue(&mut self) {
        if !self.catalog.ledger().is_empty() {
            self.catalog.clear_queue();
            self.emit(SessionEvent::LedgerChanged { pending: 0 });
        }
    }

    async fn refresh(&mut self) -> Result<(), SyncError> {
        let products = self.backend.fetch_products().await?;
        let branches = self.backend.fetch_branches().await?;
        self.catalog.reload(products, branches)?;

        self.emit(SessionEvent::CatalogsReloaded {
            products: self.catalog.matrix().len(),
            branches: self.catalog.registry().len(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use listings_catalog::{Branch, ProductRecord, RowChange};
    use listings_core::ListingError;

    use crate::memory::InMemoryBackend;

    #[derive(Default)]
    struct EventLog(Mutex<Vec<SessionEvent>>);

    impl SessionObserver for EventLog {
        fn notify(&self, event: &SessionEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    impl EventLog {
        fn take(&self) -> Vec<SessionEvent> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }
    }

    fn pid(s: &str) -> ProductId {
        ProductId::from(s)
    }

    fn branch(s: &str) -> BranchName {
        BranchName::from(s)
    }

    async fn session() -> (CatalogSession<Arc<InMemoryBackend>>, Arc<EventLog>) {
        let backend = Arc::new(InMemoryBackend::new(
            vec![ProductRecord::new("1", false)],
            vec![Branch::new("A", [pid("1")]), Branch::new("B", [])],
        ));
        let log = Arc::new(EventLog::default());
        let mut session = CatalogSession::new(backend);
        session.subscribe(log.clone());
        session.load().await.unwrap();
        log.take();
        (session, log)
    }

    fn row_b(session: &CatalogSession<Arc<InMemoryBackend>>) -> (bool, bool) {
        let row = session
            .catalog()
            .matrix()
            .product(&pid("1"))
            .and_then(|p| p.row(&branch("B")))
            .cloned()
            .unwrap();
        (row.listed, row.queued)
    }

    #[tokio::test]
    async fn load_builds_scenario_matrix() {
        let (session, _) = session().await;
        assert_eq!(row_b(&session), (false, false));
        assert_eq!(session.catalog().visible_products().count(), 1);
    }

    #[tokio::test]
    async fn toggle_emits_row_and_ledger_events() {
        let (mut session, log) = session().await;

        session.toggle(&pid("1"), &branch("B")).unwrap();

        let events = log.take();
        assert_eq!(events.len(), 2);
        match &events[0] {
            SessionEvent::RowUpdated(update) => {
                assert!(update.row.queued);
                assert!(matches!(update.change, RowChange::Queued(_)));
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(events[1], SessionEvent::LedgerChanged { pending: 1 });
    }

    #[tokio::test]
    async fn toggle_errors_emit_nothing() {
        let (mut session, log) = session().await;
        let err = session.toggle(&pid("1"), &branch("Z")).unwrap_err();
        assert!(matches!(err, ListingError::UnknownBranch { .. }));
        assert!(log.take().is_empty());
    }

    #[tokio::test]
    async fn submit_and_reconcile_applies_and_clears() {
        let (mut session, log) = session().await;
        session.toggle(&pid("1"), &branch("B")).unwrap();
        log.take();

        let receipt = session.submit_and_reconcile().await.unwrap();

        assert_eq!(receipt.entries, 1);
        assert_eq!(session.backend().applied_batches(), vec![receipt.batch_id]);
        assert!(session.catalog().ledger().is_empty());
        assert_eq!(row_b(&session), (true, false));
        assert_eq!(
            log.take(),
            vec![
                SessionEvent::CatalogsChanging,
                SessionEvent::LedgerChanged { pending: 0 },
                SessionEvent::CatalogsReloaded { products: 1, branches: 2 },
            ]
        );
    }

    #[tokio::test]
    async fn reconcile_resets_queued_even_when_listings_unchanged() {
        let (mut session, _) = session().await;
        session.toggle(&pid("1"), &branch("A")).unwrap();
        session.toggle(&pid("1"), &branch("B")).unwrap();

        session.reconcile().await.unwrap();

        assert!(session.catalog().ledger().is_empty());
        assert!(session.catalog().matrix().queued_keys().is_empty());
        assert_eq!(row_b(&session), (false, false));
    }

    #[tokio::test]
    async fn failed_submission_keeps_ledger_and_skips_reload() {
        let (mut session, log) = session().await;
        session.toggle(&pid("1"), &branch("B")).unwrap();
        session.backend().fail_next_submit(SyncError::Api(500, "nope".into()));
        log.take();

        let err = session.submit_and_reconcile().await.unwrap_err();

        assert_eq!(err, SyncError::Api(500, "nope".into()));
        assert_eq!(session.catalog().ledger().len(), 1);
        assert_eq!(row_b(&session), (false, true));
        let events = log.take();
        assert!(matches!(events.last(), Some(SessionEvent::SubmissionFailed { .. })));
        assert!(!events.iter().any(|e| matches!(e, SessionEvent::CatalogsReloaded { .. })));

        // Retry is the caller's call, and succeeds with the same queue.
        session.submit_and_reconcile().await.unwrap();
        assert_eq!(row_b(&session), (true, false));
    }

    #[tokio::test]
    async fn reload_failure_after_applied_batch_is_told_apart() {
        let (mut session, log) = session().await;
        session.toggle(&pid("1"), &branch("B")).unwrap();
        session.backend().fail_next_fetch(SyncError::Network("down".into()));
        log.take();

        let err = session.submit_and_reconcile().await.unwrap_err();

        let receipt = err.applied_receipt().cloned().unwrap();
        assert_eq!(session.backend().applied_batches(), vec![receipt.batch_id]);
        assert_eq!(
            err,
            SyncError::ReloadAfterSubmit {
                receipt,
                source: Box::new(SyncError::Network("down".into())),
            }
        );
        assert!(!err.is_recoverable());

        assert!(session.catalog().ledger().is_empty());
        assert!(session.catalog().matrix().queued_keys().is_empty());
        assert_eq!(row_b(&session), (false, false));
        let events = log.take();
        assert!(!events.iter().any(|e| matches!(e, SessionEvent::CatalogsReloaded { .. })));
        assert!(!events.iter().any(|e| matches!(e, SessionEvent::SubmissionFailed { .. })));

        // Reconciling catches up without sending anything again.
        session.reconcile().await.unwrap();
        assert_eq!(row_b(&session), (true, false));
        assert_eq!(session.backend().applied_batches().len(), 1);
    }

    #[tokio::test]
    async fn reconcile_fetch_failure_keeps_cleared_catalog() {
        let (mut session, log) = session().await;
        session.toggle(&pid("1"), &branch("B")).unwrap();
        session.backend().fail_next_fetch(SyncError::Api(503, "busy".into()));
        log.take();

        let err = session.reconcile().await.unwrap_err();

        assert_eq!(err, SyncError::Api(503, "busy".into()));
        assert!(session.catalog().ledger().is_empty());
        assert!(session.catalog().matrix().queued_keys().is_empty());
        assert_eq!(
            log.take(),
            vec![SessionEvent::CatalogsChanging, SessionEvent::LedgerChanged { pending: 0 }]
        );
    }

    #[tokio::test]
    async fn empty_queue_is_not_submitted() {
        let (mut session, _) = session().await;
        assert_eq!(session.submit().await.unwrap_err(), SyncError::EmptyQueue);
        assert!(session.backend().applied_batches().is_empty());
    }

    #[tokio::test]
    async fn slow_submission_times_out_with_ledger_intact() {
        let (session, _) = session().await;
        let mut session = session.with_submit_timeout(Duration::from_millis(50));
        session.toggle(&pid("1"), &branch("B")).unwrap();
        session.backend().set_submit_delay(Some(Duration::from_secs(5)));

        let err = session.submit().await.unwrap_err();

        assert_eq!(err, SyncError::Timeout(Duration::from_millis(50)));
        assert_eq!(session.catalog().ledger().len(), 1);
        assert!(session.backend().applied_batches().is_empty());
    }

    #[tokio::test]
    async fn in_flight_submission_can_be_cancelled() {
        let (mut session, _) = session().await;
        session.toggle(&pid("1"), &branch("B")).unwrap();
        session.backend().set_submit_delay(Some(Duration::from_secs(5)));
        let canceller = session.canceller();

        let (res, ()) = tokio::join!(session.submit(), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        assert_eq!(res.unwrap_err(), SyncError::Cancelled);
        assert_eq!(session.catalog().ledger().len(), 1);
    }

    /// Cancels from inside the request, before the backend ever yields.
    struct CancelOnSubmit {
        inner: InMemoryBackend,
        canceller: Mutex<Option<SubmitCanceller>>,
    }

    #[async_trait::async_trait]
    impl CatalogBackend for CancelOnSubmit {
        async fn fetch_products(&self) -> Result<Vec<ProductRecord>, SyncError> {
            self.inner.fetch_products().await
        }

        async fn fetch_branches(&self) -> Result<Vec<Branch>, SyncError> {
            self.inner.fetch_branches().await
        }

        async fn submit_changes(&self, batch: &ChangeBatch) -> Result<(), SyncError> {
            let canceller = self.canceller.lock().unwrap().clone();
            if let Some(canceller) = canceller {
                canceller.cancel();
            }
            tokio::time::sleep(Duration::from_secs(5)).await;
            self.inner.submit_changes(batch).await
        }

        async fn create_branch(&self, name: &str) -> Result<(), SyncError> {
            self.inner.create_branch(name).await
        }
    }

    #[tokio::test]
    async fn cancel_before_first_poll_is_not_lost() {
        let backend = Arc::new(CancelOnSubmit {
            inner: InMemoryBackend::new(
                vec![ProductRecord::new("1", false)],
                vec![Branch::new("A", [pid("1")]), Branch::new("B", [])],
            ),
            canceller: Mutex::new(None),
        });
        let mut session = CatalogSession::new(backend.clone()).with_submit_timeout(Duration::from_secs(2));
        session.load().await.unwrap();
        *backend.canceller.lock().unwrap() = Some(session.canceller());
        session.toggle(&pid("1"), &branch("B")).unwrap();

        let err = session.submit().await.unwrap_err();

        assert_eq!(err, SyncError::Cancelled);
        assert_eq!(session.catalog().ledger().len(), 1);
        assert!(backend.inner.applied_batches().is_empty());
    }

    #[tokio::test]
    async fn cancel_without_submission_is_a_no_op() {
        let (mut session, _) = session().await;
        session.canceller().cancel();
        session.toggle(&pid("1"), &branch("B")).unwrap();
        session.submit().await.unwrap();
    }

    #[tokio::test]
    async fn create_branch_reloads_registry() {
        let (mut session, _) = session().await;
        session.create_branch("  C ").await.unwrap();

        let names = session.catalog().registry().names();
        assert_eq!(names.last(), Some(&branch("C")));
        let product = session.catalog().matrix().product(&pid("1")).unwrap();
        assert_eq!(product.branch_rows().len(), 3);
    }

    #[tokio::test]
    async fn blank_branch_name_is_rejected_locally() {
        let (mut session, _) = session().await;
        let err = session.create_branch("   ").await.unwrap_err();
        assert!(matches!(err, SyncError::InvalidBranchName(_)));
        assert_eq!(session.catalog().registry().len(), 2);
    }

    #[tokio::test]
    async fn filter_toggle_is_observed() {
        let (mut session, log) = session().await;
        assert!(!session.toggle_hide_common());
        assert_eq!(log.take(), vec![SessionEvent::FilterChanged { hide_common: false }]);
    }

    #[tokio::test]
    async fn closures_can_observe() {
        let (mut session, _) = session().await;
        let seen = Arc::new(Mutex::new(0usize));
        let counter = seen.clone();
        session.subscribe(Arc::new(move |_: &SessionEvent| {
            *counter.lock().unwrap() += 1;
        }));

        session.toggle(&pid("1"), &branch("B")).unwrap();
        assert_eq!(*seen.lock().unwrap(), 2);
    }
}
