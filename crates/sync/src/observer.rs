//! Typed notifications for views layered on top of a session.

use listings_catalog::RowUpdated;

/// Something observable changed in a [`CatalogSession`](crate::CatalogSession).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// One cell was toggled; `row` is its new state.
    RowUpdated(RowUpdated),
    /// The number of queued changes changed.
    LedgerChanged { pending: usize },
    FilterChanged { hide_common: bool },
    /// A submission or reload started; the current matrix is about to be replaced.
    CatalogsChanging,
    /// Fresh data is loaded; every row is unqueued.
    CatalogsReloaded { products: usize, branches: usize },
    /// A submission failed; the ledger is unchanged.
    SubmissionFailed { error: String },
}

/// Receiver of [`SessionEvent`]s.
///
/// Observers are called synchronously, in registration order, after the
/// session's state has been updated. They receive a shared reference and
/// cannot mutate the session, so no observer can depend on another's effects.
pub trait SessionObserver: Send + Sync {
    fn notify(&self, event: &SessionEvent);
}

impl<F> SessionObserver for F
where
    F: Fn(&SessionEvent) + Send + Sync,
{
    fn notify(&self, event: &SessionEvent) {
        self(event)
    }
}
