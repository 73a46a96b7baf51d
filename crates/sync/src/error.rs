use std::time::Duration;

use listings_core::ListingError;

use crate::session::SubmissionReceipt;

/// Failure talking to the backend or applying what it returned.
///
/// Any error from a submission leaves the change ledger untouched, except
/// [`SyncError::ReloadAfterSubmit`]: the batch was applied and the queue is
/// gone, only the reload that follows failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    #[error("no products in the change queue")]
    EmptyQueue,
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("submission cancelled")]
    Cancelled,
    #[error("network error: {0}")]
    Network(String),
    #[error("API error ({0}): {1}")]
    Api(u16, String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("invalid branch name: {0:?}")]
    InvalidBranchName(String),
    #[error(transparent)]
    Listing(#[from] ListingError),
    #[error("batch {} applied but reload failed: {source}", .receipt.batch_id)]
    ReloadAfterSubmit {
        receipt: SubmissionReceipt,
        source: Box<SyncError>,
    },
}

impl SyncError {
    /// Transport-level failures worth an operator-initiated retry of the
    /// same submission.
    ///
    /// `ReloadAfterSubmit` is never one: resubmitting would have nothing to
    /// send. Reconcile instead.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SyncError::Timeout(_) | SyncError::Cancelled | SyncError::Network(_) | SyncError::Api(..)
        )
    }

    /// The receipt of a batch the backend accepted, if this error came after it.
    pub fn applied_receipt(&self) -> Option<&SubmissionReceipt> {
        match self {
            SyncError::ReloadAfterSubmit { receipt, .. } => Some(receipt),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SyncError::Parse(err.to_string())
        } else {
            SyncError::Network(err.to_string())
        }
    }
}
