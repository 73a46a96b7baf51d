//! Toggle controller: the single state transition an operator can trigger.

use tracing::{debug, error};

use listings_core::{BranchName, ChangeKey, ListingError, ListingResult, ProductId};

use crate::catalog::Catalog;
use crate::ledger::ChangeEntry;
use crate::matrix::BranchRow;

/// What a toggle did to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowChange {
    /// A new entry was queued.
    Queued(ChangeEntry),
    /// The pending entry was withdrawn.
    Unqueued(ChangeEntry),
}

/// Outcome of one toggle: the cell's identity and its new row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowUpdated {
    pub key: ChangeKey,
    pub row: BranchRow,
    pub change: RowChange,
}

impl Catalog {
    /// Queue or withdraw a listing change for one (product, branch) cell.
    ///
    /// Purely local: no backend call. The ledger is updated first and the
    /// product's rows are rebuilt only once that succeeded, so either both
    /// change or neither does.
    pub fn toggle(&mut self, product_id: &ProductId, branch: &BranchName) -> ListingResult<RowUpdated> {
        let product = self
            .matrix
            .product(product_id)
            .ok_or_else(|| ListingError::UnknownProduct(product_id.clone()))?;
        let row = product
            .row(branch)
            .cloned()
            .ok_or_else(|| ListingError::unknown_branch(product_id.clone(), branch.clone()))?;

        let key = product.change_key(branch);

        let (row, change) = if row.queued {
            let removed = self.ledger.remove(&key).map_err(invariant_broken)?;
            (BranchRow { queued: false, ..row }, RowChange::Unqueued(removed))
        } else {
            let entry = ChangeEntry::new(key.clone(), row.listed);
            self.ledger.add(entry.clone()).map_err(invariant_broken)?;
            (BranchRow { queued: true, ..row }, RowChange::Queued(entry))
        };

        let updated = product.with_row(row.clone());
        if !self.matrix.replace(updated) {
            error!(change = %key, "toggled product vanished from the matrix");
            debug_assert!(false, "toggled product {product_id} vanished from the matrix");
        }

        debug!(
            change = %key,
            queued = row.queued,
            listed = row.listed,
            pending = self.ledger.len(),
            "toggled listing"
        );

        Ok(RowUpdated { key, row, change })
    }
}

fn invariant_broken(err: ListingError) -> ListingError {
    error!(error = %err, "matrix and ledger disagree");
    debug_assert!(!err.is_invariant_violation(), "listing invariant violated: {err}");
    err
}
