//! Domain error model for the listing engine.

use thiserror::Error;

use crate::id::{BranchName, ChangeKey, ProductId};

/// Result type used across the listing domain.
pub type ListingResult<T> = Result<T, ListingError>;

/// Listing-level error.
///
/// Every variant here is a programmer or data error: the matrix and ledger are
/// never supposed to disagree. Operational failures (network, server
/// rejection) live in the sync layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ListingError {
    /// A toggle referenced a branch absent from the product's row set.
    #[error("product {product} has no row for branch {branch}")]
    UnknownBranch {
        product: ProductId,
        branch: BranchName,
    },

    /// A toggle referenced a product that is not in the matrix.
    #[error("unknown product: {0}")]
    UnknownProduct(ProductId),

    /// The ledger already holds an entry with this identity.
    #[error("duplicate change entry: {0}")]
    DuplicateEntry(ChangeKey),

    /// The ledger holds no entry with this identity.
    #[error("change entry not found: {0}")]
    NotFound(ChangeKey),

    /// The backend returned two branches with the same name.
    #[error("duplicate branch: {0}")]
    DuplicateBranch(BranchName),
}

impl ListingError {
    pub fn unknown_branch(product: ProductId, branch: BranchName) -> Self {
        Self::UnknownBranch { product, branch }
    }

    /// True when the error means the matrix/ledger invariant was broken.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::DuplicateEntry(_) | Self::NotFound(_))
    }
}
