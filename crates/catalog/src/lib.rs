//! Listing engine (products × branches).
//!
//! This crate contains the change-queue reconciliation engine, implemented
//! purely as deterministic in-memory logic (no IO, no HTTP, no async):
//!
//! - [`BranchRegistry`]: known branches and the products listed on each
//! - [`ListingMatrix`]: per-product rows of (listed, queued) in branch order
//! - [`ChangeLedger`]: pending toggles keyed by [`ChangeKey`](listings_core::ChangeKey)
//! - [`Catalog::toggle`]: the state machine keeping matrix and ledger in step
//! - [`is_visible`]: the hide-common display policy
//! - [`Catalog::reload`]: the local half of a reconciliation cycle

pub mod catalog;
pub mod filter;
pub mod ledger;
pub mod matrix;
pub mod registry;
pub mod toggle;

pub use catalog::Catalog;
pub use filter::{is_visible, FilterCriteria};
pub use ledger::{ChangeEntry, ChangeLedger};
pub use matrix::{BranchRow, ListingMatrix, Product, ProductRecord};
pub use registry::{Branch, BranchRegistry};
pub use toggle::{RowChange, RowUpdated};
