//! The catalog: registry, matrix, ledger and filter held together.

use std::collections::HashSet;

use tracing::info;

use listings_core::{ChangeKey, ListingResult};

use crate::filter::{is_visible, FilterCriteria};
use crate::ledger::ChangeLedger;
use crate::matrix::{ListingMatrix, Product, ProductRecord};
use crate::registry::{Branch, BranchRegistry};

/// Owner of all listing state for one operator session.
///
/// Only [`Catalog::toggle`] and [`Catalog::reload`] write the matrix and the
/// ledger; both take `&mut self`.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub(crate) registry: BranchRegistry,
    pub(crate) matrix: ListingMatrix,
    pub(crate) ledger: ChangeLedger,
    filter: FilterCriteria,
}

impl Catalog {
    /// An empty catalog with default filter criteria.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from freshly loaded backend data.
    pub fn load(records: Vec<ProductRecord>, branches: Vec<Branch>) -> ListingResult<Self> {
        let mut catalog = Self::new();
        catalog.reload(records, branches)?;
        Ok(catalog)
    }

    /// Discard queued state and rebuild from authoritative data.
    ///
    /// The filter criteria survive. On error (duplicate branch names) the
    /// catalog is left exactly as it was.
    pub fn reload(&mut self, records: Vec<ProductRecord>, branches: Vec<Branch>) -> ListingResult<()> {
        let registry = BranchRegistry::new(branches)?;
        let matrix = ListingMatrix::build(records, &registry);

        let discarded = self.ledger.len();
        self.ledger.clear();
        self.registry = registry;
        self.matrix = matrix;

        info!(
            products = self.matrix.len(),
            branches = self.registry.len(),
            discarded,
            "catalog reloaded"
        );
        Ok(())
    }

    /// Drop every pending change and reset all `queued` flags.
    ///
    /// Used once the backend has accepted a batch: the listings themselves
    /// stay as last loaded until the next [`Catalog::reload`].
    pub fn clear_queue(&mut self) {
        if self.ledger.is_empty() {
            return;
        }
        self.ledger.clear();
        self.matrix.reset_queued();
    }

    pub fn registry(&self) -> &BranchRegistry {
        &self.registry
    }

    pub fn matrix(&self) -> &ListingMatrix {
        &self.matrix
    }

    pub fn ledger(&self) -> &ChangeLedger {
        &self.ledger
    }

    pub fn filter(&self) -> FilterCriteria {
        self.filter
    }

    /// Flip the hide-common flag, returning the new value.
    pub fn toggle_hide_common(&mut self) -> bool {
        self.filter.toggle_hide_common()
    }

    /// Products passing the current filter, in matrix order.
    pub fn visible_products(&self) -> impl Iterator<Item = &Product> {
        let criteria = self.filter;
        self.matrix
            .products()
            .iter()
            .filter(move |p| is_visible(p, &criteria))
    }

    /// Identities where the matrix and ledger disagree on `queued`.
    ///
    /// Always empty unless something bypassed [`Catalog::toggle`].
    pub fn inconsistencies(&self) -> Vec<ChangeKey> {
        let queued = self.matrix.queued_keys();
        let queued_set: HashSet<&ChangeKey> = queued.iter().collect();
        let ledger_set: HashSet<&ChangeKey> = self.ledger.iter().map(|entry| &entry.key).collect();

        let mut out: Vec<ChangeKey> = queued
            .iter()
            .filter(|key| !ledger_set.contains(key))
            .cloned()
            .collect();
        out.extend(
            self.ledger
                .iter()
                .filter(|entry| !queued_set.contains(&entry.key))
                .map(|entry| entry.key.clone()),
        );
        out
    }
}
