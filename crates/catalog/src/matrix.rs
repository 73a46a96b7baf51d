//! Listing matrix: every product's listing state across every known branch.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use listings_core::{BranchName, ChangeKey, ProductId};

use crate::registry::BranchRegistry;

/// A product record as returned by the backend's product listing.
///
/// Only `id` and the deprecation flag are interpreted; every other field is
/// kept verbatim for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    #[serde(rename = "depr", alias = "deprecated", default)]
    pub deprecated: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProductRecord {
    pub fn new(id: impl Into<ProductId>, deprecated: bool) -> Self {
        Self {
            id: id.into(),
            deprecated,
            extra: Map::new(),
        }
    }
}

/// One (product, branch) cell of the matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRow {
    pub branch: BranchName,
    /// Last known server truth.
    pub listed: bool,
    /// A toggle for this cell is pending in the ledger.
    pub queued: bool,
}

/// A product together with its derived branch rows (registry order).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    id: ProductId,
    deprecated: bool,
    extra: Map<String, Value>,
    branch_rows: Vec<BranchRow>,
}

impl Product {
    fn from_record(record: ProductRecord, registry: &BranchRegistry) -> Self {
        let branch_rows = registry
            .branches()
            .iter()
            .map(|branch| BranchRow {
                branch: branch.name.clone(),
                listed: branch.is_listed(&record.id),
                queued: false,
            })
            .collect();

        let mut extra = record.extra;
        // Any client-side queue marker coming back from the server is stale.
        extra.remove("queued");

        Self {
            id: record.id,
            deprecated: record.deprecated,
            extra,
            branch_rows,
        }
    }

    pub fn id(&self) -> &ProductId {
        &self.id
    }

    pub fn deprecated(&self) -> bool {
        self.deprecated
    }

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    pub fn branch_rows(&self) -> &[BranchRow] {
        &self.branch_rows
    }

    pub fn row(&self, branch: &BranchName) -> Option<&BranchRow> {
        self.branch_rows.iter().find(|r| &r.branch == branch)
    }

    pub fn change_key(&self, branch: &BranchName) -> ChangeKey {
        ChangeKey::new(branch.clone(), self.id.clone())
    }

    pub fn has_queued(&self) -> bool {
        self.branch_rows.iter().any(|r| r.queued)
    }

    /// Return a copy of this product with the row for `row.branch` replaced.
    ///
    /// The row sequence is rebuilt rather than patched in place.
    pub fn with_row(&self, row: BranchRow) -> Self {
        let branch_rows = self
            .branch_rows
            .iter()
            .map(|existing| {
                if existing.branch == row.branch {
                    row.clone()
                } else {
                    existing.clone()
                }
            })
            .collect();

        Self {
            id: self.id.clone(),
            deprecated: self.deprecated,
            extra: self.extra.clone(),
            branch_rows,
        }
    }
}

/// The materialized (product × branch) view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingMatrix {
    branch_names: Vec<BranchName>,
    products: Vec<Product>,
    index: HashMap<ProductId, usize>,
}

impl ListingMatrix {
    /// Build the matrix from a product list and a registry snapshot.
    ///
    /// Pure: every row starts with `queued = false`. If the product list
    /// repeats an id, the last record wins and keeps the first position.
    pub fn build(records: Vec<ProductRecord>, registry: &BranchRegistry) -> Self {
        let mut products: Vec<Product> = Vec::with_capacity(records.len());
        let mut index = HashMap::with_capacity(records.len());

        for record in records {
            let product = Product::from_record(record, registry);
            match index.get(&product.id) {
                Some(&pos) => products[pos] = product,
                None => {
                    index.insert(product.id.clone(), products.len());
                    products.push(product);
                }
            }
        }

        Self {
            branch_names: registry.names(),
            products,
            index,
        }
    }

    pub fn branch_names(&self) -> &[BranchName] {
        &self.branch_names
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn product(&self, id: &ProductId) -> Option<&Product> {
        self.index.get(id).map(|&pos| &self.products[pos])
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Identities of every row currently marked queued, in matrix order.
    pub fn queued_keys(&self) -> Vec<ChangeKey> {
        self.products
            .iter()
            .flat_map(|p| {
                p.branch_rows
                    .iter()
                    .filter(|r| r.queued)
                    .map(|r| p.change_key(&r.branch))
            })
            .collect()
    }

    /// Rebuild every product with all rows unqueued.
    pub(crate) fn reset_queued(&mut self) {
        for product in &mut self.products {
            if product.has_queued() {
                let rows = product
                    .branch_rows
                    .iter()
                    .map(|r| BranchRow { queued: false, ..r.clone() })
                    .collect();
                product.branch_rows = rows;
            }
        }
    }

    /// Swap in a rebuilt product. Returns false if the id is unknown.
    pub(crate) fn replace(&mut self, product: Product) -> bool {
        match self.index.get(&product.id) {
            Some(&pos) => {
                self.products[pos] = product;
                true
            }
            None => false,
        }
    }
}
