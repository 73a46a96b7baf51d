//! The seam between the session and whatever serves catalog data.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use listings_catalog::{Branch, ChangeEntry, ProductRecord};

use crate::error::SyncError;

/// One submission: the full ledger, in order, under a fresh id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeBatch {
    pub id: Uuid,
    pub entries: Vec<ChangeEntry>,
}

impl ChangeBatch {
    pub fn new(entries: Vec<ChangeEntry>) -> Self {
        Self {
            id: Uuid::now_v7(),
            entries,
        }
    }
}

/// Source of truth for listings.
///
/// `submit_changes` is all-or-nothing: `Ok` means every entry was applied,
/// any `Err` means none were.
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    async fn fetch_products(&self) -> Result<Vec<ProductRecord>, SyncError>;

    async fn fetch_branches(&self) -> Result<Vec<Branch>, SyncError>;

    async fn submit_changes(&self, batch: &ChangeBatch) -> Result<(), SyncError>;

    async fn create_branch(&self, name: &str) -> Result<(), SyncError>;
}

#[async_trait]
impl<B> CatalogBackend for Arc<B>
where
    B: CatalogBackend + ?Sized,
{
    async fn fetch_products(&self) -> Result<Vec<ProductRecord>, SyncError> {
        (**self).fetch_products().await
    }

    async fn fetch_branches(&self) -> Result<Vec<Branch>, SyncError> {
        (**self).fetch_branches().await
    }

    async fn submit_changes(&self, batch: &ChangeBatch) -> Result<(), SyncError> {
        (**self).submit_changes(batch).await
    }

    async fn create_branch(&self, name: &str) -> Result<(), SyncError> {
        (**self).create_branch(name).await
    }
}
