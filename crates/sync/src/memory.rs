//! In-memory backend for tests/dev.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use listings_catalog::{Branch, ChangeEntry, ProductRecord};

use crate::backend::{CatalogBackend, ChangeBatch};
use crate::error::SyncError;

/// Backend holding products and branches in process memory.
///
/// - Applies a batch wholesale: each entry flips its cell from `listed`
/// - Rejects the whole batch if any entry names an unknown branch or product
/// - Scripted failures and latency for exercising the session
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    products: Vec<ProductRecord>,
    branches: Vec<Branch>,
    applied: Vec<Uuid>,
    scripted_failures: VecDeque<SyncError>,
    scripted_fetch_failures: VecDeque<SyncError>,
    submit_delay: Option<Duration>,
}

impl InMemoryBackend {
    pub fn new(products: Vec<ProductRecord>, branches: Vec<Branch>) -> Self {
        Self {
            state: Mutex::new(State {
                products,
                branches,
                ..State::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // State is only replaced wholesale, so a poisoned guard is still coherent.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn products(&self) -> Vec<ProductRecord> {
        self.state().products.clone()
    }

    pub fn branches(&self) -> Vec<Branch> {
        self.state().branches.clone()
    }

    /// Ids of batches applied so far, oldest first.
    pub fn applied_batches(&self) -> Vec<Uuid> {
        self.state().applied.clone()
    }

    pub fn replace_products(&self, products: Vec<ProductRecord>) {
        self.state().products = products;
    }

    /// Make the next submission fail with `err` (queued, one per call).
    pub fn fail_next_submit(&self, err: SyncError) {
        self.state().scripted_failures.push_back(err);
    }

    /// Make the next product fetch fail with `err` (queued, one per call).
    pub fn fail_next_fetch(&self, err: SyncError) {
        self.state().scripted_fetch_failures.push_back(err);
    }

    /// Delay every submission by `delay` before it is applied.
    pub fn set_submit_delay(&self, delay: Option<Duration>) {
        self.state().submit_delay = delay;
    }

    /// Apply entries atomically: validate everything, then flip every cell.
    pub fn apply(&self, entries: &[ChangeEntry]) -> Result<(), SyncError> {
        let mut state = self.state();

        for entry in entries {
            if !state.branches.iter().any(|b| &b.name == entry.branch()) {
                return Err(SyncError::Api(422, format!("unknown branch: {}", entry.branch())));
            }
            if !state.products.iter().any(|p| &p.id == entry.product()) {
                return Err(SyncError::Api(422, format!("unknown product: {}", entry.product())));
            }
        }

        for entry in entries {
            if let Some(branch) = state.branches.iter_mut().find(|b| &b.name == entry.branch()) {
                if entry.listed {
                    branch.products.remove(entry.product());
                } else {
                    branch.products.insert(entry.product().clone());
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogBackend for InMemoryBackend {
    async fn fetch_products(&self) -> Result<Vec<ProductRecord>, SyncError> {
        let mut state = self.state();
        if let Some(err) = state.scripted_fetch_failures.pop_front() {
            return Err(err);
        }
        Ok(state.products.clone())
    }

    async fn fetch_branches(&self) -> Result<Vec<Branch>, SyncError> {
        Ok(self.branches())
    }

    async fn submit_changes(&self, batch: &ChangeBatch) -> Result<(), SyncError> {
        let delay = self.state().submit_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.state().scripted_failures.pop_front();
        if let Some(err) = scripted {
            return Err(err);
        }

        self.apply(&batch.entries)?;
        self.state().applied.push(batch.id);
        tracing::debug!(batch = %batch.id, entries = batch.entries.len(), "applied batch");
        Ok(())
    }

    async fn create_branch(&self, name: &str) -> Result<(), SyncError> {
        let mut state = self.state();
        if state.branches.iter().any(|b| b.name.as_str() == name) {
            return Err(SyncError::Api(409, format!("branch already exists: {name}")));
        }
        state.branches.push(Branch::new(name, []));
        Ok(())
    }
}
