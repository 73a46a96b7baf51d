//! Change ledger: the queue of pending toggles awaiting batch submission.

use serde::{Deserialize, Serialize};

use listings_core::{BranchName, ChangeKey, ListingError, ListingResult, ProductId};

/// A pending toggle of one (branch, product) cell.
///
/// `listed` is the cell's value *before* the toggle. The backend owns the
/// meaning of a toggle and computes the flip itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "WireChangeEntry", from = "WireChangeEntry")]
pub struct ChangeEntry {
    pub key: ChangeKey,
    pub listed: bool,
}

impl ChangeEntry {
    pub fn new(key: ChangeKey, listed: bool) -> Self {
        Self { key, listed }
    }

    pub fn branch(&self) -> &BranchName {
        &self.key.branch
    }

    pub fn product(&self) -> &ProductId {
        &self.key.product
    }
}

/// Batch payload record: `{id, branch, listed, productId}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireChangeEntry {
    id: String,
    branch: BranchName,
    listed: bool,
    #[serde(rename = "productId")]
    product_id: ProductId,
}

impl From<ChangeEntry> for WireChangeEntry {
    fn from(entry: ChangeEntry) -> Self {
        Self {
            id: entry.key.wire_id(),
            branch: entry.key.branch,
            listed: entry.listed,
            product_id: entry.key.product,
        }
    }
}

impl From<WireChangeEntry> for ChangeEntry {
    fn from(wire: WireChangeEntry) -> Self {
        // The wire `id` is derived; identity comes from the structured fields.
        Self {
            key: ChangeKey::new(wire.branch, wire.product_id),
            listed: wire.listed,
        }
    }
}

/// Ordered set of pending changes, unique by [`ChangeKey`].
///
/// Insertion order is preserved so batch payloads are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeLedger {
    entries: Vec<ChangeEntry>,
}

impl ChangeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Fails if one with the same identity is already queued.
    pub fn add(&mut self, entry: ChangeEntry) -> ListingResult<()> {
        if self.contains(&entry.key) {
            return Err(ListingError::DuplicateEntry(entry.key));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Remove and return the entry with this identity.
    pub fn remove(&mut self, key: &ChangeKey) -> ListingResult<ChangeEntry> {
        let pos = self
            .entries
            .iter()
            .position(|e| &e.key == key)
            .ok_or_else(|| ListingError::NotFound(key.clone()))?;
        Ok(self.entries.remove(pos))
    }

    /// Drop every entry without contacting the backend.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, key: &ChangeKey) -> bool {
        self.entries.iter().any(|e| &e.key == key)
    }

    pub fn get(&self, key: &ChangeKey) -> Option<&ChangeEntry> {
        self.entries.iter().find(|e| &e.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChangeEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of the ledger as the ordered batch payload.
    pub fn batch(&self) -> Vec<ChangeEntry> {
        self.entries.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(branch: &str, product: &str, listed: bool) -> ChangeEntry {
        ChangeEntry::new(ChangeKey::new(branch.into(), product.into()), listed)
    }

    #[test]
    fn add_rejects_duplicate_identity() {
        let mut ledger = ChangeLedger::new();
        ledger.add(entry("B", "1", false)).unwrap();

        let err = ledger.add(entry("B", "1", true)).unwrap_err();
        assert!(matches!(err, ListingError::DuplicateEntry(_)));
        assert_eq!(ledger.len(), 1);
        assert!(!ledger.get(&entry("B", "1", false).key).unwrap().listed);
    }

    #[test]
    fn concatenation_collisions_are_separate_entries() {
        let mut ledger = ChangeLedger::new();
        ledger.add(entry("A1", "1", false)).unwrap();
        ledger.add(entry("A", "11", true)).unwrap();
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn remove_missing_is_not_found() {
        let mut ledger = ChangeLedger::new();
        let key = entry("B", "1", false).key;
        assert_eq!(ledger.remove(&key).unwrap_err(), ListingError::NotFound(key));
    }

    #[test]
    fn batch_preserves_insertion_order() {
        let mut ledger = ChangeLedger::new();
        ledger.add(entry("B", "2", true)).unwrap();
        ledger.add(entry("A", "1", false)).unwrap();
        ledger.add(entry("C", "3", false)).unwrap();
        ledger.remove(&entry("A", "1", false).key).unwrap();

        let ids: Vec<String> = ledger.batch().iter().map(|e| e.key.wire_id()).collect();
        assert_eq!(ids, vec!["B2", "C3"]);
    }

    #[test]
    fn clear_empties_the_ledger() {
        let mut ledger = ChangeLedger::new();
        ledger.add(entry("B", "1", false)).unwrap();
        ledger.clear();
        assert!(ledger.is_empty());
    }

    #[test]
    fn serializes_wire_record() {
        let value = serde_json::to_value(entry("B", "1", false)).unwrap();
        assert_eq!(
            value,
            json!({"id": "B1", "branch": "B", "listed": false, "productId": "1"})
        );
    }

    #[test]
    fn decodes_wire_record_by_structured_fields() {
        let decoded: ChangeEntry = serde_json::from_value(
            json!({"id": "ignored", "branch": "B", "listed": true, "productId": 1}),
        )
        .unwrap();
        assert_eq!(decoded, entry("B", "1", true));
    }
}
