//! Branch registry: the snapshot of branches loaded from the backend.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use listings_core::{BranchName, ListingError, ListingResult, ProductId};

/// A branch and the products currently listed on it.
///
/// Wire shape: `{"name": "...", "products": [id, ...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub name: BranchName,
    #[serde(default)]
    pub products: BTreeSet<ProductId>,
}

impl Branch {
    pub fn new(name: impl Into<BranchName>, products: impl IntoIterator<Item = ProductId>) -> Self {
        Self {
            name: name.into(),
            products: products.into_iter().collect(),
        }
    }

    pub fn is_listed(&self, product: &ProductId) -> bool {
        self.products.contains(product)
    }
}

/// Immutable snapshot of all known branches, in backend order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchRegistry {
    branches: Vec<Branch>,
}

impl BranchRegistry {
    /// Build a registry, rejecting duplicate branch names.
    pub fn new(branches: Vec<Branch>) -> ListingResult<Self> {
        let mut seen = HashSet::with_capacity(branches.len());
        for branch in &branches {
            if !seen.insert(&branch.name) {
                return Err(ListingError::DuplicateBranch(branch.name.clone()));
            }
        }
        Ok(Self { branches })
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn names(&self) -> Vec<BranchName> {
        self.branches.iter().map(|b| b.name.clone()).collect()
    }

    pub fn get(&self, name: &BranchName) -> Option<&Branch> {
        self.branches.iter().find(|b| &b.name == name)
    }

    pub fn is_listed(&self, name: &BranchName, product: &ProductId) -> bool {
        self.get(name).is_some_and(|b| b.is_listed(product))
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(s: &str) -> ProductId {
        ProductId::from(s)
    }

    #[test]
    fn keeps_backend_order() {
        let registry = BranchRegistry::new(vec![
            Branch::new("production", [pid("1")]),
            Branch::new("development", []),
            Branch::new("testing", [pid("2")]),
        ])
        .unwrap();

        let names: Vec<String> = registry.names().into_iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["production", "development", "testing"]);
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = BranchRegistry::new(vec![Branch::new("A", []), Branch::new("A", [pid("1")])])
            .unwrap_err();
        assert_eq!(err, ListingError::DuplicateBranch(BranchName::from("A")));
    }

    #[test]
    fn is_listed_is_false_for_unknown_branch() {
        let registry = BranchRegistry::new(vec![Branch::new("A", [pid("1")])]).unwrap();
        assert!(registry.is_listed(&BranchName::from("A"), &pid("1")));
        assert!(!registry.is_listed(&BranchName::from("A"), &pid("2")));
        assert!(!registry.is_listed(&BranchName::from("Z"), &pid("1")));
    }

    #[test]
    fn decodes_wire_shape_with_integer_ids() {
        let branches: Vec<Branch> =
            serde_json::from_str(r#"[{"name":"A","products":[1,2]},{"name":"B","products":[]}]"#)
                .unwrap();
        assert_eq!(branches[0], Branch::new("A", [pid("1"), pid("2")]));
        assert!(branches[1].products.is_empty());
    }
}
