//! Visibility filter: which product rows are worth showing an operator.

use serde::{Deserialize, Serialize};

use crate::matrix::Product;

/// Session-wide display criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(rename = "hideCommon")]
    pub hide_common: bool,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self { hide_common: true }
    }
}

impl FilterCriteria {
    /// Flip `hide_common` and return the new value.
    pub fn toggle_hide_common(&mut self) -> bool {
        self.hide_common = !self.hide_common;
        self.hide_common
    }
}

/// Decide whether a product row should be displayed.
///
/// With `hide_common` set, a product is hidden only when it is listed on every
/// branch and also passes the default-branch check (not deprecated).
/// Deprecated products are always shown.
pub fn is_visible(product: &Product, criteria: &FilterCriteria) -> bool {
    if !criteria.hide_common || product.deprecated() {
        return true;
    }

    // Synthetic axis: a non-deprecated product counts as listed on the
    // implicit default branch.
    let default_branch_flag = !product.deprecated();

    product
        .branch_rows()
        .iter()
        .map(|row| row.listed)
        .chain(std::iter::once(default_branch_flag))
        .any(|listed| !listed)
}
