//! Strongly-typed identifiers used by the listing engine.

use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of a catalog product.
///
/// Serialized as a JSON string. Backends that emit integer ids are accepted;
/// the integer is normalized to its decimal form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ProductId(String);

/// Name of a branch. A branch's name is its identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchName(String);

macro_rules! impl_string_newtype {
    ($t:ty) => {
        impl $t {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $t {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $t {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

impl_string_newtype!(ProductId);
impl_string_newtype!(BranchName);

impl<'de> Deserialize<'de> for ProductId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Unsigned(u64),
            Signed(i64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Self(s),
            Raw::Unsigned(n) => Self(n.to_string()),
            Raw::Signed(n) => Self(n.to_string()),
        })
    }
}

/// Composite identity of a queued change: one (branch, product) cell.
///
/// Lookups always compare the structured pair. `Display` renders the legacy
/// `branch + product` concatenation, which only appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChangeKey {
    pub branch: BranchName,
    pub product: ProductId,
}

impl ChangeKey {
    pub fn new(branch: BranchName, product: ProductId) -> Self {
        Self { branch, product }
    }

    /// Legacy wire identifier (`branch` immediately followed by `product`).
    pub fn wire_id(&self) -> String {
        format!("{}{}", self.branch, self.product)
    }
}

impl core::fmt::Display for ChangeKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}{}", self.branch, self.product)
    }
}
