//! `listings-core`: identifiers and errors shared by the listing engine.
//!
//! This crate contains **pure domain** primitives (no IO, no async).

pub mod error;
pub mod id;

pub use error::{ListingError, ListingResult};
pub use id::{BranchName, ChangeKey, ProductId};
