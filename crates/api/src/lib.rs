//! `listings-api`: in-memory reference backend for the listing engine.
//!
//! Serves the product/branch reads, the batch endpoint and branch creation
//! over HTTP, backed by [`InMemoryBackend`](listings_sync::InMemoryBackend).
//! Nothing is persisted.

pub mod app;
pub mod config;
