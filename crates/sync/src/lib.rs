//! `listings-sync`
//!
//! **Responsibility:** the asynchronous boundary of the listing engine.
//!
//! This crate provides:
//! - The [`CatalogBackend`] seam with HTTP and in-memory implementations
//! - [`CatalogSession`], the context object owning one operator's catalog
//! - Batch submission with timeout and in-flight cancellation
//! - The reconciliation cycle (submit → clear → reload)
//!
//! The backend is the authority for what is listed; the session only ever
//! holds queued intent on top of the last snapshot it loaded.

pub mod backend;
pub mod config;
pub mod error;
pub mod http;
pub mod memory;
pub mod observer;
pub mod session;

pub use backend::{CatalogBackend, ChangeBatch};
pub use config::{ClientConfig, ConfigError};
pub use error::SyncError;
pub use http::HttpBackend;
pub use memory::InMemoryBackend;
pub use observer::{SessionEvent, SessionObserver};
pub use session::{CatalogSession, SubmissionReceipt, SubmitCanceller};
