//! Local key/value persistence abstraction.
//!
//! Provides a trait-based abstraction over device-local storage so that:
//! - The progress engine can be tested without a real backend
//! - Disabled storage and quota exhaustion can be simulated
//! - A file-backed store can stand in for browser local storage

use thiserror::Error;

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Errors specific to the persistence layer
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage is unavailable")]
    Unavailable,

    #[error("storage quota exceeded writing '{key}' ({needed} bytes, {limit} allowed)")]
    QuotaExceeded {
        key: String,
        needed: usize,
        limit: usize,
    },

    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage file is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Trait abstracting a single-process string key/value store
pub trait KeyValueStore: Send + Sync {
    /// Read a key; `Ok(None)` when it has never been written
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a key, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete a key. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}
