//! Persisted key-value storage for session state.
//!
//! Two entries are kept:
//! - [`TOKEN_KEY`]: the bearer token as a plain string
//! - [`SESSION_KEY`]: the mirrored session record as JSON
//!
//! Only [`crate::auth::SessionStore`] writes to these entries.

pub mod file;
pub mod keychain;
pub mod memory;

pub use file::FileStorage;
pub use keychain::KeychainStorage;
pub use memory::MemoryStorage;

use thiserror::Error;

/// Key under which the bearer token is persisted
pub const TOKEN_KEY: &str = "token";

/// Key under which the full session record is persisted
pub const SESSION_KEY: &str = "auth-storage";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Keychain error: {0}")]
    Keychain(#[from] keyring::Error),

    #[error("Invalid stored record: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A string key-value store that survives restarts.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove an entry. Removing a missing entry is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
