//! Persistent key/value storage.
//!
//! The dashboard persists very little: string flags under fixed keys that
//! survive restarts until explicitly removed.
//!
//! ## Directory Structure
//!
//! ```text
//! storage/
//! ├── config.toml           # Dashboard configuration
//! └── local_storage.json    # Persisted flags ({ "isAuthenticated": "true" })
//! ```

pub mod local;

use async_trait::async_trait;

use crate::error::Result;

// Re-export for convenience
pub use local::LocalStorage;

/// String key/value store with no expiry.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` when the key was never set or was removed.
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a key. Removing a missing key is not an error.
    async fn remove_item(&self, key: &str) -> Result<()>;
}
