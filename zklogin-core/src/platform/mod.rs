//! Host capability traits.
//!
//! The core never touches browser globals (or any other host surface)
//! directly. Every platform-specific operation it needs is abstracted behind
//! a trait so the flows are testable without a browser host:
//!
//! - [`KeyValueStore`] — durable key-value persistence with two independent
//!   scopes (ephemeral login setup vs. the durable account list)
//! - [`Navigator`] — read the current URL, rewrite the visible URL, and
//!   perform full-page navigation
//!
//! # Platform implementations
//!
//! - Browser (WASM): `localStorage`/`sessionStorage` and `window.location` /
//!   `history.replaceState`
//! - Native shells: app-local files plus an embedded web view's navigation
//!   surface
//! - Tests and CLI tooling: [`memory`] implementations
//!
//! Scope lifetime (survives reload vs. tab-only) is a deployment choice, not
//! fixed by the core. The contract also does not require cross-process
//! coordination: two hosts sharing a scope without locking can race, and no
//! merge protocol is applied on write. Deployments that need cross-tab
//! consistency must provide a store that serializes writers.

use thiserror::Error;

pub mod memory;

/// Result type for host storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by host storage implementations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing store rejected or failed the operation.
    #[error("storage backend error: {0}")]
    Backend(String),
    /// A stored blob could not be serialized or deserialized.
    #[error("storage serialization error: {0}")]
    Serialization(String),
}

impl From<StorageError> for crate::error::ZkLoginError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Backend(msg) => Self::Storage(msg),
            StorageError::Serialization(msg) => Self::Serialization(msg),
        }
    }
}

/// The two independently-keyed storage scopes used by the flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageScope {
    /// Ephemeral login setup data, consumed once per flow.
    Setup,
    /// The durable account list.
    Accounts,
}

/// Durable key-value persistence provided by the host.
///
/// Each operation is atomic with respect to a single key: a `set` either
/// commits the full value or nothing.
pub trait KeyValueStore: Send + Sync {
    /// Reads the blob stored under `key` in `scope`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn get(&self, scope: StorageScope, key: &str) -> StorageResult<Option<String>>;

    /// Writes `value` under `key` in `scope`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn set(&self, scope: StorageScope, key: &str, value: &str) -> StorageResult<()>;

    /// Removes `key` from `scope`. Removing an absent key is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn delete(&self, scope: StorageScope, key: &str) -> StorageResult<()>;
}

/// URL and navigation surface provided by the host.
pub trait Navigator: Send + Sync {
    /// Returns the current location as an absolute URL.
    fn current_url(&self) -> String;

    /// Rewrites the visible location without navigating (the browser
    /// `history.replaceState` equivalent). Used to strip consumed identity
    /// tokens from the address bar.
    fn rewrite_url(&self, url: &str);

    /// Replaces the current page with `url`. For browser hosts this is a
    /// terminal side effect: no further code in the calling context runs.
    fn navigate(&self, url: &str);
}
