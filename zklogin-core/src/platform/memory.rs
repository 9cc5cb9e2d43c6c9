//! In-memory implementations of the host capability traits.
//!
//! These implementations are NOT secure for production use. They exist for
//! unit and integration testing of the flows, and for developer tooling
//! that runs outside a browser host.

use std::collections::HashMap;
use std::sync::Mutex;

use rand::RngCore as _;
use sha2::{Digest as _, Sha256};

use crate::crypto::{EphemeralKeypair, IdentityCrypto};
use crate::error::{Result, ZkLoginError};

use super::{KeyValueStore, Navigator, StorageError, StorageResult, StorageScope};

/// In-memory [`KeyValueStore`] backed by a mutex-guarded map per scope.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<(StorageScope, String), String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, scope: StorageScope, key: &str) -> StorageResult<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Backend("store mutex poisoned".to_string()))?;
        Ok(entries.get(&(scope, key.to_string())).cloned())
    }

    fn set(&self, scope: StorageScope, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Backend("store mutex poisoned".to_string()))?;
        entries.insert((scope, key.to_string()), value.to_string());
        Ok(())
    }

    fn delete(&self, scope: StorageScope, key: &str) -> StorageResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Backend("store mutex poisoned".to_string()))?;
        entries.remove(&(scope, key.to_string()));
        Ok(())
    }
}

/// In-memory [`Navigator`] that records navigations instead of performing
/// them, so tests can assert on the authorization URL and simulate the
/// provider redirect by setting the current URL.
#[derive(Debug)]
pub struct MemoryNavigator {
    current: Mutex<String>,
    navigations: Mutex<Vec<String>>,
}

impl MemoryNavigator {
    /// Creates a navigator positioned at `url`.
    #[must_use]
    pub fn new(url: &str) -> Self {
        Self {
            current: Mutex::new(url.to_string()),
            navigations: Mutex::new(Vec::new()),
        }
    }

    /// Repositions the navigator, as a provider redirect would.
    pub fn set_current_url(&self, url: &str) {
        *self.current.lock().expect("navigator mutex poisoned") = url.to_string();
    }

    /// Returns every URL passed to [`Navigator::navigate`], oldest first.
    #[must_use]
    pub fn navigations(&self) -> Vec<String> {
        self.navigations
            .lock()
            .expect("navigator mutex poisoned")
            .clone()
    }

    /// Returns the most recent navigation target, if any.
    #[must_use]
    pub fn last_navigation(&self) -> Option<String> {
        self.navigations
            .lock()
            .expect("navigator mutex poisoned")
            .last()
            .cloned()
    }
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::new("http://localhost:3000/")
    }
}

impl Navigator for MemoryNavigator {
    fn current_url(&self) -> String {
        self.current.lock().expect("navigator mutex poisoned").clone()
    }

    fn rewrite_url(&self, url: &str) {
        self.set_current_url(url);
    }

    fn navigate(&self, url: &str) {
        self.navigations
            .lock()
            .expect("navigator mutex poisoned")
            .push(url.to_string());
        self.set_current_url(url);
    }
}

/// Deterministic [`IdentityCrypto`] built on SHA-256.
///
/// **FOR TESTING AND TOOLING ONLY** — addresses derived here are hashes,
/// not real zkLogin addresses, and the "keys" carry no signing capability.
/// The implementation is deterministic in `(token, salt)` so duplicate-guard
/// behavior can be exercised.
#[derive(Debug, Default)]
pub struct MemoryCrypto;

impl MemoryCrypto {
    /// Creates the adapter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn public_for_secret(secret: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(secret);
        hasher.update(b"pub");
        hex::encode(hasher.finalize())
    }
}

impl IdentityCrypto for MemoryCrypto {
    fn ephemeral_keypair(&self) -> EphemeralKeypair {
        let mut secret = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut secret);
        EphemeralKeypair {
            public_key: Self::public_for_secret(&secret),
            secret_key_encoded: hex::encode(secret),
        }
    }

    fn randomness(&self) -> String {
        let mut bytes = [0u8; 16];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        u128::from_le_bytes(bytes).to_string()
    }

    fn nonce(&self, public_key: &str, max_epoch: u64, randomness: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(public_key.as_bytes());
        hasher.update(max_epoch.to_le_bytes());
        hasher.update(randomness.as_bytes());
        let digest = hex::encode(hasher.finalize());
        digest[..27.min(digest.len())].to_string()
    }

    fn extended_public_key(&self, secret_key_encoded: &str) -> Result<String> {
        let secret = hex::decode(secret_key_encoded).map_err(|err| {
            ZkLoginError::Crypto(format!("malformed ephemeral secret key: {err}"))
        })?;
        Ok(format!("00{}", Self::public_for_secret(&secret)))
    }

    fn derive_address(&self, token: &str, salt: &str) -> Result<String> {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hasher.update([0u8]);
        hasher.update(salt.as_bytes());
        Ok(format!("0x{}", hex::encode(hasher.finalize())))
    }
}
