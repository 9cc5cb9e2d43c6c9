//! Identity crypto adapter contract.
//!
//! The zkLogin flows treat key generation, nonce derivation, and address
//! derivation as an external collaborator: production hosts bind a chain
//! SDK here, while [`crate::platform::memory::MemoryCrypto`] provides a
//! deterministic stand-in for tests and tooling.

use crate::error::Result;

/// An ephemeral signing keypair generated per login attempt.
#[derive(Debug, Clone)]
pub struct EphemeralKeypair {
    /// Encoded public key, bound into the nonce.
    pub public_key: String,
    /// Encoded secret key, persisted in the setup scope until completion.
    pub secret_key_encoded: String,
}

/// Cryptographic operations the login flows depend on.
///
/// Implementations must be deterministic where the flow requires it:
/// [`derive_address`](Self::derive_address) must yield the same address for
/// the same `(token, salt)` pair, since the address is the account's natural
/// key and drives the duplicate-login guard.
pub trait IdentityCrypto: Send + Sync {
    /// Generates a fresh ephemeral keypair for a login attempt.
    fn ephemeral_keypair(&self) -> EphemeralKeypair;

    /// Produces cryptographic randomness for nonce derivation, as a decimal
    /// string.
    fn randomness(&self) -> String;

    /// Derives the nonce binding `{public key, max epoch, randomness}` into
    /// the OAuth request.
    fn nonce(&self, public_key: &str, max_epoch: u64, randomness: &str) -> String;

    /// Recovers the extended ephemeral public key from an encoded secret
    /// key. Only the secret survives the provider redirect, so the public
    /// half is re-derived at completion time.
    ///
    /// # Errors
    ///
    /// Returns [`ZkLoginError::Crypto`](crate::error::ZkLoginError::Crypto)
    /// if the encoded secret is malformed.
    fn extended_public_key(&self, secret_key_encoded: &str) -> Result<String>;

    /// Derives the deterministic account address from an identity token and
    /// a decimal salt.
    ///
    /// # Errors
    ///
    /// Returns [`ZkLoginError::Crypto`](crate::error::ZkLoginError::Crypto)
    /// if the inputs cannot be processed.
    fn derive_address(&self, token: &str, salt: &str) -> Result<String>;
}
