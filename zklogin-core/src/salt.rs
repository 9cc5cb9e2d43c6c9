//! Caller-supplied salt generation.
//!
//! The salt is a user-specific blinding factor mixed with the identity token
//! to derive a stable address without revealing the subject on-chain. Salt
//! management strategies vary per deployment (dedicated salt service,
//! password-derived, device-held), so the flows only depend on this trait.

use std::future::Future;

use serde::Deserialize;

use crate::error::Result;

/// A generated salt. Salts are carried as decimal strings once inside the
/// flow; 128 bits covers the widths used in practice.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SaltResponse {
    /// The numeric salt value.
    pub salt: u128,
}

/// Produces the user's salt for a given identity token.
#[allow(async_fn_in_trait)]
pub trait SaltProvider {
    /// Generates a salt for `token`. Returning `Ok(None)` aborts the
    /// completion flow without error.
    ///
    /// # Errors
    ///
    /// Implementations may fail with any [`ZkLoginError`](crate::error::ZkLoginError);
    /// the completion flow coarsens unexpected failures.
    async fn generate(&self, token: &str) -> Result<Option<SaltResponse>>;
}

/// Adapts an async function into a [`SaltProvider`], so deployments can pass
/// a plain closure for salt management.
#[derive(Debug, Clone, Copy)]
pub struct SaltFn<F>(
    /// The wrapped function, called with the identity token.
    pub F,
);

impl<F, Fut> SaltProvider for SaltFn<F>
where
    F: Fn(String) -> Fut + Sync,
    Fut: Future<Output = Result<Option<SaltResponse>>> + Send,
{
    async fn generate(&self, token: &str) -> Result<Option<SaltResponse>> {
        (self.0)(token.to_string()).await
    }
}

/// A [`SaltProvider`] that always yields the same salt. Useful for tests and
/// single-user tooling.
#[derive(Debug, Clone, Copy)]
pub struct FixedSalt(
    /// The salt to return for every token.
    pub u128,
);

impl SaltProvider for FixedSalt {
    async fn generate(&self, _token: &str) -> Result<Option<SaltResponse>> {
        Ok(Some(SaltResponse { salt: self.0 }))
    }
}
