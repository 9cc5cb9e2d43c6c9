//! Client for the remote zero-knowledge proof service.

use std::time::Duration;

use serde::Serialize;

use crate::defaults::KEY_CLAIM_NAME;
use crate::error::{Result, ZkLoginError};
use crate::types::ZkProofs;

/// Inputs for one proof request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofRequest<'a> {
    /// Last epoch at which the ephemeral key material is valid.
    pub max_epoch: u64,
    /// Randomness bound into the nonce at initiation, as a decimal string.
    pub jwt_randomness: &'a str,
    /// Extended ephemeral public key recovered from the setup data.
    pub extended_ephemeral_public_key: &'a str,
    /// The identity token returned by the provider.
    pub jwt: &'a str,
    /// The user's salt as a decimal string.
    pub salt: &'a str,
    /// Claim the proof is bound to; always `sub`.
    pub key_claim_name: &'a str,
}

impl<'a> ProofRequest<'a> {
    /// Builds a request bound to the `sub` claim.
    #[must_use]
    pub const fn new(
        max_epoch: u64,
        jwt_randomness: &'a str,
        extended_ephemeral_public_key: &'a str,
        jwt: &'a str,
        salt: &'a str,
    ) -> Self {
        Self {
            max_epoch,
            jwt_randomness,
            extended_ephemeral_public_key,
            jwt,
            salt,
            key_claim_name: KEY_CLAIM_NAME,
        }
    }
}

/// HTTP client for a zkLogin proving service.
///
/// Any 2xx response with a JSON body parsing as [`ZkProofs`] is a success;
/// everything else is a [`ZkLoginError::Prover`] carrying the status and the
/// response text.
#[derive(Debug)]
pub struct ProverClient {
    url: String,
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl ProverClient {
    /// Creates a client for the prover endpoint at `url`. No timeout is
    /// applied unless one is set with [`with_timeout`](Self::with_timeout);
    /// the transport's defaults govern otherwise.
    #[must_use]
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            client: reqwest::Client::new(),
            timeout: None,
        }
    }

    /// Applies a per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Requests a proof for `request`.
    ///
    /// # Errors
    ///
    /// Returns [`ZkLoginError::Prover`] on transport failure or a
    /// non-success status, and [`ZkLoginError::Serialization`] if a success
    /// body is not valid [`ZkProofs`] JSON.
    pub async fn fetch_proofs(&self, request: &ProofRequest<'_>) -> Result<ZkProofs> {
        let mut builder = self
            .client
            .post(&self.url)
            .header("Accept", "application/json")
            .header(
                "User-Agent",
                format!("zklogin-core/{}", env!("CARGO_PKG_VERSION")),
            )
            .json(request);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|err| ZkLoginError::Prover {
            status: err.status().map(|s| s.as_u16()),
            reason: err.to_string(),
        })?;
        let status = response.status();
        if !status.is_success() {
            let reason = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ZkLoginError::Prover {
                status: Some(status.as_u16()),
                reason,
            });
        }

        let body = response.text().await?;
        let proofs = serde_json::from_str::<ZkProofs>(&body).map_err(|err| {
            ZkLoginError::Serialization(format!("invalid prover response: {err}"))
        })?;
        log::debug!("zk proving service success");
        Ok(proofs)
    }
}
