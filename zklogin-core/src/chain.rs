//! Chain state collaborator: the source of the current epoch.

use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::error::{Result, ZkLoginError};

/// Source of the chain's latest epoch, used to bound ephemeral key validity.
#[allow(async_fn_in_trait)]
pub trait EpochSource {
    /// Returns the chain's current epoch.
    ///
    /// # Errors
    ///
    /// Returns [`ZkLoginError::Network`] if the epoch cannot be fetched.
    async fn latest_epoch(&self) -> Result<u64>;
}

/// An [`EpochSource`] that always reports a fixed epoch. Useful for tests
/// and offline tooling.
#[derive(Debug, Clone, Copy)]
pub struct StaticEpoch(
    /// The epoch to report.
    pub u64,
);

impl EpochSource for StaticEpoch {
    async fn latest_epoch(&self) -> Result<u64> {
        Ok(self.0)
    }
}

#[derive(Deserialize)]
struct EpochResponse {
    #[serde(deserialize_with = "epoch_from_number_or_string")]
    epoch: u64,
}

/// Chain clients commonly stringify epochs in JSON; accept both forms.
fn epoch_from_number_or_string<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(epoch) => Ok(epoch),
        Raw::Text(text) => text.parse().map_err(serde::de::Error::custom),
    }
}

/// An [`EpochSource`] backed by an HTTP endpoint returning `{"epoch": N}`.
#[derive(Debug)]
pub struct HttpEpochSource {
    url: String,
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl HttpEpochSource {
    /// Creates a source pointed at `url`. No timeout is applied unless one
    /// is set with [`with_timeout`](Self::with_timeout); the transport's
    /// defaults govern otherwise.
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
}

impl EpochSource for HttpEpochSource {
    async fn latest_epoch(&self) -> Result<u64> {
        let mut request = self.client.get(&self.url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let error = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ZkLoginError::Network {
                url: self.url.clone(),
                status: Some(status.as_u16()),
                error,
            });
        }
        let body: EpochResponse = response.json().await?;
        Ok(body.epoch)
    }
}
