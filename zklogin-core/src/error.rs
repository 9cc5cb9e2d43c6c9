//! Error outputs for the zkLogin flows.
//!
//! Conditions that merely mean "nothing to do yet" (no token in the URL, no
//! pending setup, duplicate account) are not errors; the flows return `None`
//! for those so callers can poll without exception noise.

use thiserror::Error;

/// Result type used across the crate.
pub type Result<T, E = ZkLoginError> = std::result::Result<T, E>;

/// Errors raised by the zkLogin flows and their collaborators.
#[derive(Debug, Error)]
pub enum ZkLoginError {
    /// A required call argument is missing or empty. Caller bug, not retried.
    #[error("missing required argument: {argument}")]
    Validation {
        /// Name of the missing argument.
        argument: &'static str,
    },

    /// The requested provider has no entry in the supplied configuration map.
    /// Caller bug, not retried.
    #[error("unknown or misconfigured provider: {provider}")]
    Config {
        /// The provider that was requested.
        provider: String,
    },

    /// Transport-level failure reaching a collaborator. Safe to retry the
    /// whole initiation.
    #[error("network error for {url}: {error}")]
    Network {
        /// The URL that was being requested.
        url: String,
        /// HTTP status code, when a response was received.
        status: Option<u16>,
        /// Description of the failure.
        error: String,
    },

    /// The proof request failed, either in transport or with a non-success
    /// status from the remote proof service. Setup data is consumed before
    /// the proof request, so retrying means restarting the flow at
    /// initiation.
    #[error("prover request failed: {reason}")]
    Prover {
        /// HTTP status returned by the prover, when a response was received.
        status: Option<u16>,
        /// Reason text for the failure.
        reason: String,
    },

    /// Unexpected serialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Failure in the host storage scope.
    #[error("storage error: {0}")]
    Storage(String),

    /// Failure in the identity crypto adapter.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// Any other unexpected fault. Internal detail is logged at the point of
    /// detection rather than carried here.
    #[error("zklogin flow failed, restart the login")]
    Flow,
}

impl From<reqwest::Error> for ZkLoginError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            url: err
                .url()
                .map_or_else(|| "<unknown>".to_string(), ToString::to_string),
            status: err.status().map(|s| s.as_u16()),
            error: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ZkLoginError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
