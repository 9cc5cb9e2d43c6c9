//! Fixed keys and protocol defaults.

/// Storage key for the pending [`SetupData`](crate::types::SetupData) blob.
pub const SETUP_DATA_KEY: &str = "zklogin.setup";

/// Storage key for the durable account list.
pub const ACCOUNT_DATA_KEY: &str = "zklogin.accounts";

/// Validity window added to the current epoch when binding ephemeral keys.
pub const DEFAULT_MAX_EPOCH_WINDOW: u64 = 2;

/// Default OAuth 2.0 response type for the authorization request.
pub const DEFAULT_OAUTH_RESPONSE_TYPE: &str = "id_token";

/// Default OAuth 2.0 scope for the authorization request.
pub const DEFAULT_OAUTH_SCOPE: &str = crate::types::scopes::OPENID;

/// Claim the prover uses to bind the proof to the token subject.
pub const KEY_CLAIM_NAME: &str = "sub";
