//! Shared fixtures for unit tests.

use serde_json::json;

use crate::types::{AccountData, OpenIdConfig, OpenIdProvider, ZkProofs};

/// A stored account with the given address and defaults everywhere else.
pub fn account(addr: &str) -> AccountData {
    AccountData {
        provider: OpenIdProvider::Google,
        user_addr: addr.to_string(),
        zk_proofs: ZkProofs {
            proof: "p".to_string(),
            public_inputs: Vec::new(),
            verified: true,
        },
        ephemeral_private_key: "sk".to_string(),
        user_salt: "1".to_string(),
        sub: "u1".to_string(),
        aud: "app1".to_string(),
        max_epoch: 5,
        email: None,
        email_verified: None,
    }
}

/// An unsigned identity token carrying `sub` and `aud`.
pub fn token(sub: &str, aud: &str) -> String {
    crate::jwt::testing::encode_token(&json!({ "sub": sub, "aud": aud }))
}

/// The google provider configuration used across flow tests.
pub fn google_config() -> OpenIdConfig {
    OpenIdConfig {
        auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
        client_id: "X".to_string(),
        extra_params: std::collections::BTreeMap::new(),
    }
}
