//! Shared data model for the zkLogin session protocol.
//!
//! Wire names follow the JSON produced by existing zkLogin deployments
//! (camelCase keys; the `email_verified` JWT claim keeps its snake_case
//! name), so blobs persisted by this crate interoperate with them.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Supported OpenID Connect identity providers.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OpenIdProvider {
    /// Google (`accounts.google.com`).
    Google,
    /// Facebook.
    Facebook,
    /// Twitch.
    Twitch,
    /// Kakao.
    Kakao,
    /// Apple.
    Apple,
    /// Slack.
    Slack,
    /// Microsoft.
    Microsoft,
}

/// OAuth 2.0 client configuration for a single provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenIdConfig {
    /// Authorization endpoint URL for the provider.
    pub auth_url: String,
    /// OAuth 2.0 client identifier issued by the provider.
    pub client_id: String,
    /// Additional parameters appended to the authorization URL. Ordered so
    /// that built URLs are deterministic.
    #[serde(default)]
    pub extra_params: BTreeMap<String, String>,
}

/// Caller-supplied configuration map from provider to client configuration.
pub type ProvidersConfig = HashMap<OpenIdProvider, OpenIdConfig>;

/// Optional overrides for the OAuth 2.0 authorization request.
#[derive(Debug, Clone, Default)]
pub struct AuthParams {
    /// URI the provider redirects to after authentication. Defaults to the
    /// origin of the current location.
    pub redirect_uri: Option<String>,
    /// OAuth 2.0 response type. Defaults to `id_token`.
    pub response_type: Option<String>,
    /// Space-separated OAuth 2.0 scopes. Defaults to `openid`.
    pub scope: Option<String>,
}

/// Common OAuth 2.0 scope values.
pub mod scopes {
    /// The mandatory OpenID Connect scope.
    pub const OPENID: &str = "openid";
    /// Requests the `email` and `email_verified` claims.
    pub const EMAIL: &str = "email";
    /// Requests profile claims.
    pub const PROFILE: &str = "profile";
    /// Requests the phone number claim.
    pub const PHONE: &str = "phone";
}

/// Ephemeral state written at initiation and consumed exactly once at
/// completion. At most one pending instance exists; a new initiation
/// overwrites any prior one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupData {
    /// Provider selected for this login attempt.
    pub provider: OpenIdProvider,
    /// Last epoch at which the ephemeral key material is valid.
    pub max_epoch: u64,
    /// Randomness bound into the nonce, as a decimal string.
    pub randomness: String,
    /// Encoded ephemeral private key for this login session.
    pub ephemeral_private_key: String,
}

/// Zero-knowledge proof artifact produced by the external prover service.
/// Opaque to this crate beyond storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZkProofs {
    /// The generated proof.
    pub proof: String,
    /// Public inputs for verification.
    pub public_inputs: Vec<String>,
    /// Verification status reported by the prover.
    pub verified: bool,
}

/// One durable account per successful login. `user_addr` is a deterministic
/// function of (identity token, salt) and is the account's natural key; no
/// two stored accounts share it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountData {
    /// Provider used for authentication.
    pub provider: OpenIdProvider,
    /// Derived blockchain address for the account.
    pub user_addr: String,
    /// Proof artifact for the session.
    pub zk_proofs: ZkProofs,
    /// Encoded ephemeral private key for the session.
    pub ephemeral_private_key: String,
    /// User-specific salt as a decimal string.
    pub user_salt: String,
    /// OpenID subject identifier.
    pub sub: String,
    /// OpenID audience identifier.
    pub aud: String,
    /// Last epoch at which the session key material is valid.
    pub max_epoch: u64,
    /// Email address claim, when the token carried one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Email verification claim, when the token carried one.
    #[serde(rename = "email_verified", skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn provider_string_forms_are_lowercase() {
        assert_eq!(OpenIdProvider::Google.to_string(), "google");
        assert_eq!(
            OpenIdProvider::from_str("microsoft").unwrap(),
            OpenIdProvider::Microsoft
        );
        assert!(OpenIdProvider::from_str("Google ").is_err());
    }

    #[test]
    fn account_data_wire_names() {
        let account = AccountData {
            provider: OpenIdProvider::Google,
            user_addr: "0xabc".to_string(),
            zk_proofs: ZkProofs {
                proof: "p".to_string(),
                public_inputs: vec!["1".to_string()],
                verified: true,
            },
            ephemeral_private_key: "key".to_string(),
            user_salt: "42".to_string(),
            sub: "u1".to_string(),
            aud: "app1".to_string(),
            max_epoch: 7,
            email: None,
            email_verified: Some(true),
        };
        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["userAddr"], "0xabc");
        assert_eq!(json["zkProofs"]["publicInputs"][0], "1");
        assert_eq!(json["maxEpoch"], 7);
        assert_eq!(json["email_verified"], true);
        assert!(json.get("email").is_none());
    }

    #[test]
    fn setup_data_round_trips() {
        let setup = SetupData {
            provider: OpenIdProvider::Twitch,
            max_epoch: 12,
            randomness: "123".to_string(),
            ephemeral_private_key: "sk".to_string(),
        };
        let json = serde_json::to_string(&setup).unwrap();
        assert!(json.contains("\"provider\":\"twitch\""));
        assert!(json.contains("\"ephemeralPrivateKey\""));
        let back: SetupData = serde_json::from_str(&json).unwrap();
        assert_eq!(back.max_epoch, 12);
    }
}
