//! Login initiation: ephemeral key material, setup persistence, and the
//! provider redirect.

use url::Url;

use crate::chain::EpochSource;
use crate::defaults::{
    DEFAULT_MAX_EPOCH_WINDOW, DEFAULT_OAUTH_RESPONSE_TYPE, DEFAULT_OAUTH_SCOPE,
};
use crate::error::{Result, ZkLoginError};
use crate::host::ZkLoginHost;
use crate::session;
use crate::types::{AuthParams, OpenIdProvider, ProvidersConfig, SetupData};

/// Begins a zkLogin flow for `provider`.
///
/// Resolves the provider configuration, fetches the current epoch, generates
/// an ephemeral keypair and randomness, binds them into a nonce, atomically
/// persists the setup data (overwriting any prior pending setup), and
/// navigates to the provider's authorization URL. The navigation is a
/// terminal side effect on browser hosts; no code after it runs there.
///
/// `auth_params` override the base authorization parameters; `redirect_uri`
/// defaults to the origin of the current location. `max_epoch_window`
/// defaults to [`DEFAULT_MAX_EPOCH_WINDOW`].
///
/// # Errors
///
/// - [`ZkLoginError::Validation`] if `providers_config` is empty
/// - [`ZkLoginError::Config`] if `provider` has no usable configuration;
///   this is checked before any side effect, so no setup data is committed
/// - [`ZkLoginError::Network`] if the current epoch cannot be fetched
/// - [`ZkLoginError::Flow`] for any other fault, with detail logged at the
///   point of detection
pub async fn begin_login<E: EpochSource>(
    host: &ZkLoginHost,
    epoch_source: &E,
    provider: OpenIdProvider,
    providers_config: &ProvidersConfig,
    auth_params: Option<AuthParams>,
    max_epoch_window: Option<u64>,
) -> Result<()> {
    begin_login_inner(
        host,
        epoch_source,
        provider,
        providers_config,
        auth_params,
        max_epoch_window,
    )
    .await
    .map_err(|err| match err {
        ZkLoginError::Validation { .. }
        | ZkLoginError::Config { .. }
        | ZkLoginError::Network { .. } => err,
        other => {
            log::error!("zklogin initiation failed: {other}");
            ZkLoginError::Flow
        }
    })
}

async fn begin_login_inner<E: EpochSource>(
    host: &ZkLoginHost,
    epoch_source: &E,
    provider: OpenIdProvider,
    providers_config: &ProvidersConfig,
    auth_params: Option<AuthParams>,
    max_epoch_window: Option<u64>,
) -> Result<()> {
    if providers_config.is_empty() {
        return Err(ZkLoginError::Validation {
            argument: "providers_config",
        });
    }
    // Resolved before any side effect so a misconfigured provider leaves no
    // dangling setup data.
    let provider_config =
        providers_config
            .get(&provider)
            .ok_or_else(|| ZkLoginError::Config {
                provider: provider.to_string(),
            })?;
    let mut auth_url =
        Url::parse(&provider_config.auth_url).map_err(|err| {
            log::error!("invalid auth_url for {provider}: {err}");
            ZkLoginError::Config {
                provider: provider.to_string(),
            }
        })?;

    let epoch = epoch_source.latest_epoch().await?;
    let max_valid_epoch = epoch + max_epoch_window.unwrap_or(DEFAULT_MAX_EPOCH_WINDOW);

    let keypair = host.crypto.ephemeral_keypair();
    let randomness = host.crypto.randomness();
    let nonce = host
        .crypto
        .nonce(&keypair.public_key, max_valid_epoch, &randomness);

    session::save_setup_data(
        host.storage.as_ref(),
        &SetupData {
            provider,
            max_epoch: max_valid_epoch,
            randomness,
            ephemeral_private_key: keypair.secret_key_encoded,
        },
    )?;

    let auth_params = auth_params.unwrap_or_default();
    let redirect_uri = match auth_params.redirect_uri {
        Some(uri) => uri,
        None => current_origin(&host.navigator.current_url())?,
    };
    let mut params: Vec<(String, String)> = vec![
        ("redirect_uri".to_string(), redirect_uri),
        (
            "response_type".to_string(),
            auth_params
                .response_type
                .unwrap_or_else(|| DEFAULT_OAUTH_RESPONSE_TYPE.to_string()),
        ),
        (
            "scope".to_string(),
            auth_params
                .scope
                .unwrap_or_else(|| DEFAULT_OAUTH_SCOPE.to_string()),
        ),
        ("nonce".to_string(), nonce),
    ];
    for (key, value) in &provider_config.extra_params {
        upsert(&mut params, key, value);
    }
    upsert(&mut params, "client_id", &provider_config.client_id);
    auth_url.query_pairs_mut().extend_pairs(params);

    host.navigator.navigate(auth_url.as_str());
    Ok(())
}

/// Later values win but keep the position of the key they replace, matching
/// how the original authorization parameters merged.
fn upsert(params: &mut Vec<(String, String)>, key: &str, value: &str) {
    if let Some(entry) = params.iter_mut().find(|(k, _)| k == key) {
        entry.1 = value.to_string();
    } else {
        params.push((key.to_string(), value.to_string()));
    }
}

fn current_origin(current_url: &str) -> Result<String> {
    let url = Url::parse(current_url).map_err(|err| {
        ZkLoginError::Serialization(format!("unparseable current location: {err}"))
    })?;
    Ok(url.origin().ascii_serialization())
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Arc;

    use crate::chain::StaticEpoch;
    use crate::fixtures::google_config;
    use crate::platform::memory::{MemoryCrypto, MemoryNavigator, MemoryStore};
    use crate::session::load_setup_data;

    use super::*;

    fn host() -> (ZkLoginHost, Arc<MemoryStore>, Arc<MemoryNavigator>) {
        let storage = Arc::new(MemoryStore::new());
        let navigator = Arc::new(MemoryNavigator::new("http://localhost:3000/login"));
        let host = ZkLoginHost::new(
            storage.clone(),
            navigator.clone(),
            Arc::new(MemoryCrypto::new()),
        );
        (host, storage, navigator)
    }

    fn google_providers() -> ProvidersConfig {
        HashMap::from([(OpenIdProvider::Google, google_config())])
    }

    #[tokio::test]
    async fn builds_authorization_url_with_defaults() {
        let (host, storage, navigator) = host();
        begin_login(
            &host,
            &StaticEpoch(5),
            OpenIdProvider::Google,
            &google_providers(),
            None,
            None,
        )
        .await
        .unwrap();

        let target = navigator.last_navigation().expect("navigated");
        let url = Url::parse(&target).unwrap();
        assert!(target.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        let pairs: HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs.get("client_id").map(String::as_str), Some("X"));
        assert_eq!(
            pairs.get("response_type").map(String::as_str),
            Some("id_token")
        );
        assert_eq!(pairs.get("scope").map(String::as_str), Some("openid"));
        assert_eq!(
            pairs.get("redirect_uri").map(String::as_str),
            Some("http://localhost:3000")
        );
        assert!(!pairs.get("nonce").unwrap().is_empty());

        let setup = load_setup_data(storage.as_ref()).unwrap().expect("setup");
        assert_eq!(setup.max_epoch, 7); // epoch 5 + default window 2
        assert_eq!(setup.provider, OpenIdProvider::Google);
    }

    #[tokio::test]
    async fn caller_params_and_extras_override_defaults() {
        let (host, _storage, navigator) = host();
        let mut config = google_config();
        config.extra_params =
            BTreeMap::from([("scope".to_string(), "openid email".to_string())]);
        let providers = HashMap::from([(OpenIdProvider::Google, config)]);

        begin_login(
            &host,
            &StaticEpoch(5),
            OpenIdProvider::Google,
            &providers,
            Some(AuthParams {
                redirect_uri: Some("https://app.example.com/cb".to_string()),
                response_type: None,
                scope: None,
            }),
            Some(10),
        )
        .await
        .unwrap();

        let url = Url::parse(&navigator.last_navigation().unwrap()).unwrap();
        let pairs: HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs.get("redirect_uri").map(String::as_str),
            Some("https://app.example.com/cb")
        );
        assert_eq!(pairs.get("scope").map(String::as_str), Some("openid email"));
        assert_eq!(url.query_pairs().count(), 5); // no duplicated scope key
    }

    #[tokio::test]
    async fn new_initiation_overwrites_pending_setup() {
        let (host, storage, _navigator) = host();
        let providers = google_providers();
        begin_login(
            &host,
            &StaticEpoch(5),
            OpenIdProvider::Google,
            &providers,
            None,
            None,
        )
        .await
        .unwrap();
        let first = load_setup_data(storage.as_ref()).unwrap().unwrap();

        begin_login(
            &host,
            &StaticEpoch(9),
            OpenIdProvider::Google,
            &providers,
            None,
            None,
        )
        .await
        .unwrap();
        let second = load_setup_data(storage.as_ref()).unwrap().unwrap();

        assert_eq!(second.max_epoch, 11);
        assert_ne!(first.ephemeral_private_key, second.ephemeral_private_key);
    }

    #[tokio::test]
    async fn unknown_provider_fails_without_committing_setup() {
        let (host, storage, navigator) = host();
        let err = begin_login(
            &host,
            &StaticEpoch(5),
            OpenIdProvider::Apple,
            &google_providers(),
            None,
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ZkLoginError::Config { ref provider } if provider == "apple"));
        assert!(load_setup_data(storage.as_ref()).unwrap().is_none());
        assert!(navigator.last_navigation().is_none());
    }

    #[tokio::test]
    async fn empty_config_map_is_a_validation_error() {
        let (host, _storage, _navigator) = host();
        let err = begin_login(
            &host,
            &StaticEpoch(5),
            OpenIdProvider::Google,
            &HashMap::new(),
            None,
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ZkLoginError::Validation { .. }));
    }

    #[tokio::test]
    async fn epoch_failure_surfaces_as_network_error() {
        struct FailingEpoch;
        impl EpochSource for FailingEpoch {
            async fn latest_epoch(&self) -> Result<u64> {
                Err(ZkLoginError::Network {
                    url: "http://chain.invalid".to_string(),
                    status: None,
                    error: "connection refused".to_string(),
                })
            }
        }

        let (host, storage, _navigator) = host();
        let err = begin_login(
            &host,
            &FailingEpoch,
            OpenIdProvider::Google,
            &google_providers(),
            None,
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ZkLoginError::Network { .. }));
        assert!(load_setup_data(storage.as_ref()).unwrap().is_none());
    }
}
