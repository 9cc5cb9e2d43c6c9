//! Login completion: token consumption, address derivation, proof fetch,
//! and account commit.

use url::Url;

use crate::error::{Result, ZkLoginError};
use crate::host::ZkLoginHost;
use crate::jwt;
use crate::prover::{ProofRequest, ProverClient};
use crate::salt::SaltProvider;
use crate::session;
use crate::types::AccountData;

/// Result of a successful completion.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// The full updated account list, newest first.
    pub accounts: Vec<AccountData>,
    /// The newly added account's address.
    pub address: String,
}

/// Resumes a zkLogin flow after the provider redirect.
///
/// Returns `Ok(None)` for every "nothing to do" condition: no identity token
/// in the current URL, token missing `sub` or `aud`, the salt provider
/// yielding nothing, no pending setup data, or the derived address already
/// stored. The identity token is consumed on extraction (stripped from the
/// visible URL) and the pending setup data is deleted unconditionally once
/// loaded, before the duplicate check and the proof request: a consumed
/// setup cannot be retried, which prevents replay of the ephemeral key
/// material. A duplicate address therefore never incurs a prover call, and a
/// transient prover outage requires restarting at
/// [`begin_login`](crate::begin::begin_login).
///
/// # Errors
///
/// - [`ZkLoginError::Prover`] if the proof request errors or the service
///   returns a non-success status
/// - [`ZkLoginError::Flow`] for any other unexpected fault, with detail
///   logged at the point of detection
pub async fn complete_login<S: SaltProvider>(
    host: &ZkLoginHost,
    prover: &ProverClient,
    salt_provider: &S,
) -> Result<Option<LoginOutcome>> {
    complete_login_inner(host, prover, salt_provider)
        .await
        .map_err(|err| match err {
            ZkLoginError::Prover { .. } => err,
            other => {
                log::error!("zklogin completion failed: {other}");
                ZkLoginError::Flow
            }
        })
}

async fn complete_login_inner<S: SaltProvider>(
    host: &ZkLoginHost,
    prover: &ProverClient,
    salt_provider: &S,
) -> Result<Option<LoginOutcome>> {
    let Some(token) = consume_identity_token(host) else {
        return Ok(None);
    };

    let claims = jwt::decode_claims(&token)?;
    let (Some(sub), Some(aud)) = (claims.sub.clone(), primary_aud(&claims)) else {
        log::warn!("identity token is missing sub or aud");
        return Ok(None);
    };

    let Some(salt) = salt_provider.generate(&token).await? else {
        log::warn!("salt provider yielded no salt");
        return Ok(None);
    };
    let user_salt = salt.salt.to_string();

    let user_addr = host.crypto.derive_address(&token, &user_salt)?;

    let Some(setup) = session::load_setup_data(host.storage.as_ref())? else {
        log::warn!("no pending setup data for this login");
        return Ok(None);
    };
    // One-time use: the setup is gone regardless of what happens next.
    session::clear_setup_data(host.storage.as_ref())?;

    let accounts = session::load_accounts(host.storage.as_ref())?;
    if accounts.iter().any(|account| account.user_addr == user_addr) {
        log::warn!("already logged in with this {} account", setup.provider);
        return Ok(None);
    }

    let extended_public_key = host
        .crypto
        .extended_public_key(&setup.ephemeral_private_key)?;
    let zk_proofs = prover
        .fetch_proofs(&ProofRequest::new(
            setup.max_epoch,
            &setup.randomness,
            &extended_public_key,
            &token,
            &user_salt,
        ))
        .await?;

    let account = AccountData {
        provider: setup.provider,
        user_addr: user_addr.clone(),
        zk_proofs,
        ephemeral_private_key: setup.ephemeral_private_key,
        user_salt,
        sub,
        aud,
        max_epoch: setup.max_epoch,
        email: claims.email,
        email_verified: claims.email_verified,
    };
    let accounts = session::save_account(host.storage.as_ref(), account)?;

    Ok(Some(LoginOutcome {
        accounts,
        address: user_addr,
    }))
}

fn primary_aud(claims: &jwt::JwtClaims) -> Option<String> {
    claims
        .aud
        .as_ref()
        .and_then(jwt::Audience::primary)
        .map(ToString::to_string)
}

/// Extracts `id_token` from the current location's fragment and immediately
/// strips query and fragment from the visible URL, so re-invocation sees no
/// token.
fn consume_identity_token(host: &ZkLoginHost) -> Option<String> {
    let current = host.navigator.current_url();
    let Ok(url) = Url::parse(&current) else {
        log::warn!("current location is not a parseable URL");
        return None;
    };
    let fragment = url.fragment()?;
    let token = url::form_urlencoded::parse(fragment.as_bytes())
        .find(|(key, _)| key == "id_token")
        .map(|(_, value)| value.into_owned())?;

    let mut stripped = url.clone();
    stripped.set_fragment(None);
    stripped.set_query(None);
    host.navigator.rewrite_url(stripped.as_str());

    Some(token)
}
