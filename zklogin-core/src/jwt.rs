//! Unverified decoding of OpenID identity tokens.
//!
//! Only the payload is decoded here; signature verification is the prover's
//! responsibility downstream and is deliberately not performed client-side.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::Deserialize;

use crate::error::{Result, ZkLoginError};

/// The `aud` claim, which providers deliver either as a single string or as
/// an array of strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    /// A single audience.
    Single(String),
    /// Multiple audiences; the first entry is treated as primary.
    Multiple(Vec<String>),
}

impl Audience {
    /// Returns the primary audience, if any.
    #[must_use]
    pub fn primary(&self) -> Option<&str> {
        match self {
            Self::Single(aud) => Some(aud.as_str()),
            Self::Multiple(auds) => auds.first().map(String::as_str),
        }
    }
}

/// Claims extracted from an identity token payload. Unknown claims are
/// ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtClaims {
    /// Subject identifier.
    pub sub: Option<String>,
    /// Audience identifier(s).
    pub aud: Option<Audience>,
    /// Email address, when the requested scopes include it.
    pub email: Option<String>,
    /// Email verification status.
    pub email_verified: Option<bool>,
}

/// Decodes the payload of a compact-serialized JWT without verifying its
/// signature.
///
/// # Errors
///
/// Returns [`ZkLoginError::Serialization`] if the token is not a three-part
/// compact serialization, the payload is not valid base64url, or the payload
/// is not a JSON object.
pub fn decode_claims(token: &str) -> Result<JwtClaims> {
    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => {
            return Err(ZkLoginError::Serialization(
                "identity token is not a compact JWT".to_string(),
            ))
        }
    };
    let bytes = URL_SAFE_NO_PAD.decode(payload).map_err(|err| {
        ZkLoginError::Serialization(format!("invalid token payload encoding: {err}"))
    })?;
    let claims = serde_json::from_slice(&bytes).map_err(|err| {
        ZkLoginError::Serialization(format!("invalid token payload json: {err}"))
    })?;
    Ok(claims)
}
