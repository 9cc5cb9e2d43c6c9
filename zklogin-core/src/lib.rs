//! Client-side zkLogin session protocol.
//!
//! zkLogin turns an OpenID Connect login into a deterministic blockchain
//! address via a two-phase handshake:
//!
//! 1. [`begin_login`] generates ephemeral key material, binds it into a
//!    nonce, persists setup data, and navigates to the identity provider.
//! 2. After the provider redirect, [`complete_login`] consumes the returned
//!    identity token, obtains the user's salt, derives the account address,
//!    fetches a zero-knowledge proof from a remote prover, and commits the
//!    new account.
//!
//! [`ZkLoginStore`] keeps the in-memory, observable reflection of the
//! persisted accounts so UI layers can subscribe to state changes. Host
//! surfaces (storage, navigation, identity crypto) are injected through the
//! traits in [`platform`] and [`crypto`], so the core runs unchanged in
//! browsers, native shells, and tests.
//!
//! Proof generation and verification, transaction submission, and key
//! custody beyond the ephemeral session key are out of scope and belong to
//! external collaborators.
#![deny(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod begin;
pub mod chain;
pub mod complete;
pub mod crypto;
pub mod defaults;
pub mod error;
pub mod host;
pub mod jwt;
pub mod platform;
pub mod prover;
pub mod salt;
pub mod session;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod fixtures;

pub use begin::begin_login;
pub use complete::{complete_login, LoginOutcome};
pub use error::{Result, ZkLoginError};
pub use host::ZkLoginHost;
pub use store::{Snapshot, Subscription, ZkLoginStore};
pub use types::{
    AccountData, AuthParams, OpenIdConfig, OpenIdProvider, ProvidersConfig, SetupData,
    ZkProofs,
};
