//! Persistence helpers over the host [`KeyValueStore`].
//!
//! Setup data lives in the [`StorageScope::Setup`] scope under
//! [`SETUP_DATA_KEY`]; the account list lives in [`StorageScope::Accounts`]
//! under [`ACCOUNT_DATA_KEY`]. Accounts are ordered newest-first.

use crate::defaults::{ACCOUNT_DATA_KEY, SETUP_DATA_KEY};
use crate::error::{Result, ZkLoginError};
use crate::platform::{KeyValueStore, StorageScope};
use crate::types::{AccountData, SetupData};

/// Persists `data` as the single pending setup, overwriting any prior one.
/// The write is a single key update: either the full blob commits or
/// nothing does.
///
/// # Errors
///
/// Fails on serialization or storage backend errors.
pub fn save_setup_data(store: &dyn KeyValueStore, data: &SetupData) -> Result<()> {
    let blob = serde_json::to_string(data)?;
    store.set(StorageScope::Setup, SETUP_DATA_KEY, &blob)?;
    Ok(())
}

/// Loads the pending setup data, if any.
///
/// # Errors
///
/// Fails on storage backend errors or if the stored blob is corrupt.
pub fn load_setup_data(store: &dyn KeyValueStore) -> Result<Option<SetupData>> {
    let Some(blob) = store.get(StorageScope::Setup, SETUP_DATA_KEY)? else {
        return Ok(None);
    };
    let data = serde_json::from_str(&blob).map_err(|err| {
        ZkLoginError::Serialization(format!("corrupt setup data: {err}"))
    })?;
    Ok(Some(data))
}

/// Deletes the pending setup data. Deleting when none exists is a no-op.
///
/// # Errors
///
/// Fails on storage backend errors.
pub fn clear_setup_data(store: &dyn KeyValueStore) -> Result<()> {
    store.delete(StorageScope::Setup, SETUP_DATA_KEY)?;
    Ok(())
}

/// Loads all stored accounts, newest first. An absent blob is an empty list.
///
/// # Errors
///
/// Fails on storage backend errors or if the stored blob is corrupt.
pub fn load_accounts(store: &dyn KeyValueStore) -> Result<Vec<AccountData>> {
    let Some(blob) = store.get(StorageScope::Accounts, ACCOUNT_DATA_KEY)? else {
        return Ok(Vec::new());
    };
    let accounts = serde_json::from_str(&blob).map_err(|err| {
        ZkLoginError::Serialization(format!("corrupt account list: {err}"))
    })?;
    Ok(accounts)
}

fn store_accounts(store: &dyn KeyValueStore, accounts: &[AccountData]) -> Result<()> {
    let blob = serde_json::to_string(accounts)?;
    store.set(StorageScope::Accounts, ACCOUNT_DATA_KEY, &blob)?;
    Ok(())
}

/// Prepends `account` to the stored list and returns the updated list.
///
/// # Errors
///
/// Fails on serialization or storage backend errors.
pub fn save_account(
    store: &dyn KeyValueStore,
    account: AccountData,
) -> Result<Vec<AccountData>> {
    let mut accounts = load_accounts(store)?;
    accounts.insert(0, account);
    store_accounts(store, &accounts)?;
    Ok(accounts)
}

/// Removes every stored account.
///
/// # Errors
///
/// Fails on storage backend errors.
pub fn clear_accounts(store: &dyn KeyValueStore) -> Result<()> {
    store.delete(StorageScope::Accounts, ACCOUNT_DATA_KEY)?;
    Ok(())
}

/// Removes the account whose `user_addr` matches `addr`, preserving the
/// order of the remainder, and returns the updated list.
///
/// # Errors
///
/// Fails on serialization or storage backend errors.
pub fn clear_account(
    store: &dyn KeyValueStore,
    addr: &str,
) -> Result<Vec<AccountData>> {
    let mut accounts = load_accounts(store)?;
    accounts.retain(|account| account.user_addr != addr);
    store_accounts(store, &accounts)?;
    Ok(accounts)
}
