//! Observable session state.
//!
//! [`ZkLoginStore`] owns the in-memory reflection of the durable account
//! list and is the only writer of observable state. UI layers hold
//! subscriptions, never authoritative state. The store is a constructible
//! instance rather than a hidden global; hosts that want process-wide state
//! keep one instance alive and clone handles to it.
//!
//! Registration and the completion attempt are separate operations:
//! [`ZkLoginStore::subscribe`] only registers an observer, and UI glue is
//! expected to call [`ZkLoginStore::load`] when a view attaches. The
//! single-flight guard makes that safe no matter how many views attach
//! concurrently; only the first `load` runs the completer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::Result;
use crate::host::ZkLoginHost;
use crate::prover::ProverClient;
use crate::salt::SaltProvider;
use crate::session;
use crate::types::AccountData;

/// Read-only view of the session state.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Whether a completion attempt has finished (successfully or not).
    /// Latches true exactly once per store lifetime and never reverts.
    pub is_loaded: bool,
    /// The newest account's address, or empty when no account is stored.
    pub address: String,
    /// All stored accounts, newest first.
    pub accounts: Vec<AccountData>,
}

/// Lifecycle of the single completion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadState {
    NotStarted,
    InProgress,
    Done,
}

struct StoreState {
    accounts: Vec<AccountData>,
    address: String,
    load: LoadState,
}

type ObserverFn = Arc<dyn Fn() + Send + Sync>;

struct Shared {
    host: ZkLoginHost,
    state: Mutex<StoreState>,
    observers: Mutex<Vec<(u64, ObserverFn)>>,
    next_observer: AtomicU64,
    // Single-flight guard for the completion attempt: whoever holds it runs
    // the completer; everyone else is a no-op.
    flight: tokio::sync::Mutex<()>,
}

/// The process's zkLogin session store. Cloning yields another handle to the
/// same state.
#[derive(Clone)]
pub struct ZkLoginStore {
    shared: Arc<Shared>,
}

/// Handle returned by [`ZkLoginStore::subscribe`]. The observer stays
/// registered until this handle is dropped or
/// [`unsubscribe`](Subscription::unsubscribe) is called.
pub struct Subscription {
    shared: Arc<Shared>,
    id: u64,
}

impl Subscription {
    /// Removes the observer. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut observers = self
            .shared
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        observers.retain(|(id, _)| *id != self.id);
    }
}

impl ZkLoginStore {
    /// Creates a store seeded from durable storage: every previously
    /// persisted account is loaded and `address` reflects the newest one.
    ///
    /// # Errors
    ///
    /// Fails if the account scope cannot be read or holds a corrupt blob.
    pub fn new(host: ZkLoginHost) -> Result<Self> {
        let accounts = session::load_accounts(host.storage.as_ref())?;
        let address = newest_address(&accounts);
        Ok(Self {
            shared: Arc::new(Shared {
                host,
                state: Mutex::new(StoreState {
                    accounts,
                    address,
                    load: LoadState::NotStarted,
                }),
                observers: Mutex::new(Vec::new()),
                next_observer: AtomicU64::new(0),
                flight: tokio::sync::Mutex::new(()),
            }),
        })
    }

    /// Returns the current state.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let state = self
            .shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Snapshot {
            is_loaded: state.load == LoadState::Done,
            address: state.address.clone(),
            accounts: state.accounts.clone(),
        }
    }

    /// Registers `observer` to be called after every state change.
    #[must_use]
    pub fn subscribe(&self, observer: impl Fn() + Send + Sync + 'static) -> Subscription {
        let id = self.shared.next_observer.fetch_add(1, Ordering::Relaxed);
        self.shared
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(observer)));
        Subscription {
            shared: Arc::clone(&self.shared),
            id,
        }
    }

    /// Runs the login completer at most once per store lifetime and returns
    /// the resulting state.
    ///
    /// The first caller performs the completion attempt; calls made while
    /// that attempt is in flight, or after it finished, do not trigger
    /// another one. `is_loaded` becomes true when the attempt finishes,
    /// even if it failed; completion errors are logged, not returned, so
    /// observers can poll without exception noise.
    pub async fn load<S: SaltProvider>(
        &self,
        prover: &ProverClient,
        salt_provider: &S,
    ) -> Snapshot {
        if self.load_state() != LoadState::NotStarted {
            return self.snapshot();
        }
        let Ok(_guard) = self.shared.flight.try_lock() else {
            return self.snapshot();
        };
        // Re-check under the guard: a previous holder may have finished
        // between the state read and the lock.
        {
            let mut state = self
                .shared
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if state.load != LoadState::NotStarted {
                return self.snapshot();
            }
            state.load = LoadState::InProgress;
        }

        let result =
            crate::complete::complete_login(&self.shared.host, prover, salt_provider)
                .await;

        {
            let mut state = self
                .shared
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match &result {
                Ok(Some(outcome)) => {
                    state.accounts.clone_from(&outcome.accounts);
                    state.address.clone_from(&outcome.address);
                }
                Ok(None) => {}
                Err(err) => log::error!("error during zklogin load: {err}"),
            }
            state.load = LoadState::Done;
        }
        self.notify();
        self.snapshot()
    }

    /// Clears all durable accounts and resets the in-memory state.
    /// Observers are notified synchronously.
    ///
    /// # Errors
    ///
    /// Fails if the account scope cannot be cleared; in-memory state is left
    /// untouched in that case.
    pub fn sign_out(&self) -> Result<()> {
        session::clear_accounts(self.shared.host.storage.as_ref())?;
        {
            let mut state = self
                .shared
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            state.accounts.clear();
            state.address.clear();
        }
        self.notify();
        Ok(())
    }

    /// Removes one account by address from durable storage, recomputes
    /// `address`, and notifies observers.
    ///
    /// # Errors
    ///
    /// Fails if the account scope cannot be updated; in-memory state is left
    /// untouched in that case.
    pub fn clear_account(&self, addr: &str) -> Result<()> {
        let accounts = session::clear_account(self.shared.host.storage.as_ref(), addr)?;
        {
            let mut state = self
                .shared
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            state.address = newest_address(&accounts);
            state.accounts = accounts;
        }
        self.notify();
        Ok(())
    }

    fn load_state(&self) -> LoadState {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .load
    }

    fn notify(&self) {
        // Snapshot the observer list so callbacks can re-enter the store.
        let observers: Vec<ObserverFn> = self
            .shared
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in observers {
            observer();
        }
    }
}

impl std::fmt::Debug for ZkLoginStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZkLoginStore").finish_non_exhaustive()
    }
}

fn newest_address(accounts: &[AccountData]) -> String {
    accounts
        .first()
        .map(|account| account.user_addr.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use crate::fixtures;
    use crate::platform::memory::{MemoryCrypto, MemoryNavigator, MemoryStore};
    use crate::salt::{FixedSalt, SaltFn, SaltResponse};
    use crate::session::save_account;

    use super::*;

    fn host_with(accounts: &[&str]) -> (ZkLoginHost, Arc<MemoryNavigator>) {
        let storage = Arc::new(MemoryStore::new());
        // save oldest first so the listed order is newest-first
        for addr in accounts.iter().rev() {
            save_account(storage.as_ref(), fixtures::account(addr)).unwrap();
        }
        let navigator = Arc::new(MemoryNavigator::new("http://localhost:3000/"));
        let host = ZkLoginHost::new(
            storage,
            navigator.clone(),
            Arc::new(MemoryCrypto::new()),
        );
        (host, navigator)
    }

    #[test]
    fn seeds_from_durable_storage() {
        let (host, _nav) = host_with(&["0xa", "0xb"]);
        let store = ZkLoginStore::new(host).unwrap();
        let snapshot = store.snapshot();
        assert!(!snapshot.is_loaded);
        assert_eq!(snapshot.address, "0xa");
        assert_eq!(snapshot.accounts.len(), 2);
    }

    #[test]
    fn clear_account_recomputes_address() {
        let (host, _nav) = host_with(&["0xa", "0xb", "0xc"]);
        let store = ZkLoginStore::new(host).unwrap();

        store.clear_account("0xb").unwrap();
        let snapshot = store.snapshot();
        let addrs: Vec<_> = snapshot
            .accounts
            .iter()
            .map(|a| a.user_addr.as_str())
            .collect();
        assert_eq!(addrs, vec!["0xa", "0xc"]);
        assert_eq!(snapshot.address, "0xa");

        store.clear_account("0xa").unwrap();
        store.clear_account("0xc").unwrap();
        assert_eq!(store.snapshot().address, "");
    }

    #[test]
    fn sign_out_clears_memory_and_storage() {
        let (host, _nav) = host_with(&["0xa"]);
        let storage = Arc::clone(&host.storage);
        let store = ZkLoginStore::new(host).unwrap();

        store.sign_out().unwrap();
        assert!(store.snapshot().accounts.is_empty());
        assert_eq!(store.snapshot().address, "");
        // a fresh process load also sees zero accounts
        assert!(session::load_accounts(storage.as_ref()).unwrap().is_empty());
    }

    #[test]
    fn observers_are_notified_until_unsubscribed() {
        let (host, _nav) = host_with(&["0xa", "0xb"]);
        let store = ZkLoginStore::new(host).unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let observed = Arc::clone(&calls);
        let subscription =
            store.subscribe(move || drop(observed.fetch_add(1, Ordering::SeqCst)));

        store.clear_account("0xb").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        subscription.unsubscribe();
        store.sign_out().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn load_with_no_token_latches_is_loaded() {
        let (host, _nav) = host_with(&[]);
        let store = ZkLoginStore::new(host).unwrap();
        let prover = ProverClient::new("http://prover.invalid");

        let snapshot = store.load(&prover, &FixedSalt(1)).await;
        assert!(snapshot.is_loaded);
        assert!(snapshot.accounts.is_empty());

        // idempotent thereafter
        let snapshot = store.load(&prover, &FixedSalt(1)).await;
        assert!(snapshot.is_loaded);
    }

    #[tokio::test]
    async fn load_runs_the_completer_at_most_once() {
        let (host, _nav) = host_with(&[]);
        let store = ZkLoginStore::new(host).unwrap();
        let prover = ProverClient::new("http://prover.invalid");

        let salt_calls = Arc::new(AtomicUsize::new(0));
        let counting = SaltFn({
            let salt_calls = Arc::clone(&salt_calls);
            move |_token: String| {
                let salt_calls = Arc::clone(&salt_calls);
                async move {
                    salt_calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, crate::error::ZkLoginError>(Some(SaltResponse { salt: 1 }))
                }
            }
        });

        // no token is present, so the attempt resolves quickly; the salt
        // provider is never reached and the attempt still counts as done
        let first = store.load(&prover, &counting).await;
        let second = store.load(&prover, &counting).await;
        assert!(first.is_loaded && second.is_loaded);
        assert_eq!(salt_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn concurrent_loads_run_the_completer_at_most_once() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/prove")
            .with_status(200)
            .with_body(r#"{"proof":"p","publicInputs":[],"verified":true}"#)
            .expect(1)
            .create_async()
            .await;

        let (host, navigator) = host_with(&[]);
        crate::session::save_setup_data(
            host.storage.as_ref(),
            &crate::types::SetupData {
                provider: crate::types::OpenIdProvider::Google,
                max_epoch: 7,
                randomness: "3".to_string(),
                ephemeral_private_key: hex::encode([9u8; 32]),
            },
        )
        .unwrap();
        navigator.set_current_url(&format!(
            "http://localhost:3000/#id_token={}",
            fixtures::token("u1", "app1")
        ));

        let store = ZkLoginStore::new(host).unwrap();
        let other = store.clone();
        let prover = ProverClient::new(&format!("{}/prove", server.url()));

        let salt_calls = Arc::new(AtomicUsize::new(0));
        let salt = SaltFn({
            let salt_calls = Arc::clone(&salt_calls);
            move |_token: String| {
                let salt_calls = Arc::clone(&salt_calls);
                async move {
                    salt_calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, crate::error::ZkLoginError>(Some(SaltResponse { salt: 1 }))
                }
            }
        });

        // Two handles race the same attempt: whichever one takes the
        // single-flight guard completes; the other is a no-op.
        let (first, second) =
            tokio::join!(store.load(&prover, &salt), other.load(&prover, &salt));

        mock.assert_async().await; // exactly one prover call
        assert_eq!(salt_calls.load(Ordering::SeqCst), 1);
        assert!(first.is_loaded || second.is_loaded);
        let snapshot = store.snapshot();
        assert!(snapshot.is_loaded);
        assert_eq!(snapshot.accounts.len(), 1);
        assert_eq!(snapshot.address, snapshot.accounts[0].user_addr);
    }

    #[tokio::test]
    async fn load_failure_still_latches_and_notifies() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/prove")
            .with_status(500)
            .with_body("down")
            .create_async()
            .await;

        let (host, navigator) = host_with(&[]);
        crate::session::save_setup_data(
            host.storage.as_ref(),
            &crate::types::SetupData {
                provider: crate::types::OpenIdProvider::Google,
                max_epoch: 7,
                randomness: "3".to_string(),
                ephemeral_private_key: hex::encode([9u8; 32]),
            },
        )
        .unwrap();
        navigator.set_current_url(&format!(
            "http://localhost:3000/#id_token={}",
            fixtures::token("u1", "app1")
        ));

        let store = ZkLoginStore::new(host).unwrap();
        let notified = Arc::new(AtomicUsize::new(0));
        let observed = Arc::clone(&notified);
        let _subscription =
            store.subscribe(move || drop(observed.fetch_add(1, Ordering::SeqCst)));

        let prover = ProverClient::new(&format!("{}/prove", server.url()));
        let snapshot = store.load(&prover, &FixedSalt(1)).await;
        assert!(snapshot.is_loaded);
        assert!(snapshot.accounts.is_empty());
        assert_eq!(notified.load(Ordering::SeqCst), 1);
    }
}
