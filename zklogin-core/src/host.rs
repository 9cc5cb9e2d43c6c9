//! The bundle of host capabilities injected into the flows.

use std::sync::Arc;

use crate::crypto::IdentityCrypto;
use crate::platform::{KeyValueStore, Navigator};

/// Host capabilities the flows and the session store operate against.
///
/// Cloning is cheap; all members are shared.
#[derive(Clone)]
pub struct ZkLoginHost {
    /// Durable key-value persistence.
    pub storage: Arc<dyn KeyValueStore>,
    /// URL and navigation surface.
    pub navigator: Arc<dyn Navigator>,
    /// Identity crypto adapter.
    pub crypto: Arc<dyn IdentityCrypto>,
}

impl ZkLoginHost {
    /// Bundles the three capabilities.
    #[must_use]
    pub fn new(
        storage: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn Navigator>,
        crypto: Arc<dyn IdentityCrypto>,
    ) -> Self {
        Self {
            storage,
            navigator,
            crypto,
        }
    }
}

impl std::fmt::Debug for ZkLoginHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZkLoginHost").finish_non_exhaustive()
    }
}
