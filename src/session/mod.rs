//! Session State
//!
//! Who is signed in and which wallet is active, shared by every screen:
//! - Injected service with explicit `initialize()` / `reset()`
//! - Snapshot of `{user, wallet, is_authenticated}` persisted on every change
//! - Pluggable backend ([`MemoryStore`], [`FileStore`])
//!
//! The loading flag is runtime-only and the wallet PIN is never written.

pub mod store;

pub use store::{FileStore, MemoryStore, SessionStore, STORAGE_KEY};

use crate::config::AppConfig;
use crate::error::{MundoError, MundoResult};
use crate::types::{AccountUser, WalletRecord};
use serde::{Deserialize, Serialize};
use std::sync::{RwLock, RwLockWriteGuard};

const MODULE: &str = "session";

/// Bumped when the persisted layout changes
const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub user: Option<AccountUser>,
    pub wallet: Option<WalletRecord>,
    pub is_loading: bool,
    pub is_authenticated: bool,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedSession {
    version: u32,
    user: Option<AccountUser>,
    wallet: Option<WalletRecord>,
    is_authenticated: bool,
}

pub struct SessionService {
    state: RwLock<SessionState>,
    store: Box<dyn SessionStore>,
}

impl SessionService {
    pub fn new(store: Box<dyn SessionStore>) -> Self {
        Self {
            state: RwLock::new(SessionState::default()),
            store,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }

    /// File-backed when `config.session_file` is set, in-memory otherwise
    pub fn from_config(config: &AppConfig) -> Self {
        match &config.session_file {
            Some(path) => Self::new(Box::new(FileStore::new(path.clone()))),
            None => Self::in_memory(),
        }
    }

    /// Load the persisted snapshot. A snapshot that cannot be parsed is
    /// discarded and the session starts signed out.
    pub fn initialize(&self) -> MundoResult<SessionState> {
        let restored = match self.store.read()? {
            Some(raw) => match serde_json::from_str::<PersistedSession>(&raw) {
                Ok(snapshot) if snapshot.version == SNAPSHOT_VERSION => SessionState {
                    user: snapshot.user,
                    wallet: snapshot.wallet,
                    is_loading: false,
                    is_authenticated: snapshot.is_authenticated,
                },
                Ok(snapshot) => {
                    crate::log_warn!(MODULE, "Discarding snapshot from another version", version = snapshot.version);
                    self.store.clear()?;
                    SessionState::default()
                }
                Err(e) => {
                    crate::log_warn!(MODULE, "Discarding unreadable snapshot", reason = e);
                    self.store.clear()?;
                    SessionState::default()
                }
            },
            None => SessionState::default(),
        };

        crate::log_debug!(
            MODULE,
            "Session initialized",
            authenticated = restored.is_authenticated,
            has_wallet = restored.wallet.is_some(),
        );

        *self.write_state()? = restored.clone();
        Ok(restored)
    }

    /// Drop all state, in memory and in the store
    pub fn reset(&self) -> MundoResult<()> {
        let mut state = self.write_state()?;
        self.store.clear()?;
        *state = SessionState::default();
        Ok(())
    }

    pub fn state(&self) -> MundoResult<SessionState> {
        Ok(self
            .state
            .read()
            .map_err(|_| MundoError::internal("Session lock poisoned"))?
            .clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().map(|s| s.is_authenticated).unwrap_or(false)
    }

    pub fn set_user(&self, user: Option<AccountUser>) -> MundoResult<()> {
        self.update(|state| {
            state.is_authenticated = user.is_some() || state.wallet.is_some();
            state.user = user;
            state.is_loading = false;
        })
    }

    /// Store the wallet a wizard just produced (or clear it)
    pub fn set_wallet(&self, wallet: Option<WalletRecord>) -> MundoResult<()> {
        if let Some(w) = &wallet {
            crate::log_info!(MODULE, "Active wallet set", name = w.name, address = w.address);
        }
        self.update(|state| {
            state.is_authenticated = wallet.is_some() || state.user.is_some();
            state.wallet = wallet;
        })
    }

    pub fn set_loading(&self, is_loading: bool) -> MundoResult<()> {
        self.write_state()?.is_loading = is_loading;
        Ok(())
    }

    /// Clear the wallet's one-time celebration flag. Returns whether it was set.
    pub fn acknowledge_celebration(&self) -> MundoResult<bool> {
        let mut was_set = false;
        self.update(|state| {
            if let Some(wallet) = state.wallet.as_mut() {
                was_set = wallet.just_created;
                wallet.acknowledge_celebration();
            }
        })?;
        Ok(was_set)
    }

    pub fn sign_out(&self) -> MundoResult<()> {
        crate::log_info!(MODULE, "Signing out");
        self.update(|state| *state = SessionState::default())
    }

    fn write_state(&self) -> MundoResult<RwLockWriteGuard<'_, SessionState>> {
        self.state
            .write()
            .map_err(|_| MundoError::internal("Session lock poisoned"))
    }

    /// Apply a change and persist it; memory is only updated once the write succeeds
    fn update(&self, apply: impl FnOnce(&mut SessionState)) -> MundoResult<()> {
        let mut state = self.write_state()?;
        let mut next = state.clone();
        apply(&mut next);

        let snapshot = PersistedSession {
            version: SNAPSHOT_VERSION,
            user: next.user.clone(),
            wallet: next.wallet.clone(),
            is_authenticated: next.is_authenticated,
        };
        self.store.write(&serde_json::to_string(&snapshot)?)?;

        *state = next;
        Ok(())
    }
}
