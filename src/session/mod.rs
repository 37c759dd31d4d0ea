//! The unlock protocol around a `VaultStore`.
//!
//! A `Session` is either `LoggedOut` (no key in memory) or `LoggedIn`
//! (an unlocked `VaultStore` behind a mutex).  Every record operation
//! goes through the same mutex, checks the idle deadline first and then
//! counts as activity.  An `IdleWatcher` thread takes that mutex too and
//! locks the session when the deadline passes, so an auto-lock can never
//! land in the middle of a write.

mod idle;

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, info};

use crate::config::Settings;
use crate::crypto::Argon2Params;
use crate::errors::{Result, VaultError};
use crate::vault::{
    self, CredentialRecord, NewRecord, RecordSort, RecordUpdate, VaultPaths, VaultStore,
};

pub use idle::IdleWatcher;

/// Whether a session currently holds the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    LoggedIn,
}

/// State shared between a `Session` and its `IdleWatcher`.
pub(crate) struct Shared {
    pub(crate) state: Mutex<Inner>,
    pub(crate) wake: Condvar,
}

pub(crate) struct Inner {
    store: Option<VaultStore>,
    last_activity: Instant,
    idle_timeout: Duration,
    /// Set when the idle timeout (not the user) locked the session.
    auto_locked: bool,
    pub(crate) shutdown: bool,
}

impl Inner {
    /// When the session will lock itself, if it will at all.
    pub(crate) fn deadline(&self) -> Option<Instant> {
        if self.store.is_none() || self.idle_timeout.is_zero() {
            return None;
        }
        self.last_activity.checked_add(self.idle_timeout)
    }

    /// Lock if the deadline has passed.  Returns `true` if it did.
    pub(crate) fn expire_if_idle(&mut self, now: Instant) -> bool {
        match self.deadline() {
            Some(deadline) if now >= deadline => {
                info!(timeout = ?self.idle_timeout, "session locked after inactivity");
                self.close();
                self.auto_locked = true;
                true
            }
            _ => false,
        }
    }

    fn close(&mut self) {
        if let Some(store) = self.store.take() {
            store.lock();
        }
    }
}

/// A login session over one vault installation.
pub struct Session {
    paths: VaultPaths,
    params: Argon2Params,
    shared: Arc<Shared>,
    _watcher: IdleWatcher,
}

impl Session {
    /// Create a logged-out session using the installation's settings.
    pub fn new(paths: VaultPaths, settings: &Settings) -> Result<Self> {
        Self::with_options(paths, settings.argon2_params(), settings.auto_lock())
    }

    /// Create a logged-out session with explicit KDF params (used only when
    /// a new vault is created) and idle timeout (`Duration::ZERO` disables).
    pub fn with_options(
        paths: VaultPaths,
        params: Argon2Params,
        idle_timeout: Duration,
    ) -> Result<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(Inner {
                store: None,
                last_activity: Instant::now(),
                idle_timeout,
                auto_locked: false,
                shutdown: false,
            }),
            wake: Condvar::new(),
        });

        let watcher = IdleWatcher::spawn(Arc::clone(&shared))
            .map_err(|e| VaultError::CommandFailed(format!("start idle watcher: {e}")))?;

        Ok(Self {
            paths,
            params,
            shared,
            _watcher: watcher,
        })
    }

    pub fn paths(&self) -> &VaultPaths {
        &self.paths
    }

    /// `true` when no vault exists yet; the next unlock creates one.
    pub fn is_new_user(&self) -> bool {
        !self.paths.vault_exists()
    }

    pub fn state(&self) -> SessionState {
        let mut inner = self.shared.state.lock();
        inner.expire_if_idle(Instant::now());
        if inner.store.is_some() {
            SessionState::LoggedIn
        } else {
            SessionState::LoggedOut
        }
    }

    /// Unlock (or create) the vault and return its records.
    ///
    /// An already unlocked session is re-opened from disk.  A failed
    /// attempt leaves the session in whatever state it was in.
    pub fn unlock(&self, password: &[u8]) -> Result<Vec<CredentialRecord>> {
        let mut inner = self.shared.state.lock();
        inner.expire_if_idle(Instant::now());

        let store = VaultStore::unlock(&self.paths, password, &self.params)?;
        let records = store.list_records().to_vec();

        inner.close();
        inner.store = Some(store);
        inner.last_activity = Instant::now();
        inner.auto_locked = false;
        drop(inner);

        self.shared.wake.notify_all();
        debug!("session logged in");
        Ok(records)
    }

    /// Drop the key and all decrypted records.
    pub fn lock(&self) {
        let mut inner = self.shared.state.lock();
        inner.close();
        drop(inner);
        self.shared.wake.notify_all();
        debug!("session logged out");
    }

    /// Reset the idle timer.  A locked session is unaffected.
    pub fn record_activity(&self) {
        let mut inner = self.shared.state.lock();
        if !inner.expire_if_idle(Instant::now()) && inner.store.is_some() {
            inner.last_activity = Instant::now();
        }
    }

    /// Time left before the session locks itself.
    ///
    /// `None` when logged out or when auto-lock is disabled.
    pub fn time_until_lock(&self) -> Option<Duration> {
        let mut inner = self.shared.state.lock();
        let now = Instant::now();
        inner.expire_if_idle(now);
        inner.deadline().map(|deadline| deadline.saturating_duration_since(now))
    }

    pub fn idle_timeout(&self) -> Duration {
        self.shared.state.lock().idle_timeout
    }

    /// Change the idle timeout.  `Duration::ZERO` disables auto-lock.
    pub fn set_idle_timeout(&self, timeout: Duration) {
        self.shared.state.lock().idle_timeout = timeout;
        self.shared.wake.notify_all();
    }

    /// Returns `true` once after the idle timeout locked the session.
    pub fn take_auto_locked(&self) -> bool {
        let mut inner = self.shared.state.lock();
        inner.expire_if_idle(Instant::now());
        std::mem::take(&mut inner.auto_locked)
    }

    // ------------------------------------------------------------------
    // Record operations (require LoggedIn)
    // ------------------------------------------------------------------

    pub fn add_record(&self, input: &NewRecord) -> Result<CredentialRecord> {
        self.with_store(|store| store.add_record(input))
    }

    pub fn update_record(&self, id: u64, update: &RecordUpdate) -> Result<CredentialRecord> {
        self.with_store(|store| store.update_record(id, update))
    }

    pub fn delete_record(&self, id: u64) -> Result<()> {
        self.with_store(|store| store.delete_record(id))
    }

    /// All records in insertion order.
    pub fn list_records(&self) -> Result<Vec<CredentialRecord>> {
        self.with_store(|store| Ok(store.list_records().to_vec()))
    }

    pub fn sorted_records(&self, sort: RecordSort) -> Result<Vec<CredentialRecord>> {
        self.with_store(|store| Ok(store.sorted_records(sort)))
    }

    pub fn search_records(&self, query: &str) -> Result<Vec<CredentialRecord>> {
        self.with_store(|store| Ok(store.search_records(query)))
    }

    pub fn get_record(&self, id: u64) -> Result<CredentialRecord> {
        self.with_store(|store| store.get_record(id).cloned())
    }

    pub fn change_password(&self, new_password: &[u8]) -> Result<()> {
        self.with_store(|store| store.change_password(new_password))
    }

    // ------------------------------------------------------------------
    // Whole-installation transfer
    // ------------------------------------------------------------------

    /// Copy the installation to `dest_dir`.  Works logged in or out.
    pub fn export_vault(&self, dest_dir: &Path) -> Result<()> {
        let _guard = self.shared.state.lock();
        vault::export_vault(&self.paths, dest_dir)
    }

    /// Replace the installation with the one in `src_dir`.
    ///
    /// The session is logged out first; the imported vault is opened with
    /// its own password on the next `unlock`.
    pub fn import_vault(&self, src_dir: &Path) -> Result<()> {
        let mut inner = self.shared.state.lock();
        inner.close();
        let result = vault::import_vault(&self.paths, src_dir);
        drop(inner);
        self.shared.wake.notify_all();
        result
    }

    /// Run `f` against the unlocked store, enforcing the idle deadline
    /// first and recording the call as activity.
    fn with_store<T>(&self, f: impl FnOnce(&mut VaultStore) -> Result<T>) -> Result<T> {
        let mut inner = self.shared.state.lock();
        let now = Instant::now();
        inner.expire_if_idle(now);
        if inner.store.is_none() {
            return Err(VaultError::Locked);
        }
        inner.last_activity = now;
        let store = inner.store.as_mut().ok_or(VaultError::Locked)?;
        f(store)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("paths", &self.paths)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use tempfile::TempDir;

    fn session(dir: &TempDir, timeout: Duration) -> Session {
        Session::with_options(VaultPaths::new(dir.path()), Argon2Params::minimum(), timeout).unwrap()
    }

    #[test]
    fn watcher_locks_without_any_call() {
        let dir = TempDir::new().unwrap();
        let session = session(&dir, Duration::from_millis(150));
        session.unlock(b"watcher-pw").unwrap();

        thread::sleep(Duration::from_millis(600));

        // Inspect the raw state so the lazy check in `state()` cannot be
        // what locked it.
        let inner = session.shared.state.lock();
        assert!(inner.store.is_none(), "watcher should have locked the session");
        assert!(inner.auto_locked);
    }

    #[test]
    fn zero_timeout_never_locks() {
        let dir = TempDir::new().unwrap();
        let session = session(&dir, Duration::ZERO);
        session.unlock(b"no-timeout-pw").unwrap();

        thread::sleep(Duration::from_millis(100));

        assert_eq!(session.state(), SessionState::LoggedIn);
        assert_eq!(session.time_until_lock(), None);
    }

    #[test]
    fn deadline_is_none_while_logged_out() {
        let dir = TempDir::new().unwrap();
        let session = session(&dir, Duration::from_secs(60));
        assert!(session.shared.state.lock().deadline().is_none());
    }
}
