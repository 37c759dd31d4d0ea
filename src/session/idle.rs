//! Background thread that locks an idle session.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use super::Shared;

/// Locks the session once its idle deadline passes.
///
/// The thread sleeps on the session's condvar until the current deadline
/// (or indefinitely while logged out or with auto-lock disabled) and
/// re-checks after every wake-up.  Dropping the watcher stops the thread.
pub struct IdleWatcher {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl IdleWatcher {
    pub(crate) fn spawn(shared: Arc<Shared>) -> io::Result<Self> {
        let thread_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("lockguardium-idle".into())
            .spawn(move || watch(&thread_shared))?;

        Ok(Self {
            shared,
            handle: Some(handle),
        })
    }
}

fn watch(shared: &Shared) {
    let mut inner = shared.state.lock();
    while !inner.shutdown {
        match inner.deadline() {
            None => shared.wake.wait(&mut inner),
            Some(deadline) => {
                if inner.expire_if_idle(Instant::now()) {
                    continue;
                }
                // Activity only moves the deadline later, so waking at the
                // old one and re-checking is enough.
                let _ = shared.wake.wait_until(&mut inner, deadline);
            }
        }
    }
    tracing::trace!("idle watcher stopped");
}

impl Drop for IdleWatcher {
    fn drop(&mut self) {
        self.shared.state.lock().shutdown = true;
        self.shared.wake.notify_all();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl std::fmt::Debug for IdleWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdleWatcher").finish_non_exhaustive()
    }
}
