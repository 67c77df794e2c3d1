use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, Thread, ThreadId};

/// Cooperative cancellation for blocking chute operations.
///
/// Every blocking call ([put()](crate::ChuteEntrance::put),
/// [take()](crate::ChuteExit::take), [try_take()](crate::ChuteExit::try_take))
/// takes a `&StopToken` and returns promptly with a
/// [Stopped](crate::Stopped) error once [stop()](StopToken::stop) has been
/// called. Stopping abandons only the in-flight operation; the chute's buffer
/// and closed flag stay consistent and other threads continue unaffected.
///
/// Tokens are cheap to clone and all clones observe the same state. A worker
/// is typically given one clone while the controlling thread keeps another to
/// stop it later.
#[derive(Clone)]
pub struct StopToken {
    shared: Arc<StopShared>,
}

struct StopShared {
    stopped: AtomicBool,
    // Threads currently parked under this token, so stop() can unpark them.
    parked: Mutex<Vec<Thread>>,
}

impl StopToken {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(StopShared {
                stopped: AtomicBool::new(false),
                parked: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Whether [stop()](StopToken::stop) has been called on any clone.
    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.load(Ordering::Acquire)
    }

    /// Signal every blocking operation under this token to return.
    ///
    /// Idempotent. Threads currently parked are woken immediately; calls that
    /// start after this point fail fast without blocking.
    pub fn stop(&self) {
        self.shared.stopped.store(true, Ordering::SeqCst);
        let mut parked = self.lock_parked();
        for thread in parked.drain(..) {
            thread.unpark();
        }
    }

    /// Register the current thread for the duration of a park. The returned
    /// guard must be held across `thread::park()` so stop() can unpark us.
    pub(crate) fn parked_scope(&self) -> ParkedScope<'_> {
        self.lock_parked().push(thread::current());
        ParkedScope { shared: &self.shared, id: thread::current().id() }
    }

    fn lock_parked(&self) -> std::sync::MutexGuard<'_, Vec<Thread>> {
        self.shared.parked.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for StopToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StopToken {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "StopToken(stopped={})", self.is_stopped())
    }
}

pub(crate) struct ParkedScope<'a> {
    shared: &'a Arc<StopShared>,
    id: ThreadId,
}

impl Drop for ParkedScope<'_> {
    fn drop(&mut self) {
        let mut parked =
            self.shared.parked.lock().unwrap_or_else(PoisonError::into_inner);
        parked.retain(|t| t.id() != self.id);
    }
}
