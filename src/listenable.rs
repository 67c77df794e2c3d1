use crate::chute::{Chute, ChuteEntrance, ChuteExit};
use crate::errors::{PutError, RejectedExecution, Stopped};
use crate::stop::StopToken;
use log::debug;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Where listener callbacks run. Implementations decide whether to execute
/// inline, queue onto a pool, or reject.
pub trait Executor: Send + Sync {
    /// Submit a task. `Err(RejectedExecution)` means the task will never run;
    /// the submitter carries on regardless.
    fn execute(&self, task: Box<dyn FnOnce() + Send>) -> Result<(), RejectedExecution>;
}

/// Runs each task inline on the submitting thread. Listener callbacks using
/// this executor run inside the producer's `put` call, so keep them short.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectExecutor;

impl Executor for DirectExecutor {
    fn execute(&self, task: Box<dyn FnOnce() + Send>) -> Result<(), RejectedExecution> {
        task();
        Ok(())
    }
}

struct Listener {
    callback: Arc<dyn Fn() + Send + Sync>,
    executor: Arc<dyn Executor>,
}

/// A chute whose exit can be consumed without blocking: registered callbacks
/// fire whenever an element becomes available or the chute becomes
/// closed-and-empty.
///
/// This is how one thread services many chutes with no polling and no
/// per-chute blocked thread: register a callback per chute, all submitting
/// to the same single-threaded executor, and have each callback drain its
/// chute with [try_take_now()](ChuteExit::try_take_now) and check
/// [is_closed_and_empty()](ChuteExit::is_closed_and_empty).
///
/// Callbacks receive no element. They fire in registration order, once per
/// triggering transition; the transition "non-empty to empty" does not
/// notify. A callback rejected by its executor is skipped without affecting
/// the rest.
pub struct ListenableChute<E, C> {
    inner: C,
    listeners: Mutex<Vec<Listener>>,
    // Whether a close has already gone through this wrapper; the swap makes
    // exactly one caller the closer even when closes race.
    closed: AtomicBool,
    _marker: PhantomData<fn(E) -> E>,
}

impl<E, C: Chute<E>> ListenableChute<E, C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            listeners: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
            _marker: PhantomData,
        }
    }

    /// Register a callback and the executor it should run on. Registrations
    /// live as long as this wrapper; there is no unregister.
    pub fn add_listener<L>(&self, listener: L, executor: Arc<dyn Executor>)
    where
        L: Fn() + Send + Sync + 'static,
    {
        let mut listeners =
            self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        listeners.push(Listener { callback: Arc::new(listener), executor });
    }

    fn notify_listeners(&self) {
        let listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        for listener in listeners.iter() {
            let callback = listener.callback.clone();
            if listener.executor.execute(Box::new(move || callback())).is_err() {
                debug!("listener rejected by its executor, skipping");
            }
        }
    }
}

impl<E, C: Chute<E>> ChuteEntrance<E> for ListenableChute<E, C> {
    fn put(&self, element: E, stop: &StopToken) -> Result<(), PutError> {
        self.inner.put(element, stop)?;
        self.notify_listeners();
        Ok(())
    }

    fn close(&self) {
        // Only the call that performs the close may notify; a repeated close
        // is not a state transition.
        let already_closed = self.closed.swap(true, Ordering::SeqCst);
        self.inner.close();
        if !already_closed && self.inner.is_closed_and_empty() {
            self.notify_listeners();
        }
    }

    fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

impl<E, C: Chute<E>> ChuteExit<E> for ListenableChute<E, C> {
    fn take(&self, stop: &StopToken) -> Result<Option<E>, Stopped> {
        self.inner.take(stop)
    }

    fn try_take_now(&self) -> Option<E> {
        self.inner.try_take_now()
    }

    fn try_take(&self, timeout: Duration, stop: &StopToken) -> Result<Option<E>, Stopped> {
        self.inner.try_take(timeout, stop)
    }

    fn is_closed_and_empty(&self) -> bool {
        self.inner.is_closed_and_empty()
    }
}
