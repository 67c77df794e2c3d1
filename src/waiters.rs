use crossbeam::queue::SegQueue;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, Thread};

/// One blocked thread's claim ticket on a [WaitQueue].
///
/// Starts in the waked state; [WaitQueue::register] rearms it before pushing
/// it onto the queue. A wake is consumed at most once per registration.
pub(crate) struct Waiter(Arc<WaiterInner>);

struct WaiterInner {
    thread: Thread,
    waked: AtomicBool,
}

impl Waiter {
    pub fn new() -> Self {
        Self(Arc::new(WaiterInner {
            thread: thread::current(),
            waked: AtomicBool::new(true),
        }))
    }

    #[inline]
    pub fn is_waked(&self) -> bool {
        self.0.waked.load(Ordering::Acquire)
    }

    /// Give up the slot. Returns true when a wake had already been consumed
    /// by this waiter, in which case the caller should pass it on.
    #[inline]
    pub fn abandon(&self) -> bool {
        self.0.waked.swap(true, Ordering::SeqCst)
    }

    fn rearm(&self) {
        self.0.waked.store(false, Ordering::Release);
    }

    fn weak(&self) -> WaiterRef {
        WaiterRef(Arc::downgrade(&self.0))
    }
}

impl fmt::Debug for Waiter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Waiter(waked={})", self.is_waked())
    }
}

struct WaiterRef(Weak<WaiterInner>);

impl WaiterRef {
    /// Returns true when this call actually woke the owning thread.
    fn wake(&self) -> bool {
        if let Some(inner) = self.0.upgrade() {
            if !inner.waked.swap(true, Ordering::SeqCst) {
                inner.thread.unpark();
                return true;
            }
        }
        false
    }
}

/// Registry of parked threads waiting on one side of a chute.
///
/// Entries are weak; a waiter that returned without being woken simply leaves
/// a dead entry behind, skipped by the next wake.
pub(crate) struct WaitQueue {
    queue: SegQueue<WaiterRef>,
}

impl WaitQueue {
    pub fn new() -> Self {
        Self { queue: SegQueue::new() }
    }

    pub fn register(&self, waiter: &Waiter) {
        waiter.rearm();
        self.queue.push(waiter.weak());
    }

    /// Wake one live waiter, skipping abandoned and stale entries.
    pub fn wake_one(&self) {
        while let Some(waiter) = self.queue.pop() {
            if waiter.wake() {
                return;
            }
        }
    }

    /// Wake every registered waiter. Used on close.
    pub fn wake_all(&self) {
        while let Some(waiter) = self.queue.pop() {
            waiter.wake();
        }
    }
}
