use crate::chute::{ChuteEntrance, ChuteExit};
use crate::errors::{PutError, Stopped};
use crate::stop::StopToken;
use crate::time::{SystemTimeSource, TimeSource};
use crate::waiters::{WaitQueue, Waiter};
use crossbeam::queue::ArrayQueue;
use crossbeam::utils::Backoff;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::thread;
use std::time::Duration;

/// What travels through the internal buffer: either a caller's element or the
/// end-of-stream marker pushed by [close()](ChuteEntrance::close). The marker
/// is never handed to a caller.
enum Datum<E> {
    Element(E),
    EndOfStream,
}

enum Popped<E> {
    Element(E),
    EndOfStream,
    Empty,
}

/// A bounded, closable FIFO chute backed by a lock-free ring buffer.
///
/// Capacity is fixed at construction. Producers block in
/// [put()](ChuteEntrance::put) while the buffer holds `capacity` elements;
/// consumers block in [take()](ChuteExit::take) while it is empty and still
/// open. Closing is one-way: once closed, no new elements are accepted, and
/// after the remaining elements are drained the chute is permanently
/// closed-and-empty.
///
/// Internally the buffer has one extra slot reserved for the end-of-stream
/// marker, so [close()](ChuteEntrance::close) never blocks even when the
/// buffer is full of elements. The marker stays the last item in the buffer:
/// a consumer that dequeues it to inspect it puts it straight back, so every
/// later consumer observes end-of-stream as well.
///
/// Two disjoint critical sections keep the sides independent: the entrance
/// gate serializes `put` against `close` (no element can slip in after the
/// closed flag is set), and the exit gate serializes removals (the marker's
/// transient dequeue cannot lose it). A producer adding data and a consumer
/// removing data proceed concurrently. Neither gate is held while a thread is
/// parked.
///
/// `BufferingChute` has no value identity; like any running piece of
/// machinery, share one instance (for example in an [Arc]) instead of
/// comparing instances.
pub struct BufferingChute<E> {
    buffer: ArrayQueue<Datum<E>>,
    capacity: usize,
    /// Elements currently buffered, excluding the end-of-stream marker.
    live: AtomicUsize,
    closed: AtomicBool,
    entrance_gate: Mutex<()>,
    exit_gate: Mutex<()>,
    space_waiters: WaitQueue,
    element_waiters: WaitQueue,
    time_source: Arc<dyn TimeSource>,
}

impl<E> fmt::Debug for BufferingChute<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "BufferingChute(capacity={}, live={}, closed={})",
            self.capacity,
            self.live.load(Ordering::Acquire),
            self.closed.load(Ordering::SeqCst)
        )
    }
}

fn lock_gate(gate: &Mutex<()>) -> MutexGuard<'_, ()> {
    gate.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<E> BufferingChute<E> {
    /// Create a chute buffering up to `capacity` elements.
    ///
    /// # Panics
    /// Panics when `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        Self::with_time_source(capacity, Arc::new(SystemTimeSource))
    }

    /// Like [new()](BufferingChute::new), with an injected [TimeSource] used
    /// for [try_take()](ChuteExit::try_take) budget accounting.
    pub fn with_time_source(capacity: usize, time_source: Arc<dyn TimeSource>) -> Self {
        assert!(capacity > 0, "capacity must be at least 1");
        Self {
            // One extra slot, reserved for the end-of-stream marker.
            buffer: ArrayQueue::new(capacity + 1),
            capacity,
            live: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            entrance_gate: Mutex::new(()),
            exit_gate: Mutex::new(()),
            space_waiters: WaitQueue::new(),
            element_waiters: WaitQueue::new(),
            time_source,
        }
    }

    /// Elements currently buffered (not counting end-of-stream). A snapshot.
    pub fn len(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// Whether no elements are currently buffered. A snapshot.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The fixed capacity this chute was created with.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Remove and classify the buffer head under the exit gate. With
    /// `wait_for_gate` false, returns `None` when the gate is contended.
    fn pop_one(&self, wait_for_gate: bool) -> Option<Popped<E>> {
        let guard = if wait_for_gate {
            lock_gate(&self.exit_gate)
        } else {
            match self.exit_gate.try_lock() {
                Ok(guard) => guard,
                Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
                Err(TryLockError::WouldBlock) => return None,
            }
        };
        let popped = match self.buffer.pop() {
            Some(Datum::Element(element)) => {
                self.live.fetch_sub(1, Ordering::SeqCst);
                Popped::Element(element)
            }
            Some(Datum::EndOfStream) => {
                // Not ours to consume: put it back so every later consumer
                // also observes end-of-stream. The reserved slot is free and
                // nothing else can be pushed once closed.
                if self.buffer.push(Datum::EndOfStream).is_err() {
                    unreachable!("reserved end-of-stream slot occupied");
                }
                Popped::EndOfStream
            }
            None => Popped::Empty,
        };
        drop(guard);
        match &popped {
            Popped::Element(_) => self.space_waiters.wake_one(),
            Popped::EndOfStream => self.element_waiters.wake_all(),
            Popped::Empty => {}
        }
        Some(popped)
    }

    /// Park until woken or stopped, registering with both the wait queue and
    /// the stop token. `deadline_wait` bounds the park for timed takes.
    fn wait_on(
        &self,
        queue: &WaitQueue,
        waiter: &Waiter,
        stop: &StopToken,
        deadline_wait: Option<Duration>,
    ) {
        if waiter.is_waked() {
            // Either freshly created or its wake was consumed; (re)register
            // and loop back for one more check before parking.
            queue.register(waiter);
            return;
        }
        let _scope = stop.parked_scope();
        if stop.is_stopped() {
            return;
        }
        match deadline_wait {
            Some(remaining) => thread::park_timeout(remaining),
            None => thread::park(),
        }
    }

    fn settle_waiter(&self, queue: &WaitQueue, waiter: Option<Waiter>) {
        if let Some(waiter) = waiter {
            if waiter.abandon() {
                // We consumed a wake we no longer need; pass it on.
                queue.wake_one();
            }
        }
    }
}

impl<E: Send> ChuteEntrance<E> for BufferingChute<E> {
    fn put(&self, element: E, stop: &StopToken) -> Result<(), PutError> {
        let mut slot = Some(element);
        let mut waiter: Option<Waiter> = None;
        let backoff = Backoff::new();
        let result = loop {
            {
                let _gate = lock_gate(&self.entrance_gate);
                if self.closed.load(Ordering::SeqCst) {
                    break Err(PutError::Closed);
                }
                if self.live.load(Ordering::SeqCst) < self.capacity {
                    let element = match slot.take() {
                        Some(element) => element,
                        None => unreachable!(),
                    };
                    // Cannot fail: at most capacity - 1 elements are buffered
                    // and the chute is open, so the marker slot is free too.
                    if self.buffer.push(Datum::Element(element)).is_err() {
                        unreachable!("bounded buffer overflowed");
                    }
                    self.live.fetch_add(1, Ordering::SeqCst);
                    break Ok(());
                }
            }
            if stop.is_stopped() {
                break Err(PutError::Stopped);
            }
            // Spin briefly before falling back to parking.
            if !backoff.is_completed() {
                backoff.snooze();
                continue;
            }
            let parked = waiter.get_or_insert_with(Waiter::new);
            self.wait_on(&self.space_waiters, parked, stop, None);
        };
        self.settle_waiter(&self.space_waiters, waiter);
        if result.is_ok() {
            self.element_waiters.wake_one();
        }
        result
    }

    fn close(&self) {
        {
            let _gate = lock_gate(&self.entrance_gate);
            if self.closed.swap(true, Ordering::SeqCst) {
                return;
            }
            if self.buffer.push(Datum::EndOfStream).is_err() {
                unreachable!("reserved end-of-stream slot occupied");
            }
        }
        // Blocked consumers must observe end-of-stream, blocked producers the
        // closed flag.
        self.element_waiters.wake_all();
        self.space_waiters.wake_all();
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl<E: Send> ChuteExit<E> for BufferingChute<E> {
    fn take(&self, stop: &StopToken) -> Result<Option<E>, Stopped> {
        let mut waiter: Option<Waiter> = None;
        let backoff = Backoff::new();
        let result = loop {
            // Snapshot the flag before popping: a pop that comes up empty
            // after the flag was set can never be overtaken by a late put.
            let closed = self.is_closed();
            match self.pop_one(true) {
                Some(Popped::Element(element)) => break Ok(Some(element)),
                Some(Popped::EndOfStream) => break Ok(None),
                Some(Popped::Empty) | None => {}
            }
            if closed {
                break Ok(None);
            }
            if stop.is_stopped() {
                break Err(Stopped);
            }
            if !backoff.is_completed() {
                backoff.snooze();
                continue;
            }
            let parked = waiter.get_or_insert_with(Waiter::new);
            self.wait_on(&self.element_waiters, parked, stop, None);
        };
        self.settle_waiter(&self.element_waiters, waiter);
        result
    }

    fn try_take_now(&self) -> Option<E> {
        match self.pop_one(false) {
            Some(Popped::Element(element)) => Some(element),
            // End-of-stream, empty, or the exit gate was contended: nothing
            // is available without waiting.
            _ => None,
        }
    }

    fn try_take(&self, timeout: Duration, stop: &StopToken) -> Result<Option<E>, Stopped> {
        if timeout.is_zero() {
            return Ok(self.try_take_now());
        }
        let deadline = match self.time_source.now().checked_add(timeout) {
            Some(deadline) => deadline,
            // Effectively unbounded.
            None => return self.take(stop),
        };
        let mut waiter: Option<Waiter> = None;
        let backoff = Backoff::new();
        let result = loop {
            let closed = self.is_closed();
            match self.pop_one(true) {
                Some(Popped::Element(element)) => break Ok(Some(element)),
                Some(Popped::EndOfStream) => break Ok(None),
                Some(Popped::Empty) | None => {}
            }
            if closed {
                break Ok(None);
            }
            if stop.is_stopped() {
                break Err(Stopped);
            }
            // Recomputed from the time source every pass, so coordination
            // time is subtracted from the caller's budget.
            let now = self.time_source.now();
            if now >= deadline {
                break Ok(None);
            }
            if !backoff.is_completed() {
                backoff.snooze();
                continue;
            }
            let parked = waiter.get_or_insert_with(Waiter::new);
            self.wait_on(&self.element_waiters, parked, stop, Some(deadline - now));
        };
        self.settle_waiter(&self.element_waiters, waiter);
        result
    }

    fn is_closed_and_empty(&self) -> bool {
        self.is_closed() && self.live.load(Ordering::SeqCst) == 0
    }
}
