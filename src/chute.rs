use crate::errors::{PutError, Stopped};
use crate::stop::StopToken;
use std::sync::Arc;
use std::time::Duration;

/// The producer-facing side of a chute: accepts elements until closed.
pub trait ChuteEntrance<E>: Send + Sync {
    /// Put an element, blocking while the buffer is full.
    ///
    /// Returns `Err(PutError::Closed)` once the entrance is closed, and
    /// `Err(PutError::Stopped)` when `stop` fires during the wait.
    fn put(&self, element: E, stop: &StopToken) -> Result<(), PutError>;

    /// Close the entrance. Idempotent; never blocks.
    ///
    /// Elements already buffered stay available to consumers; new puts fail.
    fn close(&self);

    /// Whether [close()](ChuteEntrance::close) has been called, regardless of
    /// how many buffered elements remain.
    fn is_closed(&self) -> bool;
}

/// The consumer-facing side of a chute: yields elements until closed and empty.
pub trait ChuteExit<E>: Send + Sync {
    /// Take the next element in FIFO order, blocking until one arrives.
    ///
    /// Returns `Ok(None)` once the chute is closed and fully drained, and
    /// `Err(Stopped)` when `stop` fires during the wait.
    fn take(&self, stop: &StopToken) -> Result<Option<E>, Stopped>;

    /// Take an element only if one is available without waiting.
    fn try_take_now(&self) -> Option<E>;

    /// Take the next element, waiting up to `timeout`.
    ///
    /// `Ok(None)` on timeout or on reaching closed-and-empty, whichever comes
    /// first. A zero timeout is equivalent to
    /// [try_take_now()](ChuteExit::try_take_now). Time spent on internal
    /// coordination counts against the wait budget.
    fn try_take(&self, timeout: Duration, stop: &StopToken) -> Result<Option<E>, Stopped>;

    /// True iff the chute is closed and no elements remain, meaning no take
    /// will ever yield an element again. A `false` result is only a snapshot:
    /// the chute may still become closed-and-empty, or another thread may
    /// consume whatever arrives next.
    fn is_closed_and_empty(&self) -> bool;
}

/// A closable conduit between producers and consumers: both sides at once.
pub trait Chute<E>: ChuteEntrance<E> + ChuteExit<E> {}

impl<E, C: ChuteEntrance<E> + ChuteExit<E>> Chute<E> for C {}

impl<E, T: ChuteEntrance<E> + ?Sized> ChuteEntrance<E> for Arc<T> {
    fn put(&self, element: E, stop: &StopToken) -> Result<(), PutError> {
        (**self).put(element, stop)
    }

    fn close(&self) {
        (**self).close()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

impl<E, T: ChuteExit<E> + ?Sized> ChuteExit<E> for Arc<T> {
    fn take(&self, stop: &StopToken) -> Result<Option<E>, Stopped> {
        (**self).take(stop)
    }

    fn try_take_now(&self) -> Option<E> {
        (**self).try_take_now()
    }

    fn try_take(&self, timeout: Duration, stop: &StopToken) -> Result<Option<E>, Stopped> {
        (**self).try_take(timeout, stop)
    }

    fn is_closed_and_empty(&self) -> bool {
        (**self).is_closed_and_empty()
    }
}

impl<E, T: ChuteEntrance<E> + ?Sized> ChuteEntrance<E> for &T {
    fn put(&self, element: E, stop: &StopToken) -> Result<(), PutError> {
        (**self).put(element, stop)
    }

    fn close(&self) {
        (**self).close()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

impl<E, T: ChuteExit<E> + ?Sized> ChuteExit<E> for &T {
    fn take(&self, stop: &StopToken) -> Result<Option<E>, Stopped> {
        (**self).take(stop)
    }

    fn try_take_now(&self) -> Option<E> {
        (**self).try_take_now()
    }

    fn try_take(&self, timeout: Duration, stop: &StopToken) -> Result<Option<E>, Stopped> {
        (**self).try_take(timeout, stop)
    }

    fn is_closed_and_empty(&self) -> bool {
        (**self).is_closed_and_empty()
    }
}
