use crate::chute::{ChuteEntrance, ChuteExit};
use crate::errors::{PutError, Stopped};
use crate::stop::StopToken;
use std::marker::PhantomData;
use std::time::Duration;

/// A [ChuteEntrance] that applies a pure function to each element before
/// forwarding it to an inner sink. Adds no buffering; `close` and `is_closed`
/// pass straight through.
pub struct TransformingEntrance<A, B, S, F> {
    receiver: S,
    transform: F,
    _marker: PhantomData<fn(A) -> B>,
}

impl<A, B, S, F> TransformingEntrance<A, B, S, F>
where
    S: ChuteEntrance<B>,
    F: Fn(A) -> B + Send + Sync,
{
    pub fn new(receiver: S, transform: F) -> Self {
        Self { receiver, transform, _marker: PhantomData }
    }
}

impl<A, B, S, F> ChuteEntrance<A> for TransformingEntrance<A, B, S, F>
where
    S: ChuteEntrance<B>,
    F: Fn(A) -> B + Send + Sync,
{
    fn put(&self, element: A, stop: &StopToken) -> Result<(), PutError> {
        self.receiver.put((self.transform)(element), stop)
    }

    fn close(&self) {
        self.receiver.close()
    }

    fn is_closed(&self) -> bool {
        self.receiver.is_closed()
    }
}

/// A [ChuteExit] that applies a pure function to each element taken from an
/// inner source before returning it. Adds no buffering;
/// `is_closed_and_empty` passes straight through.
pub struct TransformingExit<A, B, X, F> {
    supplier: X,
    transform: F,
    _marker: PhantomData<fn(A) -> B>,
}

impl<A, B, X, F> TransformingExit<A, B, X, F>
where
    X: ChuteExit<A>,
    F: Fn(A) -> B + Send + Sync,
{
    pub fn new(supplier: X, transform: F) -> Self {
        Self { supplier, transform, _marker: PhantomData }
    }
}

impl<A, B, X, F> ChuteExit<B> for TransformingExit<A, B, X, F>
where
    X: ChuteExit<A>,
    F: Fn(A) -> B + Send + Sync,
{
    fn take(&self, stop: &StopToken) -> Result<Option<B>, Stopped> {
        Ok(self.supplier.take(stop)?.map(&self.transform))
    }

    fn try_take_now(&self) -> Option<B> {
        self.supplier.try_take_now().map(&self.transform)
    }

    fn try_take(&self, timeout: Duration, stop: &StopToken) -> Result<Option<B>, Stopped> {
        Ok(self.supplier.try_take(timeout, stop)?.map(&self.transform))
    }

    fn is_closed_and_empty(&self) -> bool {
        self.supplier.is_closed_and_empty()
    }
}
