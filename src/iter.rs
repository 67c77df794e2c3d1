use crate::chute::ChuteExit;
use crate::stop::StopToken;
use std::marker::PhantomData;

/// A single-pass iterator over elements taken from a [ChuteExit].
///
/// Each `next()` blocks until an element arrives, and ends the iteration once
/// the source is closed-and-empty or the stop token fires (the iterator is
/// fused afterward). Concurrent iterators over the same exit see disjoint
/// elements, since every element is delivered to exactly one taker; build a
/// fresh iterator (for example over `&exit`) whenever consumption should
/// restart.
pub struct ChuteIter<E, X> {
    source: X,
    stop: StopToken,
    finished: bool,
    stopped: bool,
    _marker: PhantomData<fn() -> E>,
}

impl<E, X: ChuteExit<E>> ChuteIter<E, X> {
    pub fn new(source: X, stop: StopToken) -> Self {
        Self { source, stop, finished: false, stopped: false, _marker: PhantomData }
    }

    /// Whether iteration ended because the stop token fired rather than
    /// because the source was drained.
    pub fn stopped(&self) -> bool {
        self.stopped
    }
}

impl<E, X: ChuteExit<E>> Iterator for ChuteIter<E, X> {
    type Item = E;

    fn next(&mut self) -> Option<E> {
        if self.finished {
            return None;
        }
        match self.source.take(&self.stop) {
            Ok(Some(element)) => Some(element),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(_) => {
                self.finished = true;
                self.stopped = true;
                None
            }
        }
    }
}
