use super::WorkerOutcome;
use crate::chute::{ChuteEntrance, ChuteExit};
use crate::errors::PutError;
use crate::stop::StopToken;
use crate::time::TimeSource;
use log::{debug, warn};
use std::marker::PhantomData;
use std::mem;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A [BatchingWorker](super::BatchingWorker) with a time bound: a non-empty
/// partial batch is flushed once `max_time_between_batches` elapses, even if
/// the size threshold was never reached.
///
/// An elapsed interval with nothing accumulated emits nothing; the deadline
/// is simply pushed out again. After every emission, size- or
/// time-triggered, the next deadline is recomputed from the injected
/// [TimeSource].
pub struct PeriodicBatchingWorker<E, I, O> {
    input: I,
    output: O,
    max_batch_size: usize,
    batch: Vec<E>,
    close_output_when_done: bool,
    time_source: Arc<dyn TimeSource>,
    max_time_between_batches: Duration,
    next_flush: Instant,
    stop: StopToken,
    _marker: PhantomData<fn(E)>,
}

impl<E, I, O> PeriodicBatchingWorker<E, I, O>
where
    I: ChuteExit<E>,
    O: ChuteEntrance<Vec<E>>,
{
    /// # Panics
    /// Panics when `max_batch_size` is zero or `max_time_between_batches`
    /// is zero.
    pub fn new(
        input: I,
        output: O,
        max_batch_size: usize,
        close_output_when_done: bool,
        time_source: Arc<dyn TimeSource>,
        max_time_between_batches: Duration,
        stop: StopToken,
    ) -> Self {
        assert!(max_batch_size > 0, "max_batch_size must be greater than 0");
        assert!(
            !max_time_between_batches.is_zero(),
            "max_time_between_batches cannot be zero"
        );
        let next_flush = time_source.now() + max_time_between_batches;
        Self {
            input,
            output,
            max_batch_size,
            batch: Vec::with_capacity(max_batch_size),
            close_output_when_done,
            time_source,
            max_time_between_batches,
            next_flush,
            stop,
            _marker: PhantomData,
        }
    }

    pub fn run(mut self) -> WorkerOutcome {
        loop {
            let now = self.time_source.now();
            if now >= self.next_flush {
                if !self.batch.is_empty() {
                    if let Err(outcome) = self.flush() {
                        return outcome;
                    }
                } else {
                    // Nothing accumulated: no empty batch, just a new deadline.
                    self.next_flush = self.time_source.now() + self.max_time_between_batches;
                }
                continue;
            }
            match self.input.try_take(self.next_flush - now, &self.stop) {
                Err(_) => return WorkerOutcome::Stopped,
                Ok(Some(element)) => {
                    self.batch.push(element);
                    if self.batch.len() >= self.max_batch_size {
                        if let Err(outcome) = self.flush() {
                            return outcome;
                        }
                    }
                }
                Ok(None) => {
                    // Either the wait timed out (the loop head flushes any
                    // partial batch) or the input is done.
                    if self.input.is_closed_and_empty() {
                        if !self.batch.is_empty() {
                            if let Err(outcome) = self.flush() {
                                return outcome;
                            }
                        }
                        if self.close_output_when_done {
                            self.output.close();
                        }
                        debug!("periodic batching worker drained its input");
                        return WorkerOutcome::Drained;
                    }
                }
            }
        }
    }

    fn flush(&mut self) -> Result<(), WorkerOutcome> {
        let batch = mem::take(&mut self.batch);
        let result = match self.output.put(batch, &self.stop) {
            Ok(()) => Ok(()),
            Err(PutError::Stopped) => Err(WorkerOutcome::Stopped),
            Err(PutError::Closed) => {
                warn!("periodic batching worker output closed while a batch was pending");
                Err(WorkerOutcome::OutputClosed)
            }
        };
        self.next_flush = self.time_source.now() + self.max_time_between_batches;
        result
    }
}
