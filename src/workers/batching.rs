use super::WorkerOutcome;
use crate::chute::{ChuteEntrance, ChuteExit};
use crate::errors::PutError;
use crate::stop::StopToken;
use log::{debug, warn};
use std::marker::PhantomData;
use std::mem;

/// Groups elements taken from `input` into batches of at most
/// `max_batch_size` and puts each batch into `output` the instant it fills.
///
/// When the input reaches closed-and-empty, whatever has accumulated is sent
/// as one final, possibly short batch; an empty final batch is never sent.
/// Over `n` input elements this emits `ceil(n / max_batch_size)` batches, all
/// full except possibly the last. The worker waits indefinitely between
/// elements; for time-bounded flushing use
/// [PeriodicBatchingWorker](super::PeriodicBatchingWorker).
pub struct BatchingWorker<E, I, O> {
    input: I,
    output: O,
    max_batch_size: usize,
    batch: Vec<E>,
    close_output_when_done: bool,
    stop: StopToken,
    _marker: PhantomData<fn(E)>,
}

impl<E, I, O> BatchingWorker<E, I, O>
where
    I: ChuteExit<E>,
    O: ChuteEntrance<Vec<E>>,
{
    /// # Panics
    /// Panics when `max_batch_size` is zero.
    pub fn new(
        input: I,
        output: O,
        max_batch_size: usize,
        close_output_when_done: bool,
        stop: StopToken,
    ) -> Self {
        assert!(max_batch_size > 0, "max_batch_size must be greater than 0");
        Self {
            input,
            output,
            max_batch_size,
            batch: Vec::with_capacity(max_batch_size),
            close_output_when_done,
            stop,
            _marker: PhantomData,
        }
    }

    pub fn run(mut self) -> WorkerOutcome {
        loop {
            match self.input.take(&self.stop) {
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
                    if !self.batch.is_empty() {
                        if let Err(outcome) = self.flush() {
                            return outcome;
                        }
                    }
                    if self.close_output_when_done {
                        self.output.close();
                    }
                    debug!("batching worker drained its input");
                    return WorkerOutcome::Drained;
                }
            }
        }
    }

    fn flush(&mut self) -> Result<(), WorkerOutcome> {
        let batch = mem::take(&mut self.batch);
        match self.output.put(batch, &self.stop) {
            Ok(()) => Ok(()),
            Err(PutError::Stopped) => Err(WorkerOutcome::Stopped),
            Err(PutError::Closed) => {
                warn!("batching worker output closed while a batch was pending");
                Err(WorkerOutcome::OutputClosed)
            }
        }
    }
}
