use super::WorkerOutcome;
use crate::chute::{ChuteEntrance, ChuteExit};
use crate::errors::PutError;
use crate::stop::StopToken;
use log::{debug, warn};
use std::marker::PhantomData;

/// Applies a conversion function to every element taken from `input` and
/// forwards the result to `output`.
///
/// When so configured, the output is closed only once the input is confirmed
/// closed-and-empty; a stopped worker leaves the output open and drops the
/// element it was carrying.
pub struct TransformingWorker<A, B, I, O, F> {
    input: I,
    output: O,
    transform: F,
    close_output_when_done: bool,
    stop: StopToken,
    _marker: PhantomData<fn(A) -> B>,
}

impl<A, B, I, O, F> TransformingWorker<A, B, I, O, F>
where
    I: ChuteExit<A>,
    O: ChuteEntrance<B>,
    F: Fn(A) -> B,
{
    pub fn new(
        input: I,
        output: O,
        transform: F,
        close_output_when_done: bool,
        stop: StopToken,
    ) -> Self {
        Self { input, output, transform, close_output_when_done, stop, _marker: PhantomData }
    }

    pub fn run(self) -> WorkerOutcome {
        loop {
            match self.input.take(&self.stop) {
                Err(_) => return WorkerOutcome::Stopped,
                Ok(Some(element)) => {
                    match self.output.put((self.transform)(element), &self.stop) {
                        Ok(()) => {}
                        Err(PutError::Stopped) => return WorkerOutcome::Stopped,
                        Err(PutError::Closed) => {
                            warn!("transforming worker output closed mid-stream");
                            return WorkerOutcome::OutputClosed;
                        }
                    }
                }
                Ok(None) => {
                    if self.close_output_when_done && self.input.is_closed_and_empty() {
                        self.output.close();
                    }
                    debug!("transforming worker drained its input");
                    return WorkerOutcome::Drained;
                }
            }
        }
    }
}
