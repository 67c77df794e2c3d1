use crate::chute::ChuteEntrance;
use crate::errors::PutError;
use crate::stop::StopToken;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

struct MuxShared<S> {
    output: S,
    handles_open: AtomicUsize,
}

/// Create `inputs` independently closable entrances that all feed `output`.
///
/// Each handle forwards its puts directly to the shared output. The output
/// is closed exactly once, by whichever handle's first
/// [close()](ChuteEntrance::close) brings the open count to zero; it closes
/// if and only if every handle has been closed. A single input is redundant
/// (just use the output directly) but allowed.
///
/// # Panics
/// Panics when `inputs` is zero.
pub fn multiplexer<E, S>(inputs: usize, output: S) -> Vec<MultiplexEntrance<E, S>>
where
    S: ChuteEntrance<E>,
{
    assert!(inputs > 0, "inputs must be at least 1");
    let shared = Arc::new(MuxShared { output, handles_open: AtomicUsize::new(inputs) });
    (0..inputs)
        .map(|_| MultiplexEntrance {
            shared: shared.clone(),
            closed: AtomicBool::new(false),
            _marker: PhantomData,
        })
        .collect()
}

/// One input handle of a [multiplexer()]. Closing a handle is independent of
/// its siblings; putting on a closed handle fails even while the shared
/// output is still open.
pub struct MultiplexEntrance<E, S> {
    shared: Arc<MuxShared<S>>,
    closed: AtomicBool,
    _marker: PhantomData<fn(E)>,
}

impl<E, S: ChuteEntrance<E>> ChuteEntrance<E> for MultiplexEntrance<E, S> {
    fn put(&self, element: E, stop: &StopToken) -> Result<(), PutError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(PutError::Closed);
        }
        self.shared.output.put(element, stop)
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        // The handle that brings the count to zero closes the output; racing
        // closers cannot both see 1 here.
        if self.shared.handles_open.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.shared.output.close();
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst) || self.shared.output.is_closed()
    }
}
