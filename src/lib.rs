//! # Chute
//!
//! Closable, bounded, thread-safe conduits ("chutes") between producer and
//! consumer threads, plus the composition operators that make many
//! independent producer/consumer relationships cheap to coordinate:
//! listener-driven non-blocking consumption, element transformation, fan-in
//! multiplexing, and batching workers.
//!
//! ## The chute
//!
//! [BufferingChute] is the core primitive: a fixed-capacity FIFO buffer with
//! a one-way close protocol. Producers use the [ChuteEntrance] side
//! ([put()](ChuteEntrance::put), [close()](ChuteEntrance::close)); consumers
//! use the [ChuteExit] side ([take()](ChuteExit::take),
//! [try_take()](ChuteExit::try_take), [try_take_now()](ChuteExit::try_take_now)).
//! Everything composes by these capability traits, and they are implemented
//! for `&T` and `Arc<T>` so a component needing "a consumable source" or "a
//! fillable sink" accepts whatever you have.
//!
//! Blocking calls are cancelled cooperatively through a [StopToken]; stopping
//! abandons only the in-flight operation and never corrupts shared state.
//!
//! ```rust
//! use chute::*;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let chute = Arc::new(BufferingChute::<i32>::new(16));
//! let stop = StopToken::new();
//! let producer = {
//!     let chute = chute.clone();
//!     let stop = stop.clone();
//!     thread::spawn(move || {
//!         for i in 0..100 {
//!             chute.put(i, &stop).unwrap();
//!         }
//!         chute.close();
//!     })
//! };
//! let mut total = 0;
//! while let Ok(Some(v)) = chute.take(&stop) {
//!     total += v;
//! }
//! assert_eq!(total, 4950);
//! producer.join().unwrap();
//! ```
//!
//! ## Composition
//!
//! * [TransformingEntrance] / [TransformingExit] wrap one side of a chute
//!   with a pure mapping function, with no added buffering.
//! * [ListenableChute] notifies registered callbacks (each on its own
//!   [Executor]) whenever data or end-of-stream becomes observable, so one
//!   thread can service many chutes without blocking on any of them.
//! * [multiplexer()] fans several independently closable entrances into one
//!   shared sink, closing it exactly once, when the last handle closes.
//! * [ChuteIter] presents an exit as a plain single-pass [Iterator].
//! * [workers] hosts the run-loop workers: fixed-size batching, time-bounded
//!   periodic batching, and per-element transformation.
//!
//! ```rust
//! use chute::*;
//! use chute::workers::{BatchingWorker, WorkerOutcome};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let stop = StopToken::new();
//! let input = Arc::new(BufferingChute::<u32>::new(8));
//! let output = Arc::new(BufferingChute::<Vec<u32>>::new(8));
//! let worker = BatchingWorker::new(input.clone(), output.clone(), 3, true, stop.clone());
//! let runner = thread::spawn(move || worker.run());
//!
//! for i in 0..7 {
//!     input.put(i, &stop).unwrap();
//! }
//! input.close();
//! assert_eq!(runner.join().unwrap(), WorkerOutcome::Drained);
//!
//! let mut batches = Vec::new();
//! while let Ok(Some(batch)) = output.take(&stop) {
//!     batches.push(batch);
//! }
//! assert_eq!(batches, vec![vec![0, 1, 2], vec![3, 4, 5], vec![6]]);
//! ```
//!
//! ## Scheduling model
//!
//! The library owns no threads. Workers are plain run loops the caller
//! schedules wherever it likes; listeners run on caller-supplied
//! [Executor]s; the injected [TimeSource] keeps timeout and deadline logic
//! deterministic under test. There are no internal retries anywhere: retry
//! policy belongs to callers.

mod buffering;
pub use buffering::BufferingChute;
mod chute;
pub use chute::{Chute, ChuteEntrance, ChuteExit};
mod errors;
pub use errors::{PutError, RejectedExecution, Stopped};
mod iter;
pub use iter::ChuteIter;
mod listenable;
pub use listenable::{DirectExecutor, Executor, ListenableChute};
mod multiplex;
pub use multiplex::{multiplexer, MultiplexEntrance};
mod stop;
pub use stop::StopToken;
mod time;
pub use time::{ManualTimeSource, SystemTimeSource, TimeSource};
mod transform;
pub use transform::{TransformingEntrance, TransformingExit};
mod waiters;

pub mod workers;

#[cfg(test)]
mod tests;
