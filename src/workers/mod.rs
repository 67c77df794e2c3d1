//! Run-loop workers that consume one chute and feed another.
//!
//! Each worker is a plain run loop the caller schedules on a thread of its
//! choosing; the library owns no thread pool. `run()` consumes the worker, so
//! a worker instance executes at most once; independent workers on
//! independent chutes run fully in parallel with no coordination.

mod batching;
mod periodic;
mod transforming;

pub use batching::BatchingWorker;
pub use periodic::PeriodicBatchingWorker;
pub use transforming::TransformingWorker;

/// How a worker's run loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// The input reached closed-and-empty and everything pending was
    /// forwarded (and the output closed, when so configured).
    Drained,
    /// The stop token fired. Any in-flight element or partial batch was
    /// dropped and the output was left untouched.
    Stopped,
    /// The output rejected a put because it was already closed. Usually a
    /// wiring error; the input is left as-is.
    OutputClosed,
}
