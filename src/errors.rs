use std::error::Error;
use std::fmt;

/// A blocking operation was abandoned because its [StopToken](crate::StopToken) fired.
///
/// This is a cooperative stop signal, not a failure: the chute involved stays
/// valid and other threads can keep using it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stopped;

impl fmt::Display for Stopped {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "blocking operation stopped by its stop token")
    }
}

impl Error for Stopped {}

/// Error returned by [put()](crate::ChuteEntrance::put).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutError {
    /// The entrance was already closed; no new elements are accepted.
    Closed,
    /// The caller's [StopToken](crate::StopToken) fired while blocked on a full buffer.
    Stopped,
}

impl PutError {
    /// Whether this error means the entrance was closed.
    pub fn is_closed(&self) -> bool {
        matches!(self, PutError::Closed)
    }

    /// Whether this error means the stop token fired.
    pub fn is_stopped(&self) -> bool {
        matches!(self, PutError::Stopped)
    }
}

impl fmt::Display for PutError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PutError::Closed => write!(f, "putting into a closed entrance"),
            PutError::Stopped => write!(f, "put stopped by its stop token"),
        }
    }
}

impl Error for PutError {}

impl From<Stopped> for PutError {
    fn from(_: Stopped) -> Self {
        PutError::Stopped
    }
}

/// A listener task was rejected by its [Executor](crate::Executor).
///
/// Rejection is isolated per listener: the notifying thread logs it and moves
/// on to the remaining listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RejectedExecution;

impl fmt::Display for RejectedExecution {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "task rejected by executor")
    }
}

impl Error for RejectedExecution {}
