// Error types for the dispatcher

use shortlink_contracts::ValidationError;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for dispatcher operations
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Failures reported by a remote operation adapter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The call could not complete (connect failure, timeout, broken body)
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status; the body is the message
    #[error("{body}")]
    Rejected { status: u16, body: String },

    /// The service answered 200 but the payload did not match the contract
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The adapter panicked mid-call; the worker survives and reports it
    #[error("remote operation panicked: {0}")]
    Panicked(String),
}

impl RemoteError {
    pub fn transport(msg: impl Into<String>) -> Self {
        RemoteError::Transport(msg.into())
    }

    pub fn rejected(status: u16, body: impl Into<String>) -> Self {
        RemoteError::Rejected {
            status,
            body: body.into(),
        }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        RemoteError::Decode(msg.into())
    }

    pub fn panicked(msg: impl Into<String>) -> Self {
        RemoteError::Panicked(msg.into())
    }
}

/// Errors surfaced to callers of the dispatcher
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Input rejected before dispatch
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The adapter failed the unit of work
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// No worker produced a result before the deadline
    #[error("timed out awaiting result after {waited:?}")]
    Timeout { waited: Duration },

    /// The dispatcher is shutting down and accepts no new work
    #[error("dispatcher is shut down")]
    ShutDown,

    /// The unit was dropped without a result (its worker went away)
    #[error("unit of work {0} was abandoned before completion")]
    Abandoned(uuid::Uuid),

    /// A unit id collided with a pending one
    #[error("unit of work id {0} is already pending")]
    DuplicateId(uuid::Uuid),

    /// The completion did not carry the output shape the operation expects
    #[error("unexpected output for {0} operation")]
    UnexpectedOutput(&'static str),

    /// Workers did not finish within the shutdown timeout
    #[error("graceful shutdown timed out")]
    ShutdownTimeout,
}

impl DispatchError {
    /// True when the failure came back from the remote service itself
    pub fn is_remote(&self) -> bool {
        matches!(self, DispatchError::Remote(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, DispatchError::Timeout { .. })
    }
}
