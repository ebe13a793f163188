use std::sync::Arc;

use thiserror::Error;

pub type StdErrorShared = Arc<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by streams, parallel operations and the values they carry.
///
/// Errors are cheap to clone so that a failed [`Outcome`](crate::Outcome) can be
/// duplicated across branches of a pipeline.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("concurrency must be >= 1, got {0}")]
    InvalidConcurrency(usize),

    #[error("terminal channel closed without a status")]
    MissingChannel,

    #[error("context canceled")]
    Canceled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,

    #[error("stream exhausted")]
    Exhausted,

    #[error("stream receiver dropped")]
    ReceiverDropped,

    #[error("worker panicked")]
    WorkerPanicked,

    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    User(StdErrorShared),

    #[error("{}", join_messages(.0))]
    Joined(Vec<Error>),
}

impl Error {
    /// Wraps an arbitrary error returned by a user function.
    pub fn user<E>(source: E) -> Error
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::User(Arc::new(source))
    }

    pub fn msg(message: impl Into<String>) -> Error {
        Error::Message(message.into())
    }

    /// Returns `true` for errors raised by a canceled or expired context.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Canceled | Error::DeadlineExceeded)
    }

    /// Flat view of the errors combined into this one.
    ///
    /// A [`Error::Joined`] yields its members (recursively flattened), any
    /// other error yields itself.
    pub fn errors(&self) -> Vec<&Error> {
        match self {
            Error::Joined(errors) => errors.iter().flat_map(|e| e.errors()).collect(),
            other => vec![other],
        }
    }
}

fn join_messages(errors: &[Error]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::user(e)
    }
}

impl From<String> for Error {
    fn from(message: String) -> Self {
        Error::Message(message)
    }
}

impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Error::Message(message.to_string())
    }
}
