// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the coordinator
//!
//! Two families:
//! - [`CoordinatorError`] - misuse of the API, returned synchronously to the caller
//! - [`TaskError`] - failures inside user work, captured and delivered to the terminal callback

use std::any::Any;
use thiserror::Error;

/// Errors returned when the coordinator is used incorrectly
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinatorError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("unknown event finished: [{0}]")]
    UnknownTask(String),
    #[error("missing event to wait for")]
    MissingDependency,
    #[error("finalize callback already set")]
    AlreadyFinalized,
    #[error("coordinator already finalized")]
    Finalized,
    #[error("finished called with nothing outstanding")]
    NothingOutstanding,
}

/// A failure captured from user-supplied work
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("{0}")]
    Failed(Box<dyn std::error::Error + Send + Sync>),
    #[error("{0}")]
    Message(String),
    #[error("task panicked: {0}")]
    Panicked(String),
}

impl TaskError {
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Failed(Box::new(err))
    }

    /// Convert a panic payload from `catch_unwind` into an error
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::Panicked(message)
    }
}

impl From<String> for TaskError {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

impl From<&str> for TaskError {
    fn from(message: &str) -> Self {
        Self::Message(message.to_string())
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for TaskError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self::Failed(err)
    }
}

impl From<CoordinatorError> for TaskError {
    fn from(err: CoordinatorError) -> Self {
        Self::new(err)
    }
}

impl From<std::io::Error> for TaskError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err)
    }
}

/// Return types accepted from user callbacks
///
/// `()` always succeeds; `Result<T, E>` fails with its error converted into a [`TaskError`].
pub trait TaskOutcome {
    type Output;

    fn into_result(self) -> Result<Self::Output, TaskError>;
}

impl TaskOutcome for () {
    type Output = ();

    fn into_result(self) -> Result<(), TaskError> {
        Ok(())
    }
}

impl<T, E: Into<TaskError>> TaskOutcome for Result<T, E> {
    type Output = T;

    fn into_result(self) -> Result<T, TaskError> {
        self.map_err(Into::into)
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
