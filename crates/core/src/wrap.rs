// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wrapping helpers that turn a callback-style operation into one outstanding unit
//!
//! The returned closure runs the wrapped function, captures its error or panic, then
//! completes the unit (or named task) it registered.

use crate::coordinator::Coordinator;
use crate::error::{CoordinatorError, TaskOutcome};

impl Coordinator {
    /// Add one anonymous unit, completed when the returned closure is called
    pub fn callback<A, F, O>(
        &self,
        work: F,
    ) -> Result<impl FnOnce(A) -> Option<O::Output> + Send, CoordinatorError>
    where
        F: FnOnce(A) -> O + Send + 'static,
        O: TaskOutcome,
    {
        self.add(1)?;
        let coordinator = self.clone();

        Ok(move |args: A| {
            let result = coordinator.run_captured(|| work(args).into_result());
            if let Err(err) = coordinator.finished() {
                tracing::error!(
                    coordinator = %coordinator.name(),
                    error = %err,
                    "wrapped callback could not complete its unit"
                );
            }
            result
        })
    }

    /// Like [`callback`](Self::callback), passing `receiver` to the wrapped function
    pub fn callback_with<A, R, F, O>(
        &self,
        receiver: R,
        work: F,
    ) -> Result<impl FnOnce(A) -> Option<O::Output> + Send, CoordinatorError>
    where
        R: Send + 'static,
        F: FnOnce(&R, A) -> O + Send + 'static,
        O: TaskOutcome,
    {
        self.callback(move |args: A| work(&receiver, args))
    }

    /// Register one occurrence of `name`, finished when the returned closure is called
    pub fn event<A, F, O>(
        &self,
        name: impl Into<String>,
        work: F,
    ) -> Result<impl FnOnce(A) -> Option<O::Output> + Send, CoordinatorError>
    where
        F: FnOnce(A) -> O + Send + 'static,
        O: TaskOutcome,
    {
        let name = name.into();
        self.events([name.clone()])?;
        let coordinator = self.clone();

        Ok(move |args: A| {
            let result = coordinator.run_captured(|| work(args).into_result());
            if let Err(err) = coordinator.finished_events([name.as_str()]) {
                tracing::error!(
                    coordinator = %coordinator.name(),
                    event = %name,
                    error = %err,
                    "wrapped event could not finish"
                );
            }
            result
        })
    }

    /// Like [`event`](Self::event), passing `receiver` to the wrapped function
    pub fn event_with<A, R, F, O>(
        &self,
        name: impl Into<String>,
        receiver: R,
        work: F,
    ) -> Result<impl FnOnce(A) -> Option<O::Output> + Send, CoordinatorError>
    where
        R: Send + 'static,
        F: FnOnce(&R, A) -> O + Send + 'static,
        O: TaskOutcome,
    {
        self.event(name, move |args: A| work(&receiver, args))
    }
}

#[cfg(test)]
#[path = "wrap_tests.rs"]
mod tests;
