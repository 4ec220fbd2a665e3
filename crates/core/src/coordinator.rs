// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Completion coordinator
//!
//! Tracks anonymous outstanding units and named outstanding tasks, runs "after"
//! continuations once every name they depend on has finished, and invokes a terminal
//! callback exactly once when nothing is left outstanding.
//!
//! All follow-up work runs on deferred turns through the configured [`Scheduler`]:
//! - a drain turn runs continuations made eligible by one burst of completions
//! - a terminal turn re-checks the count and fires the terminal callback

use crate::after::{AfterIndex, ContinuationFn};
use crate::config::CoordinatorConfig;
use crate::error::{CoordinatorError, TaskError, TaskOutcome};
use crate::scheduler::Scheduler;
use crate::tasks::{Completion, PendingTasks};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;

/// Terminal callback; receives the captured errors, or `None` if there were none
pub(crate) type TerminalFn = Box<dyn FnOnce(Option<Vec<TaskError>>) + Send>;

/// Receiver side of [`Coordinator::completion`]
pub type CompletionReceiver = oneshot::Receiver<Option<Vec<TaskError>>>;

/// What a coordinator is still waiting on
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Holdup {
    /// Named tasks still outstanding, in first-registration order
    Events(Vec<String>),
    /// No named tasks; the raw outstanding count
    Count(u64),
    /// The terminal callback has already run
    Finalized,
}

enum Lifecycle {
    /// No terminal callback attached
    Active,
    /// Terminal callback attached, waiting for the count to reach zero
    Finalizing(TerminalFn),
    /// Terminal callback has run
    Finalized,
}

struct State {
    count: u64,
    lifecycle: Lifecycle,
    tasks: PendingTasks,
    after: AfterIndex,
    /// Names whose continuations await the scheduled drain turn; `Some` while one is scheduled
    staged: Option<Vec<String>>,
    errors: Vec<TaskError>,
}

impl State {
    fn new() -> Self {
        Self {
            count: 0,
            lifecycle: Lifecycle::Active,
            tasks: PendingTasks::new(),
            after: AfterIndex::new(),
            staged: None,
            errors: Vec::new(),
        }
    }

    fn ensure_open(&self) -> Result<(), CoordinatorError> {
        match self.lifecycle {
            Lifecycle::Finalized => Err(CoordinatorError::Finalized),
            _ => Ok(()),
        }
    }

    fn terminal_due(&self) -> bool {
        self.count == 0 && matches!(self.lifecycle, Lifecycle::Finalizing(_))
    }
}

struct Inner {
    name: String,
    scheduler: Arc<dyn Scheduler>,
    state: Mutex<State>,
}

/// Joins on a set of anonymous units and named tasks
///
/// A cheap handle: clones share the same state.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<Inner>,
}

impl Coordinator {
    /// Create an empty coordinator
    pub fn new(scheduler: impl Scheduler + 'static) -> Self {
        Self::named(scheduler, CoordinatorConfig::default().name)
    }

    /// Create a coordinator seeded from configuration
    pub fn with_config(
        scheduler: impl Scheduler + 'static,
        config: CoordinatorConfig,
    ) -> Result<Self, CoordinatorError> {
        let coordinator = Self::named(scheduler, config.name);
        coordinator.add(config.initial_count)?;
        coordinator.events(config.events)?;
        Ok(coordinator)
    }

    fn named(scheduler: impl Scheduler + 'static, name: String) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                scheduler: Arc::new(scheduler),
                state: Mutex::new(State::new()),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Label used in log output
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Add `amount` anonymous outstanding units
    pub fn add<N>(&self, amount: N) -> Result<&Self, CoordinatorError>
    where
        N: TryInto<u64> + std::fmt::Display + Copy,
    {
        let value: u64 = amount
            .try_into()
            .map_err(|_| {
                CoordinatorError::InvalidArgument(format!("invalid count value {amount}"))
            })?;

        let mut state = self.lock();
        state.ensure_open()?;
        state.count = state.count.checked_add(value).ok_or_else(|| {
            CoordinatorError::InvalidArgument(format!("count overflow adding {value}"))
        })?;
        tracing::trace!(
            coordinator = %self.inner.name,
            added = value,
            count = state.count,
            "units added"
        );
        Ok(self)
    }

    /// Register named outstanding tasks; a repeated name adds another occurrence
    pub fn events<I>(&self, names: I) -> Result<&Self, CoordinatorError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut state = self.lock();
        state.ensure_open()?;
        let names = validate_names(names)?;
        if names.is_empty() {
            return Ok(self);
        }
        state.count = state
            .count
            .checked_add(names.len() as u64)
            .ok_or_else(|| CoordinatorError::InvalidArgument("count overflow".to_string()))?;
        tracing::debug!(
            coordinator = %self.inner.name,
            events = ?names,
            count = state.count,
            "events registered"
        );
        for name in names {
            state.tasks.register(name);
        }
        debug_assert!(state.count >= state.tasks.total());
        Ok(self)
    }

    /// Complete one anonymous unit
    pub fn finished(&self) -> Result<&Self, CoordinatorError> {
        let mut state = self.lock();
        state.ensure_open()?;
        if state.count == 0 {
            return Err(CoordinatorError::NothingOutstanding);
        }
        state.count -= 1;
        tracing::trace!(coordinator = %self.inner.name, count = state.count, "unit finished");
        if state.terminal_due() {
            self.schedule_terminal();
        }
        Ok(self)
    }

    /// Complete one occurrence of each named task, in order
    ///
    /// Stops at the first name that is not outstanding. Names processed before it stay
    /// completed.
    pub fn finished_events<I>(&self, names: I) -> Result<&Self, CoordinatorError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut state = self.lock();
        state.ensure_open()?;

        let mut cleared = Vec::new();
        let mut outcome = Ok(());
        for name in names {
            let name: String = name.into();
            match state.tasks.complete(&name) {
                None => {
                    outcome = Err(CoordinatorError::UnknownTask(name));
                    break;
                }
                Some(Completion::Remaining(left)) => {
                    tracing::trace!(
                        coordinator = %self.inner.name,
                        event = %name,
                        left,
                        "event occurrence finished"
                    );
                }
                Some(Completion::Cleared) => {
                    tracing::trace!(
                        coordinator = %self.inner.name,
                        event = %name,
                        "event finished"
                    );
                    if state.after.watches(&name) {
                        cleared.push(name);
                    }
                }
            }
            state.count -= 1;
        }
        debug_assert!(state.count >= state.tasks.total());

        let drain = if cleared.is_empty() {
            false
        } else if let Some(staged) = state.staged.as_mut() {
            staged.extend(cleared);
            false
        } else {
            state.staged = Some(cleared);
            true
        };
        // Deferred under the lock so turns queue in the order the state changed
        if drain {
            self.schedule_drain();
        }
        if state.terminal_due() {
            self.schedule_terminal();
        }
        outcome.map(|_| self)
    }

    /// Run `callback` once every name in `names` has finished
    pub fn after<I, F, O>(&self, names: I, callback: F) -> Result<&Self, CoordinatorError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
        F: FnOnce() -> O + Send + 'static,
        O: TaskOutcome,
    {
        let names = validate_names(names)?;
        if names.is_empty() {
            return Err(CoordinatorError::MissingDependency);
        }

        let continuation: ContinuationFn =
            Box::new(move || callback().into_result().map(|_| ()));
        let mut state = self.lock();
        let id = state.after.register(names.clone(), continuation);
        tracing::debug!(
            coordinator = %self.inner.name,
            continuation = id,
            depends_on = ?names,
            registered = state.after.len(),
            "continuation registered"
        );
        Ok(self)
    }

    /// Like [`after`](Self::after), passing `receiver` to the callback
    pub fn after_with<I, R, F, O>(
        &self,
        names: I,
        receiver: R,
        callback: F,
    ) -> Result<&Self, CoordinatorError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
        R: Send + 'static,
        F: FnOnce(&R) -> O + Send + 'static,
        O: TaskOutcome,
    {
        self.after(names, move || callback(&receiver))
    }

    /// Record a task-level error for the terminal callback
    pub fn error(&self, err: impl Into<TaskError>) -> &Self {
        let err = err.into();
        tracing::warn!(coordinator = %self.inner.name, error = %err, "task error captured");
        self.lock().errors.push(err);
        self
    }

    /// Record an error if there is one
    pub fn error_opt<E: Into<TaskError>>(&self, err: Option<E>) -> &Self {
        match err {
            Some(err) => self.error(err),
            None => self,
        }
    }

    /// True if any of `names` is still outstanding
    pub fn any<I>(&self, names: I) -> bool
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.lock().tasks.any(names)
    }

    /// What is still outstanding
    pub fn holdup(&self) -> Holdup {
        let state = self.lock();
        if matches!(state.lifecycle, Lifecycle::Finalized) {
            Holdup::Finalized
        } else if state.tasks.is_empty() {
            Holdup::Count(state.count)
        } else {
            Holdup::Events(state.tasks.names())
        }
    }

    /// Outstanding count, or `None` once the terminal callback has run
    pub fn count(&self) -> Option<u64> {
        let state = self.lock();
        match state.lifecycle {
            Lifecycle::Finalized => None,
            _ => Some(state.count),
        }
    }

    /// True once the terminal callback has run
    pub fn is_finalized(&self) -> bool {
        matches!(self.lock().lifecycle, Lifecycle::Finalized)
    }

    /// Attach the terminal callback
    ///
    /// Runs on a deferred turn once the count reaches zero, receiving the captured errors
    /// or `None`. Work may still be added until that turn observes zero.
    pub fn finalize<F>(&self, callback: F) -> Result<&Self, CoordinatorError>
    where
        F: FnOnce(Option<Vec<TaskError>>) + Send + 'static,
    {
        {
            let mut state = self.lock();
            if !matches!(state.lifecycle, Lifecycle::Active) {
                return Err(CoordinatorError::AlreadyFinalized);
            }
            state.count = state.count.checked_add(1).ok_or_else(|| {
                CoordinatorError::InvalidArgument("count overflow".to_string())
            })?;
            state.lifecycle = Lifecycle::Finalizing(Box::new(callback));
            tracing::debug!(
                coordinator = %self.inner.name,
                outstanding = state.count - 1,
                "finalize attached"
            );
        }

        // Uniform completion check, whether or not anything is outstanding
        self.finished()
    }

    /// Like [`finalize`](Self::finalize), passing `receiver` to the callback
    pub fn finalize_with<R, F>(&self, receiver: R, callback: F) -> Result<&Self, CoordinatorError>
    where
        R: Send + 'static,
        F: FnOnce(&R, Option<Vec<TaskError>>) + Send + 'static,
    {
        self.finalize(move |errors| callback(&receiver, errors))
    }

    /// Finalize and return a receiver resolved with the outcome
    pub fn completion(&self) -> Result<CompletionReceiver, CoordinatorError> {
        let (tx, rx) = oneshot::channel();
        self.finalize(move |errors| {
            let _ = tx.send(errors);
        })?;
        Ok(rx)
    }

    /// Run `work`, capturing an error or panic into the error list
    pub(crate) fn run_captured<T>(
        &self,
        work: impl FnOnce() -> Result<T, TaskError>,
    ) -> Option<T> {
        match catch_unwind(AssertUnwindSafe(work)) {
            Ok(Ok(value)) => Some(value),
            Ok(Err(err)) => {
                self.error(err);
                None
            }
            Err(payload) => {
                self.error(TaskError::from_panic(payload));
                None
            }
        }
    }

    fn schedule_drain(&self) {
        let this = self.clone();
        self.inner
            .scheduler
            .defer(Box::new(move || this.drain_continuations()));
    }

    fn schedule_terminal(&self) {
        let this = self.clone();
        self.inner
            .scheduler
            .defer(Box::new(move || this.fire_terminal()));
    }

    /// Drain turn: run every staged continuation whose dependencies have all cleared
    fn drain_continuations(&self) {
        let batch = self.lock().staged.take().unwrap_or_default();
        tracing::debug!(coordinator = %self.inner.name, batch = ?batch, "draining continuations");

        for name in batch {
            loop {
                let ready = {
                    let mut guard = self.lock();
                    let state = &mut *guard;
                    let tasks = &state.tasks;
                    state.after.take_ready(&name, |dep| tasks.contains(dep))
                };
                let Some(ready) = ready else { break };

                tracing::debug!(
                    coordinator = %self.inner.name,
                    continuation = ready.id,
                    depends_on = ?ready.depends_on,
                    "running continuation"
                );
                self.run_captured(ready.callback);
            }
        }
    }

    /// Terminal turn: fire the terminal callback if the count is still zero
    fn fire_terminal(&self) {
        let fired = {
            let mut state = self.lock();
            if !state.terminal_due() {
                tracing::trace!(
                    coordinator = %self.inner.name,
                    count = state.count,
                    "terminal turn superseded"
                );
                return;
            }
            match std::mem::replace(&mut state.lifecycle, Lifecycle::Finalized) {
                Lifecycle::Finalizing(terminal) => {
                    let errors = std::mem::take(&mut state.errors);
                    Some((terminal, errors))
                }
                other => {
                    state.lifecycle = other;
                    None
                }
            }
        };

        if let Some((terminal, errors)) = fired {
            tracing::debug!(coordinator = %self.inner.name, errors = errors.len(), "finalized");
            terminal((!errors.is_empty()).then_some(errors));
        }
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("name", &self.inner.name)
            .field("count", &self.count())
            .field("holdup", &self.holdup())
            .finish()
    }
}

/// Create a coordinator seeded from configuration
pub fn waiting_on(
    scheduler: impl Scheduler + 'static,
    config: CoordinatorConfig,
) -> Result<Coordinator, CoordinatorError> {
    Coordinator::with_config(scheduler, config)
}

fn validate_names<I>(names: I) -> Result<Vec<String>, CoordinatorError>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    names
        .into_iter()
        .map(|name| {
            let name = name.into();
            if name.is_empty() {
                Err(CoordinatorError::InvalidArgument(
                    "event name must be a string with one or more characters".to_string(),
                ))
            } else {
                Ok(name)
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
