// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deferred-turn scheduling
//!
//! The coordinator never runs continuations or its terminal callback inline. It hands
//! them to a [`Scheduler`] which runs them after the current synchronous burst, in the
//! order they were deferred.

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// A unit of deferred work
pub type Deferred = Box<dyn FnOnce() + Send + 'static>;

/// Runs deferred turns later, FIFO
///
/// `defer` is called while the coordinator holds its state lock, so it must queue the
/// turn and return without running it.
pub trait Scheduler: Send + Sync {
    fn defer(&self, turn: Deferred);
}

/// Work queue drained explicitly by the owner
///
/// Deterministic: nothing runs until `run_next` or `run_until_idle` is called.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    queue: Arc<Mutex<VecDeque<Deferred>>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of turns waiting to run
    pub fn pending(&self) -> usize {
        self.queue.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Run the oldest deferred turn, returning false if the queue was empty
    pub fn run_next(&self) -> bool {
        // Pop before running so the turn can defer more work
        let turn = self
            .queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match turn {
            Some(turn) => {
                turn();
                true
            }
            None => false,
        }
    }

    /// Run turns until the queue is empty, including turns deferred while running
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }
}

impl Scheduler for ManualScheduler {
    fn defer(&self, turn: Deferred) {
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(turn);
    }
}

/// Runs deferred turns on a single tokio task fed by an unbounded channel
///
/// The dispatcher yields between turns so other tasks get to run, and exits once every
/// handle to the scheduler (and every queued turn) has been dropped.
#[derive(Clone)]
pub struct TokioScheduler {
    tx: mpsc::UnboundedSender<Deferred>,
}

impl TokioScheduler {
    /// Start the dispatcher on the current runtime
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn() -> Self {
        Self::spawn_on(&tokio::runtime::Handle::current())
    }

    /// Start the dispatcher on the given runtime
    pub fn spawn_on(handle: &tokio::runtime::Handle) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Deferred>();
        handle.spawn(async move {
            while let Some(turn) = rx.recv().await {
                if let Err(payload) = catch_unwind(AssertUnwindSafe(turn)) {
                    let err = crate::error::TaskError::from_panic(payload);
                    tracing::error!(error = %err, "deferred turn panicked");
                }
                tokio::task::yield_now().await;
            }
            tracing::trace!("scheduler dispatcher stopped");
        });
        Self { tx }
    }
}

impl Scheduler for TokioScheduler {
    fn defer(&self, turn: Deferred) {
        if self.tx.send(turn).is_err() {
            tracing::warn!("scheduler dispatcher is gone, dropping deferred turn");
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
