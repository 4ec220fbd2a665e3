// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! tally-core: a completion coordinator
//!
//! This crate provides:
//! - A countdown of anonymous outstanding units plus a multiset of named tasks
//! - "After" continuations that run once a specific set of named tasks has finished
//! - A terminal callback invoked exactly once with every captured task error
//! - Pluggable deferred-turn scheduling (manual queue or tokio dispatcher)

pub mod config;
pub mod coordinator;
pub mod error;
pub mod scheduler;

mod after;
mod tasks;
mod wrap;

// Re-exports
pub use config::{ConfigError, CoordinatorConfig};
pub use coordinator::{waiting_on, CompletionReceiver, Coordinator, Holdup};
pub use error::{CoordinatorError, TaskError, TaskOutcome};
pub use scheduler::{Deferred, ManualScheduler, Scheduler, TokioScheduler};
