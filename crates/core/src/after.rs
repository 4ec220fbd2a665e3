// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bookkeeping for continuations that wait on a set of named tasks
//!
//! Each continuation is stored once and indexed under every distinct name in its
//! dependency set, so finishing any one of those names can make it eligible.
//! Per-name index order is registration order.

use crate::error::TaskError;
use std::collections::HashMap;

/// A continuation body, already normalized to a task result
pub(crate) type ContinuationFn = Box<dyn FnOnce() -> Result<(), TaskError> + Send>;

struct Registration {
    /// Dependency names as given, duplicates included
    depends_on: Vec<String>,
    callback: ContinuationFn,
}

/// A continuation whose dependencies have all cleared, detached from the index
pub(crate) struct ReadyContinuation {
    pub id: u64,
    pub depends_on: Vec<String>,
    pub callback: ContinuationFn,
}

#[derive(Default)]
pub(crate) struct AfterIndex {
    next_id: u64,
    registrations: HashMap<u64, Registration>,
    by_name: HashMap<String, Vec<u64>>,
}

impl AfterIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a continuation under each of its dependency names
    pub fn register(&mut self, depends_on: Vec<String>, callback: ContinuationFn) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        for name in &depends_on {
            let ids = self.by_name.entry(name.clone()).or_default();
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        self.registrations.insert(
            id,
            Registration {
                depends_on,
                callback,
            },
        );
        id
    }

    /// True if at least one continuation is indexed under `name`
    pub fn watches(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Detach the first continuation indexed under `name` whose dependencies have all cleared
    ///
    /// `is_pending` reports whether a dependency name is still outstanding. The returned
    /// continuation has been removed from the index of every one of its dependency names.
    pub fn take_ready(
        &mut self,
        name: &str,
        is_pending: impl Fn(&str) -> bool,
    ) -> Option<ReadyContinuation> {
        let id = self.by_name.get(name)?.iter().copied().find(|id| {
            self.registrations
                .get(id)
                .is_some_and(|r| !r.depends_on.iter().any(|dep| is_pending(dep)))
        })?;

        let registration = self.registrations.remove(&id)?;
        for dep in &registration.depends_on {
            if let Some(ids) = self.by_name.get_mut(dep) {
                ids.retain(|other| *other != id);
                if ids.is_empty() {
                    self.by_name.remove(dep);
                }
            }
        }

        Some(ReadyContinuation {
            id,
            depends_on: registration.depends_on,
            callback: registration.callback,
        })
    }

    /// Number of registered continuations that have not fired
    pub fn len(&self) -> usize {
        self.registrations.len()
    }
}

impl std::fmt::Debug for AfterIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AfterIndex")
            .field("registrations", &self.registrations.len())
            .field("by_name", &self.by_name)
            .finish()
    }
}

#[cfg(test)]
#[path = "after_tests.rs"]
mod tests;
