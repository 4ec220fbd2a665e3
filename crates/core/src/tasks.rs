// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Multiset of named outstanding tasks

use std::collections::HashMap;

/// Result of completing one occurrence of a named task
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Completion {
    /// Other occurrences of the name are still outstanding
    Remaining(u32),
    /// The last occurrence finished; the name is no longer tracked
    Cleared,
}

/// Named tasks with occurrence counts, remembering first-registration order
#[derive(Clone, Debug, Default)]
pub(crate) struct PendingTasks {
    counts: HashMap<String, u32>,
    order: Vec<String>,
}

impl PendingTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one occurrence of `name`
    pub fn register(&mut self, name: String) {
        match self.counts.get_mut(&name) {
            Some(count) => *count += 1,
            None => {
                self.order.push(name.clone());
                self.counts.insert(name, 1);
            }
        }
    }

    /// Complete one occurrence of `name`, or `None` if it is not tracked
    pub fn complete(&mut self, name: &str) -> Option<Completion> {
        let count = self.counts.get_mut(name)?;
        if *count > 1 {
            *count -= 1;
            return Some(Completion::Remaining(*count));
        }

        self.counts.remove(name);
        self.order.retain(|n| n != name);
        Some(Completion::Cleared)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.counts.contains_key(name)
    }

    /// True if any of the given names is outstanding
    pub fn any<S: AsRef<str>>(&self, names: impl IntoIterator<Item = S>) -> bool {
        names.into_iter().any(|n| self.contains(n.as_ref()))
    }

    /// Unique outstanding names, in first-registration order
    pub fn names(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Sum of all occurrence counts
    pub fn total(&self) -> u64 {
        self.counts.values().map(|&c| u64::from(c)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[cfg(test)]
#[path = "tasks_tests.rs"]
mod tests;
